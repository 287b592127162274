use crate::types::Embedding;

/// Euclidean distance at or below which a reference accepts the probe.
///
/// This is the embedding library's default tolerance; the gateway does
/// not tune it per request.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.6;

/// Strategy for comparing a probe embedding against a list of
/// reference embeddings.
///
/// Returns one accept/reject boolean per reference, in the same order
/// as the input. The comparator carries no ranking or confidence; the
/// caller decides what to do with multiple accepts.
pub trait FaceComparator: Send + Sync {
    fn compare_all(&self, references: &[Embedding], probe: &Embedding) -> Vec<bool>;
}

/// Fixed-threshold Euclidean distance comparator.
pub struct DistanceComparator {
    threshold: f32,
}

impl DistanceComparator {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for DistanceComparator {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE_THRESHOLD)
    }
}

impl FaceComparator for DistanceComparator {
    fn compare_all(&self, references: &[Embedding], probe: &Embedding) -> Vec<bool> {
        references
            .iter()
            .map(|reference| reference.euclidean_distance(probe) <= self.threshold)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_within_threshold() {
        let probe = Embedding::new(vec![0.0, 0.0]);
        let references = vec![
            Embedding::new(vec![0.1, 0.0]),
            Embedding::new(vec![5.0, 5.0]),
            Embedding::new(vec![0.0, 0.5]),
        ];
        let results = DistanceComparator::default().compare_all(&references, &probe);
        assert_eq!(results, vec![true, false, true]);
    }

    #[test]
    fn test_boundary_distance_accepts() {
        let probe = Embedding::new(vec![0.0]);
        let references = vec![Embedding::new(vec![DEFAULT_DISTANCE_THRESHOLD])];
        let results = DistanceComparator::default().compare_all(&references, &probe);
        assert_eq!(results, vec![true]);
    }

    #[test]
    fn test_empty_references() {
        let probe = Embedding::new(vec![1.0, 2.0]);
        let results = DistanceComparator::default().compare_all(&[], &probe);
        assert!(results.is_empty());
    }

    #[test]
    fn test_custom_threshold() {
        let probe = Embedding::new(vec![0.0]);
        let references = vec![Embedding::new(vec![1.0])];
        assert_eq!(
            DistanceComparator::new(2.0).compare_all(&references, &probe),
            vec![true]
        );
        assert_eq!(
            DistanceComparator::new(0.5).compare_all(&references, &probe),
            vec![false]
        );
    }
}
