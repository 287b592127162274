//! Match orchestrator — probe in, identity out.
//!
//! Stateless per call: fetch every reference record, embed each
//! stored image and the probe, run the comparator once, and resolve
//! to the first accepting name or "Unknown".

use crate::codec::{self, CodecError};
use crate::compare::FaceComparator;
use crate::embed::{EmbedError, FaceEmbedder};
use crate::store::{PersonStore, StoreError};
use crate::types::{Embedding, MatchOutcome, PersonRecord};
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("could not decode image: {0}")]
    Decode(#[from] CodecError),
    #[error("no face detected in the probe or in a reference image")]
    NoFaceDetected,
    #[error("record store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("embedding capability failed: {0}")]
    Embed(#[from] EmbedError),
    #[error("match attempt exceeded its {0:?} budget")]
    Timeout(Duration),
}

/// Time budget for one match attempt.
///
/// Embedding cost grows linearly with the store, so the bound does
/// too: `base + per_record * record_count`, applied after the record
/// fetch (which is bounded by `base` alone).
#[derive(Debug, Clone, Copy)]
pub struct MatchBudget {
    pub base: Duration,
    pub per_record: Duration,
}

impl Default for MatchBudget {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(10),
            per_record: Duration::from_millis(500),
        }
    }
}

impl MatchBudget {
    fn for_records(&self, count: usize) -> Duration {
        self.base + self.per_record * count as u32
    }
}

/// The match orchestrator. Capabilities are injected so tests can
/// substitute fakes for the store and the embedder.
pub struct MatchEngine {
    store: Arc<dyn PersonStore>,
    embedder: Arc<dyn FaceEmbedder>,
    comparator: Arc<dyn FaceComparator>,
    budget: MatchBudget,
}

impl MatchEngine {
    pub fn new(
        store: Arc<dyn PersonStore>,
        embedder: Arc<dyn FaceEmbedder>,
        comparator: Arc<dyn FaceComparator>,
        budget: MatchBudget,
    ) -> Self {
        Self {
            store,
            embedder,
            comparator,
            budget,
        }
    }

    /// Identify the person in a base64-encoded probe image.
    ///
    /// All-or-nothing: a reference image without a detectable face
    /// fails the whole attempt, never a partial result. An empty
    /// store resolves to "Unknown".
    pub async fn identify(&self, probe_base64: &str) -> Result<MatchOutcome, MatchError> {
        let probe_pixels = codec::decode_base64_image(probe_base64)?;

        let fetch = self.store.stream_all();
        let records = tokio::time::timeout(self.budget.base, fetch)
            .await
            .map_err(|_| MatchError::Timeout(self.budget.base))??;

        let deadline = self.budget.for_records(records.len());
        let outcome = tokio::time::timeout(deadline, self.run(&probe_pixels, &records))
            .await
            .map_err(|_| MatchError::Timeout(deadline))??;

        tracing::info!(
            references = records.len(),
            name = %outcome.name,
            matched = !outcome.is_unknown(),
            "match resolved"
        );
        Ok(outcome)
    }

    async fn run(
        &self,
        probe_pixels: &RgbImage,
        records: &[PersonRecord],
    ) -> Result<MatchOutcome, MatchError> {
        // Parallel lists: names[i] belongs to references[i], in store
        // iteration order.
        let mut names = Vec::with_capacity(records.len());
        let mut references = Vec::with_capacity(records.len());
        for record in records {
            let embedding = self.embed_reference(record).await?;
            names.push(record.name.as_str());
            references.push(embedding);
        }

        let probe = self
            .embedder
            .embed(probe_pixels)
            .await?
            .ok_or(MatchError::NoFaceDetected)?;

        let accepted = self.comparator.compare_all(&references, &probe);
        for (name, ok) in names.iter().zip(accepted) {
            if ok {
                return Ok(MatchOutcome::matched(*name));
            }
        }
        Ok(MatchOutcome::unknown())
    }

    async fn embed_reference(&self, record: &PersonRecord) -> Result<Embedding, MatchError> {
        let pixels = codec::decode_base64_image(&record.image_base64)?;
        match self.embedder.embed(&pixels).await? {
            Some(embedding) => Ok(embedding),
            None => {
                tracing::warn!(name = %record.name, "reference image has no detectable face");
                Err(MatchError::NoFaceDetected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::DistanceComparator;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    /// Serves a fixed record list; `stream_all` only, like the match
    /// path itself.
    struct FixedStore {
        records: Vec<PersonRecord>,
        fail: bool,
    }

    impl FixedStore {
        fn new(records: Vec<PersonRecord>) -> Self {
            Self {
                records,
                fail: false,
            }
        }

        fn unavailable() -> Self {
            Self {
                records: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl PersonStore for FixedStore {
        async fn stream_all(&self) -> Result<Vec<PersonRecord>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            Ok(self.records.clone())
        }

        async fn get(&self, name: &str) -> Result<PersonRecord, StoreError> {
            Err(StoreError::NotFound(name.to_string()))
        }

        async fn put(&self, _: &PersonRecord) -> Result<(), StoreError> {
            Ok(())
        }

        async fn update(&self, _: &crate::types::PersonPatch) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Maps the top-left pixel straight to a 3-dim embedding; pure
    /// black means "no face detected".
    struct PixelEmbedder;

    #[async_trait]
    impl FaceEmbedder for PixelEmbedder {
        async fn embed(&self, image: &RgbImage) -> Result<Option<Embedding>, EmbedError> {
            let [r, g, b] = image.get_pixel(0, 0).0;
            if r == 0 && g == 0 && b == 0 {
                return Ok(None);
            }
            Ok(Some(Embedding::new(vec![
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
            ])))
        }
    }

    fn image_b64(rgb: [u8; 3]) -> String {
        let img = RgbImage::from_pixel(2, 2, image::Rgb(rgb));
        STANDARD.encode(codec::encode_png(&img).unwrap())
    }

    fn record(name: &str, rgb: [u8; 3]) -> PersonRecord {
        PersonRecord::new(name, image_b64(rgb))
    }

    fn engine(store: FixedStore) -> MatchEngine {
        MatchEngine::new(
            Arc::new(store),
            Arc::new(PixelEmbedder),
            Arc::new(DistanceComparator::default()),
            MatchBudget::default(),
        )
    }

    const RED: [u8; 3] = [255, 0, 0];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [0, 0, 255];
    const BLACK: [u8; 3] = [0, 0, 0];

    #[tokio::test]
    async fn test_no_accepting_reference_is_unknown() {
        let engine = engine(FixedStore::new(vec![
            record("alice", GREEN),
            record("bob", BLUE),
        ]));
        let outcome = engine.identify(&image_b64(RED)).await.unwrap();
        assert!(outcome.is_unknown());
    }

    #[tokio::test]
    async fn test_empty_store_is_unknown() {
        let engine = engine(FixedStore::new(vec![]));
        let outcome = engine.identify(&image_b64(RED)).await.unwrap();
        assert!(outcome.is_unknown());
    }

    #[tokio::test]
    async fn test_single_accepting_reference_wins_regardless_of_position() {
        for position in 0..3 {
            let mut records = vec![record("decoy-a", GREEN), record("decoy-b", BLUE)];
            records.insert(position, record("carol", RED));
            let engine = engine(FixedStore::new(records));
            let outcome = engine.identify(&image_b64(RED)).await.unwrap();
            assert_eq!(outcome.name, "carol", "position {position}");
        }
    }

    #[tokio::test]
    async fn test_first_accepting_reference_wins_per_store_order() {
        let forward = engine(FixedStore::new(vec![
            record("alice", RED),
            record("bob", RED),
        ]));
        assert_eq!(forward.identify(&image_b64(RED)).await.unwrap().name, "alice");

        let reversed = engine(FixedStore::new(vec![
            record("bob", RED),
            record("alice", RED),
        ]));
        assert_eq!(reversed.identify(&image_b64(RED)).await.unwrap().name, "bob");
    }

    #[tokio::test]
    async fn test_probe_without_face_fails() {
        let engine = engine(FixedStore::new(vec![record("alice", RED)]));
        let err = engine.identify(&image_b64(BLACK)).await.unwrap_err();
        assert!(matches!(err, MatchError::NoFaceDetected));
    }

    #[tokio::test]
    async fn test_faceless_reference_fails_whole_attempt() {
        // Probe and the other reference are perfectly valid.
        let engine = engine(FixedStore::new(vec![
            record("alice", RED),
            record("mannequin", BLACK),
        ]));
        let err = engine.identify(&image_b64(RED)).await.unwrap_err();
        assert!(matches!(err, MatchError::NoFaceDetected));
    }

    #[tokio::test]
    async fn test_undecodable_probe_fails_with_decode_error() {
        let engine = engine(FixedStore::new(vec![record("alice", RED)]));
        let err = engine.identify("!!definitely not base64!!").await.unwrap_err();
        assert!(matches!(err, MatchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_undecodable_reference_fails_with_decode_error() {
        let engine = engine(FixedStore::new(vec![PersonRecord::new(
            "corrupt",
            STANDARD.encode(b"these bytes are no image"),
        )]));
        let err = engine.identify(&image_b64(RED)).await.unwrap_err();
        assert!(matches!(err, MatchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unavailable_store_surfaces_as_store_error() {
        let engine = engine(FixedStore::unavailable());
        let err = engine.identify(&image_b64(RED)).await.unwrap_err();
        assert!(matches!(err, MatchError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_concurrent_matches_do_not_cross_talk() {
        let store = Arc::new(FixedStore::new(vec![
            record("ruby", RED),
            record("grace", GREEN),
        ]));
        let embedder = Arc::new(PixelEmbedder);
        let comparator = Arc::new(DistanceComparator::default());
        let engine = Arc::new(MatchEngine::new(
            store,
            embedder,
            comparator,
            MatchBudget::default(),
        ));

        let red_probe = image_b64(RED);
        let green_probe = image_b64(GREEN);
        let (a, b) = tokio::join!(engine.identify(&red_probe), engine.identify(&green_probe));
        assert_eq!(a.unwrap().name, "ruby");
        assert_eq!(b.unwrap().name, "grace");
    }

    #[tokio::test]
    async fn test_budget_scales_with_record_count() {
        let budget = MatchBudget {
            base: Duration::from_secs(2),
            per_record: Duration::from_millis(250),
        };
        assert_eq!(budget.for_records(0), Duration::from_secs(2));
        assert_eq!(budget.for_records(8), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_slow_embedder_times_out() {
        struct StalledEmbedder;

        #[async_trait]
        impl FaceEmbedder for StalledEmbedder {
            async fn embed(&self, _: &RgbImage) -> Result<Option<Embedding>, EmbedError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }
        }

        let engine = MatchEngine::new(
            Arc::new(FixedStore::new(vec![record("alice", RED)])),
            Arc::new(StalledEmbedder),
            Arc::new(DistanceComparator::default()),
            MatchBudget {
                base: Duration::from_millis(50),
                per_record: Duration::from_millis(10),
            },
        );
        let err = engine.identify(&image_b64(RED)).await.unwrap_err();
        assert!(matches!(err, MatchError::Timeout(_)));
    }
}
