use serde::{Deserialize, Serialize};

/// Name returned when no reference accepts the probe.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Face embedding vector (dimensionality is fixed by the embedding
/// capability; typically 128 or 512).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Compute Euclidean distance between two embeddings.
    ///
    /// Lower = more similar. Vectors of unequal length are compared
    /// over their common prefix, which the capability contract never
    /// produces in practice.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// A person record as stored in the remote document store.
///
/// Keyed by `name`. The stored face image travels base64-encoded under
/// the wire field `base64`; any additional fields the caller supplied
/// at registration time are preserved untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    #[serde(rename = "base64")]
    pub image_base64: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PersonRecord {
    pub fn new(name: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_base64: image_base64.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Partial update for a person record.
///
/// Merged into the stored document field by field; fields absent from
/// the patch keep their stored value, so a caller can update the
/// free-form fields without resending the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPatch {
    pub name: String,
    #[serde(rename = "base64", skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of matching a probe image against the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Name of the first accepting reference, or [`UNKNOWN_NAME`].
    pub name: String,
}

impl MatchOutcome {
    pub fn matched(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_NAME.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAME
    }
}
