use crate::types::Embedding;
use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding service unavailable: {0}")]
    Unavailable(String),
    #[error("embedding service returned a malformed response: {0}")]
    Malformed(String),
    #[error("could not stage image for embedding: {0}")]
    Staging(String),
}

/// The face-embedding capability.
///
/// Implementations run a pretrained model somewhere (a sidecar
/// service in production, a fake in tests); this crate only consumes
/// the contract: zero or one embedding per image. When the image
/// contains several faces only the first detected one is reported;
/// `Ok(None)` is the no-face signal.
#[async_trait]
pub trait FaceEmbedder: Send + Sync {
    async fn embed(&self, image: &RgbImage) -> Result<Option<Embedding>, EmbedError>;
}
