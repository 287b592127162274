//! Client for the face-embedding sidecar service.
//!
//! The service wraps the pretrained model; this client only consumes
//! its contract: PNG bytes in, zero or more embedding vectors out,
//! first vector = first detected face.

use async_trait::async_trait;
use facegate_core::codec;
use facegate_core::embed::{EmbedError, FaceEmbedder};
use facegate_core::types::Embedding;
use image::RgbImage;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Clone)]
pub struct RemoteEmbedder {
    http: Client,
    embed_url: Url,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    /// One vector per detected face, detector order.
    embeddings: Vec<Vec<f32>>,
}

impl RemoteEmbedder {
    pub fn new(http: Client, embed_url: Url) -> Self {
        Self { http, embed_url }
    }
}

#[async_trait]
impl FaceEmbedder for RemoteEmbedder {
    async fn embed(&self, image: &RgbImage) -> Result<Option<Embedding>, EmbedError> {
        let png = codec::encode_png(image).map_err(|e| EmbedError::Staging(e.to_string()))?;

        let response = self
            .http
            .post(self.embed_url.clone())
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await
            .map_err(|e| EmbedError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Unavailable(format!("{status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Malformed(e.to_string()))?;

        // Zero vectors is the no-face signal; extra vectors beyond
        // the first are ignored per the capability contract.
        let mut embeddings = parsed.embeddings;
        if embeddings.len() > 1 {
            tracing::debug!(faces = embeddings.len(), "multiple faces; using the first");
        }
        Ok(if embeddings.is_empty() {
            None
        } else {
            Some(Embedding::new(embeddings.swap_remove(0)))
        })
    }
}
