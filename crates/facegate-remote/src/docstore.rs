//! Client for the hosted document store.
//!
//! The store is a plain collection/document REST API:
//! `GET    {base}/{collection}`          — all documents
//! `GET    {base}/{collection}/{name}`   — one document
//! `PUT    {base}/{collection}/{name}`   — create/replace
//! `PATCH  {base}/{collection}/{name}`   — merge fields
//! `DELETE {base}/{collection}/{name}`   — remove

use async_trait::async_trait;
use facegate_core::store::{PersonStore, StoreError};
use facegate_core::types::{PersonPatch, PersonRecord};
use reqwest::{Client, RequestBuilder, StatusCode};
use url::Url;

#[derive(Clone)]
pub struct DocStoreClient {
    http: Client,
    base_url: Url,
    collection: String,
    token: Option<String>,
}

impl DocStoreClient {
    pub fn new(http: Client, base_url: Url, collection: String, token: Option<String>) -> Self {
        Self {
            http,
            base_url,
            collection,
            token,
        }
    }

    fn collection_url(&self) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Rejected(format!("store URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(&self.collection);
        Ok(url)
    }

    fn document_url(&self, name: &str) -> Result<Url, StoreError> {
        let mut url = self.collection_url()?;
        // push() percent-encodes, so record names with spaces or
        // slashes stay a single path segment.
        url.path_segments_mut()
            .map_err(|_| StoreError::Rejected(format!("store URL {} cannot take a path", self.base_url)))?
            .push(name);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `resource` is the record name a 404 should be attributed to;
    /// collection-level requests pass `None` and a 404 there is a
    /// store misconfiguration, not a missing record.
    async fn send(
        &self,
        request: RequestBuilder,
        resource: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND if resource.is_some() => {
                let name = resource.unwrap_or_default().to_string();
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(name, body, "document not found");
                Err(StoreError::NotFound(name))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, body, "document store rejected request");
                Err(StoreError::Rejected(format!("{status}: {body}")))
            }
        }
    }
}

#[async_trait]
impl PersonStore for DocStoreClient {
    async fn stream_all(&self) -> Result<Vec<PersonRecord>, StoreError> {
        let url = self.collection_url()?;
        let response = self.send(self.http.get(url), None).await?;
        response
            .json::<Vec<PersonRecord>>()
            .await
            .map_err(|e| StoreError::Unavailable(format!("decoding record list: {e}")))
    }

    async fn get(&self, name: &str) -> Result<PersonRecord, StoreError> {
        let url = self.document_url(name)?;
        let response = self.send(self.http.get(url), Some(name)).await?;
        response
            .json::<PersonRecord>()
            .await
            .map_err(|e| StoreError::Unavailable(format!("decoding record {name:?}: {e}")))
    }

    async fn put(&self, record: &PersonRecord) -> Result<(), StoreError> {
        let url = self.document_url(&record.name)?;
        self.send(self.http.put(url).json(record), Some(&record.name))
            .await?;
        Ok(())
    }

    async fn update(&self, patch: &PersonPatch) -> Result<(), StoreError> {
        let url = self.document_url(&patch.name)?;
        // PATCH merges; a patch without an image leaves the stored
        // one untouched (base64 is omitted from the body entirely).
        self.send(self.http.patch(url).json(patch), Some(&patch.name))
            .await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let url = self.document_url(name)?;
        self.send(self.http.delete(url), Some(name)).await?;
        Ok(())
    }
}
