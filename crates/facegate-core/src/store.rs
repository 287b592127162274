use crate::types::{PersonPatch, PersonRecord};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("no record named {0:?}")]
    NotFound(String),
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

/// Read/write access to the hosted person-record collection.
///
/// The match orchestrator only ever reads (`stream_all`); the CRUD
/// endpoints use the rest. Iteration order of `stream_all` is
/// store-defined but stable within one returned snapshot, which is
/// what the first-accepted-wins rule relies on.
#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn stream_all(&self) -> Result<Vec<PersonRecord>, StoreError>;
    async fn get(&self, name: &str) -> Result<PersonRecord, StoreError>;
    async fn put(&self, record: &PersonRecord) -> Result<(), StoreError>;
    /// Merge the patch into an existing record; fields absent from
    /// the patch keep their stored value.
    async fn update(&self, patch: &PersonPatch) -> Result<(), StoreError>;
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}
