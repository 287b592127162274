//! facegate-remote — HTTP clients for the gateway's two external
//! collaborators: the hosted document store holding person records,
//! and the face-embedding sidecar service.

pub mod docstore;
pub mod embed;

pub use docstore::DocStoreClient;
pub use embed::RemoteEmbedder;
