//! facegate-core — The matching core of the face gateway.
//!
//! Holds the domain types, the image codec, the contracts for the two
//! external capabilities (face embedding and comparison) and for the
//! record store, and the match orchestrator that ties them together.

pub mod codec;
pub mod compare;
pub mod embed;
pub mod matcher;
pub mod store;
pub mod types;

pub use compare::{DistanceComparator, FaceComparator};
pub use embed::FaceEmbedder;
pub use matcher::{MatchBudget, MatchEngine, MatchError};
pub use store::PersonStore;
pub use types::{Embedding, MatchOutcome, PersonPatch, PersonRecord};
