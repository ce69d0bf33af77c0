//! Vector storage capability and implementations.
//!
//! The [`VectorStore`] trait abstracts over points-and-collections stores so
//! the orchestrator can run against any backend:
//!
//! ```text
//!                 ┌───────────────────┐
//!                 │  VectorStore      │
//!                 │  (async trait)    │
//!                 └─────────┬─────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!       ┌─────────────┐          ┌──────────────┐
//!       │ QdrantStore │          │ MemoryStore  │
//!       │ (REST)      │          │ (tests/demo) │
//!       └─────────────┘          └──────────────┘
//! ```
//!
//! Stores must tolerate duplicate collection creation: racing ingest calls
//! are not coordinated and the store is the serialization point.

pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::RagError;

pub use memory::MemoryStore;
pub use qdrant::QdrantStore;

/// A named collection of points sharing one vector dimensionality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
}

/// A vector point with its provenance payload, ready for upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointStruct {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// Parameters for a similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Filter::is_empty")]
    pub filter: Filter,
}

/// A search hit: similarity score plus the stored payload, highest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub score: f32,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Conjunctive payload filter in the store's wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub must: Vec<Condition>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    /// Evaluates the filter against a payload object. Used by [`MemoryStore`]
    /// and handy for asserting filter semantics in tests.
    pub fn matches(&self, payload: &serde_json::Value) -> bool {
        self.must.iter().all(|condition| condition.matches(payload))
    }
}

/// One payload condition: exact value or any-of membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(rename = "match")]
    pub matching: MatchCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchCondition {
    /// Matches when the payload field equals (or, for array fields,
    /// contains) any of the values.
    Any { any: Vec<String> },
    /// Matches when the payload field equals (or contains) the value.
    Value { value: String },
}

impl Condition {
    pub fn value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            matching: MatchCondition::Value {
                value: value.into(),
            },
        }
    }

    pub fn any(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            matching: MatchCondition::Any { any: values },
        }
    }

    fn matches(&self, payload: &serde_json::Value) -> bool {
        let Some(field) = payload.get(&self.key) else {
            return false;
        };
        match &self.matching {
            MatchCondition::Value { value } => field_matches(field, value),
            MatchCondition::Any { any } => any.iter().any(|value| field_matches(field, value)),
        }
    }
}

/// String fields match by equality; array fields match by membership.
fn field_matches(field: &serde_json::Value, needle: &str) -> bool {
    match field {
        serde_json::Value::String(value) => value == needle,
        serde_json::Value::Array(items) => {
            items.iter().any(|item| item.as_str() == Some(needle))
        }
        _ => false,
    }
}

/// Capability interface over a vector store.
///
/// All operations are single attempts: no retries, no transactions. A failed
/// call mid-ingestion leaves earlier upserts in place.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Names of all existing collections.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, RagError>;

    /// Creates a collection with the given vector dimensionality. Creating a
    /// collection that already exists is not an error.
    async fn create_collection(&self, name: &str, vector_size: usize) -> Result<(), RagError>;

    /// Inserts or replaces points by id.
    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), RagError>;

    /// Similarity search, highest score first, bounded by `query.limit`.
    async fn search(
        &self,
        collection: &str,
        query: SearchQuery,
    ) -> Result<Vec<ScoredPoint>, RagError>;

    /// Drops a collection and all of its points.
    async fn delete_collection(&self, name: &str) -> Result<(), RagError>;

    /// Deletes every point matching the filter.
    async fn delete_points(&self, collection: &str, filter: &Filter) -> Result<(), RagError>;

    /// Merges `payload` into the payload of every point matching the filter.
    async fn set_payload(
        &self,
        collection: &str,
        payload: serde_json::Value,
        filter: &Filter,
    ) -> Result<(), RagError>;
}
