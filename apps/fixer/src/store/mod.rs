//! Document store, the only shared mutable resource of a run.
//!
//! Documents are JSON objects addressed by `(collection, key)`. Pipelines only
//! see `dyn DocumentStore`; `PgDocumentStore` backs real runs and `MemoryStore`
//! backs `--nodb` runs without a database and the tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod content;
pub mod memory;
pub mod postgres;

pub use content::{content_id, upsert_if_absent, UpsertOutcome};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

pub const TRIVIA_COLLECTION: &str = "trivia";
pub const FEEDBACK_COLLECTION: &str = "trivia_feedback";
pub const BANTER_COLLECTION: &str = "banter";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document {collection}/{key} not found")]
    NotFound { collection: String, key: String },

    #[error("Document {collection}/{key} is not a JSON object")]
    NotAnObject { collection: String, key: String },

    #[error("Failed to decode document {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A stored document with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|source| StoreError::Decode {
            key: self.key.clone(),
            source,
        })
    }
}

/// Result of an atomic create-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, collection: &str, key: &str) -> Result<bool, StoreError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Writes `fields` at `key` unless a document is already there. Never overwrites.
    async fn create(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<CreateOutcome, StoreError>;

    /// Adds a document under a freshly generated key and returns that key.
    async fn add(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<String, StoreError>;

    /// Partial update of an existing document: top-level fields in `partial`
    /// replace their counterparts, everything else is kept.
    async fn update(
        &self,
        collection: &str,
        key: &str,
        partial: &Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Like `update`, but creates the document when it does not exist.
    async fn merge(
        &self,
        collection: &str,
        key: &str,
        partial: &Map<String, Value>,
    ) -> Result<(), StoreError>;

    fn stream_all<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxStream<'a, Result<Document, StoreError>>;

    /// Documents whose `proofed` and `to_review` flags are both unset or false.
    fn stream_unreviewed<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxStream<'a, Result<Document, StoreError>>;
}

/// Shared predicate for backends that filter in process.
pub(crate) fn is_unreviewed(data: &Value) -> bool {
    let flag = |name: &str| data.get(name).and_then(Value::as_bool).unwrap_or(false);
    !flag("proofed") && !flag("to_review")
}

/// Builds a field map from `json!({...})` literals.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
