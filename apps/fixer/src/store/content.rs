//! Content-addressed persistence of trivia records.
//!
//! Identity is the SHA-1 of the corrected question text, so the first write of
//! a given question wins and later writes of the same text are no-ops.

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};
use tracing::info;

use super::{CreateOutcome, DocumentStore, StoreError, TRIVIA_COLLECTION};
use crate::models::trivia::TriviaRecord;

/// 40 hex characters (160 bits) derived from the exact UTF-8 bytes of `question`.
pub fn content_id(question: &str) -> String {
    hex::encode(Sha1::digest(question.as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Duplicate,
}

/// Persists `record` at its content id unless a document is already there.
///
/// The existence check skips the write for known questions; the create itself
/// is create-if-absent, so a writer that loses a race still reports `Duplicate`.
pub async fn upsert_if_absent(
    store: &dyn DocumentStore,
    record: &TriviaRecord,
) -> Result<UpsertOutcome, StoreError> {
    let key = record.content_id.as_str();
    if store.exists(TRIVIA_COLLECTION, key).await? {
        info!("Already found entry with key {}", key);
        return Ok(UpsertOutcome::Duplicate);
    }

    let fields = record_fields(record)?;
    match store.create(TRIVIA_COLLECTION, key, &fields).await? {
        CreateOutcome::Created => {
            info!("Added question {} to the store: '{}'", key, record.question);
            Ok(UpsertOutcome::Inserted)
        }
        CreateOutcome::AlreadyExists => {
            info!("Entry with key {} appeared concurrently, skipping", key);
            Ok(UpsertOutcome::Duplicate)
        }
    }
}

fn record_fields(record: &TriviaRecord) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::NotAnObject {
            collection: TRIVIA_COLLECTION.to_string(),
            key: record.content_id.clone(),
        }),
        Err(source) => Err(StoreError::Decode {
            key: record.content_id.clone(),
            source,
        }),
    }
}
