use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{is_unreviewed, CreateOutcome, Document, DocumentStore, StoreError};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// Process-local store. Streams iterate over a snapshot taken when the stream
/// is created, so callers may write while scanning.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        // A poisoned map is still structurally valid.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, data)| Document {
                        key: key.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn merge_into(target: &mut Value, partial: &Map<String, Value>) {
    if let Value::Object(existing) = target {
        for (k, v) in partial {
            existing.insert(k.clone(), v.clone());
        }
    } else {
        *target = Value::Object(partial.clone());
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn exists(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .is_some_and(|docs| docs.contains_key(key)))
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|data| Document {
                key: key.to_string(),
                data: data.clone(),
            }))
    }

    async fn create(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<CreateOutcome, StoreError> {
        let mut collections = self.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        docs.insert(key.to_string(), Value::Object(fields.clone()));
        Ok(CreateOutcome::Created)
    }

    async fn add(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        let key = Uuid::new_v4().to_string();
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .insert(key.clone(), Value::Object(fields.clone()));
        Ok(key)
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        partial: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            })?;
        merge_into(doc, partial);
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        partial: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge_into(doc, partial);
        Ok(())
    }

    fn stream_all<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxStream<'a, Result<Document, StoreError>> {
        stream::iter(self.snapshot(collection).into_iter().map(Ok)).boxed()
    }

    fn stream_unreviewed<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxStream<'a, Result<Document, StoreError>> {
        let docs = self
            .snapshot(collection)
            .into_iter()
            .filter(|doc| is_unreviewed(&doc.data))
            .map(Ok);
        stream::iter(docs).boxed()
    }
}
