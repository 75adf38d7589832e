use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CreateOutcome, Document, DocumentStore, StoreError};

/// PostgreSQL backend: every collection lives in the `documents` table as JSONB.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_document((key, data): (String, Value)) -> Document {
    Document { key, data }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn exists(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND key = $2)",
        )
        .bind(collection)
        .bind(key)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, (String, Value)>(
            "SELECT key, data FROM documents WHERE collection = $1 AND key = $2",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(to_document))
    }

    async fn create(
        &self,
        collection: &str,
        key: &str,
        fields: &Map<String, Value>,
    ) -> Result<CreateOutcome, StoreError> {
        // ON CONFLICT makes the create itself atomic across concurrent writers.
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, key, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 1 {
            CreateOutcome::Created
        } else {
            CreateOutcome::AlreadyExists
        })
    }

    async fn add(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        let key = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO documents (collection, key, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&key)
            .bind(Json(fields))
            .execute(&self.pool)
            .await?;
        Ok(key)
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        partial: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = now()
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(Json(partial))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        partial: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(Json(partial))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn stream_all<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxStream<'a, Result<Document, StoreError>> {
        sqlx::query_as::<_, (String, Value)>(
            "SELECT key, data FROM documents WHERE collection = $1 ORDER BY key",
        )
        .bind(collection)
        .fetch(&self.pool)
        .map(|row| row.map(to_document).map_err(StoreError::from))
        .boxed()
    }

    fn stream_unreviewed<'a>(
        &'a self,
        collection: &'a str,
    ) -> BoxStream<'a, Result<Document, StoreError>> {
        sqlx::query_as::<_, (String, Value)>(
            r#"
            SELECT key, data FROM documents
            WHERE collection = $1
              AND NOT (data @> '{"proofed": true}')
              AND NOT (data @> '{"to_review": true}')
            ORDER BY key
            "#,
        )
        .bind(collection)
        .fetch(&self.pool)
        .map(|row| row.map(to_document).map_err(StoreError::from))
        .boxed()
    }
}
