// ABOUTME: SQLite-backed document store for development and tests
// ABOUTME: Persists schemaless JSON documents keyed by collection and id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! SQLite document store backend
//!
//! Documents are rows of `(collection, doc_id, data)` with the body stored
//! as JSON text. Field-level updates run read-modify-write inside a
//! transaction, which makes each per-document update atomic; the store is
//! the sole arbiter of write ordering for a given key.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use super::{Document, DocumentStore, DocumentUpdate};
use crate::errors::{AppError, AppResult};

/// SQLite-backed [`DocumentStore`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `url` and ensures the schema exists
    ///
    /// In-memory databases get a single-connection pool so every operation
    /// sees the same database.
    ///
    /// # Errors
    /// Returns an error if the connection or migration fails
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
            .create_if_missing(true);

        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to store: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_id     TEXT NOT NULL,
                data       TEXT NOT NULL,
                PRIMARY KEY (collection, doc_id)
            )
            ",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to migrate store schema: {e}")))?;

        debug!("document store ready at {url}");
        Ok(Self { pool })
    }

    fn decode(collection: &str, id: &str, raw: &str) -> AppResult<JsonValue> {
        serde_json::from_str(raw).map_err(|e| {
            AppError::database(format!("Corrupt document {collection}/{id}: {e}"))
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<JsonValue>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read document: {e}")))?;

        match row {
            Some(row) => {
                let raw: String = row
                    .try_get("data")
                    .map_err(|e| AppError::database(format!("Failed to decode row: {e}")))?;
                Ok(Some(Self::decode(collection, id, &raw)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, collection: &str, id: &str, doc: &JsonValue) -> AppResult<()> {
        let raw = serde_json::to_string(doc)
            .map_err(|e| AppError::database(format!("Failed to encode document: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO documents (collection, doc_id, data) VALUES ($1, $2, $3)
            ON CONFLICT (collection, doc_id) DO UPDATE SET data = excluded.data
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to write document: {e}")))?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, update: &DocumentUpdate) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to read document: {e}")))?;

        let Some(row) = row else {
            return Err(AppError::not_found(
                "Document not found",
                format!("No document {id} in {collection}"),
            ));
        };

        let raw: String = row
            .try_get("data")
            .map_err(|e| AppError::database(format!("Failed to decode row: {e}")))?;
        let mut doc = Self::decode(collection, id, &raw)?;
        update.apply(&mut doc);

        let encoded = serde_json::to_string(&doc)
            .map_err(|e| AppError::database(format!("Failed to encode document: {e}")))?;

        sqlx::query("UPDATE documents SET data = $3 WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .bind(encoded)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to write document: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit update: {e}")))?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc_id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete document: {e}")))?;
        Ok(())
    }

    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> AppResult<Vec<Document>> {
        let all = self.list(collection).await?;
        Ok(all
            .into_iter()
            .filter(|doc| super::value_at(&doc.data, field) == Some(value))
            .collect())
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT doc_id, data FROM documents WHERE collection = $1 ORDER BY doc_id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list documents: {e}")))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row
                .try_get("doc_id")
                .map_err(|e| AppError::database(format!("Failed to decode row: {e}")))?;
            let raw: String = row
                .try_get("data")
                .map_err(|e| AppError::database(format!("Failed to decode row: {e}")))?;
            let data = Self::decode(collection, &id, &raw)?;
            documents.push(Document { id, data });
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = memory_store().await;
        store
            .put("farms", "farm-1", &json!({ "name": "North Field" }))
            .await
            .unwrap();
        let doc = store.get("farms", "farm-1").await.unwrap().unwrap();
        assert_eq!(doc["name"], json!("North Field"));
        assert!(store.get("farms", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sequential_increments_accumulate() {
        let store = memory_store().await;
        store
            .put("cropPlans", "p1", &json!({ "costs": { "seeds": 0.0 } }))
            .await
            .unwrap();

        store
            .update(
                "cropPlans",
                "p1",
                &DocumentUpdate::new().increment("costs.seeds", 10.0),
            )
            .await
            .unwrap();
        store
            .update(
                "cropPlans",
                "p1",
                &DocumentUpdate::new().increment("costs.seeds", 5.0),
            )
            .await
            .unwrap();

        let doc = store.get("cropPlans", "p1").await.unwrap().unwrap();
        assert_eq!(doc["costs"]["seeds"], json!(15.0));
    }

    #[tokio::test]
    async fn update_of_missing_document_fails() {
        let store = memory_store().await;
        let err = store
            .update("cropPlans", "ghost", &DocumentUpdate::new().set("a", json!(1)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn find_eq_matches_nested_fields() {
        let store = memory_store().await;
        store
            .put("cropPlans", "a", &json!({ "farmId": "f1", "area": 2 }))
            .await
            .unwrap();
        store
            .put("cropPlans", "b", &json!({ "farmId": "f2", "area": 3 }))
            .await
            .unwrap();

        let hits = store
            .find_eq("cropPlans", "farmId", &json!("f1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }
}
