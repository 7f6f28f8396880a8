// ABOUTME: Document store abstraction over schemaless JSON documents
// ABOUTME: Defines the provider trait, field-level update semantics, and backend factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Document store
//!
//! Domain records live in an external managed document store as schemaless
//! JSON documents keyed by (collection, id). This module defines the
//! provider trait the rest of the crate programs against, plus the
//! field-level update operations the store must honor: path-wise set,
//! **additive** numeric increment, and array union. Increments are merges
//! against the stored document, never whole-document overwrites, so
//! concurrent partial updates from different workflow stages compose.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use crate::errors::AppResult;

/// A stored document with its key
#[derive(Debug, Clone)]
pub struct Document {
    /// Document id within its collection
    pub id: String,
    /// Document body
    pub data: JsonValue,
}

/// A field-level update applied atomically to one document
///
/// Paths are dotted (`costs.seeds`); intermediate objects are created as
/// needed. Application order is sets, then increments, then array unions.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    sets: Vec<(String, JsonValue)>,
    increments: Vec<(String, f64)>,
    array_unions: Vec<(String, JsonValue)>,
}

impl DocumentUpdate {
    /// Empty update
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the update carries no operations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.increments.is_empty() && self.array_unions.is_empty()
    }

    /// Sets the value at `path`, replacing any existing value
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: JsonValue) -> Self {
        self.sets.push((path.into(), value));
        self
    }

    /// Adds `amount` to the number at `path`; missing fields start at zero
    #[must_use]
    pub fn increment(mut self, path: impl Into<String>, amount: f64) -> Self {
        self.increments.push((path.into(), amount));
        self
    }

    /// Appends `value` to the array at `path` unless already present
    #[must_use]
    pub fn array_union(mut self, path: impl Into<String>, value: JsonValue) -> Self {
        self.array_unions.push((path.into(), value));
        self
    }

    /// Applies the update to a document body in place
    pub fn apply(&self, doc: &mut JsonValue) {
        for (path, value) in &self.sets {
            *slot_at(doc, path) = value.clone();
        }
        for (path, amount) in &self.increments {
            let slot = slot_at(doc, path);
            let current = slot.as_f64().unwrap_or(0.0);
            *slot = JsonValue::from(current + amount);
        }
        for (path, value) in &self.array_unions {
            let slot = slot_at(doc, path);
            if !slot.is_array() {
                *slot = JsonValue::Array(Vec::new());
            }
            if let Some(items) = slot.as_array_mut() {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
        }
    }
}

/// Resolves a dotted path to a mutable slot, creating intermediate objects
fn slot_at<'a>(doc: &'a mut JsonValue, path: &str) -> &'a mut JsonValue {
    let mut current = doc;
    for segment in path.split('.') {
        if !current.is_object() {
            *current = JsonValue::Object(Map::new());
        }
        let map = match current {
            JsonValue::Object(map) => map,
            // current was just made an object
            _ => unreachable!(),
        };
        current = map.entry(segment.to_owned()).or_insert(JsonValue::Null);
    }
    current
}

/// Reads the value at a dotted path, if present
#[must_use]
pub fn value_at<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Provider trait for the external document store
///
/// Implementations own write ordering and conflict resolution for a given
/// document key; callers see atomic per-document operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches one document, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<JsonValue>>;

    /// Creates or replaces one document
    async fn put(&self, collection: &str, id: &str, doc: &JsonValue) -> AppResult<()>;

    /// Applies a field-level update to an existing document
    ///
    /// # Errors
    /// Fails with a not-found error when the document does not exist.
    async fn update(&self, collection: &str, id: &str, update: &DocumentUpdate) -> AppResult<()>;

    /// Deletes one document; deleting an absent document is not an error
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;

    /// All documents in a collection whose value at `field` equals `value`
    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &JsonValue,
    ) -> AppResult<Vec<Document>>;

    /// All documents in a collection
    async fn list(&self, collection: &str) -> AppResult<Vec<Document>>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn increments_are_additive_against_stored_values() {
        let mut doc = json!({ "costs": { "seeds": 10.0, "total": 0.0 } });
        DocumentUpdate::new()
            .increment("costs.seeds", 5.0)
            .apply(&mut doc);
        assert_eq!(doc["costs"]["seeds"], json!(15.0));
    }

    #[test]
    fn increment_of_missing_field_starts_at_zero() {
        let mut doc = json!({});
        DocumentUpdate::new()
            .increment("costs.labor", 7.5)
            .apply(&mut doc);
        assert_eq!(doc["costs"]["labor"], json!(7.5));
    }

    #[test]
    fn set_replaces_only_the_addressed_path() {
        let mut doc = json!({ "progress": { "planted": false, "irrigated": true } });
        DocumentUpdate::new()
            .set("progress.planted", json!(true))
            .apply(&mut doc);
        assert_eq!(doc["progress"]["planted"], json!(true));
        assert_eq!(doc["progress"]["irrigated"], json!(true));
    }

    #[test]
    fn array_union_deduplicates() {
        let mut doc = json!({ "cropPlans": ["plan-1"] });
        let update = DocumentUpdate::new()
            .array_union("cropPlans", json!("plan-2"))
            .array_union("cropPlans", json!("plan-1"));
        update.apply(&mut doc);
        assert_eq!(doc["cropPlans"], json!(["plan-1", "plan-2"]));
    }

    #[test]
    fn value_at_resolves_nested_paths() {
        let doc = json!({ "yields": { "actual": 12.0 } });
        assert_eq!(value_at(&doc, "yields.actual"), Some(&json!(12.0)));
        assert_eq!(value_at(&doc, "yields.missing"), None);
    }
}
