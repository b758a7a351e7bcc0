//! # In-Memory Store
//!
//! Process-local [`DocumentStore`] backend. Documents are kept in insertion
//! order per collection behind a single async `RwLock`; each operation holds
//! the lock for its whole duration, so every operation is atomic with
//! respect to the others.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::aggregate::{self, Stage};
use super::errors::{StoreError, StoreResult};
use super::filter::Filter;
use super::id::ObjectId;
use super::query::{FindQuery, ID_FIELD};
use super::value::Document;
use super::DocumentStore;
use crate::schema::{
    CollectionSchema, FieldViolation, SchemaError, TourSchema, CREATED_AT_FIELD, VERSION_FIELD,
};

struct Collection {
    schema: Arc<dyn CollectionSchema>,
    documents: Vec<Document>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id))
    }

    /// Reject `doc` if it repeats a unique value held by another document
    fn check_unique(&self, doc: &Document, own_id: &str) -> StoreResult<()> {
        for field in self.schema.unique_fields() {
            let Some(value) = doc.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = self.documents.iter().any(|other| {
                other.get(ID_FIELD).and_then(Value::as_str) != Some(own_id)
                    && other.get(*field) == Some(value)
            });
            if taken {
                return Err(SchemaError::Duplicate {
                    field: field.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Store with no collections
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the `tours` collection registered
    pub fn with_tours() -> Self {
        Self::new().with_schema(TourSchema)
    }

    /// Register a collection governed by `schema`
    pub fn with_schema(mut self, schema: impl CollectionSchema + 'static) -> Self {
        let name = schema.collection().to_string();
        self.collections.get_mut().insert(
            name,
            Collection {
                schema: Arc::new(schema),
                documents: Vec::new(),
            },
        );
        self
    }
}

fn unknown(collection: &str) -> StoreError {
    StoreError::UnknownCollection(collection.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>> {
        let guard = self.collections.read().await;
        let coll = guard.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(query.execute(coll.documents.iter()))
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let id = ObjectId::parse(id)?.to_hex();
        let guard = self.collections.read().await;
        let coll = guard.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(coll.position(&id).map(|i| coll.documents[i].clone()))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<usize> {
        let guard = self.collections.read().await;
        let coll = guard.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(coll.documents.iter().filter(|d| filter.matches(d)).count())
    }

    async fn insert(&self, collection: &str, body: Value) -> StoreResult<Document> {
        let mut guard = self.collections.write().await;
        let coll = guard.get_mut(collection).ok_or_else(|| unknown(collection))?;

        let mut doc = coll.schema.prepare_insert(body)?;
        let id = match doc.get(ID_FIELD) {
            Some(Value::String(s)) => ObjectId::parse(s)?.to_hex(),
            Some(other) => return Err(StoreError::InvalidId(other.to_string())),
            None => ObjectId::new().to_hex(),
        };
        if coll.position(&id).is_some() {
            return Err(SchemaError::Duplicate {
                field: ID_FIELD.to_string(),
                value: id,
            }
            .into());
        }
        coll.check_unique(&doc, &id)?;

        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        doc.insert(VERSION_FIELD.to_string(), Value::from(0));
        coll.documents.push(doc.clone());

        debug!(collection, id = %id, "document inserted");
        Ok(doc)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> StoreResult<Option<Document>> {
        let id = ObjectId::parse(id)?.to_hex();
        let Value::Object(patch) = patch else {
            return Err(SchemaError::validation_failed(
                collection,
                vec![FieldViolation::new("$root", "must be a JSON object")],
            )
            .into());
        };

        let mut guard = self.collections.write().await;
        let coll = guard.get_mut(collection).ok_or_else(|| unknown(collection))?;
        let Some(index) = coll.position(&id) else {
            return Ok(None);
        };

        let mut merged = coll.documents[index].clone();
        for (key, value) in patch {
            match key.as_str() {
                ID_FIELD => {
                    if value.as_str() != Some(id.as_str()) {
                        return Err(SchemaError::Immutable(ID_FIELD.to_string()).into());
                    }
                }
                VERSION_FIELD | CREATED_AT_FIELD => {}
                _ => {
                    merged.insert(key, value);
                }
            }
        }

        let doc = coll.schema.prepare_update(merged)?;
        coll.check_unique(&doc, &id)?;
        coll.documents[index] = doc.clone();

        debug!(collection, id = %id, "document updated");
        Ok(Some(doc))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let id = ObjectId::parse(id)?.to_hex();
        let mut guard = self.collections.write().await;
        let coll = guard.get_mut(collection).ok_or_else(|| unknown(collection))?;
        Ok(coll.position(&id).map(|i| coll.documents.remove(i)))
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> StoreResult<Vec<Document>> {
        let documents = {
            let guard = self.collections.read().await;
            let coll = guard.get(collection).ok_or_else(|| unknown(collection))?;
            coll.documents.clone()
        };
        aggregate::run(pipeline, documents)
    }
}
