//! # Document Store
//!
//! Collections of JSON documents addressed by `_id`, queried with composed
//! find clauses and aggregation pipelines.
//!
//! The HTTP layer only ever talks to [`DocumentStore`]; [`MemoryStore`] is
//! the bundled backend.

mod aggregate;
mod errors;
mod filter;
mod id;
mod memory;
mod query;
mod value;

use async_trait::async_trait;
use serde_json::Value;

pub use aggregate::{Accumulator, AccumulatorOp, GroupKey, Stage};
pub use errors::{StoreError, StoreResult};
pub use filter::{Filter, FilterExpr, FilterOperator};
pub use id::{ObjectId, OBJECT_ID_HEX_LEN};
pub use memory::MemoryStore;
pub use query::{sort_documents, FindQuery, Projection, SortDirection, SortKey, ID_FIELD};
pub use value::{compare_values, get_path, Document};

/// Operations every storage backend provides.
///
/// Identifiers are validated by the backend: a malformed `id` is
/// [`StoreError::InvalidId`], an unknown well-formed one is `Ok(None)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a composed find query
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Number of documents matching `filter`
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<usize>;

    /// Validate and insert a new document, returning it as stored
    async fn insert(&self, collection: &str, body: Value) -> StoreResult<Document>;

    /// Merge `patch` into the stored document and revalidate the result
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> StoreResult<Option<Document>>;

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn aggregate(&self, collection: &str, pipeline: &[Stage]) -> StoreResult<Vec<Document>>;
}
