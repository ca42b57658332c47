//! # Data access facade
//!
//! The boundary between request handlers and whatever document store backs the
//! site. Handlers only see two operations, [`DocumentStore::get_documents`] and
//! [`DocumentStore::create_document`], so the store can be swapped (SQLite,
//! in-memory, an always-failing stub) without touching handler logic.
//!
//! Documents are plain JSON objects. Every document handed back by a store
//! carries the store-internal identifier under [`ID_FIELD`]; callers strip it
//! before anything leaves the process.

use crate::error::StoreError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Name of the store-internal identifier field.
pub const ID_FIELD: &str = "_id";

pub type Document = Map<String, Value>;

/// Equality filter: a document matches when every pair matches. An empty
/// filter matches everything.
pub type Filter = Map<String, Value>;

pub trait DocumentStore: Send + Sync {
    /// Returns up to `limit` documents of `collection` matching `filter`.
    /// Order is store-defined.
    fn get_documents(
        &self,
        collection: &str,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError>;

    /// Persists `record` into `collection` and returns its new identifier.
    fn create_document(&self, collection: &str, record: Document) -> Result<String, StoreError>;
}

/// Read-only view of the process-wide store handle, used for diagnostics.
pub trait StoreInspector: Send + Sync {
    /// `Ok(None)` while the handle exists but was never initialised.
    fn database_name(&self) -> Result<Option<String>, StoreError>;

    fn list_collection_names(&self) -> Result<Vec<String>, StoreError>;
}

pub fn strip_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::MalformedDocument(other.to_string())),
    }
}

/// Builds a filter from `(key, value)` pairs.
pub fn filter<I, K>(pairs: I) -> Filter
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Equality match used by stores that evaluate filters in process. A `null`
/// filter value also matches a missing field.
pub fn matches(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(key, expected)| match doc.get(key) {
        Some(actual) => actual == expected,
        None => expected.is_null(),
    })
}
