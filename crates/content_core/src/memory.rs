use crate::error::StoreError;
use crate::facade::{self, Document, DocumentStore, Filter, ID_FIELD};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// In-process document store. Documents are kept in insertion order per
/// collection and vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }
}

impl DocumentStore for MemoryDocuments {
    fn get_documents(
        &self,
        collection: &str,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|doc| facade::matches(doc, filter))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn create_document(&self, collection: &str, mut record: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        record.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut collections = self.collections.lock().map_err(|_| StoreError::Poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
        Ok(id)
    }
}

/// Store that refuses every call, standing in for an unreachable database.
#[derive(Debug, Clone)]
pub struct UnavailableDocuments {
    reason: String,
}

impl UnavailableDocuments {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableDocuments {
    fn default() -> Self {
        Self::new("connection refused")
    }
}

impl DocumentStore for UnavailableDocuments {
    fn get_documents(&self, _: &str, _: &Filter, _: u32) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    fn create_document(&self, _: &str, _: Document) -> Result<String, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}
