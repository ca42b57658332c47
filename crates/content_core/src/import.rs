use crate::facade::{self, DocumentStore};
use crate::schema::{BlogPost, Collection, Testimonial};
use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Collections that are populated out-of-band rather than through the API.
pub const IMPORTABLE: &[&str] = &[Testimonial::NAME, BlogPost::NAME];

/// Loads a JSON array from `path` into `collection`. See [`import_documents`].
pub fn import_file(store: &dyn DocumentStore, collection: &str, path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array", path.display()))?;
    import_documents(store, collection, items)
}

/// Validates every item against the collection's schema (applying its
/// defaults) and then inserts them. Nothing is written if any item is invalid.
pub fn import_documents(
    store: &dyn DocumentStore,
    collection: &str,
    items: Vec<Value>,
) -> Result<usize> {
    let records = if collection == Testimonial::NAME {
        normalize::<Testimonial>(items)?
    } else if collection == BlogPost::NAME {
        normalize::<BlogPost>(items)?
    } else {
        bail!(
            "collection `{collection}` cannot be imported (expected one of: {})",
            IMPORTABLE.join(", ")
        );
    };

    let count = records.len();
    for record in records {
        store
            .create_document(collection, record)
            .with_context(|| format!("Failed to store document in `{collection}`"))?;
    }
    info!("imported {count} documents into `{collection}`");
    Ok(count)
}

fn normalize<T>(items: Vec<Value>) -> Result<Vec<facade::Document>>
where
    T: DeserializeOwned + Serialize + Validate,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let parsed: T = serde_json::from_value(item)
                .with_context(|| format!("item {index} does not match the schema"))?;
            parsed
                .validate()
                .map_err(|e| anyhow!("item {index} is invalid: {e}"))?;
            Ok(facade::to_document(&parsed)?)
        })
        .collect()
}
