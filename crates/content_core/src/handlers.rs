//! Request handlers, independent of the HTTP layer. Each one makes at most a
//! single facade call and absorbs store failures according to its
//! [`FallbackPolicy`](crate::fallback::FallbackPolicy).

use crate::error::ApiError;
use crate::facade::{self, Document, DocumentStore, Filter};
use crate::fallback::{self, DEGRADED_LEAD_NOTE, DEMO_LEAD_ID};
use crate::schema::{BlogDetail, BlogPost, BlogSummary, Collection, Lead, LeadAck, Testimonial};
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const DEFAULT_TESTIMONIAL_LIMIT: u32 = 12;
pub const DEFAULT_BLOG_LIMIT: u32 = 15;

/// Outcome of a lead submission. Both variants are reported to the caller as
/// accepted; only `Persisted` means the lead was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadReceipt {
    Persisted { id: String },
    AcceptedDegraded { note: String },
}

impl From<LeadReceipt> for LeadAck {
    fn from(receipt: LeadReceipt) -> Self {
        match receipt {
            LeadReceipt::Persisted { id } => Self {
                ok: true,
                id,
                note: None,
            },
            LeadReceipt::AcceptedDegraded { note } => Self {
                ok: true,
                id: DEMO_LEAD_ID.to_string(),
                note: Some(note),
            },
        }
    }
}

pub fn banner() -> Value {
    json!({
        "message": "Hello from the content API!",
        "service": "SpellsToGetMyExBack API",
    })
}

pub fn hello() -> Value {
    json!({ "message": "Hello from the backend API!" })
}

/// Records are returned as stored, minus the internal identifier.
pub fn list_testimonials(store: &dyn DocumentStore, featured: bool, limit: u32) -> Vec<Document> {
    let filter = if featured {
        facade::filter([("featured", Value::Bool(true))])
    } else {
        Filter::new()
    };

    match store.get_documents(Testimonial::NAME, &filter, limit) {
        Ok(docs) => docs.into_iter().map(facade::strip_id).collect(),
        Err(e) => {
            warn!("testimonials unavailable, serving sample: {e}");
            fallback::TESTIMONIALS.resolve(None).unwrap_or_default()
        }
    }
}

pub fn list_blog(store: &dyn DocumentStore, limit: u32) -> Vec<BlogSummary> {
    let filter = facade::filter([("published", Value::Bool(true))]);

    match store.get_documents(BlogPost::NAME, &filter, limit) {
        Ok(docs) => docs.iter().map(blog_summary).collect(),
        Err(e) => {
            warn!("blog list unavailable, serving sample: {e}");
            fallback::BLOG_LIST.resolve(None).unwrap_or_default()
        }
    }
}

pub fn get_blog(store: &dyn DocumentStore, slug: &str) -> Result<BlogDetail, ApiError> {
    let filter = facade::filter([
        ("slug", Value::String(slug.to_string())),
        ("published", Value::Bool(true)),
    ]);

    match store.get_documents(BlogPost::NAME, &filter, 1) {
        Ok(docs) => docs
            .first()
            .map(blog_detail)
            .ok_or_else(ApiError::post_not_found),
        Err(e) => {
            warn!("blog post `{slug}` unavailable: {e}");
            fallback::BLOG_DETAIL
                .resolve(Some(slug))
                .ok_or_else(ApiError::post_not_found)
        }
    }
}

/// `lead` must already be validated.
pub fn create_lead(store: &dyn DocumentStore, lead: &Lead) -> LeadReceipt {
    let stored = facade::to_document(lead)
        .and_then(|record| store.create_document(Lead::NAME, record));

    match stored {
        Ok(id) => {
            debug!("lead `{id}` stored");
            LeadReceipt::Persisted { id }
        }
        Err(e) => {
            warn!("lead not persisted, acknowledging anyway: {e}");
            LeadReceipt::AcceptedDegraded {
                note: DEGRADED_LEAD_NOTE.to_string(),
            }
        }
    }
}

fn text(doc: &Document, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Missing fields are backfilled rather than rejected.
fn blog_summary(doc: &Document) -> BlogSummary {
    BlogSummary {
        title: text(doc, "title").unwrap_or_default(),
        slug: text(doc, "slug").unwrap_or_default(),
        excerpt: text(doc, "excerpt"),
        tags: doc
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        published: doc
            .get("published")
            .and_then(Value::as_bool)
            .unwrap_or(true),
    }
}

fn blog_detail(doc: &Document) -> BlogDetail {
    BlogDetail {
        summary: blog_summary(doc),
        content: text(doc, "content").unwrap_or_default(),
    }
}
