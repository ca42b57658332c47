//! Static payloads served while the document store is unavailable, and the
//! per-handler policy deciding when they apply.
//!
//! The list endpoints fall back unconditionally; blog detail only falls back
//! for [`FALLBACK_SLUG`] and reports every other slug as not found.

use crate::facade::Document;
use crate::schema::{BlogDetail, BlogSummary};
use serde_json::json;

/// Slug of the only post that has a static detail fallback.
pub const FALLBACK_SLUG: &str = "ethical-love-work-guide";

/// Identifier reported for a lead that could not be persisted.
pub const DEMO_LEAD_ID: &str = "demo";

pub const DEGRADED_LEAD_NOTE: &str =
    "stored in memory fallback unavailable; DB not configured";

/// What a handler serves when its store call fails.
#[derive(Debug)]
pub enum FallbackPolicy<T> {
    /// Always serve the static payload.
    Static(fn() -> T),
    /// Serve the static payload only when the request key equals `key`.
    ByKey { key: &'static str, build: fn(&str) -> T },
    /// Surface the failure.
    None,
}

impl<T> FallbackPolicy<T> {
    pub fn resolve(&self, requested: Option<&str>) -> Option<T> {
        match self {
            Self::Static(build) => Some(build()),
            Self::ByKey { key, build } => match requested {
                Some(requested) if requested == *key => Some(build(requested)),
                _ => None,
            },
            Self::None => None,
        }
    }
}

pub const TESTIMONIALS: FallbackPolicy<Vec<Document>> = FallbackPolicy::Static(sample_testimonials);
pub const BLOG_LIST: FallbackPolicy<Vec<BlogSummary>> = FallbackPolicy::Static(sample_blog_list);
pub const BLOG_DETAIL: FallbackPolicy<BlogDetail> = FallbackPolicy::ByKey {
    key: FALLBACK_SLUG,
    build: sample_blog_detail,
};

pub fn sample_testimonials() -> Vec<Document> {
    let sample = json!({
        "name": "Sasha",
        "location": "Austin, TX",
        "message": "In my darkest hour, guidance helped me find peace and reunite with my partner.",
        "rating": 5,
        "service": "get-your-ex-back-spell",
        "featured": true,
    });
    sample.as_object().cloned().into_iter().collect()
}

pub fn sample_blog_list() -> Vec<BlogSummary> {
    vec![BlogSummary {
        title: "Understanding Ethical Love Work: A Practical Guide".to_string(),
        slug: FALLBACK_SLUG.to_string(),
        excerpt: Some(
            "How to approach reconciliation with compassion, clarity, and respect for free will."
                .to_string(),
        ),
        tags: vec!["ethics".into(), "love".into(), "guides".into()],
        published: true,
    }]
}

/// Echoes `slug` back rather than the constant.
pub fn sample_blog_detail(slug: &str) -> BlogDetail {
    BlogDetail {
        summary: BlogSummary {
            title: "Understanding Ethical Love Work: A Practical Guide".to_string(),
            slug: slug.to_string(),
            excerpt: Some("How to approach reconciliation with compassion and respect.".to_string()),
            tags: vec!["ethics".into(), "love".into()],
            published: true,
        },
        content: "I have helped many over the years navigate matters of the heart with dignity..."
            .to_string(),
    }
}
