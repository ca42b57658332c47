use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use validator::Validate;

/// A content type persisted in its own collection of the document store.
pub trait Collection {
    const NAME: &'static str;
}

fn default_rating() -> i32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_source() -> String {
    "website".to_string()
}

// Optional fields with a default: an explicit `null` takes the default too.

fn rating_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    Ok(Option::deserialize(d)?.unwrap_or_else(default_rating))
}

fn source_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::deserialize(d)?.unwrap_or_else(default_source))
}

/// Client testimonial. Collection: "testimonial".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Testimonial {
    pub name: String,             // client first name or alias
    #[serde(default)]
    pub location: Option<String>, // client city/state
    pub message: String,
    #[serde(default = "default_rating", deserialize_with = "rating_or_default")]
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,              // star rating 1-5
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub featured: bool,           // highlighted on the homepage
}

impl Collection for Testimonial {
    const NAME: &'static str = "testimonial";
}

/// Long-form educational content. Collection: "blogpost".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct BlogPost {
    pub title: String,
    pub slug: String, // external lookup key, expected unique per collection
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schemars(with = "Option<String>")]
    pub published_at: Option<OffsetDateTime>,
}

impl Collection for BlogPost {
    const NAME: &'static str = "blogpost";
}

/// Contact or consultation request. Collection: "lead".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Lead {
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_source", deserialize_with = "source_or_default")]
    pub source: String, // where the lead came from
    #[serde(default)]
    pub service_interest: Option<String>,
}

impl Collection for Lead {
    const NAME: &'static str = "lead";
}

// Generic reference shapes. Nothing in the API reads or writes them; they are
// exported alongside the content schemas.

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct User {
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Collection for User {
    const NAME: &'static str = "user";
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Product {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

impl Collection for Product {
    const NAME: &'static str = "product";
}

/// Public listing shape of a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlogSummary {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
}

/// Public detail shape of a blog post: the summary plus the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlogDetail {
    #[serde(flatten)]
    pub summary: BlogSummary,
    pub content: String,
}

/// Acknowledgement returned for every accepted lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LeadAck {
    pub ok: bool,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
