//! HTTP surface of the content API.

use crate::config::ServerConfig;
use crate::diagnostics::{self, ConnectivityReport, EnvPresence};
use crate::error::{ApiError, FieldError};
use crate::facade::{Document, DocumentStore, StoreInspector};
use crate::handlers::{self, DEFAULT_BLOG_LIMIT, DEFAULT_TESTIMONIAL_LIMIT};
use crate::schema::{BlogDetail, BlogSummary, Lead, LeadAck};
use anyhow::Context;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router, async_trait};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use serde_path_to_error::Segment;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use validator::Validate;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Absent when the process runs without a database handle.
    pub inspector: Option<Arc<dyn StoreInspector>>,
    pub env: EnvPresence,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            inspector: None,
            env: EnvPresence::default(),
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn StoreInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn with_env(mut self, env: EnvPresence) -> Self {
        self.env = env;
        self
    }

    /// State backed by the SQLite store described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let sqlite = Arc::new(config.store());
        let store: Arc<dyn DocumentStore> = sqlite.clone();
        let inspector: Arc<dyn StoreInspector> = sqlite;
        Self::new(store)
            .with_inspector(inspector)
            .with_env(config.env_presence())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/hello", get(hello))
        .route("/api/testimonials", get(list_testimonials))
        .route("/api/blog", get(list_blog))
        .route("/api/blog/:slug", get(get_blog))
        .route("/api/leads", post(create_lead))
        .route("/test", get(test_database))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves the router until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")
}

/// JSON body that deserialized into `T` and passed its `validator` checks.
/// Every failure is reported as a list of [`FieldError`]s.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<Value>::from_request(req, state).await.map_err(|e| {
            ApiError::InvalidRequest(vec![FieldError::new(
                vec![json!("body")],
                e.body_text(),
                "value_error.jsondecode",
            )])
        })?;
        let value: T = serde_path_to_error::deserialize(raw).map_err(body_error)?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn body_error(err: serde_path_to_error::Error<serde_json::Error>) -> ApiError {
    let mut loc = vec![json!("body")];
    loc.extend(err.path().iter().filter_map(|segment| match segment {
        Segment::Map { key } => Some(json!(key)),
        Segment::Seq { index } => Some(json!(index)),
        Segment::Enum { variant } => Some(json!(variant)),
        Segment::Unknown => None,
    }));

    let message = err.into_inner().to_string();
    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());
    let error = match missing {
        Some(field) => {
            loc.push(json!(field));
            FieldError::new(loc, "field required", "value_error.missing")
        }
        None => FieldError::new(loc, message, "type_error"),
    };
    ApiError::InvalidRequest(vec![error])
}

/// Raw query parameters, parsed one field at a time so each bad value is
/// reported under its own name.
struct QueryParams {
    raw: HashMap<String, String>,
    errors: Vec<FieldError>,
}

impl QueryParams {
    async fn extract<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Query(raw) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::InvalidRequest(vec![FieldError::new(
                    vec![json!("query")],
                    e.body_text(),
                    "value_error",
                )])
            })?;
        Ok(Self {
            raw,
            errors: Vec::new(),
        })
    }

    fn parse<T>(
        &mut self,
        name: &str,
        default: T,
        parse: fn(&str) -> Option<T>,
        msg: &str,
        kind: &str,
    ) -> T {
        let Some(raw) = self.raw.get(name) else {
            return default;
        };
        parse(raw).unwrap_or_else(|| {
            self.errors.push(FieldError::query(name, msg, kind));
            default
        })
    }

    fn limit(&mut self, default: u32) -> u32 {
        self.parse(
            "limit",
            default,
            |raw| raw.trim().parse().ok(),
            "value is not a valid non-negative integer",
            "type_error.integer",
        )
    }

    fn flag(&mut self, name: &str) -> bool {
        self.parse(
            name,
            false,
            parse_flag,
            "value could not be parsed to a boolean",
            "type_error.bool",
        )
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::InvalidRequest(self.errors))
        }
    }
}

/// Accepts the usual form spellings of a boolean, ignoring case.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "t" | "true" | "y" | "yes" => Some(true),
        "0" | "off" | "f" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestimonialQuery {
    pub featured: bool,
    pub limit: u32,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TestimonialQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = QueryParams::extract(parts, state).await?;
        let query = Self {
            featured: params.flag("featured"),
            limit: params.limit(DEFAULT_TESTIMONIAL_LIMIT),
        };
        params.finish(query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlogQuery {
    pub limit: u32,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BlogQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = QueryParams::extract(parts, state).await?;
        let query = Self {
            limit: params.limit(DEFAULT_BLOG_LIMIT),
        };
        params.finish(query)
    }
}

/// Runs a synchronous store call off the async workers.
async fn with_store<T, F>(store: Arc<dyn DocumentStore>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn DocumentStore) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn root() -> Json<Value> {
    Json(handlers::banner())
}

async fn hello() -> Json<Value> {
    Json(handlers::hello())
}

async fn list_testimonials(
    State(state): State<AppState>,
    TestimonialQuery { featured, limit }: TestimonialQuery,
) -> Result<Json<Vec<Document>>, ApiError> {
    let docs = with_store(state.store, move |store| {
        handlers::list_testimonials(store, featured, limit)
    })
    .await?;
    Ok(Json(docs))
}

async fn list_blog(
    State(state): State<AppState>,
    BlogQuery { limit }: BlogQuery,
) -> Result<Json<Vec<BlogSummary>>, ApiError> {
    let posts = with_store(state.store, move |store| handlers::list_blog(store, limit)).await?;
    Ok(Json(posts))
}

async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogDetail>, ApiError> {
    let post = with_store(state.store, move |store| handlers::get_blog(store, &slug)).await??;
    Ok(Json(post))
}

async fn create_lead(
    State(state): State<AppState>,
    ValidatedJson(lead): ValidatedJson<Lead>,
) -> Result<Json<LeadAck>, ApiError> {
    let receipt = with_store(state.store, move |store| handlers::create_lead(store, &lead)).await?;
    Ok(Json(receipt.into()))
}

async fn test_database(State(state): State<AppState>) -> Result<Json<ConnectivityReport>, ApiError> {
    let AppState { inspector, env, .. } = state;
    let report = tokio::task::spawn_blocking(move || {
        diagnostics::connectivity_report(inspector.as_deref(), env)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(report))
}
