use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use validator::ValidationErrors;

/// Failures raised by a document store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database not configured")]
    NotConfigured,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("sqlite error :: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("document serialization error :: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid filter key `{0}`")]
    InvalidFilterKey(String),
    #[error("unsupported filter value for `{0}`")]
    UnsupportedFilterValue(String),
    #[error("document `{0}` is not a JSON object")]
    MalformedDocument(String),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors surfaced to HTTP callers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("invalid request: {}", summarize(.0))]
    InvalidRequest(Vec<FieldError>),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn post_not_found() -> Self {
        Self::NotFound("Post not found".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Value {
        match self {
            Self::Validation(errors) => json!(validation_detail(errors)),
            Self::InvalidRequest(errors) => json!(errors),
            other => Value::String(other.to_string()),
        }
    }
}

/// One rejected input value, rendered as `{loc, msg, type}`. `loc` starts with
/// where the value came from (`body` or `query`) followed by its path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: Vec<Value>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    pub fn query(param: &str, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(vec![json!("query"), json!(param)], msg, kind)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.msg, e.kind))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Flattens validator errors into [`FieldError`]s, sorted by field.
fn validation_detail(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let msg = err
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("invalid {field}"));
                FieldError::new(vec![json!("body"), json!(field)], msg, err.code.to_string())
            })
        })
        .collect()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
