use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use content_core::api::{AppState, router};
use content_core::config::{FileConfig, ServerConfig};
use content_core::error::StoreError;
use content_core::facade::{Document, DocumentStore, Filter};
use content_core::fallback::{DEMO_LEAD_ID, FALLBACK_SLUG};
use content_core::memory::{MemoryDocuments, UnavailableDocuments};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

/// Fails every call and counts how many were made.
#[derive(Default)]
struct CountingStore {
    calls: AtomicUsize,
}

impl DocumentStore for CountingStore {
    fn get_documents(&self, _: &str, _: &Filter, _: u32) -> Result<Vec<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("down".into()))
    }

    fn create_document(&self, _: &str, _: Document) -> Result<String, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("down".into()))
    }
}

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn seeded() -> Arc<MemoryDocuments> {
    let store = MemoryDocuments::new();
    for i in 0..4 {
        store
            .create_document(
                "testimonial",
                doc(json!({"name": format!("T{i}"), "message": "m", "rating": 5, "featured": i % 2 == 0})),
            )
            .unwrap();
    }
    store
        .create_document(
            "blogpost",
            doc(json!({"title": "Untagged", "slug": "untagged", "content": "text", "published": true})),
        )
        .unwrap();
    store
        .create_document(
            "blogpost",
            doc(json!({"title": "Hidden", "slug": "hidden", "content": "text", "published": false})),
        )
        .unwrap();
    Arc::new(store)
}

fn live_app() -> Router {
    router(AppState::new(seeded()))
}

fn down_app() -> Router {
    router(AppState::new(Arc::new(UnavailableDocuments::default())))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

#[tokio::test]
async fn banner_and_greeting() {
    let (status, body) = get(down_app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "SpellsToGetMyExBack API");

    let (status, body) = get(down_app(), "/api/hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello from the backend API!");
}

#[tokio::test]
async fn testimonials_from_live_store() {
    let (status, body) = get(live_app(), "/api/testimonials").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|t| t.get("_id").is_none()));

    let (_, body) = get(live_app(), "/api/testimonials?featured=true").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(live_app(), "/api/testimonials?limit=3").await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn testimonials_fall_back_for_any_featured_value() {
    for uri in [
        "/api/testimonials",
        "/api/testimonials?featured=false",
        "/api/testimonials?featured=true&limit=1",
    ] {
        let (status, body) = get(down_app(), uri).await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1, "{uri}");
        assert_eq!(items[0]["name"], "Sasha");
    }
}

#[tokio::test]
async fn malformed_limit_is_rejected_per_field() {
    for uri in [
        "/api/testimonials?limit=-1",
        "/api/testimonials?limit=abc",
        "/api/blog?limit=abc",
    ] {
        let (status, body) = get(live_app(), uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0]["loc"], json!(["query", "limit"]));
        assert_eq!(detail[0]["type"], "type_error.integer");
    }
}

#[tokio::test]
async fn featured_accepts_form_spellings() {
    for value in ["1", "True", "yes", "on"] {
        let uri = format!("/api/testimonials?featured={value}");
        let (status, body) = get(live_app(), &uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body.as_array().unwrap().len(), 2, "{uri}");
    }

    let (status, body) = get(live_app(), "/api/testimonials?featured=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, body) = get(live_app(), "/api/testimonials?featured=maybe").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["query", "featured"]));
}

#[tokio::test]
async fn blog_list_backfills_tags() {
    let (status, body) = get(live_app(), "/api/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "title": "Untagged",
            "slug": "untagged",
            "excerpt": null,
            "tags": [],
            "published": true,
        }])
    );
}

#[tokio::test]
async fn blog_list_falls_back() {
    let (status, body) = get(down_app(), "/api/blog?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["slug"], FALLBACK_SLUG);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blog_detail_found() {
    let (status, body) = get(live_app(), "/api/blog/untagged").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "text");
    assert_eq!(body["tags"], json!([]));
}

#[tokio::test]
async fn blog_detail_missing_on_live_store_is_not_found() {
    let (status, body) = get(live_app(), "/api/blog/hidden").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Post not found"}));

    let (status, _) = get(live_app(), &format!("/api/blog/{FALLBACK_SLUG}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blog_detail_fallback_only_for_known_slug() {
    let (status, body) = get(down_app(), &format!("/api/blog/{FALLBACK_SLUG}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], FALLBACK_SLUG);
    assert!(!body["content"].as_str().unwrap().is_empty());

    let (status, _) = get(down_app(), "/api/blog/some-other-post").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_lead_email_never_reaches_store() {
    let store = Arc::new(CountingStore::default());
    let app = router(AppState::new(store.clone()));

    let (status, body) = post_json(
        app,
        "/api/leads",
        json!({"name": "Sam", "email": "sam-at-example"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "email"]));
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lead_missing_required_field_is_rejected() {
    let store = Arc::new(CountingStore::default());
    let app = router(AppState::new(store.clone()));

    let (status, body) = post_json(app, "/api/leads", json!({"email": "sam@example.com"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"],
        json!([{
            "loc": ["body", "name"],
            "msg": "field required",
            "type": "value_error.missing",
        }])
    );
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lead_wrong_type_names_the_field() {
    let store = Arc::new(CountingStore::default());
    let app = router(AppState::new(store.clone()));

    let (status, body) = post_json(
        app,
        "/api/leads",
        json!({"name": "Sam", "email": "sam@example.com", "phone": 5551234}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "phone"]));
    assert_eq!(body["detail"][0]["type"], "type_error");
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn lead_null_source_takes_default() {
    let store = Arc::new(MemoryDocuments::new());
    let app = router(AppState::new(store.clone()));

    let (status, body) = post_json(
        app,
        "/api/leads",
        json!({"name": "Sam", "email": "sam@example.com", "source": null}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["id"], DEMO_LEAD_ID);

    let stored = store.get_documents("lead", &Filter::new(), 1).unwrap();
    assert_eq!(stored[0]["source"], "website");
}

#[tokio::test]
async fn lead_acknowledged_when_store_down() {
    let store = Arc::new(CountingStore::default());
    let app = router(AppState::new(store.clone()));

    let (status, body) = post_json(
        app,
        "/api/leads",
        json!({"name": "Sam", "email": "sam@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["id"], DEMO_LEAD_ID);
    assert!(!body["note"].as_str().unwrap().is_empty());
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lead_persisted_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("site.db");
    let config = ServerConfig::resolve(
        FileConfig::default(),
        FileConfig {
            database_url: Some(db_path.to_string_lossy().into_owned()),
            ..FileConfig::default()
        },
    );
    let state = AppState::from_config(&config);

    let (status, body) = post_json(
        router(state.clone()),
        "/api/leads",
        json!({"name": "Sam", "email": "sam@example.com", "phone": "555"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_ne!(body["id"], DEMO_LEAD_ID);
    assert!(body.get("note").is_none());

    let stored = config
        .store()
        .get_documents("lead", &Filter::new(), 10)
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["_id"], body["id"]);
    assert_eq!(stored[0]["source"], "website");

    let (status, report) = get(router(state), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["database"], "✅ Connected & Working");
    assert_eq!(report["collections"], json!(["lead"]));
    assert_eq!(report["database_url"], "✅ Set");
    assert_eq!(report["database_name"], "❌ Not Set");
}

#[tokio::test]
async fn diagnostics_without_database() {
    let state = AppState::from_config(&ServerConfig::default());
    let (status, report) = get(router(state), "/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["backend"], "✅ Running");
    assert_eq!(report["database"], "⚠️  Available but not initialized");
    assert_eq!(report["connection_status"], "Not Connected");
    assert_eq!(report["database_url"], "❌ Not Set");

    let (_, report) = get(down_app(), "/test").await;
    assert!(report["database"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn unconfigured_sqlite_serves_fallbacks() {
    let app = router(AppState::from_config(&ServerConfig::default()));
    let (status, body) = get(app.clone(), "/api/testimonials?featured=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = post_json(
        app,
        "/api/leads",
        json!({"name": "Sam", "email": "sam@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], DEMO_LEAD_ID);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let req = Request::get("/api/hello")
        .header(header::ORIGIN, "https://example.org")
        .body(Body::empty())
        .unwrap();
    let res = live_app().oneshot(req).await.unwrap();
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
