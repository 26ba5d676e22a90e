//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode},
};
use loca_core::{
  RecordType,
  schema::{FieldKind, FieldRule, Schema},
};
use loca_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, RecordTypeConfig, Registry, router};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");

  let mut registry = Registry::new();
  let kind = registry.register(
    RecordType::builder("articles")
      .translatable(["title"])
      .columns(["slug"])
      .schema(
        Schema::new()
          .field("slug", FieldRule::new(FieldKind::String).required())
          .field("title", FieldRule::new(FieldKind::String).max_length(20)),
      )
      .build()
      .expect("record type"),
  );
  store.ensure_record_type(&kind).await.expect("tables");

  router(AppState {
    store:    Arc::new(store),
    registry: Arc::new(registry),
  })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(body) => builder
      .header("content-type", "application/json")
      .body(Body::from(body.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

#[tokio::test]
async fn create_then_read_in_two_locales() {
  let app = app().await;

  let (status, created) = send(
    &app,
    Method::POST,
    "/records/articles",
    Some(json!({ "slug": "hello", "title": "Hello" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created, json!({ "id": 1, "slug": "hello", "title": "Hello" }));

  let (status, _) = send(
    &app,
    Method::PATCH,
    "/records/articles/1?locale=de",
    Some(json!({ "title": "Hallo" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, de) = send(&app, Method::GET, "/records/articles/1?locale=de", None).await;
  assert_eq!(de["title"], "Hallo");
  let (_, en) = send(&app, Method::GET, "/records/articles/1", None).await;
  assert_eq!(en["title"], "Hello");
  let (_, it) = send(&app, Method::GET, "/records/articles/1?locale=it", None).await;
  assert_eq!(it["title"], "Hello");

  let (_, all) = send(&app, Method::GET, "/records/articles/1/translations", None).await;
  assert_eq!(all, json!({ "de": { "title": "Hallo" }, "en": { "title": "Hello" } }));
}

#[tokio::test]
async fn put_rewrites_base_attributes() {
  let app = app().await;
  send(&app, Method::POST, "/records/articles", Some(json!({ "slug": "a" }))).await;

  let (status, body) = send(
    &app,
    Method::PUT,
    "/records/articles/1",
    Some(json!({ "slug": "b", "title": "B" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "id": 1, "slug": "b", "title": "B" }));
}

#[tokio::test]
async fn validation_errors_are_unprocessable() {
  let app = app().await;

  let (status, body) = send(&app, Method::POST, "/records/articles", Some(json!({ "title": "x" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["table"], "articles");
  assert_eq!(body["issues"][0]["field"], "slug");
  assert_eq!(body["issues"][0]["issue"], "missing");
}

#[tokio::test]
async fn unknown_tables_and_rows_are_not_found() {
  let app = app().await;

  let (status, _) = send(&app, Method::GET, "/records/nope/1", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, Method::GET, "/records/articles/9", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, Method::DELETE, "/records/articles/9", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_record() {
  let app = app().await;
  send(&app, Method::POST, "/records/articles", Some(json!({ "slug": "a", "title": "A" }))).await;

  let (status, _) = send(&app, Method::DELETE, "/records/articles/1", None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, Method::GET, "/records/articles/1", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn record_types_build_from_config() {
  let config: RecordTypeConfig = serde_json::from_value(json!({
    "table": "pages",
    "translatable": ["title"],
    "default_locale": "de",
    "schema": { "title": { "kind": "string", "required": true } },
  }))
  .unwrap();

  let registry = Registry::from_configs(&[config]).unwrap();
  let kind = registry.get("pages").unwrap();
  assert_eq!(kind.translation_table_name(), "pages_locale");
  assert_eq!(kind.default_locale(), "de");
  assert!(kind.is_translatable("title"));
  assert_eq!(kind.schema().unwrap().keys().collect::<Vec<_>>(), vec!["title"]);
}
