//! Handlers for `/records/{table}` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use loca_core::{
  Attributes, LocalizedRecord, RecordId, RecordType, Value,
  record::VariationTable,
  store::{SaveMethod, SaveOptions, VariationStore},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LocaleParams {
  /// Locale to read and write in; the type's default locale when absent.
  pub locale: Option<String>,
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn record_type<S>(state: &AppState<S>, table: &str) -> Result<Arc<RecordType>, ApiError> {
  state
    .registry
    .get(table)
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("unknown record type {table:?}")))
}

/// A record of `kind` with `id` set but nothing loaded.
fn forge(kind: Arc<RecordType>, id: Option<RecordId>, locale: Option<String>) -> LocalizedRecord {
  let mut record = match locale {
    Some(locale) => LocalizedRecord::new_in_locale(kind, locale),
    None => LocalizedRecord::new(kind),
  };
  if let Some(id) = id {
    let id_attribute = record.record_type().id_attribute().to_owned();
    record.set(&id_attribute, Value::from(id));
  }
  record
}

async fn load<S: VariationStore>(
  state: &AppState<S>,
  table: &str,
  id: RecordId,
  locale: Option<String>,
) -> Result<LocalizedRecord, ApiError> {
  let mut record = forge(record_type(state, table)?, Some(id), locale);
  if !record.fetch(state.store.as_ref()).await? {
    return Err(ApiError::NotFound(format!("{table} {id} not found")));
  }
  Ok(record)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /records/{table}[?locale=]`
pub async fn create<S: VariationStore>(
  State(state): State<AppState<S>>,
  Path(table): Path<String>,
  Query(params): Query<LocaleParams>,
  Json(body): Json<Attributes>,
) -> Result<impl IntoResponse, ApiError> {
  let mut record = forge(record_type(&state, &table)?, None, params.locale);
  record
    .save(state.store.as_ref(), body, SaveOptions::method(SaveMethod::Insert))
    .await?;
  Ok((StatusCode::CREATED, Json(record.serialize())))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /records/{table}/{id}[?locale=]`
pub async fn get_one<S: VariationStore>(
  State(state): State<AppState<S>>,
  Path((table, id)): Path<(String, RecordId)>,
  Query(params): Query<LocaleParams>,
) -> Result<Json<Attributes>, ApiError> {
  let record = load(&state, &table, id, params.locale).await?;
  Ok(Json(record.serialize()))
}

/// `GET /records/{table}/{id}/translations`
pub async fn translations<S: VariationStore>(
  State(state): State<AppState<S>>,
  Path((table, id)): Path<(String, RecordId)>,
) -> Result<Json<VariationTable>, ApiError> {
  let record = load(&state, &table, id, None).await?;
  Ok(Json(record.variations().clone()))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /records/{table}/{id}[?locale=]` — merge the body and write the whole
/// record.
pub async fn replace<S: VariationStore>(
  State(state): State<AppState<S>>,
  Path((table, id)): Path<(String, RecordId)>,
  Query(params): Query<LocaleParams>,
  Json(body): Json<Attributes>,
) -> Result<Json<Attributes>, ApiError> {
  let mut record = load(&state, &table, id, params.locale).await?;
  record
    .save(state.store.as_ref(), body, SaveOptions::method(SaveMethod::Update))
    .await?;
  Ok(Json(record.serialize()))
}

/// `PATCH /records/{table}/{id}[?locale=]` — write only the body's keys.
pub async fn patch<S: VariationStore>(
  State(state): State<AppState<S>>,
  Path((table, id)): Path<(String, RecordId)>,
  Query(params): Query<LocaleParams>,
  Json(body): Json<Attributes>,
) -> Result<Json<Attributes>, ApiError> {
  let mut record = load(&state, &table, id, params.locale).await?;
  record.save(state.store.as_ref(), body, SaveOptions::patch()).await?;
  Ok(Json(record.serialize()))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /records/{table}/{id}`
pub async fn delete<S: VariationStore>(
  State(state): State<AppState<S>>,
  Path((table, id)): Path<(String, RecordId)>,
) -> Result<StatusCode, ApiError> {
  let mut record = forge(record_type(&state, &table)?, Some(id), None);
  if !record.destroy(state.store.as_ref()).await? {
    return Err(ApiError::NotFound(format!("{table} {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
