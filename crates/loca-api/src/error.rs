//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use loca_core::schema::ValidationError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Validation(ValidationError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<loca_core::Error> for ApiError {
  fn from(err: loca_core::Error) -> Self {
    match err {
      loca_core::Error::Validation(v) => Self::Validation(v),
      loca_core::Error::NotFound { table, id } => {
        Self::NotFound(format!("{table} {id} not found"))
      }
      loca_core::Error::MissingId { .. } => Self::BadRequest(err.to_string()),
      loca_core::Error::Store(e) => Self::Store(e),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match &self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Validation(v) => {
        let body = json!({ "error": v.to_string(), "table": v.table, "issues": v.issues });
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
          .into_response()
      }
    }
  }
}
