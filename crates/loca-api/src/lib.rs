//! JSON HTTP API over localized records.
//!
//! Exposes an axum [`Router`] backed by any [`VariationStore`]. Every request
//! names a record type by table and, optionally, a locale with `?locale=`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/records/{table}` | Body: attribute object; 201 |
//! | `GET`    | `/records/{table}/{id}` | Serialized in the requested locale |
//! | `PUT`    | `/records/{table}/{id}` | Full update |
//! | `PATCH`  | `/records/{table}/{id}` | Only the given keys |
//! | `DELETE` | `/records/{table}/{id}` | 204 |
//! | `GET`    | `/records/{table}/{id}/translations` | Every stored locale |

pub mod error;
pub mod records;
pub mod registry;

pub use error::ApiError;
pub use registry::{RecordTypeConfig, Registry};

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use loca_core::store::VariationStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  #[serde(default)]
  pub record_types: Vec<RecordTypeConfig>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub registry: Arc<Registry>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      registry: Arc::clone(&self.registry),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: VariationStore + 'static,
{
  Router::new()
    .route("/records/{table}", axum::routing::post(records::create::<S>))
    .route(
      "/records/{table}/{id}",
      get(records::get_one::<S>)
        .put(records::replace::<S>)
        .patch(records::patch::<S>)
        .delete(records::delete::<S>),
    )
    .route("/records/{table}/{id}/translations", get(records::translations::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
