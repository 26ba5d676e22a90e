//! Error types for `loca-core`.

use thiserror::Error;

use crate::{RecordId, schema::ValidationError};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("record in table {table:?} has no id")]
  MissingId { table: String },

  #[error("no row with id {id} in table {table:?}")]
  NotFound { table: String, id: RecordId },

  #[error("invalid record type: {0}")]
  InvalidRecordType(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
