//! Error type for `loca-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A translation row whose `owner_id` or `locale` column has the wrong type.
  #[error("malformed translation row in {table:?}: {reason}")]
  MalformedRow { table: String, reason: String },

  #[error("value {value} of {column:?} does not fit in a 64-bit signed integer")]
  IntegerOutOfRange { column: String, value: u64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
