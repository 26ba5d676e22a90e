//! Core types for locale-overlay records.
//!
//! A [`LocalizedRecord`](record::LocalizedRecord) keeps its ordinary
//! attributes in a base map and its translatable attributes in a per-locale
//! variation table. This crate holds the overlay model, the validator, and
//! the store traits; it depends on no database or HTTP code.

pub mod error;
pub mod persist;
pub mod record;
pub mod record_type;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use record::LocalizedRecord;
pub use record_type::RecordType;

/// Attribute values are plain JSON values.
pub type Value = serde_json::Value;

/// A field name → value mapping (base attributes, patches, variation rows).
pub type Attributes = serde_json::Map<String, Value>;

/// Identifier assigned by the backing store on first insert.
pub type RecordId = i64;
