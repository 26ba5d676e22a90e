//! Store traits consumed by [`LocalizedRecord`](crate::LocalizedRecord).
//!
//! [`RecordStore`] persists base attributes; [`VariationStore`] persists the
//! per-locale translation rows. Backends (e.g. `loca-store-sqlite`) implement
//! both, and the record orchestrates the two during save and fetch.

use std::future::Future;

use crate::{Attributes, RecordId};

// ─── Save options ────────────────────────────────────────────────────────────

/// Whether a save creates a row or modifies an existing one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum SaveMethod {
  Insert,
  Update,
}

/// Options accepted by [`LocalizedRecord::save`](crate::LocalizedRecord::save).
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
  /// Force a method instead of deriving it from whether the record has an id.
  pub method: Option<SaveMethod>,
  /// Persist only the attributes passed to `save`, not the whole record.
  pub patch:  bool,
}

impl SaveOptions {
  pub fn patch() -> Self { Self { method: Some(SaveMethod::Update), patch: true } }

  pub fn method(method: SaveMethod) -> Self { Self { method: Some(method), patch: false } }
}

// ─── Variation rows ──────────────────────────────────────────────────────────

/// One row of a translation table: the translatable values of one record in
/// one locale.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationRow {
  pub owner_id: RecordId,
  pub locale:   String,
  pub fields:   Attributes,
}

/// Result of attempting to insert a [`VariationRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  Inserted,
  /// A row for the same `(owner_id, locale)` already exists.
  Conflict,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Persistence for base (locale-independent) attributes.
///
/// All methods return `Send` futures so records can be saved from handlers
/// running on a multi-threaded runtime.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a row and return its identifier. An empty attribute set inserts a
  /// row of column defaults.
  fn insert_record<'a>(
    &'a self,
    table: &'a str,
    attrs: &'a Attributes,
  ) -> impl Future<Output = Result<RecordId, Self::Error>> + Send + 'a;

  /// Update the row whose `id_attribute` equals `id`. Returns the number of
  /// rows matched.
  fn update_record<'a>(
    &'a self,
    table: &'a str,
    id_attribute: &'a str,
    id: RecordId,
    attrs: &'a Attributes,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Load a row by identifier. Returns `None` if not found.
  fn fetch_record<'a>(
    &'a self,
    table: &'a str,
    id_attribute: &'a str,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<Attributes>, Self::Error>> + Send + 'a;

  /// Delete a row by identifier. Returns the number of rows removed.
  fn delete_record<'a>(
    &'a self,
    table: &'a str,
    id_attribute: &'a str,
    id: RecordId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

/// Persistence for translation rows, unique on `(owner_id, locale)`.
pub trait VariationStore: RecordStore {
  /// Insert a row. A uniqueness violation on `(owner_id, locale)` is reported
  /// as [`InsertOutcome::Conflict`]; every other failure is an error.
  fn insert_variation<'a>(
    &'a self,
    table: &'a str,
    row: &'a VariationRow,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + 'a;

  /// `UPDATE table SET fields WHERE owner_id = ? AND locale = ?`. Returns the
  /// number of rows matched.
  fn update_variation<'a>(
    &'a self,
    table: &'a str,
    owner_id: RecordId,
    locale: &'a str,
    fields: &'a Attributes,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// All rows belonging to `owner_id`, one per locale.
  fn select_variations<'a>(
    &'a self,
    table: &'a str,
    owner_id: RecordId,
  ) -> impl Future<Output = Result<Vec<VariationRow>, Self::Error>> + Send + 'a;
}
