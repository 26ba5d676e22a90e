//! Per-type configuration: table names, the translatable field set, and the
//! fallback locale.
//!
//! A [`RecordType`] is built once and never mutated afterwards. Records share
//! it through an `Arc`, so whether a field is translatable is a fixed property
//! of the type rather than of any one instance.

use std::collections::BTreeSet;

use crate::{Error, Result, schema::Schema};

/// Locale used for fallback lookups when a type does not configure one.
pub const DEFAULT_LOCALE: &str = "en";

/// Name of the identifier attribute when a type does not configure one.
pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

/// Column in the translation table referencing the owning record.
pub const OWNER_COLUMN: &str = "owner_id";

/// Column in the translation table holding the locale of the row.
pub const LOCALE_COLUMN: &str = "locale";

// ─── RecordType ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordType {
  table_name:             String,
  translation_table_name: String,
  id_attribute:           String,
  default_locale:         String,
  translatable:           BTreeSet<String>,
  columns:                BTreeSet<String>,
  schema:                 Option<Schema>,
}

impl RecordType {
  pub fn builder(table_name: impl Into<String>) -> RecordTypeBuilder {
    RecordTypeBuilder {
      table_name:        table_name.into(),
      translation_table: None,
      id_attribute:      DEFAULT_ID_ATTRIBUTE.to_owned(),
      default_locale:    DEFAULT_LOCALE.to_owned(),
      translatable:      BTreeSet::new(),
      columns:           BTreeSet::new(),
      schema:            None,
    }
  }

  pub fn table_name(&self) -> &str { &self.table_name }

  /// Table holding one row per `(owner_id, locale)`.
  pub fn translation_table_name(&self) -> &str { &self.translation_table_name }

  pub fn id_attribute(&self) -> &str { &self.id_attribute }

  pub fn default_locale(&self) -> &str { &self.default_locale }

  pub fn is_translatable(&self, field: &str) -> bool {
    self.translatable.contains(field)
  }

  pub fn translatable_fields(&self) -> impl Iterator<Item = &str> {
    self.translatable.iter().map(String::as_str)
  }

  pub fn has_translatable_fields(&self) -> bool { !self.translatable.is_empty() }

  /// Declared base columns. Only table bootstrap reads these; records accept
  /// any non-translatable attribute.
  pub fn columns(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(String::as_str)
  }

  pub fn schema(&self) -> Option<&Schema> { self.schema.as_ref() }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordTypeBuilder {
  table_name:        String,
  translation_table: Option<String>,
  id_attribute:      String,
  default_locale:    String,
  translatable:      BTreeSet<String>,
  columns:           BTreeSet<String>,
  schema:            Option<Schema>,
}

impl RecordTypeBuilder {
  pub fn translatable<I, F>(mut self, fields: I) -> Self
  where
    I: IntoIterator<Item = F>,
    F: Into<String>,
  {
    self.translatable.extend(fields.into_iter().map(Into::into));
    self
  }

  pub fn columns<I, F>(mut self, columns: I) -> Self
  where
    I: IntoIterator<Item = F>,
    F: Into<String>,
  {
    self.columns.extend(columns.into_iter().map(Into::into));
    self
  }

  /// Override the `<table>_locale` naming convention.
  pub fn translation_table(mut self, name: impl Into<String>) -> Self {
    self.translation_table = Some(name.into());
    self
  }

  pub fn id_attribute(mut self, name: impl Into<String>) -> Self {
    self.id_attribute = name.into();
    self
  }

  pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
    self.default_locale = locale.into();
    self
  }

  pub fn schema(mut self, schema: Schema) -> Self {
    self.schema = Some(schema);
    self
  }

  pub fn build(self) -> Result<RecordType> {
    if self.table_name.is_empty() {
      return Err(Error::InvalidRecordType("table name is empty".into()));
    }
    if self.default_locale.is_empty() {
      return Err(Error::InvalidRecordType(format!(
        "{}: default locale is empty",
        self.table_name
      )));
    }
    if self.translatable.contains(&self.id_attribute) {
      return Err(Error::InvalidRecordType(format!(
        "{}: id attribute {:?} cannot be translatable",
        self.table_name, self.id_attribute
      )));
    }
    if let Some(field) = self
      .translatable
      .iter()
      .find(|f| f.as_str() == OWNER_COLUMN || f.as_str() == LOCALE_COLUMN)
    {
      return Err(Error::InvalidRecordType(format!(
        "{}: {field:?} is reserved by the translation table",
        self.table_name
      )));
    }
    if let Some(field) = self.translatable.intersection(&self.columns).next() {
      return Err(Error::InvalidRecordType(format!(
        "{}: {field:?} is declared both translatable and a base column",
        self.table_name
      )));
    }

    // Full saves validate every stored column.
    if let Some(schema) = &self.schema
      && let Some(field) = self
        .columns
        .iter()
        .chain(&self.translatable)
        .find(|f| *f != &self.id_attribute && !schema.contains(f))
    {
      return Err(Error::InvalidRecordType(format!(
        "{}: {field:?} is declared but missing from the schema",
        self.table_name
      )));
    }

    let translation_table_name = self
      .translation_table
      .unwrap_or_else(|| format!("{}_locale", self.table_name));

    Ok(RecordType {
      table_name: self.table_name,
      translation_table_name,
      id_attribute: self.id_attribute,
      default_locale: self.default_locale,
      translatable: self.translatable,
      columns: self.columns,
      schema: self.schema,
    })
  }
}
