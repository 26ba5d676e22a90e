//! [`LocalizedRecord`]: base attributes plus a per-locale variation table.
//!
//! Translatable fields never live in the base map. Writes go to the variation
//! entry of the current locale; reads look in the current locale and then,
//! once, in the type's default locale.

use std::{collections::BTreeMap, sync::Arc};

use crate::{Attributes, RecordId, RecordType, Value};

/// `locale -> (field -> value)`.
pub type VariationTable = BTreeMap<String, Attributes>;

#[derive(Debug, Clone)]
pub struct LocalizedRecord {
  pub(crate) kind:       Arc<RecordType>,
  pub(crate) attributes: Attributes,
  current_locale:        String,
  pub(crate) variations: VariationTable,
}

impl LocalizedRecord {
  /// An empty record operating in the type's default locale.
  pub fn new(kind: Arc<RecordType>) -> Self {
    let current_locale = kind.default_locale().to_owned();
    Self {
      kind,
      attributes: Attributes::new(),
      current_locale,
      variations: VariationTable::new(),
    }
  }

  pub fn new_in_locale(kind: Arc<RecordType>, locale: impl Into<String>) -> Self {
    let mut record = Self::new(kind);
    record.set_locale(locale);
    record
  }

  /// A record whose attributes are routed through [`set_many`](Self::set_many).
  pub fn with_attributes(kind: Arc<RecordType>, attrs: Attributes) -> Self {
    let mut record = Self::new(kind);
    record.set_many(attrs);
    record
  }

  pub fn record_type(&self) -> &Arc<RecordType> { &self.kind }

  /// The identifier, once the store has assigned one.
  pub fn id(&self) -> Option<RecordId> {
    self.attributes.get(self.kind.id_attribute()).and_then(Value::as_i64)
  }

  pub fn is_new(&self) -> bool { self.id().is_none() }

  /// Base (non-translatable) attributes, including the id once assigned.
  pub fn attributes(&self) -> &Attributes { &self.attributes }

  pub fn variations(&self) -> &VariationTable { &self.variations }

  // ── Locale ──────────────────────────────────────────────────────────────

  /// Switch the locale used for reads and writes. No validation, no I/O.
  pub fn set_locale(&mut self, locale: impl Into<String>) {
    self.current_locale = locale.into();
  }

  pub fn locale(&self) -> &str { &self.current_locale }

  pub fn default_locale(&self) -> &str { self.kind.default_locale() }

  /// The locale writes land in: the current one, or the default locale when
  /// the current one is empty.
  pub fn write_locale(&self) -> &str {
    if self.current_locale.is_empty() {
      self.default_locale()
    } else {
      &self.current_locale
    }
  }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// Translatable fields resolve through [`translation`](Self::translation);
  /// everything else comes from the base map.
  pub fn get(&self, field: &str) -> Option<&Value> {
    if self.kind.is_translatable(field) {
      return self.translation(field);
    }
    self.attributes.get(field)
  }

  /// Resolve a translatable field in the current locale, falling back to the
  /// default locale once. Returns `None` for non-translatable fields.
  pub fn translation(&self, field: &str) -> Option<&Value> {
    if !self.kind.is_translatable(field) {
      return None;
    }

    if let Some(value) = self.translation_for_locale(field, &self.current_locale) {
      return Some(value);
    }

    if self.current_locale == self.default_locale() {
      return None;
    }

    self.translation_for_locale(field, self.default_locale())
  }

  /// Point lookup in one locale, without fallback.
  pub fn translation_for_locale(&self, field: &str, locale: &str) -> Option<&Value> {
    if !self.kind.is_translatable(field) {
      return None;
    }
    self.variations.get(locale)?.get(field)
  }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Store `value` for `field` under the current locale (or the default
  /// locale when the current one is empty). Returns `false`, storing nothing,
  /// if the field is not translatable.
  pub fn set_translation(&mut self, field: &str, value: Value) -> bool {
    let locale = self.write_locale().to_owned();
    self.set_translation_for_locale(field, &locale, value)
  }

  /// Store `value` for `field` under `locale` (or the default locale when
  /// `locale` is empty). The locale entry is created if missing.
  pub fn set_translation_for_locale(
    &mut self,
    field: &str,
    locale: &str,
    value: Value,
  ) -> bool {
    if !self.kind.is_translatable(field) {
      return false;
    }

    let locale = if locale.is_empty() { self.kind.default_locale() } else { locale };

    self
      .variations
      .entry(locale.to_owned())
      .or_default()
      .insert(field.to_owned(), value);
    true
  }

  /// Set one attribute, routing translatable fields to the variation table.
  /// An empty field name is a no-op.
  pub fn set(&mut self, field: &str, value: Value) -> &mut Self {
    if field.is_empty() {
      return self;
    }
    if self.kind.is_translatable(field) {
      self.set_translation(field, value);
    } else {
      self.attributes.insert(field.to_owned(), value);
    }
    self
  }

  /// Set many attributes at once. Translatable entries go to the variation
  /// table of the current locale; the rest are merged into the base map.
  pub fn set_many(&mut self, attrs: Attributes) -> &mut Self {
    let (translatable, base): (Vec<_>, Vec<_>) = attrs
      .into_iter()
      .filter(|(field, _)| !field.is_empty())
      .partition(|(field, _)| self.kind.is_translatable(field));

    for (field, value) in translatable {
      self.set_translation(&field, value);
    }
    self.attributes.extend(base);
    self
  }

  // ── Serialization ───────────────────────────────────────────────────────

  /// The base attributes with every translatable field resolved for the
  /// current locale. Fields with no translation in either the current or the
  /// default locale are omitted.
  pub fn serialize(&self) -> Attributes {
    let mut out = self.attributes.clone();
    for field in self.kind.translatable_fields() {
      match self.translation(field) {
        Some(value) => {
          out.insert(field.to_owned(), value.clone());
        }
        None => {
          out.remove(field);
        }
      }
    }
    out
  }
}
