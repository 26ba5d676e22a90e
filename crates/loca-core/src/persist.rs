//! Save, fetch, and delete for [`LocalizedRecord`].
//!
//! Base attributes go through [`RecordStore`]; once that succeeds, every
//! locale in the variation table is upserted through [`VariationStore`]
//! concurrently. A failed translation upsert fails the save but does not roll
//! back the base write.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::{
  Attributes, Error, LocalizedRecord, RecordId, RecordType, Result, Value,
  schema::ValidationError,
  store::{InsertOutcome, SaveMethod, SaveOptions, VariationRow, VariationStore},
};

impl LocalizedRecord {
  /// The method a save with `options` will use: the explicit one if given,
  /// otherwise `Insert` for records without an id and `Update` for the rest.
  pub fn save_method(&self, options: &SaveOptions) -> SaveMethod {
    options.method.unwrap_or(if self.is_new() {
      SaveMethod::Insert
    } else {
      SaveMethod::Update
    })
  }

  // ── Validation ──────────────────────────────────────────────────────────

  /// Validate against the type's schema, if any, returning coerced values.
  ///
  /// With `Some(patch)` only the keys of the patch are validated. With `None`
  /// the base attributes merged with the current locale's translations are
  /// validated against the full schema. The id attribute is never validated.
  pub fn validate_save(&self, patch: Option<&Attributes>) -> Result<Attributes> {
    let mut candidate: Attributes = match patch {
      Some(attrs) => attrs.clone(),
      None => {
        let mut merged = self.attributes.clone();
        if let Some(variation) = self.variations.get(self.write_locale()) {
          merged.extend(variation.clone());
        }
        merged
      }
    };
    candidate.remove(self.kind.id_attribute());

    let Some(schema) = self.kind.schema() else {
      return Ok(candidate);
    };

    schema.validate(&candidate, patch.is_some()).map_err(|issues| {
      Error::Validation(ValidationError {
        table: self.kind.table_name().to_owned(),
        issues,
      })
    })
  }

  // ── Save ────────────────────────────────────────────────────────────────

  /// Save one attribute. Equivalent to [`save`](Self::save) with a single
  /// entry map.
  pub async fn save_field<S: VariationStore>(
    &mut self,
    store: &S,
    field: &str,
    value: Value,
    options: SaveOptions,
  ) -> Result<&mut Self> {
    let mut attrs = Attributes::new();
    if !field.is_empty() {
      attrs.insert(field.to_owned(), value);
    }
    self.save(store, attrs, options).await
  }

  /// Persist the record: base attributes first, then every locale of the
  /// variation table.
  ///
  /// For a patch (`Update` with `patch: true`) only the keys in `attrs` are
  /// written; translatable keys among them are moved into the current
  /// locale's variation entry first. Otherwise `attrs` is merged into the
  /// record and the whole base map is written.
  pub async fn save<S: VariationStore>(
    &mut self,
    store: &S,
    attrs: Attributes,
    options: SaveOptions,
  ) -> Result<&mut Self> {
    let method = self.save_method(&options);
    let table = self.kind.table_name().to_owned();

    if method == SaveMethod::Update && options.patch {
      let id = self.id().ok_or_else(|| Error::MissingId { table: table.clone() })?;
      let validated = self.validate_save(Some(&attrs))?;

      let mut base = Attributes::new();
      for (field, value) in validated {
        if self.kind.is_translatable(&field) {
          self.set_translation(&field, value);
        } else {
          base.insert(field, value);
        }
      }

      if !base.is_empty() {
        self.update_base(store, id, &base).await?;
        self.attributes.extend(base);
      }
    } else {
      self.set_many(attrs);
      let validated = self.validate_save(None)?;
      self.set_many(validated);

      match method {
        SaveMethod::Insert => {
          let id = store
            .insert_record(&table, &self.attributes)
            .await
            .map_err(Error::store)?;
          debug!(table = %table, id, "inserted record");
          self.attributes.insert(self.kind.id_attribute().to_owned(), Value::from(id));
        }
        SaveMethod::Update => {
          let id = self.id().ok_or_else(|| Error::MissingId { table: table.clone() })?;
          let mut base = self.attributes.clone();
          base.remove(self.kind.id_attribute());
          self.update_base(store, id, &base).await?;
        }
      }
    }

    self.save_translations(store).await?;
    Ok(self)
  }

  async fn update_base<S: VariationStore>(
    &self,
    store: &S,
    id: RecordId,
    base: &Attributes,
  ) -> Result<()> {
    let table = self.kind.table_name();
    let matched = store
      .update_record(table, self.kind.id_attribute(), id, base)
      .await
      .map_err(Error::store)?;
    if matched == 0 {
      return Err(Error::NotFound { table: table.to_owned(), id });
    }
    debug!(table = %table, id, fields = base.len(), "updated record");
    Ok(())
  }

  /// Upsert one translation row per locale in the variation table, all at
  /// once. Resolves to the saved locales; the first failure is returned and
  /// the remaining upserts are abandoned.
  pub async fn save_translations<S: VariationStore>(&self, store: &S) -> Result<Vec<String>> {
    if self.variations.is_empty() {
      return Ok(Vec::new());
    }
    let owner_id = self.id().ok_or_else(|| Error::MissingId {
      table: self.kind.table_name().to_owned(),
    })?;

    let upserts = self
      .variations
      .iter()
      .map(|(locale, fields)| self.upsert_locale(store, owner_id, locale, fields));

    try_join_all(upserts).await
  }

  /// Insert the row for `locale`; if one already exists, update its fields.
  async fn upsert_locale<S: VariationStore>(
    &self,
    store: &S,
    owner_id: RecordId,
    locale: &str,
    fields: &Attributes,
  ) -> Result<String> {
    let table = self.kind.translation_table_name();
    let row = VariationRow {
      owner_id,
      locale: locale.to_owned(),
      fields: fields.clone(),
    };

    match store.insert_variation(table, &row).await.map_err(Error::store)? {
      InsertOutcome::Inserted => {
        debug!(table = %table, owner_id, locale, "inserted translation");
      }
      InsertOutcome::Conflict => {
        if !fields.is_empty() {
          store
            .update_variation(table, owner_id, locale, fields)
            .await
            .map_err(Error::store)?;
        }
        debug!(table = %table, owner_id, locale, "updated translation");
      }
    }

    Ok(row.locale)
  }

  // ── Fetch ───────────────────────────────────────────────────────────────

  /// Load a record by id in the type's default locale.
  pub async fn find<S: VariationStore>(
    store: &S,
    kind: Arc<RecordType>,
    id: RecordId,
  ) -> Result<Option<Self>> {
    let mut record = Self::new(kind);
    record
      .attributes
      .insert(record.kind.id_attribute().to_owned(), Value::from(id));
    Ok(if record.fetch(store).await? { Some(record) } else { None })
  }

  /// Reload base attributes and translations for this record's id, keeping
  /// the current locale. Returns `false` if the row does not exist.
  pub async fn fetch<S: VariationStore>(&mut self, store: &S) -> Result<bool> {
    let table = self.kind.table_name();
    let id = self.id().ok_or_else(|| Error::MissingId { table: table.to_owned() })?;

    let Some(row) = store
      .fetch_record(table, self.kind.id_attribute(), id)
      .await
      .map_err(Error::store)?
    else {
      return Ok(false);
    };
    self.attributes.extend(row);

    if self.kind.has_translatable_fields() {
      self.fetch_translatable(store).await?;
    }
    Ok(true)
  }

  /// Replace the in-memory variation entry of every locale stored for this
  /// record. Locales with no stored row are left as they are.
  pub async fn fetch_translatable<S: VariationStore>(&mut self, store: &S) -> Result<()> {
    let id = self.id().ok_or_else(|| Error::MissingId {
      table: self.kind.table_name().to_owned(),
    })?;

    let rows = store
      .select_variations(self.kind.translation_table_name(), id)
      .await
      .map_err(Error::store)?;

    debug!(
      table = %self.kind.translation_table_name(),
      owner_id = id,
      locales = rows.len(),
      "hydrated translations"
    );
    for row in rows {
      self.variations.insert(row.locale, row.fields);
    }
    Ok(())
  }

  // ── Delete ──────────────────────────────────────────────────────────────

  /// Delete the base row. Translation rows are removed by the store's
  /// cascading foreign key. Returns `false` if no row matched.
  pub async fn destroy<S: VariationStore>(&mut self, store: &S) -> Result<bool> {
    let table = self.kind.table_name();
    let id = self.id().ok_or_else(|| Error::MissingId { table: table.to_owned() })?;

    let removed = store
      .delete_record(table, self.kind.id_attribute(), id)
      .await
      .map_err(Error::store)?;
    debug!(table = %table, id, removed, "deleted record");

    self.attributes.remove(self.kind.id_attribute());
    Ok(removed > 0)
  }
}
