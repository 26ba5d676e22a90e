//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`] and
//! [`VariationStore`].

use std::path::Path;

use loca_core::{
  Attributes, RecordId, RecordType,
  record_type::{LOCALE_COLUMN, OWNER_COLUMN},
  store::{InsertOutcome, RecordStore, VariationRow, VariationStore},
};
use rusqlite::{OptionalExtension as _, ffi, types::Value as SqlValue};
use tracing::info;

use crate::{
  Result,
  encode::{RawRow, encode_columns, quote_ident},
  schema::{PRAGMAS, base_table_ddl, translation_table_ddl},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Record and translation tables in a single SQLite database.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a database at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory database — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Create the base table of `kind` and, if it has translatable fields, its
  /// translation table. Existing tables are left untouched.
  pub async fn ensure_record_type(&self, kind: &RecordType) -> Result<()> {
    let mut ddl = vec![base_table_ddl(kind)];
    if kind.has_translatable_fields() {
      ddl.push(translation_table_ddl(kind));
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for statement in &ddl {
          tx.execute(statement, [])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!(
      table = kind.table_name(),
      translations = kind.translation_table_name(),
      "ensured record tables"
    );
    Ok(())
  }

  /// `SELECT COUNT(*)` over `table` for rows matching every `(column, value)`.
  async fn count_where(&self, table: &str, filter: Vec<(&str, SqlValue)>) -> Result<u64> {
    let (conds, params): (Vec<String>, Vec<SqlValue>) = filter
      .into_iter()
      .enumerate()
      .map(|(i, (column, value))| (format!("{} = ?{}", quote_ident(column), i + 1), value))
      .unzip();
    let sql = format!(
      "SELECT COUNT(*) FROM {} WHERE {}",
      quote_ident(table),
      conds.join(" AND ")
    );

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |r| r.get(0))?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  /// `UPDATE table SET attrs WHERE <filter>`; returns rows matched. An empty
  /// `attrs` only counts the matching rows.
  async fn update_where(
    &self,
    table: &str,
    attrs: &Attributes,
    filter: Vec<(&str, SqlValue)>,
  ) -> Result<u64> {
    if attrs.is_empty() {
      return self.count_where(table, filter).await;
    }

    let (columns, mut params) = encode_columns(attrs)?;
    let set_clause = columns
      .iter()
      .enumerate()
      .map(|(i, column)| format!("{column} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");

    let mut conds = Vec::with_capacity(filter.len());
    for (column, value) in filter {
      params.push(value);
      conds.push(format!("{} = ?{}", quote_ident(column), params.len()));
    }

    let sql = format!(
      "UPDATE {} SET {set_clause} WHERE {}",
      quote_ident(table),
      conds.join(" AND ")
    );

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?))
      .await?;
    Ok(changed as u64)
  }
}

fn insert_sql(table: &str, columns: &[String]) -> String {
  if columns.is_empty() {
    return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
  }
  let placeholders = (1..=columns.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "INSERT INTO {} ({}) VALUES ({placeholders})",
    quote_ident(table),
    columns.join(", ")
  )
}

/// Whether `err` is a UNIQUE or PRIMARY KEY constraint violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_record(&self, table: &str, attrs: &Attributes) -> Result<RecordId> {
    let (columns, params) = encode_columns(attrs)?;
    let sql = insert_sql(table, &columns);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  async fn update_record(
    &self,
    table: &str,
    id_attribute: &str,
    id: RecordId,
    attrs: &Attributes,
  ) -> Result<u64> {
    self
      .update_where(table, attrs, vec![(id_attribute, SqlValue::Integer(id))])
      .await
  }

  async fn fetch_record(
    &self,
    table: &str,
    id_attribute: &str,
    id: RecordId,
  ) -> Result<Option<Attributes>> {
    let sql = format!(
      "SELECT * FROM {} WHERE {} = ?1",
      quote_ident(table),
      quote_ident(id_attribute)
    );

    let raw: Option<RawRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], RawRow::from_row)
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawRow::into_attributes))
  }

  async fn delete_record(&self, table: &str, id_attribute: &str, id: RecordId) -> Result<u64> {
    let sql = format!(
      "DELETE FROM {} WHERE {} = ?1",
      quote_ident(table),
      quote_ident(id_attribute)
    );

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id])?))
      .await?;
    Ok(removed as u64)
  }
}

// ─── VariationStore impl ─────────────────────────────────────────────────────

impl VariationStore for SqliteStore {
  async fn insert_variation(&self, table: &str, row: &VariationRow) -> Result<InsertOutcome> {
    let mut attrs = row.fields.clone();
    attrs.insert(OWNER_COLUMN.to_owned(), row.owner_id.into());
    attrs.insert(LOCALE_COLUMN.to_owned(), row.locale.clone().into());

    let (columns, params) = encode_columns(&attrs)?;
    let sql = insert_sql(table, &columns);

    let outcome = self
      .conn
      .call(move |conn| {
        match conn.execute(&sql, rusqlite::params_from_iter(params.iter())) {
          Ok(_) => Ok(InsertOutcome::Inserted),
          Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Conflict),
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    Ok(outcome)
  }

  async fn update_variation(
    &self,
    table: &str,
    owner_id: RecordId,
    locale: &str,
    fields: &Attributes,
  ) -> Result<u64> {
    self
      .update_where(table, fields, vec![
        (OWNER_COLUMN, SqlValue::Integer(owner_id)),
        (LOCALE_COLUMN, SqlValue::Text(locale.to_owned())),
      ])
      .await
  }

  async fn select_variations(&self, table: &str, owner_id: RecordId) -> Result<Vec<VariationRow>> {
    let sql = format!(
      "SELECT * FROM {} WHERE {} = ?1 ORDER BY {}",
      quote_ident(table),
      quote_ident(OWNER_COLUMN),
      quote_ident(LOCALE_COLUMN)
    );

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id], RawRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_variation(table)).collect()
  }
}
