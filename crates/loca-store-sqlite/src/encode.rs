//! Conversions between JSON attribute values and SQLite values.
//!
//! Nulls, integers, reals, and text map onto their storage classes directly.
//! Booleans are stored as 0/1; arrays and objects as compact JSON text. Blobs
//! read back as arrays of byte values. Unsigned integers above `i64::MAX`
//! cannot be stored.

use loca_core::{
  Attributes, Value,
  record_type::{LOCALE_COLUMN, OWNER_COLUMN},
  store::VariationRow,
};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

// ─── Values ──────────────────────────────────────────────────────────────────

/// Encode one attribute. Integers beyond the range of SQLite's 64-bit signed
/// integer are rejected rather than stored as lossy reals.
pub fn encode_value(column: &str, value: &Value) -> Result<SqlValue> {
  Ok(match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
      (Some(i), _, _) => SqlValue::Integer(i),
      (None, Some(u), _) => {
        return Err(Error::IntegerOutOfRange { column: column.to_owned(), value: u });
      }
      (None, None, f) => f.map_or(SqlValue::Null, SqlValue::Real),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  })
}

pub fn decode_value(value: SqlValue) -> Value {
  match value {
    SqlValue::Null => Value::Null,
    SqlValue::Integer(i) => Value::from(i),
    SqlValue::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
    SqlValue::Text(s) => Value::String(s),
    SqlValue::Blob(bytes) => Value::Array(bytes.into_iter().map(Value::from).collect()),
  }
}

/// Split an attribute map into quoted column names and encoded values, in
/// matching order.
pub fn encode_columns(attrs: &Attributes) -> Result<(Vec<String>, Vec<SqlValue>)> {
  let mut columns = Vec::with_capacity(attrs.len());
  let mut values = Vec::with_capacity(attrs.len());
  for (name, value) in attrs {
    values.push(encode_value(name, value)?);
    columns.push(quote_ident(name));
  }
  Ok((columns, values))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A row read with `SELECT *`, as `(column, value)` pairs.
pub struct RawRow {
  pub columns: Vec<(String, SqlValue)>,
}

impl RawRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let names: Vec<String> = row
      .as_ref()
      .column_names()
      .into_iter()
      .map(str::to_owned)
      .collect();
    let columns = names
      .into_iter()
      .enumerate()
      .map(|(i, name)| Ok((name, row.get::<_, SqlValue>(i)?)))
      .collect::<rusqlite::Result<_>>()?;
    Ok(Self { columns })
  }

  pub fn into_attributes(self) -> Attributes {
    self
      .columns
      .into_iter()
      .map(|(name, value)| (name, decode_value(value)))
      .collect()
  }

  /// Separate the key columns of a translation row from its field values.
  pub fn into_variation(self, table: &str) -> Result<VariationRow> {
    let mut fields = self.into_attributes();
    let malformed = |reason: &str| Error::MalformedRow {
      table:  table.to_owned(),
      reason: reason.to_owned(),
    };

    let owner_id = fields
      .remove(OWNER_COLUMN)
      .and_then(|v| v.as_i64())
      .ok_or_else(|| malformed("owner_id is not an integer"))?;
    let locale = match fields.remove(LOCALE_COLUMN) {
      Some(Value::String(locale)) => locale,
      _ => return Err(malformed("locale is not text")),
    };

    Ok(VariationRow { owner_id, locale, fields })
  }
}
