//! DDL for record tables and their translation tables.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`; existing tables are
//! never altered. Columns other than the keys are declared without a type so
//! SQLite stores each value with its own storage class.

use loca_core::{
  RecordType,
  record_type::{LOCALE_COLUMN, OWNER_COLUMN},
};

use crate::encode::quote_ident;

/// Connection-level settings applied once at startup.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// `CREATE TABLE` for the base table of `kind`.
pub fn base_table_ddl(kind: &RecordType) -> String {
  let mut columns = vec![format!(
    "{} INTEGER PRIMARY KEY AUTOINCREMENT",
    quote_ident(kind.id_attribute())
  )];
  columns.extend(
    kind
      .columns()
      .filter(|c| *c != kind.id_attribute())
      .map(quote_ident),
  );

  format!(
    "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
    quote_ident(kind.table_name()),
    columns.join(",\n    ")
  )
}

/// `CREATE TABLE` for the translation table of `kind`: one row per
/// `(owner_id, locale)`, removed together with the owning row.
pub fn translation_table_ddl(kind: &RecordType) -> String {
  let owner = quote_ident(OWNER_COLUMN);
  let locale = quote_ident(LOCALE_COLUMN);

  let mut columns = vec![
    format!(
      "{owner} INTEGER NOT NULL REFERENCES {}({}) ON DELETE CASCADE",
      quote_ident(kind.table_name()),
      quote_ident(kind.id_attribute())
    ),
    format!("{locale} TEXT NOT NULL"),
  ];
  columns.extend(kind.translatable_fields().map(quote_ident));
  columns.push(format!("UNIQUE ({owner}, {locale})"));

  format!(
    "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
    quote_ident(kind.translation_table_name()),
    columns.join(",\n    ")
  )
}
