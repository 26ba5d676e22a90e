//! Record types known to the server, keyed by table name.

use std::{collections::BTreeMap, sync::Arc};

use loca_core::{RecordType, schema::Schema};
use serde::Deserialize;

/// One `[[record_types]]` entry of the server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct RecordTypeConfig {
  pub table:             String,
  #[serde(default)]
  pub translatable:      Vec<String>,
  #[serde(default)]
  pub columns:           Vec<String>,
  pub translation_table: Option<String>,
  pub id_attribute:      Option<String>,
  pub default_locale:    Option<String>,
  pub schema:            Option<Schema>,
}

impl RecordTypeConfig {
  pub fn build(&self) -> loca_core::Result<RecordType> {
    let mut builder = RecordType::builder(&self.table)
      .translatable(&self.translatable)
      .columns(&self.columns);
    if let Some(name) = &self.translation_table {
      builder = builder.translation_table(name);
    }
    if let Some(id) = &self.id_attribute {
      builder = builder.id_attribute(id);
    }
    if let Some(locale) = &self.default_locale {
      builder = builder.default_locale(locale);
    }
    if let Some(schema) = &self.schema {
      builder = builder.schema(schema.clone());
    }
    builder.build()
  }
}

#[derive(Debug, Default)]
pub struct Registry {
  types: BTreeMap<String, Arc<RecordType>>,
}

impl Registry {
  pub fn new() -> Self { Self::default() }

  pub fn register(&mut self, kind: RecordType) -> Arc<RecordType> {
    let kind = Arc::new(kind);
    self.types.insert(kind.table_name().to_owned(), Arc::clone(&kind));
    kind
  }

  pub fn from_configs(configs: &[RecordTypeConfig]) -> loca_core::Result<Self> {
    let mut registry = Self::new();
    for config in configs {
      registry.register(config.build()?);
    }
    Ok(registry)
  }

  pub fn get(&self, table: &str) -> Option<&Arc<RecordType>> { self.types.get(table) }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordType>> { self.types.values() }
}
