//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use loca_core::{
  Attributes, LocalizedRecord, RecordType, Value,
  schema::{FieldKind, FieldRule, Schema},
  store::{
    InsertOutcome, RecordStore, SaveMethod, SaveOptions, VariationRow, VariationStore,
  },
};
use serde_json::json;

use crate::{Error, SqliteStore};

fn kind() -> Arc<RecordType> {
  Arc::new(
    RecordType::builder("translatable_table")
      .translatable(["attrOne", "attrTwo", "attrThree"])
      .columns(["name"])
      .build()
      .expect("record type"),
  )
}

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.ensure_record_type(&kind()).await.expect("tables");
  s
}

fn attrs(v: Value) -> Attributes {
  match v {
    Value::Object(map) => map,
    other => panic!("expected an object, got {other}"),
  }
}

fn s(v: &str) -> Value { Value::String(v.into()) }

// ─── Bootstrap ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_record_type_is_idempotent() {
  let st = store().await;
  st.ensure_record_type(&kind()).await.unwrap();
}

#[tokio::test]
async fn plain_types_get_no_translation_table() {
  let st = store().await;
  let plain = RecordType::builder("plain").columns(["name"]).build().unwrap();
  st.ensure_record_type(&plain).await.unwrap();

  let err = st.select_variations("plain_locale", 1).await.unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
}

// ─── Base records ────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_fetch_update_delete_record() {
  let st = store().await;

  let id = st
    .insert_record("translatable_table", &attrs(json!({ "name": "test" })))
    .await
    .unwrap();
  let row = st.fetch_record("translatable_table", "id", id).await.unwrap().unwrap();
  assert_eq!(Value::Object(row), json!({ "id": id, "name": "test" }));

  let matched = st
    .update_record("translatable_table", "id", id, &attrs(json!({ "name": "renamed" })))
    .await
    .unwrap();
  assert_eq!(matched, 1);

  let missing = st
    .update_record("translatable_table", "id", id + 1, &attrs(json!({ "name": "x" })))
    .await
    .unwrap();
  assert_eq!(missing, 0);

  assert_eq!(st.delete_record("translatable_table", "id", id).await.unwrap(), 1);
  assert!(st.fetch_record("translatable_table", "id", id).await.unwrap().is_none());
}

#[tokio::test]
async fn empty_insert_uses_defaults() {
  let st = store().await;
  let id = st.insert_record("translatable_table", &Attributes::new()).await.unwrap();
  let row = st.fetch_record("translatable_table", "id", id).await.unwrap().unwrap();
  assert_eq!(row["name"], Value::Null);
}

#[tokio::test]
async fn values_keep_their_storage_class() {
  let st = store().await;
  let mixed = RecordType::builder("mixed")
    .columns(["n", "f", "b", "t", "j"])
    .build()
    .unwrap();
  st.ensure_record_type(&mixed).await.unwrap();

  let id = st
    .insert_record(
      "mixed",
      &attrs(json!({ "n": 7, "f": 1.5, "b": true, "t": "text", "j": { "k": [1, 2] } })),
    )
    .await
    .unwrap();
  let row = st.fetch_record("mixed", "id", id).await.unwrap().unwrap();

  assert_eq!(row["n"], json!(7));
  assert_eq!(row["f"], json!(1.5));
  assert_eq!(row["b"], json!(1));
  assert_eq!(row["t"], json!("text"));
  assert_eq!(row["j"], json!("{\"k\":[1,2]}"));
}

#[tokio::test]
async fn unsigned_overflow_is_rejected() {
  let st = store().await;
  let err = st
    .insert_record("translatable_table", &attrs(json!({ "name": u64::MAX })))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::IntegerOutOfRange { ref column, value } if column == "name" && value == u64::MAX
  ));
  assert!(
    st.fetch_record("translatable_table", "id", 1).await.unwrap().is_none()
  );
}

// ─── Translation rows ────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_variation_insert_is_a_conflict() {
  let st = store().await;
  let id = st.insert_record("translatable_table", &Attributes::new()).await.unwrap();
  let row = VariationRow {
    owner_id: id,
    locale:   "en".into(),
    fields:   attrs(json!({ "attrOne": "a" })),
  };

  let table = "translatable_table_locale";
  assert_eq!(st.insert_variation(table, &row).await.unwrap(), InsertOutcome::Inserted);
  assert_eq!(st.insert_variation(table, &row).await.unwrap(), InsertOutcome::Conflict);
}

#[tokio::test]
async fn variation_for_missing_owner_is_an_error() {
  let st = store().await;
  let row = VariationRow {
    owner_id: 404,
    locale:   "en".into(),
    fields:   attrs(json!({ "attrOne": "a" })),
  };
  let err = st
    .insert_variation("translatable_table_locale", &row)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
}

#[tokio::test]
async fn select_strips_key_columns() {
  let st = store().await;
  let id = st.insert_record("translatable_table", &Attributes::new()).await.unwrap();
  for locale in ["en", "de"] {
    let row = VariationRow {
      owner_id: id,
      locale:   locale.into(),
      fields:   attrs(json!({ "attrOne": format!("1:{locale}") })),
    };
    st.insert_variation("translatable_table_locale", &row).await.unwrap();
  }

  let rows = st.select_variations("translatable_table_locale", id).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].locale, "de");
  assert_eq!(rows[0].owner_id, id);
  assert_eq!(
    Value::Object(rows[0].fields.clone()),
    json!({ "attrOne": "1:de", "attrTwo": null, "attrThree": null })
  );
}

// ─── Localized records end to end ────────────────────────────────────────────

#[tokio::test]
async fn round_trip_across_locales() {
  let st = store().await;

  let mut record = LocalizedRecord::new(kind());
  record.set_many(attrs(json!({
    "attrOne": "1: English version",
    "attrTwo": "2: English version",
    "attrThree": "3: English version",
    "name": "test",
  })));
  record.save(&st, Attributes::new(), SaveOptions::default()).await.unwrap();
  let id = record.id().expect("id assigned");

  let mut loaded = LocalizedRecord::find(&st, kind(), id).await.unwrap().unwrap();
  assert_eq!(loaded.get("name"), Some(&s("test")));
  for field in ["attrOne", "attrTwo", "attrThree"] {
    assert_eq!(loaded.get(field), record.get(field));
  }

  loaded.set_locale("de");
  loaded
    .save(
      &st,
      attrs(json!({
        "attrOne": "1: Deutsch version",
        "attrTwo": "2: Deutsch version",
        "attrThree": "3: Deutsch version",
      })),
      SaveOptions::default(),
    )
    .await
    .unwrap();

  let mut reloaded = LocalizedRecord::find(&st, kind(), id).await.unwrap().unwrap();
  assert_eq!(reloaded.get("attrOne"), Some(&s("1: English version")));
  assert_eq!(reloaded.get("attrThree"), Some(&s("3: English version")));
  reloaded.set_locale("de");
  assert_eq!(reloaded.get("attrOne"), Some(&s("1: Deutsch version")));
  assert_eq!(reloaded.get("attrTwo"), Some(&s("2: Deutsch version")));
  assert_eq!(reloaded.get("attrThree"), Some(&s("3: Deutsch version")));
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
  let st = store().await;

  let mut record = LocalizedRecord::new(kind());
  record.set_many(attrs(json!({
    "attrOne": "1: English version",
    "attrTwo": "2: English version",
    "attrThree": "3: English version",
    "name": "test",
  })));
  record.save(&st, Attributes::new(), SaveOptions::default()).await.unwrap();
  let id = record.id().unwrap();

  let mut patcher = LocalizedRecord::new(kind());
  patcher.set("id", json!(id));
  patcher
    .save(
      &st,
      attrs(json!({
        "attrOne": "1: English version 2",
        "attrTwo": "2: English version 2",
      })),
      SaveOptions::patch(),
    )
    .await
    .unwrap();

  let reloaded = LocalizedRecord::find(&st, kind(), id).await.unwrap().unwrap();
  assert_eq!(reloaded.get("attrOne"), Some(&s("1: English version 2")));
  assert_eq!(reloaded.get("attrTwo"), Some(&s("2: English version 2")));
  assert_eq!(reloaded.get("attrThree"), Some(&s("3: English version")));
  assert_eq!(reloaded.get("name"), Some(&s("test")));
}

#[tokio::test]
async fn repeated_saves_keep_one_row_per_locale() {
  let st = store().await;

  let mut record = LocalizedRecord::new(kind());
  record.set("attrOne", s("same"));
  record.save(&st, Attributes::new(), SaveOptions::default()).await.unwrap();
  record.save(&st, Attributes::new(), SaveOptions::default()).await.unwrap();
  record.save_field(&st, "attrOne", s("same"), SaveOptions::patch()).await.unwrap();

  let rows = st
    .select_variations("translatable_table_locale", record.id().unwrap())
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].fields["attrOne"], s("same"));
}

#[tokio::test]
async fn destroy_cascades_to_translations() {
  let st = store().await;

  let mut record = LocalizedRecord::new(kind());
  record.set("attrOne", s("en"));
  record.set_translation_for_locale("attrOne", "de", s("de"));
  record.save(&st, Attributes::new(), SaveOptions::default()).await.unwrap();
  let id = record.id().unwrap();

  assert!(record.destroy(&st).await.unwrap());
  assert!(
    st.select_variations("translatable_table_locale", id)
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn serialize_after_fetch_uses_fallback() {
  let st = store().await;

  let mut record = LocalizedRecord::new(kind());
  record.set_many(attrs(json!({ "attrOne": "1:en", "name": "test" })));
  record.save(&st, Attributes::new(), SaveOptions::default()).await.unwrap();
  let id = record.id().unwrap();

  let mut loaded = LocalizedRecord::new_in_locale(kind(), "it");
  loaded.set("id", json!(id));
  assert!(loaded.fetch(&st).await.unwrap());

  let out = loaded.serialize();
  assert_eq!(out["attrOne"], s("1:en"));
  assert_eq!(out["name"], s("test"));
  // Stored as NULL in the "en" row, so present but null.
  assert_eq!(out["attrTwo"], Value::Null);
}

#[tokio::test]
async fn boolean_fields_survive_fetch_and_resave() {
  let st = store().await;
  let flags = Arc::new(
    RecordType::builder("flags")
      .translatable(["title"])
      .columns(["visible"])
      .schema(
        Schema::new()
          .field("visible", FieldRule::new(FieldKind::Boolean).required())
          .field("title", FieldRule::new(FieldKind::String)),
      )
      .build()
      .unwrap(),
  );
  st.ensure_record_type(&flags).await.unwrap();

  let mut r = LocalizedRecord::new(Arc::clone(&flags));
  r.save(&st, attrs(json!({ "visible": true, "title": "t" })), SaveOptions::default())
    .await
    .unwrap();
  let id = r.id().unwrap();

  let mut fetched = LocalizedRecord::find(&st, Arc::clone(&flags), id)
    .await
    .unwrap()
    .unwrap();
  fetched
    .save(&st, Attributes::new(), SaveOptions::method(SaveMethod::Update))
    .await
    .unwrap();
  assert_eq!(fetched.get("visible"), Some(&json!(true)));

  fetched
    .save(&st, attrs(json!({ "visible": false })), SaveOptions::patch())
    .await
    .unwrap();
  let row = st.fetch_record("flags", "id", id).await.unwrap().unwrap();
  assert_eq!(row["visible"], json!(0));
}
