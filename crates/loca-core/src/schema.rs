//! Declarative attribute validation.
//!
//! A [`Schema`] is checked before any write reaches a store. Patches are
//! validated with absent keys relaxed to optional; full saves must satisfy
//! every required key. Values are coerced where the input is unambiguous
//! (`"42"` for an integer field, `"true"` for a boolean field) and the
//! coerced values are what gets persisted.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Attributes, Value};

// ─── Rules ───────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
  String,
  Integer,
  Number,
  Boolean,
  #[default]
  Any,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
  #[serde(default)]
  pub kind:       FieldKind,
  #[serde(default)]
  pub required:   bool,
  #[serde(default)]
  pub nullable:   bool,
  /// Maximum length in characters; only meaningful for string fields.
  #[serde(default)]
  pub max_length: Option<usize>,
}

impl FieldRule {
  pub fn new(kind: FieldKind) -> Self { Self { kind, ..Self::default() } }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  pub fn max_length(mut self, max: usize) -> Self {
    self.max_length = Some(max);
    self
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
  fields: BTreeMap<String, FieldRule>,
}

impl Schema {
  pub fn new() -> Self { Self::default() }

  pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
    self.fields.insert(name.into(), rule);
    self
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.fields.keys().map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool { self.fields.contains_key(name) }

  /// Validate `attrs`, returning the coerced attribute set.
  ///
  /// With `relax_absent` every key missing from `attrs` is treated as
  /// optional, so only the keys actually present are checked.
  pub fn validate(
    &self,
    attrs: &Attributes,
    relax_absent: bool,
  ) -> Result<Attributes, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut out = Attributes::new();

    for key in attrs.keys().filter(|k| !self.fields.contains_key(*k)) {
      issues.push(ValidationIssue::new(key, IssueKind::Unknown));
    }

    for (name, rule) in &self.fields {
      match attrs.get(name) {
        None => {
          if rule.required && !relax_absent {
            issues.push(ValidationIssue::new(name, IssueKind::Missing));
          }
        }
        Some(value) => match check(rule, value) {
          Ok(coerced) => {
            out.insert(name.clone(), coerced);
          }
          Err(kind) => issues.push(ValidationIssue::new(name, kind)),
        },
      }
    }

    if issues.is_empty() { Ok(out) } else { Err(issues) }
  }
}

fn check(rule: &FieldRule, value: &Value) -> Result<Value, IssueKind> {
  if value.is_null() {
    return if rule.nullable { Ok(Value::Null) } else { Err(IssueKind::Null) };
  }

  let coerced = match (rule.kind, value) {
    (FieldKind::Any, v) => v.clone(),
    (FieldKind::String, Value::String(s)) => {
      if let Some(max) = rule.max_length
        && s.chars().count() > max
      {
        return Err(IssueKind::TooLong { max });
      }
      Value::String(s.clone())
    }
    (FieldKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
      Value::Number(n.clone())
    }
    (FieldKind::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
      Ok(i) => Value::from(i),
      Err(_) => return Err(IssueKind::WrongType { expected: rule.kind }),
    },
    (FieldKind::Number, Value::Number(n)) => Value::Number(n.clone()),
    (FieldKind::Number, Value::String(s)) => {
      match s.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(n) => Value::Number(n),
        None => return Err(IssueKind::WrongType { expected: rule.kind }),
      }
    }
    (FieldKind::Boolean, Value::Bool(b)) => Value::Bool(*b),
    // Storage backends without a boolean class hand booleans back as 0/1.
    (FieldKind::Boolean, Value::Number(n)) => match n.as_i64() {
      Some(0) => Value::Bool(false),
      Some(1) => Value::Bool(true),
      _ => return Err(IssueKind::WrongType { expected: rule.kind }),
    },
    (FieldKind::Boolean, Value::String(s)) if s == "true" => Value::Bool(true),
    (FieldKind::Boolean, Value::String(s)) if s == "false" => Value::Bool(false),
    _ => return Err(IssueKind::WrongType { expected: rule.kind }),
  };

  Ok(coerced)
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum IssueKind {
  Missing,
  Unknown,
  Null,
  WrongType { expected: FieldKind },
  TooLong { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
  pub field: String,
  #[serde(flatten)]
  pub kind:  IssueKind,
}

impl ValidationIssue {
  fn new(field: &str, kind: IssueKind) -> Self {
    Self { field: field.to_owned(), kind }
  }
}

impl fmt::Display for ValidationIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      IssueKind::Missing => write!(f, "{:?} is required", self.field),
      IssueKind::Unknown => write!(f, "{:?} is not allowed", self.field),
      IssueKind::Null => write!(f, "{:?} must not be null", self.field),
      IssueKind::WrongType { expected } => {
        write!(f, "{:?} must be a {expected}", self.field)
      }
      IssueKind::TooLong { max } => {
        write!(f, "{:?} must be at most {max} characters", self.field)
      }
    }
  }
}

/// A failed validation, tagged with the table of the record being saved.
#[derive(Debug, Clone, Error)]
#[error("validation failed for {table:?}: {}", join_issues(.issues))]
pub struct ValidationError {
  pub table:  String,
  pub issues: Vec<ValidationIssue>,
}

fn join_issues(issues: &[ValidationIssue]) -> String {
  issues
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}
