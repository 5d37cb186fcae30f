//! Field sets and request schema validation

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A request field and the template placeholder it fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Name of the field in the JSON request body
    pub field: &'static str,
    /// Key inside `{{...}}` in the template
    pub placeholder: &'static str,
}

impl FieldSpec {
    /// A field whose placeholder carries the same name
    pub const fn same(name: &'static str) -> Self {
        Self {
            field: name,
            placeholder: name,
        }
    }

    pub const fn mapped(field: &'static str, placeholder: &'static str) -> Self {
        Self { field, placeholder }
    }
}

/// Placeholder key to replacement value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<String, String>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert a possibly-absent value; `None` fills the placeholder with `""`.
    pub fn insert_optional(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value.unwrap_or_default());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A request body that does not match a document schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe(.missing, .not_strings))]
pub struct SchemaError {
    pub missing: Vec<String>,
    pub not_strings: Vec<String>,
}

fn describe(missing: &[String], not_strings: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing required fields: {}", missing.join(", ")));
    }
    if !not_strings.is_empty() {
        parts.push(format!("fields must be strings: {}", not_strings.join(", ")));
    }
    parts.join("; ")
}

/// Build a field set from a JSON object according to `specs`.
///
/// Every field is required. Values must be JSON strings; `null` is accepted
/// and fills the placeholder with an empty string. Fields not named in
/// `specs` are ignored.
pub fn extract_fields(specs: &[FieldSpec], body: &Map<String, Value>) -> Result<FieldSet, SchemaError> {
    let mut fields = FieldSet::new();
    let mut missing = Vec::new();
    let mut not_strings = Vec::new();

    for spec in specs {
        match body.get(spec.field) {
            None => missing.push(spec.field.to_string()),
            Some(Value::String(value)) => fields.insert(spec.placeholder, value.as_str()),
            Some(Value::Null) => fields.insert_optional(spec.placeholder, None),
            Some(_) => not_strings.push(spec.field.to_string()),
        }
    }

    if missing.is_empty() && not_strings.is_empty() {
        Ok(fields)
    } else {
        Err(SchemaError {
            missing,
            not_strings,
        })
    }
}
