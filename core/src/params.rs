//! Request parameters and their two wire shapes.
//!
//! `Params` is an insertion-ordered JSON map. Form encoding keeps nested
//! values and flattens them with bracket keys; multipart encoding keeps only
//! top-level scalars.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Parameters of a single call, keyed by field name in insertion order.
pub type Params = Map<String, Value>;

/// How `send` encodes the active parameter set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamsEncoding {
    #[default]
    Form,
    Multipart,
}

/// One named section of a multipart body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipartPart {
    pub name: String,
    pub contents: Value,
}

impl MultipartPart {
    /// Text placed on the wire for this part.
    pub fn contents_text(&self) -> String {
        match &self.contents {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => number_text(n),
            other => other.to_string(),
        }
    }
}

/// Render a number the way form fields carry it: integral floats lose
/// their fraction (`1.0` -> `"1"`).
pub fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Shallow merge of `params` over `defaults`.
///
/// Keys already present in `defaults` keep their position and take the
/// per-call value; new keys are appended in the order they appear in `params`.
pub fn merge_params(defaults: &Params, params: Params) -> Params {
    let mut merged = defaults.clone();
    for (key, value) in params {
        merged.insert(key, value);
    }
    merged
}

/// Flatten parameters into form fields.
///
/// Nested objects become `key[inner]`, arrays become `key[0]`, `key[1]`, ...
/// Null values and empty containers produce no field.
pub fn form_fields(params: &Params) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for (key, value) in params {
        push_form_field(&mut fields, key.clone(), value);
    }
    fields
}

fn push_form_field(fields: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => fields.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => fields.push((key, number_text(n))),
        Value::String(s) => fields.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_form_field(fields, format!("{key}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (inner, item) in map {
                push_form_field(fields, format!("{key}[{inner}]"), item);
            }
        }
    }
}

/// Convert parameters into multipart sections, one per scalar top-level key.
///
/// Keys holding arrays or objects are skipped entirely.
pub fn multipart_parts(params: &Params) -> Vec<MultipartPart> {
    params
        .iter()
        .filter(|(_, value)| !value.is_array() && !value.is_object())
        .map(|(name, contents)| MultipartPart {
            name: name.clone(),
            contents: contents.clone(),
        })
        .collect()
}
