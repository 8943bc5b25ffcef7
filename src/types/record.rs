//! Input record handling: a flat JSON object of feature name to raw value.

use crate::errors::PredictError;
use serde_json::{Map, Value};

/// One caller-supplied record, keyed by feature name.
///
/// Values stay raw JSON until the pipeline decides whether a column is
/// categorical (encoded through its label string) or numeric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    fields: Map<String, Value>,
}

impl InputRecord {
    /// Parse a request body. Anything other than a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, PredictError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, PredictError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(PredictError::NotAnObject(kind_of(&other))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Render a raw value as the label string an encoder was fitted on.
///
/// Training stringified every categorical cell, so numbers use their
/// decimal form, booleans `True`/`False` and null `None`. Arrays and
/// objects render as their JSON text, which falls through to the encoder's
/// fallback like any other unseen label.
pub fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Coerce a raw value into the numeric cell the scaler consumes.
pub fn numeric_of(feature: &str, value: &Value) -> Result<f64, PredictError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| PredictError::NotNumeric {
            feature: feature.to_string(),
            value: n.to_string(),
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| PredictError::NotNumeric {
                feature: feature.to_string(),
                value: s.clone(),
            }),
        Value::Null => Err(PredictError::NullValue {
            feature: feature.to_string(),
        }),
        other => Err(PredictError::NotScalar {
            feature: feature.to_string(),
            kind: kind_of(other),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
