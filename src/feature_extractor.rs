//! Aligns an input record to the training feature schema.
//!
//! This covers the pre-scaling half of the pipeline: categorical labels are
//! normalized and encoded, missing schema columns are filled with zero, and
//! the record is projected onto the schema in schema order.

use crate::errors::PredictError;
use crate::models::encoders::EncoderSet;
use crate::types::record::{label_of, numeric_of, InputRecord};
use serde_json::Value;
use tracing::debug;

/// Value given to schema columns the caller did not supply
pub const MISSING_FEATURE_DEFAULT: f64 = 0.0;

/// Feature extractor that turns records into classifier-ordered vectors.
pub struct FeatureExtractor<'a> {
    encoders: &'a EncoderSet,
    schema: &'a [String],
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(encoders: &'a EncoderSet, schema: &'a [String]) -> Self {
        Self { encoders, schema }
    }

    /// Replace every encoded column's raw value with its integer code.
    ///
    /// Labels the encoder never saw become its first class before encoding,
    /// so this step cannot fail. Columns missing from the record are left alone.
    pub fn encode_categoricals(&self, record: &mut InputRecord) {
        for (column, encoder) in self.encoders.iter() {
            let Some(raw) = record.get(column) else {
                continue;
            };

            let label = label_of(raw);
            if !encoder.is_known(&label) {
                debug!(
                    column,
                    label = %label,
                    fallback = encoder.fallback_class(),
                    "Unseen category, using fallback class"
                );
            }
            let code = encoder.encode(&label);
            record.insert(column, Value::from(code));
        }
    }

    /// Insert the default for every schema column absent from the record.
    pub fn complete_schema(&self, record: &mut InputRecord) {
        for feature in self.schema {
            if !record.contains(feature) {
                record.insert(feature.as_str(), Value::from(MISSING_FEATURE_DEFAULT));
            }
        }
    }

    /// Project onto the schema in schema order, dropping extra fields.
    pub fn reorder(&self, record: &InputRecord) -> Result<Vec<f64>, PredictError> {
        self.schema
            .iter()
            .map(|feature| match record.get(feature) {
                Some(value) => numeric_of(feature, value),
                None => Ok(MISSING_FEATURE_DEFAULT),
            })
            .collect()
    }

    /// Run all alignment steps on an owned record.
    pub fn extract(&self, mut record: InputRecord) -> Result<Vec<f64>, PredictError> {
        self.encode_categoricals(&mut record);
        self.complete_schema(&mut record);
        self.reorder(&record)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }
}
