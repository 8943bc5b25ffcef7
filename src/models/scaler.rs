//! Fitted feature scaler. Also owns the canonical feature schema.

use crate::errors::{LoadError, PredictError};
use serde::Deserialize;
use std::collections::HashSet;

/// Fitted transform parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerKind {
    /// `(x - mean) / scale`; either part may be absent when it was disabled at fit time
    Standard {
        #[serde(default)]
        mean: Option<Vec<f64>>,
        #[serde(default)]
        scale: Option<Vec<f64>>,
    },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

/// On-disk form of `scaler.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerDocument {
    pub feature_names_in: Vec<String>,
    #[serde(flatten)]
    pub kind: ScalerKind,
}

/// Scaler keyed to an ordered feature schema
#[derive(Debug, Clone)]
pub struct Scaler {
    feature_names: Vec<String>,
    kind: ScalerKind,
}

impl Scaler {
    /// Validate a parsed document: non-empty unique schema, parameters as wide as the schema.
    pub fn from_document(document: ScalerDocument) -> Result<Self, LoadError> {
        let ScalerDocument {
            feature_names_in: feature_names,
            kind,
        } = document;

        if feature_names.is_empty() {
            return Err(LoadError::EmptySchema);
        }

        let mut seen = HashSet::with_capacity(feature_names.len());
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(LoadError::DuplicateFeature(name.clone()));
            }
        }

        let expected = feature_names.len();
        let widths: Vec<usize> = match &kind {
            ScalerKind::Standard { mean, scale } => mean
                .iter()
                .chain(scale.iter())
                .map(Vec::len)
                .collect(),
            ScalerKind::MinMax { min, scale } => vec![min.len(), scale.len()],
        };
        if let Some(&actual) = widths.iter().find(|&&w| w != expected) {
            return Err(LoadError::WidthMismatch {
                artifact: "scaler",
                expected,
                actual,
            });
        }

        Ok(Self {
            feature_names,
            kind,
        })
    }

    /// Feature names in the order the classifier expects them
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Scale an ordered feature vector in place.
    pub fn transform(&self, features: &mut [f64]) -> Result<(), PredictError> {
        if features.len() != self.feature_count() {
            return Err(PredictError::Shape {
                expected: self.feature_count(),
                actual: features.len(),
            });
        }

        match &self.kind {
            ScalerKind::Standard { mean, scale } => {
                if let Some(mean) = mean {
                    for (x, m) in features.iter_mut().zip(mean) {
                        *x -= m;
                    }
                }
                if let Some(scale) = scale {
                    for (x, &s) in features.iter_mut().zip(scale) {
                        // zero-variance columns were fitted with unit scale
                        *x /= if s == 0.0 { 1.0 } else { s };
                    }
                }
            }
            ScalerKind::MinMax { min, scale } => {
                for ((x, m), s) in features.iter_mut().zip(min).zip(scale) {
                    *x = *x * s + m;
                }
            }
        }

        if let Some(i) = features.iter().position(|x| !x.is_finite()) {
            return Err(PredictError::NonFinite {
                feature: self.feature_names[i].clone(),
            });
        }

        Ok(())
    }
}
