//! Error types for artifact loading and per-request prediction.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading or cross-checking the fitted artifacts at startup.
///
/// Any of these leaves the service in the degraded state: it keeps serving
/// `/` and `/health`, but refuses every prediction until restarted.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoder for column '{column}' has no known classes")]
    EmptyEncoder { column: String },

    #[error("encoder for column '{column}' lists class '{class}' more than once")]
    DuplicateClass { column: String, class: String },

    #[error("scaler defines no feature names")]
    EmptySchema,

    #[error("feature '{0}' appears more than once in the scaler schema")]
    DuplicateFeature(String),

    #[error("encoded column '{0}' is not part of the scaler schema")]
    UnknownEncodedColumn(String),

    #[error("{artifact} expects {actual} features but the schema has {expected}")]
    WidthMismatch {
        artifact: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("classifier backend error: {0}")]
    Backend(String),
}

/// Failure while scoring a single record. Never outlives the request.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("expected a JSON object of feature values, got {0}")]
    NotAnObject(&'static str),

    #[error("could not convert string to float: '{value}' (feature '{feature}')")]
    NotNumeric { feature: String, value: String },

    #[error("feature '{feature}' is null")]
    NullValue { feature: String },

    #[error("feature '{feature}' must be a scalar, got {kind}")]
    NotScalar { feature: String, kind: &'static str },

    #[error("feature '{feature}' is not finite after scaling")]
    NonFinite { feature: String },

    #[error("expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("classifier failed: {0}")]
    Classifier(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = PredictError::NotNumeric {
            feature: "claim_amount".to_string(),
            value: "lots".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not convert string to float: 'lots' (feature 'claim_amount')"
        );

        let err = LoadError::WidthMismatch {
            artifact: "classifier",
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "classifier expects 3 features but the schema has 4"
        );
    }
}
