//! Insurance Fraud Scoring Service
//!
//! Scores single claim records for fraud likelihood using pre-trained
//! artifacts: categorical label encoders, a feature scaler that also fixes
//! the feature schema, and a binary classifier.

pub mod config;
pub mod errors;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use errors::{LoadError, PredictError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use models::loader::{ArtifactLoader, Artifacts};
pub use server::{router, AppState};
pub use types::{InputRecord, Verdict};
