//! Fitted artifacts and the inference pipeline over them

pub mod classifier;
pub mod encoders;
pub mod inference;
pub mod loader;
pub mod scaler;

pub use classifier::{ClassScore, Classifier, LogisticRegression};
pub use encoders::{EncoderSet, LabelEncoder};
pub use inference::InferenceEngine;
pub use loader::{ArtifactLoader, Artifacts};
pub use scaler::Scaler;
