//! Inference pipeline: record in, fraud verdict out

use crate::errors::PredictError;
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::Artifacts;
use crate::types::{InputRecord, Verdict};
use tracing::debug;

/// Stateless scorer over one immutable set of artifacts.
///
/// Every call is a pure function of the artifacts and the record, so a
/// single engine is shared by all request tasks.
#[derive(Debug)]
pub struct InferenceEngine {
    artifacts: Artifacts,
}

impl InferenceEngine {
    pub fn new(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }

    /// Ordered feature names the classifier expects
    pub fn feature_names(&self) -> &[String] {
        self.artifacts.feature_names()
    }

    pub fn classifier_name(&self) -> &str {
        self.artifacts.classifier.name()
    }

    /// Align, scale and classify one record.
    pub fn predict(&self, record: InputRecord) -> Result<Verdict, PredictError> {
        let extractor =
            FeatureExtractor::new(&self.artifacts.encoders, self.artifacts.feature_names());
        let mut features = extractor.extract(record)?;

        self.artifacts.scaler.transform(&mut features)?;

        let score = self.artifacts.classifier.predict(&features)?;
        let verdict = Verdict::new(score.label, score.fraud_probability());

        debug!(
            prediction = verdict.prediction,
            probability = verdict.probability,
            "Record scored"
        );

        Ok(verdict)
    }
}
