//! Fraud verdict returned for a scored record

use serde::{Deserialize, Serialize};

/// Human-readable verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Genuine,
    Fraudulent,
}

impl Status {
    /// Map a predicted class to its label (1 = fraudulent)
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Status::Fraudulent
        } else {
            Status::Genuine
        }
    }
}

/// Outcome of one pass through the inference pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Predicted class (0 = genuine, 1 = fraudulent)
    pub prediction: u8,

    /// Probability assigned to the fraudulent class (0.0 - 1.0)
    pub probability: f64,

    /// Whether the predicted class is fraudulent
    pub is_fraud: bool,

    /// `probability` expressed as a percentage
    pub fraud_probability_percentage: f64,

    /// Verdict label matching `is_fraud`
    pub status: Status,
}

impl Verdict {
    /// Assemble a verdict from the classifier output.
    ///
    /// Every derived field is computed from `prediction` and `probability`
    /// here, so they cannot disagree.
    pub fn new(prediction: u8, probability: f64) -> Self {
        let prediction = u8::from(prediction == 1);
        let status = Status::from_class(prediction);

        Self {
            prediction,
            probability,
            is_fraud: status == Status::Fraudulent,
            fraud_probability_percentage: probability * 100.0,
            status,
        }
    }
}
