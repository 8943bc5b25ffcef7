//! Binary classifiers that can sit at the end of the pipeline.

use crate::errors::{LoadError, PredictError};
use serde::Deserialize;

/// Raw classifier output for one scaled feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    /// Predicted class (0 or 1)
    pub label: u8,
    /// Class membership probabilities, indexed by class
    pub probabilities: [f64; 2],
}

impl ClassScore {
    /// Probability of the fraudulent class
    pub fn fraud_probability(&self) -> f64 {
        self.probabilities[1]
    }
}

/// A fitted binary classifier over vectors in schema order.
///
/// Implementations must be shareable across request tasks.
pub trait Classifier: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Input width the classifier was fitted on, when the artifact records it
    fn input_width(&self) -> Option<usize>;

    fn predict(&self, features: &[f64]) -> Result<ClassScore, PredictError>;
}

/// On-disk form of the native model file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDocument {
    LogisticRegression {
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

/// Fitted logistic regression: `p1 = sigmoid(w·x + b)`
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, LoadError> {
        if coefficients.is_empty() {
            return Err(LoadError::WidthMismatch {
                artifact: "classifier",
                expected: 1,
                actual: 0,
            });
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn from_document(document: ModelDocument) -> Result<Self, LoadError> {
        match document {
            ModelDocument::LogisticRegression {
                coefficients,
                intercept,
            } => Self::new(coefficients, intercept),
        }
    }

    fn decision(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f64]) -> Result<ClassScore, PredictError> {
        if features.len() != self.coefficients.len() {
            return Err(PredictError::Shape {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let z = self.decision(features);
        if !z.is_finite() {
            return Err(PredictError::Classifier(
                "decision function is not finite".to_string(),
            ));
        }

        let p1 = 1.0 / (1.0 + (-z).exp());
        Ok(ClassScore {
            label: u8::from(z > 0.0),
            probabilities: [1.0 - p1, p1],
        })
    }
}

/// Class-1 probability from a probability tensor row. Two or more columns
/// are per-class probabilities; a single column is already class 1.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
fn probability_from_tensor(width: Option<i64>, data: &[f32]) -> Option<f64> {
    let p = if width.unwrap_or(1) >= 2 {
        data.get(1)
    } else {
        data.first()
    };
    p.map(|&v| v as f64)
}

/// Class-1 probability from a class to probability map, falling back to the
/// complement of class 0 when class 1 is absent.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
fn probability_from_class_map(pairs: &[(i64, f32)]) -> Option<f64> {
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Some(*p as f64);
    }
    pairs
        .iter()
        .find(|(class, _)| *class == 0)
        .map(|(_, p)| 1.0 - *p as f64)
}

/// Predicted class: the model's own label output when it has one.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
fn label_from_output(label: Option<i64>, p1: f64) -> u8 {
    match label {
        Some(label) => u8::from(label == 1),
        None => u8::from(p1 > 0.5),
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    //! ONNX Runtime backed classifier for scikit-learn exports

    use super::{
        label_from_output, probability_from_class_map, probability_from_tensor, ClassScore,
        Classifier,
    };
    use crate::errors::{LoadError, PredictError};
    use ort::memory::Allocator;
    use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
    use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::{debug, info};

    /// Loaded ONNX session plus the tensor names it was exported with
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        input_name: String,
        label_name: Option<String>,
        probability_name: String,
    }

    impl OnnxClassifier {
        pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self, LoadError> {
            let path = path.as_ref();
            let backend = |e: ort::Error| LoadError::Backend(e.to_string());

            ort::init().commit().map_err(backend)?;
            let session = Session::builder()
                .map_err(backend)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(backend)?
                .with_intra_threads(threads)
                .map_err(backend)?
                .commit_from_file(path)
                .map_err(|e| LoadError::Backend(format!("{}: {}", path.display(), e)))?;

            let input_name = session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "float_input".to_string());

            let label_name = session
                .outputs
                .iter()
                .find(|o| o.name.contains("label"))
                .map(|o| o.name.clone());

            let probability_name = session
                .outputs
                .iter()
                .find(|o| o.name.contains("prob"))
                .or_else(|| session.outputs.last())
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "probabilities".to_string());

            info!(
                path = %path.display(),
                input = %input_name,
                output = %probability_name,
                threads,
                "ONNX classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                label_name,
                probability_name,
            })
        }

        fn fraud_probability(&self, outputs: &SessionOutputs) -> Result<f64, PredictError> {
            let output = outputs.get(self.probability_name.as_str()).ok_or_else(|| {
                PredictError::Classifier(format!("missing output '{}'", self.probability_name))
            })?;

            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                return probability_from_tensor(shape.last().copied(), data).ok_or_else(|| {
                    PredictError::Classifier("empty probability tensor".to_string())
                });
            }

            if DynSequenceValueType::can_downcast(&output.dtype()) {
                return sequence_map_probability(output);
            }

            Err(PredictError::Classifier(format!(
                "unsupported output type for '{}'",
                self.probability_name
            )))
        }

        fn label(&self, outputs: &SessionOutputs, p1: f64) -> u8 {
            let label = self
                .label_name
                .as_deref()
                .and_then(|name| outputs.get(name))
                .and_then(|o| o.try_extract_tensor::<i64>().ok())
                .and_then(|(_, data)| data.first().copied());
            label_from_output(label, p1)
        }
    }

    /// seq(map(int64, float)) as emitted by the ZipMap operator
    fn sequence_map_probability(output: &DynValue) -> Result<f64, PredictError> {
        let classifier_err = |e: ort::Error| PredictError::Classifier(e.to_string());
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(classifier_err)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(classifier_err)?;
        let first = maps
            .first()
            .ok_or_else(|| PredictError::Classifier("empty probability sequence".to_string()))?;
        let pairs = first
            .try_extract_key_values::<i64, f32>()
            .map_err(classifier_err)?;

        probability_from_class_map(&pairs).ok_or_else(|| {
            PredictError::Classifier("no class probability in output map".to_string())
        })
    }

    impl Classifier for OnnxClassifier {
        fn name(&self) -> &str {
            "onnx"
        }

        fn input_width(&self) -> Option<usize> {
            // dynamic input shapes do not record a width
            None
        }

        fn predict(&self, features: &[f64]) -> Result<ClassScore, PredictError> {
            let classifier_err = |e: ort::Error| PredictError::Classifier(e.to_string());
            let data: Vec<f32> = features.iter().map(|&x| x as f32).collect();
            let input = Tensor::from_array((vec![1_i64, data.len() as i64], data))
                .map_err(classifier_err)?;

            let mut session = self
                .session
                .lock()
                .map_err(|e| PredictError::Classifier(format!("session lock poisoned: {}", e)))?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(classifier_err)?;

            let p1 = self.fraud_probability(&outputs)?.clamp(0.0, 1.0);
            let label = self.label(&outputs, p1);
            debug!(label, p1, "ONNX classifier scored record");

            Ok(ClassScore {
                label,
                probabilities: [1.0 - p1, p1],
            })
        }
    }
}
