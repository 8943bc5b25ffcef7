//! Artifact loader: reads the fitted encoders, scaler and classifier

use crate::config::{ArtifactsConfig, ModelFormat};
use crate::errors::LoadError;
use crate::models::classifier::{Classifier, LogisticRegression, ModelDocument};
use crate::models::encoders::{EncoderDocument, EncoderSet};
use crate::models::scaler::{Scaler, ScalerDocument};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// The three artifacts, fitted together and cross-checked at load time
pub struct Artifacts {
    pub encoders: EncoderSet,
    pub scaler: Scaler,
    pub classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifacts")
            .field("encoders", &self.encoders)
            .field("scaler", &self.scaler)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl Artifacts {
    /// Assemble and check that the artifacts agree on the feature schema.
    pub fn new(
        encoders: EncoderSet,
        scaler: Scaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, LoadError> {
        let schema = scaler.feature_names();
        if let Some(column) = encoders
            .columns()
            .find(|c| !schema.iter().any(|f| f.as_str() == *c))
        {
            return Err(LoadError::UnknownEncodedColumn(column.to_string()));
        }

        if let Some(width) = classifier.input_width() {
            if width != scaler.feature_count() {
                return Err(LoadError::WidthMismatch {
                    artifact: "classifier",
                    expected: scaler.feature_count(),
                    actual: width,
                });
            }
        }

        Ok(Self {
            encoders,
            scaler,
            classifier,
        })
    }

    /// Ordered feature schema
    pub fn feature_names(&self) -> &[String] {
        self.scaler.feature_names()
    }
}

/// Loader for the artifact directory
pub struct ArtifactLoader {
    dir: PathBuf,
    config: ArtifactsConfig,
}

impl ArtifactLoader {
    /// Resolve the artifact directory: configured, or next to the executable.
    pub fn new(config: &ArtifactsConfig) -> Self {
        let dir = config.dir.clone().unwrap_or_else(install_dir);
        Self {
            dir,
            config: config.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.config.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.config.scaler_file)
    }

    pub fn encoders_path(&self) -> PathBuf {
        self.dir.join(&self.config.encoders_file)
    }

    /// Load all three artifacts.
    pub fn load(&self) -> Result<Artifacts, LoadError> {
        info!(dir = %self.dir.display(), "Looking for model artifacts");
        info!(path = %self.model_path().display(), format = ?self.config.model_format, "Model path");
        info!(path = %self.scaler_path().display(), "Scaler path");
        info!(path = %self.encoders_path().display(), "Encoders path");

        let classifier = self.load_classifier()?;
        let scaler = Scaler::from_document(read_json::<ScalerDocument>(&self.scaler_path())?)?;
        let encoders =
            EncoderSet::from_document(read_json::<EncoderDocument>(&self.encoders_path())?)?;

        let artifacts = Artifacts::new(encoders, scaler, classifier)?;

        if artifacts.encoders.is_empty() {
            warn!("No categorical encoders found, every feature is treated as numeric");
        }
        info!(
            features = artifacts.scaler.feature_count(),
            encoded_columns = artifacts.encoders.len(),
            classifier = artifacts.classifier.name(),
            "Models loaded successfully"
        );

        Ok(artifacts)
    }

    /// Load, logging and swallowing any failure. `None` means degraded.
    pub fn load_or_degrade(&self) -> Option<Artifacts> {
        match self.load() {
            Ok(artifacts) => Some(artifacts),
            Err(e) => {
                error!(error = %e, "Error loading models, predictions disabled until restart");
                None
            }
        }
    }

    fn load_classifier(&self) -> Result<Box<dyn Classifier>, LoadError> {
        let path = self.model_path();
        match self.config.model_format {
            ModelFormat::Native => {
                let model = LogisticRegression::from_document(read_json::<ModelDocument>(&path)?)?;
                Ok(Box::new(model))
            }
            #[cfg(feature = "onnx")]
            ModelFormat::Onnx => {
                let model = crate::models::classifier::OnnxClassifier::load(
                    &path,
                    self.config.onnx_threads,
                )?;
                Ok(Box::new(model))
            }
            #[cfg(not(feature = "onnx"))]
            ModelFormat::Onnx => Err(LoadError::Backend(
                "ONNX models require building with the `onnx` feature".to_string(),
            )),
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory holding the running executable, falling back to the working directory.
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
