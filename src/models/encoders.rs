//! Categorical label encoders fitted during training.

use crate::errors::LoadError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// On-disk form of a single encoder inside `label_encoders.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct EncoderSpec {
    pub classes: Vec<String>,
}

/// The whole `label_encoders.json` document: column name to encoder.
pub type EncoderDocument = BTreeMap<String, EncoderSpec>;

/// Index of the label substituted for categories unseen during training.
pub const FALLBACK_CLASS_INDEX: usize = 0;

/// Maps a fixed, ordered set of labels to integer codes.
///
/// The code of a label is its position in `classes`.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new(column: &str, classes: Vec<String>) -> Result<Self, LoadError> {
        if classes.is_empty() {
            return Err(LoadError::EmptyEncoder {
                column: column.to_string(),
            });
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code).is_some() {
                return Err(LoadError::DuplicateClass {
                    column: column.to_string(),
                    class: class.clone(),
                });
            }
        }

        Ok(Self { classes, codes })
    }

    /// Label substituted for anything the encoder never saw.
    pub fn fallback_class(&self) -> &str {
        &self.classes[FALLBACK_CLASS_INDEX]
    }

    pub fn is_known(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    /// Encode a label, substituting [`fallback_class`](Self::fallback_class)
    /// for unseen labels. Total over all strings.
    pub fn encode(&self, label: &str) -> usize {
        self.codes.get(label).copied().unwrap_or(FALLBACK_CLASS_INDEX)
    }
}

/// Column name to encoder, for every categorical column seen in training.
#[derive(Debug, Clone, Default)]
pub struct EncoderSet {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    /// Validate a parsed `label_encoders.json` document.
    pub fn from_document(document: EncoderDocument) -> Result<Self, LoadError> {
        Self::build(
            document
                .into_iter()
                .map(|(column, spec)| (column, spec.classes)),
        )
    }

    /// Build a validated set from `(column, classes)` pairs.
    pub fn build<I, S>(columns: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut encoders = BTreeMap::new();
        for (column, classes) in columns {
            let column = column.into();
            let encoder = LabelEncoder::new(&column, classes)?;
            encoders.insert(column, encoder);
        }
        Ok(Self { encoders })
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelEncoder)> {
        self.encoders.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}
