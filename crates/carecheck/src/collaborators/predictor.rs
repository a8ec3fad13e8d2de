use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::CollaboratorError;
use crate::screening::catalog::{SLIDER_ITEM_COUNT, SLIDER_MAX};

/// Fixed-length slider answers, each validated to `0..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureVector([u8; SLIDER_ITEM_COUNT]);

impl FeatureVector {
    pub fn new(values: &[u8]) -> Result<Self, InvalidFeatures> {
        if values.len() != SLIDER_ITEM_COUNT {
            return Err(InvalidFeatures::Length {
                expected: SLIDER_ITEM_COUNT,
                actual: values.len(),
            });
        }
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| **value > SLIDER_MAX)
        {
            return Err(InvalidFeatures::OutOfRange {
                index,
                value: *value,
            });
        }

        let mut features = [0; SLIDER_ITEM_COUNT];
        features.copy_from_slice(values);
        Ok(Self(features))
    }

    pub fn values(&self) -> &[u8; SLIDER_ITEM_COUNT] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFeatures {
    #[error("expected {expected} slider answers, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("slider answer {index} is {value}; answers range from 0 to 4")]
    OutOfRange { index: usize, value: u8 },
}

/// Opaque pretrained classifier: feature vector in, categorical label out.
pub trait LabelPredictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<String, CollaboratorError>;
}

/// Nearest-centroid model. Each row pairs a label with the mean answer
/// profile that label was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidModel {
    name: String,
    centroids: Vec<(String, [f32; SLIDER_ITEM_COUNT])>,
}

impl CentroidModel {
    /// Build from rows of `(label, centroid)`.
    pub fn new(
        name: impl Into<String>,
        centroids: Vec<(String, [f32; SLIDER_ITEM_COUNT])>,
    ) -> Result<Self, ModelLoadError> {
        let name = name.into();
        if centroids.is_empty() {
            return Err(ModelLoadError::Empty { model: name });
        }
        Ok(Self { name, centroids })
    }

    fn uniform(name: &str, rows: &[(&str, f32)]) -> Self {
        Self {
            name: name.to_string(),
            centroids: rows
                .iter()
                .map(|(label, level)| (label.to_string(), [*level; SLIDER_ITEM_COUNT]))
                .collect(),
        }
    }

    pub fn baseline_stress() -> Self {
        Self::uniform(
            "stress",
            &[("Low", 0.8), ("Moderate", 2.0), ("High", 3.0), ("Severe", 3.7)],
        )
    }

    pub fn baseline_depression() -> Self {
        Self::uniform(
            "depression",
            &[
                ("Minimal", 0.5),
                ("Mild", 1.5),
                ("Moderate", 2.5),
                ("Severe", 3.5),
            ],
        )
    }

    /// Load rows of `label,f1,...,f10` from a CSV file with a header row.
    pub fn from_path(name: &str, path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let file = std::fs::File::open(path.as_ref()).map_err(|source| ModelLoadError::Io {
            model: name.to_string(),
            source,
        })?;
        Self::from_reader(name, file)
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, ModelLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut centroids = Vec::new();

        for (row, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|source| ModelLoadError::Csv {
                model: name.to_string(),
                source,
            })?;
            let line = row + 2;

            let label = record
                .get(0)
                .filter(|label| !label.is_empty())
                .ok_or_else(|| ModelLoadError::Row {
                    model: name.to_string(),
                    line,
                    reason: "missing label".to_string(),
                })?
                .to_string();

            if record.len() != SLIDER_ITEM_COUNT + 1 {
                return Err(ModelLoadError::Row {
                    model: name.to_string(),
                    line,
                    reason: format!(
                        "expected {} feature columns, found {}",
                        SLIDER_ITEM_COUNT,
                        record.len().saturating_sub(1)
                    ),
                });
            }

            let mut centroid = [0.0; SLIDER_ITEM_COUNT];
            for (slot, raw) in centroid.iter_mut().zip(record.iter().skip(1)) {
                *slot = raw.parse::<f32>().map_err(|_| ModelLoadError::Row {
                    model: name.to_string(),
                    line,
                    reason: format!("'{raw}' is not a number"),
                })?;
            }
            centroids.push((label, centroid));
        }

        Self::new(name, centroids)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|(label, _)| label.as_str())
    }
}

impl LabelPredictor for CentroidModel {
    fn predict(&self, features: &FeatureVector) -> Result<String, CollaboratorError> {
        let mut best: Option<(&str, f32)> = None;
        for (label, centroid) in &self.centroids {
            let distance: f32 = centroid
                .iter()
                .zip(features.values())
                .map(|(center, value)| (center - f32::from(*value)).powi(2))
                .sum();
            if best.map_or(true, |(_, current)| distance < current) {
                best = Some((label.as_str(), distance));
            }
        }

        best.map(|(label, _)| label.to_string()).ok_or_else(|| {
            CollaboratorError::Unavailable(format!("model '{}' has no centroids", self.name))
        })
    }
}

#[derive(Debug)]
pub enum ModelLoadError {
    Io {
        model: String,
        source: std::io::Error,
    },
    Csv {
        model: String,
        source: csv::Error,
    },
    Row {
        model: String,
        line: usize,
        reason: String,
    },
    Empty {
        model: String,
    },
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelLoadError::Io { model, source } => {
                write!(f, "unable to open {model} model: {source}")
            }
            ModelLoadError::Csv { model, source } => {
                write!(f, "unable to parse {model} model: {source}")
            }
            ModelLoadError::Row {
                model,
                line,
                reason,
            } => write!(f, "{model} model line {line}: {reason}"),
            ModelLoadError::Empty { model } => write!(f, "{model} model has no rows"),
        }
    }
}

impl std::error::Error for ModelLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelLoadError::Io { source, .. } => Some(source),
            ModelLoadError::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}
