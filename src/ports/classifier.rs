//! Classifier ports: the two output shapes a loaded artifact can expose.
//!
//! An artifact either reports per-class probabilities or a single label. The
//! variant is decided once, when the artifact is decoded.

use crate::domain::{ArtifactError, InferenceError};
use crate::ports::ArtifactBlob;

/// Classifier exposing a per-class probability vector.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Class labels in output column order, if the artifact declares them.
    fn classes(&self) -> Option<&[i64]>;

    /// Number of input features expected.
    fn n_features(&self) -> usize;

    /// Column names the classifier was trained on, if declared.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Per-class probabilities for one row.
    ///
    /// # Errors
    /// Returns `InferenceError` if the row does not fit the classifier.
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// Classifier exposing only a single output value.
pub trait LabelClassifier: Send + Sync {
    /// Number of input features expected.
    fn n_features(&self) -> usize;

    /// Column names the classifier was trained on, if declared.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Output value for one row.
    ///
    /// # Errors
    /// Returns `InferenceError` if the row does not fit the classifier.
    fn predict(&self, row: &[f64]) -> Result<f64, InferenceError>;
}

/// A decoded artifact, tagged by the interface it exposes.
pub enum DecodedClassifier {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    Label(Box<dyn LabelClassifier>),
}

impl DecodedClassifier {
    #[must_use]
    pub fn n_features(&self) -> usize {
        match self {
            Self::Probabilistic(c) => c.n_features(),
            Self::Label(c) => c.n_features(),
        }
    }

    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::Probabilistic(c) => c.feature_names(),
            Self::Label(c) => c.feature_names(),
        }
    }
}

impl std::fmt::Debug for DecodedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probabilistic(c) => f
                .debug_struct("Probabilistic")
                .field("n_features", &c.n_features())
                .field("classes", &c.classes())
                .finish(),
            Self::Label(c) => f
                .debug_struct("Label")
                .field("n_features", &c.n_features())
                .finish(),
        }
    }
}

/// Trait for turning stored bytes into a usable classifier.
pub trait ArtifactDecoder: Send + Sync {
    /// Decode one artifact.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` if the bytes are not a valid artifact.
    fn decode(&self, blob: &ArtifactBlob) -> Result<DecodedClassifier, ArtifactError>;
}
