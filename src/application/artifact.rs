//! Loaded model artifacts and the positive-class probability contract.

use crate::domain::{AnalysisType, ArtifactError, FeatureRow, InferenceError};
use crate::ports::{DecodedClassifier, LabelClassifier, ProbabilisticClassifier};

/// Label of the "at risk" class.
pub const POSITIVE_LABEL: i64 = 1;

/// Column used when an artifact declares no class labels.
pub const DEFAULT_POSITIVE_CLASS_INDEX: usize = 1;

/// Output column holding the positive class.
///
/// Declared labels: the index of label `1`, or the last column if `1` is
/// not among them. No labels: [`DEFAULT_POSITIVE_CLASS_INDEX`].
#[must_use]
pub fn resolve_positive_class_index(classes: Option<&[i64]>) -> usize {
    match classes {
        Some(classes) => classes
            .iter()
            .position(|&c| c == POSITIVE_LABEL)
            .unwrap_or_else(|| classes.len().saturating_sub(1)),
        None => DEFAULT_POSITIVE_CLASS_INDEX,
    }
}

/// Classifier capability, resolved once at load time.
pub enum Classifier {
    Probabilistic {
        model: Box<dyn ProbabilisticClassifier>,
        positive_class_index: usize,
    },
    Label(Box<dyn LabelClassifier>),
}

impl Classifier {
    fn from_decoded(decoded: DecodedClassifier) -> Self {
        match decoded {
            DecodedClassifier::Probabilistic(model) => {
                let positive_class_index = resolve_positive_class_index(model.classes());
                Self::Probabilistic {
                    model,
                    positive_class_index,
                }
            }
            DecodedClassifier::Label(model) => Self::Label(model),
        }
    }
}

/// One loaded, immutable classifier.
pub struct ModelArtifact {
    name: String,
    analysis: AnalysisType,
    classifier: Classifier,
}

impl ModelArtifact {
    /// Bind a decoded classifier to an analysis type.
    ///
    /// The classifier must accept exactly the analysis type's row width, and
    /// declared feature names must match the row columns in order.
    ///
    /// # Errors
    /// Returns `ArtifactError::LayoutMismatch` if the classifier does not fit.
    pub fn new(
        name: impl Into<String>,
        analysis: AnalysisType,
        decoded: DecodedClassifier,
    ) -> Result<Self, ArtifactError> {
        let name = name.into();
        let mismatch = |reason: String| ArtifactError::LayoutMismatch {
            name: name.clone(),
            analysis,
            reason,
        };

        let expected = analysis.row_width();
        if decoded.n_features() != expected {
            return Err(mismatch(format!(
                "expects {} features, rows have {expected}",
                decoded.n_features()
            )));
        }
        if let Some(names) = decoded.feature_names() {
            if let Some((i, (got, want))) = names
                .iter()
                .zip(analysis.row_columns())
                .enumerate()
                .find(|(_, (got, want))| got.as_str() != *want)
            {
                return Err(mismatch(format!(
                    "feature {i} is '{got}', expected '{want}'"
                )));
            }
        }

        Ok(Self {
            name,
            analysis,
            classifier: Classifier::from_decoded(decoded),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn analysis(&self) -> AnalysisType {
        self.analysis
    }

    /// Positive-class column for probabilistic artifacts.
    #[must_use]
    pub fn positive_class_index(&self) -> Option<usize> {
        match &self.classifier {
            Classifier::Probabilistic {
                positive_class_index,
                ..
            } => Some(*positive_class_index),
            Classifier::Label(_) => None,
        }
    }

    /// Whether the artifact exposes per-class probabilities.
    #[must_use]
    pub fn is_probabilistic(&self) -> bool {
        matches!(self.classifier, Classifier::Probabilistic { .. })
    }

    /// Probability of the positive class for `row`, clamped to `[0, 1]`.
    ///
    /// Label-only artifacts report their output value as the probability.
    ///
    /// # Errors
    /// Returns `InferenceError` if the row does not fit, the positive column
    /// is absent from the output, or the output is NaN.
    pub fn positive_class_probability(&self, row: &FeatureRow) -> Result<f64, InferenceError> {
        let raw = match &self.classifier {
            Classifier::Probabilistic {
                model,
                positive_class_index,
            } => {
                let proba = model.predict_proba(row.values())?;
                *proba
                    .get(*positive_class_index)
                    .ok_or(InferenceError::MissingClassColumn {
                        index: *positive_class_index,
                        width: proba.len(),
                    })?
            }
            Classifier::Label(model) => model.predict(row.values())?,
        };

        if raw.is_nan() {
            return Err(InferenceError::NonFinite);
        }
        Ok(raw.clamp(0.0, 1.0))
    }
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("name", &self.name)
            .field("analysis", &self.analysis)
            .field("positive_class_index", &self.positive_class_index())
            .finish()
    }
}
