//! JSON artifact adapter: Implementation of `ArtifactDecoder`.
//!
//! Artifacts are JSON documents tagged by `kind`:
//!
//! - `logistic_regression`: float coefficients, optional standardization
//! - `quantized_logistic`: fixed-point logistic model
//! - `decision_tree` / `random_forest`: flat node lists with leaf class counts
//! - `linear_regressor`: label-only scorer, its output is the probability
//!
//! Every kind except `linear_regressor` exposes per-class probabilities.

mod linear;
mod tree;

pub use linear::{LinearRegressor, LogisticRegression, QuantizedLogistic, Scaler};
pub use tree::{DecisionTree, RandomForest, TreeNode, TreeNodes};

use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactError, InferenceError};
use crate::ports::{ArtifactBlob, ArtifactDecoder, DecodedClassifier};

/// Upper bound on artifact size accepted by the decoder.
pub const MAX_ARTIFACT_BYTES: usize = 64 * 1024 * 1024;

/// On-disk artifact document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactDocument {
    LogisticRegression(LogisticRegression),
    QuantizedLogistic(QuantizedLogistic),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    LinearRegressor(LinearRegressor),
}

impl ArtifactDocument {
    /// Validate and wrap the document in its classifier interface.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` if the parameters are inconsistent.
    pub fn into_classifier(self, name: &str) -> Result<DecodedClassifier, ArtifactError> {
        let decoded = match self {
            Self::LogisticRegression(m) => {
                m.validate(name)?;
                DecodedClassifier::Probabilistic(Box::new(m))
            }
            Self::QuantizedLogistic(m) => {
                m.validate(name)?;
                DecodedClassifier::Probabilistic(Box::new(m))
            }
            Self::DecisionTree(m) => {
                m.validate(name)?;
                DecodedClassifier::Probabilistic(Box::new(m))
            }
            Self::RandomForest(m) => {
                m.validate(name)?;
                DecodedClassifier::Probabilistic(Box::new(m))
            }
            Self::LinearRegressor(m) => {
                m.validate(name)?;
                DecodedClassifier::Label(Box::new(m))
            }
        };

        if let Some(names) = decoded.feature_names() {
            if names.len() != decoded.n_features() {
                return Err(ArtifactError::decode(
                    name,
                    format!(
                        "{} feature names declared for {} features",
                        names.len(),
                        decoded.n_features()
                    ),
                ));
            }
        }
        Ok(decoded)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::QuantizedLogistic(_) => "quantized_logistic",
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest(_) => "random_forest",
            Self::LinearRegressor(_) => "linear_regressor",
        }
    }
}

/// Decoder for JSON artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArtifactDecoder;

impl JsonArtifactDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactDecoder for JsonArtifactDecoder {
    fn decode(&self, blob: &ArtifactBlob) -> Result<DecodedClassifier, ArtifactError> {
        if blob.bytes.len() > MAX_ARTIFACT_BYTES {
            return Err(ArtifactError::decode(
                &blob.name,
                format!("artifact exceeds {MAX_ARTIFACT_BYTES} bytes"),
            ));
        }

        let document: ArtifactDocument = serde_json::from_slice(&blob.bytes)
            .map_err(|e| ArtifactError::decode(&blob.name, e.to_string()))?;

        tracing::debug!(
            "Decoded artifact '{}' (kind={}, {} bytes)",
            blob.name,
            document.kind(),
            blob.bytes.len()
        );

        document.into_classifier(&blob.name)
    }
}

pub(crate) fn check_row(row: &[f64], expected: usize) -> Result<(), InferenceError> {
    if row.len() != expected {
        return Err(InferenceError::FeatureCount {
            got: row.len(),
            expected,
        });
    }
    Ok(())
}

pub(crate) fn check_finite<'a>(
    name: &str,
    field: &str,
    values: impl IntoIterator<Item = &'a f64>,
) -> Result<(), ArtifactError> {
    if values.into_iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::decode(
            name,
            format!("{field} contains a non-finite value"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<DecodedClassifier, ArtifactError> {
        JsonArtifactDecoder::new().decode(&ArtifactBlob::new("test", json.as_bytes()))
    }

    #[test]
    fn test_decode_logistic_exposes_probabilities() {
        let decoded = decode(
            r#"{"kind": "logistic_regression", "classes": [0, 1],
                "coefficients": [[0.5, -0.25]], "intercepts": [0.1],
                "feature_names": ["a", "b"]}"#,
        )
        .expect("decode");

        match decoded {
            DecodedClassifier::Probabilistic(c) => {
                assert_eq!(c.classes(), Some(&[0_i64, 1][..]));
                assert_eq!(c.n_features(), 2);
                let p = c.predict_proba(&[0.0, 0.0]).expect("predict");
                assert_eq!(p.len(), 2);
            }
            DecodedClassifier::Label(_) => panic!("expected probabilistic classifier"),
        }
    }

    #[test]
    fn test_decode_linear_regressor_is_label_only() {
        let decoded = decode(r#"{"kind": "linear_regressor", "coefficients": [1.0], "intercept": 0.0}"#)
            .expect("decode");
        assert!(matches!(decoded, DecodedClassifier::Label(_)));
    }

    #[test]
    fn test_decode_quantized_has_binary_classes() {
        let decoded = decode(
            r#"{"kind": "quantized_logistic", "precision_bits": 12, "scale_factor": 4096,
                "coefficients_q": [100], "intercept_q": 0,
                "scaler_mean_q": [0], "scaler_std_inv_q": [4096]}"#,
        )
        .expect("decode");
        match decoded {
            DecodedClassifier::Probabilistic(c) => assert_eq!(c.classes(), Some(&[0_i64, 1][..])),
            DecodedClassifier::Label(_) => panic!("expected probabilistic classifier"),
        }
    }

    #[test]
    fn test_decode_errors_name_the_artifact() {
        let err = decode(r#"{"kind": "svm"}"#).expect_err("unknown kind");
        assert!(err.to_string().contains("'test'"));

        let err = decode("not json").expect_err("garbage");
        assert!(matches!(err, ArtifactError::Decode { .. }));
    }

    #[test]
    fn test_feature_name_count_checked() {
        let err = decode(
            r#"{"kind": "linear_regressor", "coefficients": [1.0, 2.0], "intercept": 0.0,
                "feature_names": ["only_one"]}"#,
        )
        .expect_err("mismatch");
        assert!(err.to_string().contains("feature names"));
    }
}
