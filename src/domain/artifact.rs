//! Error types for classifier artifacts and inference.

use std::path::PathBuf;

use super::analysis::AnalysisType;

/// Error type for artifact discovery, integrity checks and decoding.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact '{name}' could not be decoded: {reason}")]
    Decode { name: String, reason: String },

    #[error("artifact '{name}' does not fit the {analysis} row layout: {reason}")]
    LayoutMismatch {
        name: String,
        analysis: AnalysisType,
        reason: String,
    },

    #[error("duplicate model name '{name}' for analysis_type '{analysis}'")]
    DuplicateName { name: String, analysis: AnalysisType },

    #[error("artifact integrity check failed: {0}")]
    Integrity(String),
}

impl ArtifactError {
    pub(crate) fn decode(name: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error type for running a classifier on a feature row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("feature count mismatch: got {got}, expected {expected}")]
    FeatureCount { got: usize, expected: usize },

    #[error("positive class column {index} out of range for {width} outputs")]
    MissingClassColumn { index: usize, width: usize },

    #[error("classifier produced a non-finite output")]
    NonFinite,
}
