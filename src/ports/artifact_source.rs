//! Artifact source port: Trait for enumerating stored classifier artifacts.

use crate::domain::{AnalysisType, ArtifactError};

/// One stored artifact, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBlob {
    /// Model name exposed to callers (file stem for directory sources).
    pub name: String,
    /// Storage identifier; discovery order and the default model follow it.
    pub identifier: String,
    /// Raw artifact bytes.
    pub bytes: Vec<u8>,
}

impl ArtifactBlob {
    /// Create a blob whose identifier equals its name.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        Self {
            identifier: name.clone(),
            name,
            bytes: bytes.into(),
        }
    }
}

/// Trait for artifact discovery.
///
/// Sources are only consulted while a registry is being built.
pub trait ArtifactSource: Send + Sync {
    /// Enumerate every artifact stored for `analysis`.
    ///
    /// An analysis type with no storage location yields an empty list.
    ///
    /// # Errors
    /// Returns `ArtifactError` if storage cannot be read or fails an
    /// integrity check.
    fn discover(&self, analysis: AnalysisType) -> Result<Vec<ArtifactBlob>, ArtifactError>;

    /// Human-readable location for log messages.
    fn describe(&self) -> String {
        "artifact source".to_string()
    }
}
