//! In-memory adapter: Implementation of `ArtifactSource` over explicit blobs.
//!
//! Useful for embedding artifacts in a binary and for tests.

use crate::domain::{AnalysisType, ArtifactError};
use crate::ports::{ArtifactBlob, ArtifactSource};

/// Artifact source backed by a list of `(analysis, blob)` pairs.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactSource {
    entries: Vec<(AnalysisType, ArtifactBlob)>,
}

impl MemoryArtifactSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact; the name doubles as its storage identifier.
    #[must_use]
    pub fn with(
        mut self,
        analysis: AnalysisType,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.push(analysis, ArtifactBlob::new(name, bytes));
        self
    }

    pub fn push(&mut self, analysis: AnalysisType, blob: ArtifactBlob) {
        self.entries.push((analysis, blob));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArtifactSource for MemoryArtifactSource {
    fn discover(&self, analysis: AnalysisType) -> Result<Vec<ArtifactBlob>, ArtifactError> {
        let mut blobs: Vec<ArtifactBlob> = self
            .entries
            .iter()
            .filter(|(a, _)| *a == analysis)
            .map(|(_, b)| b.clone())
            .collect();
        blobs.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(blobs)
    }

    fn describe(&self) -> String {
        format!("memory ({} artifacts)", self.entries.len())
    }
}
