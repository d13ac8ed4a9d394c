//! Directory adapter: Implementation of `ArtifactSource` over a folder tree.
//!
//! Layout: `<root>/<analysis_type>/<model_name>.json`. Artifacts are listed in
//! file-name order, so the lexicographically first file of a folder becomes
//! the default model of that analysis type.
//!
//! # Integrity
//!
//! - A folder containing `manifest.json` must list every artifact with its
//!   SHA-256 digest, and every listed file must exist.
//! - With a verifying key configured, manifests must be signed and folders
//!   without a manifest are refused.
//! - `require_manifest` refuses unmanifested folders without requiring
//!   signatures.

mod manifest;

pub use manifest::{
    read_manifest, sha256_hex, verifying_key_from_b64, ArtifactManifest, MANIFEST_FILE,
    MANIFEST_VERSION, SIGNATURE_FILE,
};

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;

use crate::config::Settings;
use crate::domain::{AnalysisType, ArtifactError};
use crate::ports::{ArtifactBlob, ArtifactSource};

/// Extension of artifact files.
pub const ARTIFACT_EXTENSION: &str = "json";

/// Artifact source reading one sub-folder per analysis type.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactSource {
    root: PathBuf,
    verifying_key: Option<VerifyingKey>,
    require_manifest: bool,
}

impl DirectoryArtifactSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            verifying_key: None,
            require_manifest: false,
        }
    }

    /// Build a source from runtime settings.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` if the configured key is malformed.
    pub fn from_settings(settings: &Settings) -> Result<Self, ArtifactError> {
        let mut source =
            Self::new(&settings.model_dir).require_manifest(settings.require_manifest);
        if let Some(b64) = &settings.manifest_pubkey_b64 {
            source = source.with_verifying_key(verifying_key_from_b64(b64)?);
        }
        Ok(source)
    }

    /// Require every artifact folder to be bound by a signed manifest.
    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    #[must_use]
    pub fn require_manifest(mut self, require: bool) -> Self {
        self.require_manifest = require;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_files(folder: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
        let entries = fs::read_dir(folder).map_err(|source| ArtifactError::Io {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ArtifactError::Io {
                path: folder.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_artifact = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
                && path.file_name().and_then(|n| n.to_str()) != Some(MANIFEST_FILE);
            if is_artifact {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

fn file_name_str(path: &Path) -> Result<&str, ArtifactError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ArtifactError::Integrity(format!("non UTF-8 artifact name {path:?}")))
}

impl ArtifactSource for DirectoryArtifactSource {
    fn discover(&self, analysis: AnalysisType) -> Result<Vec<ArtifactBlob>, ArtifactError> {
        let folder = self.root.join(analysis.as_str());
        if !folder.is_dir() {
            tracing::debug!("No artifact folder for {} at {:?}", analysis, folder);
            return Ok(Vec::new());
        }

        let files = Self::artifact_files(&folder)?;
        let manifest = read_manifest(&folder, self.verifying_key.as_ref())?;

        if manifest.is_none() && !files.is_empty() {
            if self.verifying_key.is_some() {
                return Err(ArtifactError::Integrity(format!(
                    "signed {MANIFEST_FILE} required in {folder:?}"
                )));
            }
            if self.require_manifest {
                return Err(ArtifactError::Integrity(format!(
                    "{MANIFEST_FILE} required in {folder:?}"
                )));
            }
            tracing::warn!("Loading artifacts from {:?} without a manifest", folder);
        }

        if let Some(manifest) = &manifest {
            let names = files
                .iter()
                .map(|p| file_name_str(p))
                .collect::<Result<Vec<_>, _>>()?;
            manifest.verify_complete(names)?;
        }

        let mut blobs = Vec::with_capacity(files.len());
        for path in files {
            let file_name = file_name_str(&path)?.to_string();
            let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
            if let Some(manifest) = &manifest {
                manifest.verify_file(&file_name, &bytes)?;
            }
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(file_name.as_str())
                .to_string();
            blobs.push(ArtifactBlob {
                name,
                identifier: file_name,
                bytes,
            });
        }

        tracing::debug!(
            "Discovered {} artifact(s) for {} in {:?}",
            blobs.len(),
            analysis,
            folder
        );
        Ok(blobs)
    }

    fn describe(&self) -> String {
        format!("directory {:?}", self.root)
    }
}
