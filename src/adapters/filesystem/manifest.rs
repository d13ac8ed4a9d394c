//! Artifact manifests: SHA-256 digests of every artifact in a folder,
//! optionally signed with Ed25519.
//!
//! A folder is bound by `manifest.json`. When a verifying key is configured,
//! `manifest.sig` (raw 64-byte signature over the manifest bytes) must be
//! present and valid.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::ArtifactError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "manifest.sig";

/// Only manifest version understood by this build.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Digest listing for one artifact folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Check one artifact's bytes against its recorded digest.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` if the file is unlisted or its
    /// digest differs.
    pub fn verify_file(&self, file_name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let expected = self.files.get(file_name).ok_or_else(|| {
            ArtifactError::Integrity(format!("{file_name} is not listed in {MANIFEST_FILE}"))
        })?;
        if !constant_time_eq_str(&sha256_hex(bytes), expected) {
            return Err(ArtifactError::Integrity(format!(
                "file hash mismatch for {file_name}"
            )));
        }
        Ok(())
    }

    /// Check that every listed file is among the discovered ones.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` naming the first listed file that
    /// was not found.
    pub fn verify_complete<'a>(
        &self,
        present: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ArtifactError> {
        let present: Vec<&str> = present.into_iter().collect();
        match self.files.keys().find(|f| !present.contains(&f.as_str())) {
            Some(missing) => Err(ArtifactError::Integrity(format!(
                "{MANIFEST_FILE} references missing file {missing}"
            ))),
            None => Ok(()),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Parse a base64-encoded 32-byte Ed25519 verifying key.
///
/// # Errors
/// Returns `ArtifactError::Integrity` for malformed keys.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Integrity("invalid public key base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Integrity("invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ArtifactError::Integrity("invalid verifying key".into()))
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and check the manifest of `folder`, if there is one.
///
/// With a verifying key, an existing manifest must carry a valid signature.
///
/// # Errors
/// Returns `ArtifactError` for unreadable, unsigned, badly signed or
/// malformed manifests.
pub fn read_manifest(
    folder: &Path,
    key: Option<&VerifyingKey>,
) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let manifest_path = folder.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Ok(None);
    }
    let content = read(&manifest_path)?;

    if let Some(key) = key {
        let sig_path = folder.join(SIGNATURE_FILE);
        if !sig_path.is_file() {
            return Err(ArtifactError::Integrity(format!(
                "{SIGNATURE_FILE} required next to {manifest_path:?}"
            )));
        }
        let sig_bytes = read(&sig_path)?;
        let sig: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
            ArtifactError::Integrity("invalid signature length (expected 64 bytes)".into())
        })?;
        key.verify(&content, &Signature::from_bytes(&sig))
            .map_err(|_| ArtifactError::Integrity(format!("invalid signature for {manifest_path:?}")))?;
    }

    let manifest: ArtifactManifest = serde_json::from_slice(&content)
        .map_err(|e| ArtifactError::Integrity(format!("invalid {MANIFEST_FILE} format: {e}")))?;

    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Integrity(format!(
            "unsupported manifest version: {}",
            manifest.version
        )));
    }
    if manifest.files.is_empty() {
        return Err(ArtifactError::Integrity(format!("{MANIFEST_FILE} lists no files")));
    }
    if let Some(created_at) = manifest.created_at {
        if created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
            return Err(ArtifactError::Integrity("manifest created_at is in the future".into()));
        }
    }

    tracing::debug!(
        "Manifest {:?} accepted ({} files, signed={})",
        manifest_path,
        manifest.files.len(),
        key.is_some()
    );
    Ok(Some(manifest))
}
