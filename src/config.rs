//! Runtime settings read from `VITALRISK_*` environment variables.

use std::fs;
use std::path::PathBuf;

use crate::VitalriskError;

pub const MODEL_DIR_ENV: &str = "VITALRISK_MODEL_DIR";
pub const MANIFEST_PUBKEY_ENV: &str = "VITALRISK_MANIFEST_PUBKEY_B64";
pub const MANIFEST_PUBKEY_FILE_ENV: &str = "VITALRISK_MANIFEST_PUBKEY_B64_FILE";
pub const REQUIRE_MANIFEST_ENV: &str = "VITALRISK_REQUIRE_MANIFEST";
pub const LOG_MODE_ENV: &str = "VITALRISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "VITALRISK_LOG_FILE";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "vitalrisk.log";

/// Where log lines go. Stdout is reserved for responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stderr,
    File,
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root folder with one sub-folder per analysis type.
    pub model_dir: PathBuf,
    /// Base64 Ed25519 verifying key for signed manifests.
    pub manifest_pubkey_b64: Option<String>,
    /// Refuse artifact folders without a manifest.
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            manifest_pubkey_b64: None,
            require_manifest: false,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Accepts `1`, `true`, `TRUE`, `yes`, `YES`; anything else is false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `VitalriskError::Config` for invalid values or an unreadable
    /// key file.
    pub fn from_env() -> Result<Self, VitalriskError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// See [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VitalriskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(dir) = get(MODEL_DIR_ENV) {
            settings.model_dir = PathBuf::from(dir.trim());
        }

        settings.manifest_pubkey_b64 = match (get(MANIFEST_PUBKEY_ENV), get(MANIFEST_PUBKEY_FILE_ENV)) {
            (Some(inline), _) => Some(inline.trim().to_string()),
            (None, Some(path)) => {
                let content = fs::read_to_string(path.trim()).map_err(|e| {
                    VitalriskError::Config(format!("failed reading {MANIFEST_PUBKEY_FILE_ENV}: {e}"))
                })?;
                let key = content.trim().to_string();
                if key.is_empty() {
                    return Err(VitalriskError::Config(format!(
                        "{MANIFEST_PUBKEY_FILE_ENV} points to an empty file"
                    )));
                }
                Some(key)
            }
            (None, None) => None,
        };

        settings.require_manifest = get(REQUIRE_MANIFEST_ENV).is_some_and(|v| parse_bool(&v));

        if let Some(mode) = get(LOG_MODE_ENV) {
            settings.log_mode = match mode.trim() {
                "stderr" => LogMode::Stderr,
                "file" => LogMode::File,
                other => {
                    return Err(VitalriskError::Config(format!(
                        "{LOG_MODE_ENV} must be 'stderr' or 'file', got '{other}'"
                    )))
                }
            };
        }
        if let Some(file) = get(LOG_FILE_ENV) {
            settings.log_file = PathBuf::from(file.trim());
        }

        Ok(settings)
    }
}
