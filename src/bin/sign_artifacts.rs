//! Artifact signing utility for Vitalrisk model folders.
//!
//! Writes `manifest.json` (SHA-256 of every `*.json` artifact) and
//! `manifest.sig` (Ed25519 signature over the manifest bytes) into each given
//! folder.
//!
//! # Usage
//!
//! ```bash
//! VITALRISK_SIGNING_KEY_B64_FILE=seed.b64 \
//!     cargo run --bin sign_artifacts -- models/heart models/diabetes
//! ```
//!
//! The seed is 32 bytes, base64 encoded. The matching verifying key is
//! printed for `VITALRISK_MANIFEST_PUBKEY_B64`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use vitalrisk::adapters::filesystem::{
    sha256_hex, ArtifactManifest, ARTIFACT_EXTENSION, MANIFEST_FILE, MANIFEST_VERSION,
    SIGNATURE_FILE,
};

const KEY_FILE_ENV: &str = "VITALRISK_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "VITALRISK_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("failed reading signing key file")?,
        );
        let secret = content.trim_end_matches(['\n', '\r']).to_string();
        if secret.is_empty() {
            bail!("empty signing key");
        }
        return Ok(Zeroizing::new(secret));
    }

    // Dev-only fallback for convenience.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            let secret = v.trim_end_matches(['\n', '\r']).to_string();
            if secret.is_empty() {
                bail!("empty signing key");
            }
            return Ok(Zeroizing::new(secret));
        }
    }

    bail!("missing signing key: set {KEY_FILE_ENV} ({KEY_ENV} is accepted in debug builds only)")
}

fn read_signing_seed() -> Result<Seed> {
    let v = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(v.trim())
            .context("invalid base64 in signing key")?,
    );
    if raw.len() != 32 {
        bail!(
            "signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        );
    }

    let mut seed = [0u8; 32];
    seed.copy_from_slice(&raw);
    Ok(Seed(seed))
}

fn unix_now() -> Option<i64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

fn parse_args() -> Result<Vec<PathBuf>> {
    let folders: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if folders.is_empty() || folders.iter().any(|f| f.as_os_str() == "-h" || f.as_os_str() == "--help") {
        bail!("Usage: sign_artifacts <artifact_dir>...");
    }
    Ok(folders)
}

fn collect_digests(folder: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();
    for entry in fs::read_dir(folder).with_context(|| format!("reading {folder:?}"))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_artifact = path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
            && name != MANIFEST_FILE;
        if is_artifact {
            let bytes = fs::read(&path).with_context(|| format!("reading {path:?}"))?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
    }
    Ok(files)
}

fn sign_folder(folder: &Path, signing_key: &SigningKey) -> Result<()> {
    let files = collect_digests(folder)?;
    if files.is_empty() {
        bail!("no *.{ARTIFACT_EXTENSION} artifacts in {folder:?}");
    }
    let count = files.len();

    let manifest = ArtifactManifest {
        version: MANIFEST_VERSION,
        created_at: unix_now(),
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;

    let manifest_path = folder.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = folder.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes()).with_context(|| format!("failed to write {sig_path:?}"))?;

    println!("Signed {count} artifact(s): {manifest_path:?}");
    Ok(())
}

fn main() -> Result<()> {
    let folders = parse_args()?;

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    for folder in &folders {
        sign_folder(folder, &signing_key)?;
    }

    println!(
        "VITALRISK_MANIFEST_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}
