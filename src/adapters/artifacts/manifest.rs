//! Signed artifact manifest.
//!
//! `manifest.json` binds every artifact file to its SHA-256 digest and
//! `model.sig` carries an Ed25519 signature over the exact manifest bytes.
//! Artifacts are only bound after the signature and every digest check out.
//!
//! Unsigned directories are accepted only in debug builds, and only when the
//! policy explicitly allows it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ArtifactError, ARTIFACT_FILES};
use crate::config::Settings;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Only manifest format understood by this build.
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at` in the future.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Contents of `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedManifest {
    pub version: u32,
    /// Unix seconds
    pub created_at: i64,
    /// 16 random bytes, base64
    pub nonce_b64: String,
    /// Relative path -> lowercase SHA-256 hex
    pub files: BTreeMap<String, String>,
}

/// How strictly an artifact directory is verified.
#[derive(Debug, Clone, Default)]
pub struct ManifestPolicy {
    pub verifying_key: Option<VerifyingKey>,
    /// Honoured only in debug builds
    pub allow_unsigned: bool,
    pub max_age_secs: Option<i64>,
}

impl ManifestPolicy {
    /// Build the policy from process settings.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the configured key cannot be read or decoded.
    pub fn from_settings(settings: &Settings) -> Result<Self, ArtifactError> {
        let verifying_key = match &settings.verifying_key {
            Some(source) => Some(verifying_key_from_b64(&source.load_b64()?)?),
            None => None,
        };

        Ok(Self {
            verifying_key,
            allow_unsigned: settings.allow_unsigned_models,
            max_age_secs: settings.model_max_age_secs,
        })
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ArtifactError::Manifest` for bad base64, wrong length or an
/// invalid curve point.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Manifest("Invalid public key base64".into()))?;
    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Manifest("Invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| ArtifactError::Manifest("Invalid verifying key".into()))
}

/// Check that a nonce decodes to exactly 16 bytes.
///
/// # Errors
/// Returns `ArtifactError::Manifest` otherwise.
pub fn validate_nonce_b64(nonce_b64: &str) -> Result<(), ArtifactError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| ArtifactError::Manifest(format!("Invalid nonce base64: {e}")))?;
    if raw.len() != 16 {
        return Err(ArtifactError::Manifest(
            "nonce must decode to exactly 16 bytes".into(),
        ));
    }
    Ok(())
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Artifact bytes that passed [`verify`], keyed by file name.
///
/// Callers parse from these bytes instead of reading the directory again.
#[derive(Debug, Clone)]
pub struct VerifiedArtifacts {
    /// `None` when an unsigned directory was accepted.
    pub manifest: Option<SignedManifest>,
    files: BTreeMap<String, Vec<u8>>,
}

impl VerifiedArtifacts {
    /// Verified contents of `name`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Read` if `name` was not part of the verified set.
    pub fn bytes(&self, name: &str) -> Result<&[u8], ArtifactError> {
        self.files
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ArtifactError::Read {
                name: name.to_string(),
                reason: "not part of the verified artifact set".into(),
            })
    }
}

/// Verify the manifest in `dir` against `policy` and return the bytes that
/// were checked.
///
/// An unsigned directory yields `manifest: None` when the policy (in a debug
/// build) allows that.
///
/// # Errors
/// Returns `ArtifactError::Manifest` on any verification failure.
pub fn verify(dir: &Path, policy: &ManifestPolicy) -> Result<VerifiedArtifacts, ArtifactError> {
    let sig_path = dir.join(SIGNATURE_FILE);
    let manifest_path = dir.join(MANIFEST_FILE);

    if !sig_path.exists() || !manifest_path.exists() {
        return unsigned(dir, policy);
    }

    let sig_bytes = fs::read(&sig_path)
        .map_err(|e| ArtifactError::Manifest(format!("Failed to read signature: {e}")))?;
    let sig_bytes: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Manifest("Invalid signature length (expected 64 bytes)".into())
    })?;
    let signature = Signature::from_bytes(&sig_bytes);

    let manifest_bytes = fs::read(&manifest_path)
        .map_err(|e| ArtifactError::Manifest(format!("Failed to read manifest: {e}")))?;

    let key = policy.verifying_key.as_ref().ok_or_else(|| {
        ArtifactError::Manifest(format!(
            "No verifying key configured (set {} or {})",
            crate::config::MODEL_PUBKEY_ENV,
            crate::config::MODEL_PUBKEY_FILE_ENV
        ))
    })?;
    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ArtifactError::Manifest("Invalid model signature".into()))?;

    let manifest: SignedManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ArtifactError::Manifest(format!("Invalid manifest.json format: {e}")))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Manifest(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    validate_nonce_b64(&manifest.nonce_b64)?;
    check_age(manifest.created_at, policy.max_age_secs)?;

    for required in ARTIFACT_FILES {
        if !manifest.files.contains_key(required) {
            return Err(ArtifactError::Manifest(format!(
                "manifest.json does not bind {required}"
            )));
        }
    }

    let mut files = BTreeMap::new();
    for (rel, expected_hex) in &manifest.files {
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ArtifactError::Manifest(format!(
                "Manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(ArtifactError::Manifest(format!("File hash mismatch for {rel}")));
        }
        files.insert(rel.clone(), bytes);
    }

    tracing::info!(
        "Artifact manifest verified ({} files, created_at={})",
        manifest.files.len(),
        manifest.created_at
    );
    Ok(VerifiedArtifacts {
        manifest: Some(manifest),
        files,
    })
}

/// Hash `files` in `dir`, then write `manifest.json` and its `model.sig`.
///
/// # Errors
/// Returns `ArtifactError` if a file cannot be read, the nonce is malformed
/// or the outputs cannot be written.
pub fn write_signed(
    dir: &Path,
    key: &SigningKey,
    files: &[&str],
    created_at: i64,
    nonce_b64: String,
) -> Result<SignedManifest, ArtifactError> {
    validate_nonce_b64(&nonce_b64)?;

    let mut hashes = BTreeMap::new();
    for rel in files {
        let bytes = fs::read(dir.join(rel)).map_err(|e| ArtifactError::Read {
            name: (*rel).to_string(),
            reason: e.to_string(),
        })?;
        hashes.insert((*rel).to_string(), sha256_hex(&bytes));
    }

    let manifest = SignedManifest {
        version: MANIFEST_VERSION,
        created_at,
        nonce_b64,
        files: hashes,
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| ArtifactError::Manifest(format!("Failed to serialize manifest.json: {e}")))?;
    let signature: Signature = key.sign(&manifest_bytes);
    let signature_bytes = signature.to_bytes();

    for (name, bytes) in [
        (MANIFEST_FILE, manifest_bytes.as_slice()),
        (SIGNATURE_FILE, signature_bytes.as_slice()),
    ] {
        fs::write(dir.join(name), bytes).map_err(|e| {
            ArtifactError::Manifest(format!("Failed to write {name}: {e}"))
        })?;
    }
    Ok(manifest)
}

fn check_age(created_at: i64, max_age_secs: Option<i64>) -> Result<(), ArtifactError> {
    let now = chrono::Utc::now().timestamp();
    if created_at > now + MAX_FUTURE_SKEW_SECS {
        return Err(ArtifactError::Manifest(
            "manifest created_at is in the future".into(),
        ));
    }
    if let Some(max_age) = max_age_secs {
        if now.saturating_sub(created_at) > max_age {
            return Err(ArtifactError::Manifest(
                "manifest is older than allowed max age".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(debug_assertions)]
fn unsigned(dir: &Path, policy: &ManifestPolicy) -> Result<VerifiedArtifacts, ArtifactError> {
    if policy.allow_unsigned {
        tracing::warn!(
            "Loading UNSIGNED model artifacts from {:?} ({}=true). \
             This is only allowed in debug builds.",
            dir,
            crate::config::ALLOW_UNSIGNED_MODELS_ENV
        );
        let mut files = BTreeMap::new();
        for name in ARTIFACT_FILES {
            let bytes = fs::read(dir.join(name)).map_err(|e| ArtifactError::Read {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            files.insert(name.to_string(), bytes);
        }
        return Ok(VerifiedArtifacts {
            manifest: None,
            files,
        });
    }
    tracing::error!("Artifact signature not found in {:?}", dir);
    Err(ArtifactError::Manifest(format!(
        "Artifact signature required. Set {}=true for testing.",
        crate::config::ALLOW_UNSIGNED_MODELS_ENV
    )))
}

#[cfg(not(debug_assertions))]
fn unsigned(dir: &Path, _policy: &ManifestPolicy) -> Result<VerifiedArtifacts, ArtifactError> {
    tracing::error!(
        "Artifact signature not found in {:?}. Release builds require signed artifacts.",
        dir
    );
    Err(ArtifactError::Manifest(
        "Artifact signature required in production".into(),
    ))
}
