//! Artifact signing utility for healthrisk model directories.
//!
//! Hashes the four model artifacts, writes `manifest.json` and an Ed25519
//! signature `model.sig`, and prints the verifying key to configure with
//! `HEALTHRISK_MODEL_PUBKEY_B64`.
//!
//! # Usage
//!
//! ```bash
//! HEALTHRISK_SIGNING_KEY_B64_FILE=key.b64 sign_model <artifact_dir> [--nonce-b64 <b64>]
//! ```
//!
//! The signing seed is read from a file; the inline variable is accepted
//! only in debug builds. Seed material is zeroized after use.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use healthrisk::adapters::artifacts::{manifest, ARTIFACT_FILES};

const KEY_FILE_ENV: &str = "HEALTHRISK_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "HEALTHRISK_SIGNING_KEY_B64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn non_empty(secret: &str) -> Result<Zeroizing<String>> {
    let secret = Zeroizing::new(secret.trim_end_matches(['\n', '\r']).to_string());
    if secret.trim().is_empty() {
        bail!("Empty signing key");
    }
    Ok(secret)
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        return non_empty(&content);
    }

    if cfg!(debug_assertions) {
        if let Ok(value) = env::var(KEY_ENV) {
            return non_empty(&Zeroizing::new(value));
        }
    }

    Err(anyhow!(
        "Missing signing key. Set {KEY_FILE_ENV} ({KEY_ENV} is accepted only in debug builds)."
    ))
}

fn read_signing_seed() -> Result<Seed> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn usage() -> anyhow::Error {
    anyhow!("Usage: sign_model <artifact_dir> [--nonce-b64 <b64_16_bytes>]")
}

fn parse_args() -> Result<(PathBuf, Option<String>)> {
    let mut args = env::args().skip(1);
    let mut dir: Option<PathBuf> = None;
    let mut nonce_b64: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--nonce-b64" => nonce_b64 = Some(args.next().ok_or_else(usage)?),
            "-h" | "--help" => return Err(usage()),
            _ if dir.is_none() => dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok((dir.ok_or_else(usage)?, nonce_b64))
}

fn make_nonce_b64() -> String {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    general_purpose::STANDARD.encode(nonce)
}

fn main() -> Result<()> {
    let (dir, nonce_arg) = parse_args()?;
    if !dir.is_dir() {
        bail!("{dir:?} is not a directory");
    }

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let nonce_b64 = nonce_arg.unwrap_or_else(make_nonce_b64);
    let created_at = chrono::Utc::now().timestamp();

    let signed = manifest::write_signed(&dir, &signing_key, &ARTIFACT_FILES, created_at, nonce_b64)
        .with_context(|| format!("Failed to sign {dir:?}"))?;

    println!(
        "Signed {} artifacts in {:?} (created_at={})",
        signed.files.len(),
        dir,
        signed.created_at
    );
    println!(
        "HEALTHRISK_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}
