//! Signed model manifests.
//!
//! The export step writes `manifest.json` (SHA-256 of every artifact file)
//! next to the artifact and signs its exact bytes with Ed25519 into
//! `model.sig`. Loading verifies the signature first, then that every bound
//! file still hashes to the recorded digest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ModelError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Allowed clock skew for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedModelManifest {
    pub version: u32,
    pub serial: u64,
    pub created_at: i64,
    /// Relative path -> lowercase SHA-256 hex
    pub files: BTreeMap<String, String>,
}

impl SignedModelManifest {
    /// Whether `name` is bound by this manifest.
    #[must_use]
    pub fn binds(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Check `bytes` against the digest recorded for `name`.
    ///
    /// # Errors
    /// Returns `ModelError::Manifest` if `name` is not bound or the digest
    /// differs.
    pub fn check_bytes(&self, name: &str, bytes: &[u8]) -> Result<(), ModelError> {
        let expected_hex = self.files.get(name).ok_or_else(|| {
            ModelError::Manifest(format!("{name} is not bound by the signed manifest"))
        })?;
        if !constant_time_eq_str(&sha256_hex(bytes), expected_hex) {
            return Err(ModelError::Manifest(format!("File hash mismatch for {name}")));
        }
        Ok(())
    }
}

/// Whether `dir` carries a manifest and signature.
pub fn is_signed(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).exists() && dir.join(SIGNATURE_FILE).exists()
}

/// Verify the manifest in `dir` against `key` and check all bound hashes.
///
/// # Errors
/// Returns `ModelError::Signature` if the signature is malformed or invalid,
/// `ModelError::Manifest` if the manifest is malformed, stale, or a bound
/// file is missing or altered.
pub fn verify(dir: &Path, key: &VerifyingKey) -> Result<SignedModelManifest, ModelError> {
    let sig_path = dir.join(SIGNATURE_FILE);
    let manifest_path = dir.join(MANIFEST_FILE);

    let sig_bytes = fs::read(&sig_path)
        .map_err(|e| ModelError::Signature(format!("Failed to read signature: {e}")))?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Signature("Invalid signature length (expected 64 bytes)".into()))?;
    let signature = Signature::from_bytes(&sig_array);

    let manifest_content = fs::read(&manifest_path)
        .map_err(|e| ModelError::Manifest(format!("Failed to read manifest: {e}")))?;

    key.verify(&manifest_content, &signature)
        .map_err(|_| ModelError::Signature("Invalid model signature".into()))?;

    let manifest: SignedModelManifest = serde_json::from_slice(&manifest_content)
        .map_err(|e| ModelError::Manifest(format!("Invalid manifest.json format: {e}")))?;

    if manifest.version != 1 {
        return Err(ModelError::Manifest(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    if manifest.created_at > unix_now() + MAX_FUTURE_SKEW_SECS {
        return Err(ModelError::Manifest(
            "manifest created_at is in the future".into(),
        ));
    }
    if manifest.files.is_empty() {
        return Err(ModelError::Manifest("manifest.json contains no files".into()));
    }

    for rel in manifest.files.keys() {
        if Path::new(rel).components().count() != 1 {
            return Err(ModelError::Manifest(format!(
                "Manifest entry {rel:?} must be a plain file name"
            )));
        }
        let path = dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ModelError::Manifest(format!(
                "Manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        manifest.check_bytes(rel, &bytes)?;
    }

    tracing::info!(
        serial = manifest.serial,
        files = manifest.files.len(),
        "Model signature and hashes verified"
    );
    Ok(manifest)
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ModelError::Signature` if the text is not base64 of a valid
/// 32-byte key.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelError::Signature("Invalid public key base64".into()))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Signature("Invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ModelError::Signature("Invalid verifying key".into()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// Constant-time compare for ASCII hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_verify_valid_manifest() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join("model.json"), b"{}").expect("write model");
        let key = signing_key();
        sign_dir(dir, &key, &["model.json"], now());

        assert!(is_signed(dir));
        let manifest = verify(dir, &key.verifying_key()).expect("valid manifest");
        assert!(manifest.binds("model.json"));
        assert!(!manifest.binds("other.json"));
    }

    #[test]
    fn test_verify_rejects_tampered_file() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join("model.json"), b"{}").expect("write model");
        let key = signing_key();
        sign_dir(dir, &key, &["model.json"], now());
        fs::write(dir.join("model.json"), b"{\"tampered\":true}").expect("tamper");

        let err = verify(dir, &key.verifying_key()).expect_err("hash mismatch");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join("model.json"), b"{}").expect("write model");
        sign_dir(dir, &signing_key(), &["model.json"], now());

        let err = verify(dir, &signing_key().verifying_key()).expect_err("wrong key");
        assert!(matches!(err, ModelError::Signature(_)));
    }

    #[test]
    fn test_verify_rejects_future_manifest() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join("model.json"), b"{}").expect("write model");
        let key = signing_key();
        sign_dir(dir, &key, &["model.json"], now() + 3600);

        let err = verify(dir, &key.verifying_key()).expect_err("future manifest");
        assert!(err.to_string().contains("future"));
    }

    #[test]
    fn test_verify_rejects_missing_bound_file() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        let key = signing_key();
        sign_dir(dir, &key, &["model.json"], now());

        let err = verify(dir, &key.verifying_key()).expect_err("missing file");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_check_bytes() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        fs::write(dir.join("model.json"), b"{}").expect("write model");
        let key = signing_key();
        sign_dir(dir, &key, &["model.json"], now());
        let manifest = verify(dir, &key.verifying_key()).expect("valid manifest");

        assert!(manifest.check_bytes("model.json", b"{}").is_ok());
        let err = manifest
            .check_bytes("model.json", b"{\"swapped\":true}")
            .expect_err("altered bytes");
        assert!(err.to_string().contains("hash mismatch"));
        assert!(manifest.check_bytes("other.json", b"{}").is_err());
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key().verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        let decoded = verifying_key_from_b64(&format!("{b64}\n")).expect("decode key");
        assert_eq!(decoded, key);
        assert!(verifying_key_from_b64("not base64!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }

    #[test]
    fn test_constant_time_eq_str() {
        assert!(constant_time_eq_str("abcd", "abcd"));
        assert!(!constant_time_eq_str("abcd", "abce"));
        assert!(!constant_time_eq_str("abc", "abcd"));
    }
}
