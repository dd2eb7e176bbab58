//! Master-key handling and access-key secret encryption. The master key
//! is the only secret the gateway holds; everything else in the store is
//! ciphertext or public.

use std::path::Path;

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hive_types::error::{ApiError, Code};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

/// Nonce length of AES-256-GCM.
const NONCE_LEN: usize = 12;
/// Access-key secrets are 40 characters, like AWS's.
const SECRET_LEN: usize = 40;
/// Entity-ID suffix length after the `AKIA`/`AIDA`/`ANPA` prefix.
const ID_SUFFIX_LEN: usize = 16;

/// The 32-byte process master key. Read-only after start; used only for
/// access-key encrypt/decrypt.
#[derive(Clone)]
pub struct MasterKey([u8; 32]);

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

impl MasterKey {
    /// Wraps raw key material.
    pub fn from_bytes(bytes: [u8; 32]) -> MasterKey {
        MasterKey(bytes)
    }

    /// A fresh random key.
    pub fn generate() -> MasterKey {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill(&mut bytes);
        MasterKey(bytes)
    }

    /// Loads the key file: exactly 32 bytes, 0600 recommended. A wider
    /// mode is logged, not fatal.
    pub async fn load(path: &Path) -> Result<MasterKey, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::with_message(
                Code::InternalError,
                format!("cannot read master key {}: {e}", path.display()),
            )
        })?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ApiError::with_message(
                Code::InternalError,
                format!(
                    "master key {} must be exactly 32 bytes, found {}",
                    path.display(),
                    bytes.len()
                ),
            )
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = tokio::fs::metadata(path).await {
                let mode = meta.permissions().mode() & 0o777;
                if mode & 0o077 != 0 {
                    warn!(path = %path.display(), mode = format!("{mode:o}"),
                        "master key file is readable by group/other; 0600 recommended");
                }
            }
        }
        Ok(MasterKey(bytes))
    }

    /// Writes the key file with mode 0600.
    pub async fn save(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ApiError::with_message(Code::InternalError, format!("mkdir failed: {e}"))
            })?;
        }
        tokio::fs::write(path, self.0).await.map_err(|e| {
            ApiError::with_message(
                Code::InternalError,
                format!("cannot write master key {}: {e}", path.display()),
            )
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = tokio::fs::set_permissions(path, perms).await;
        }
        Ok(())
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

/// Encrypts an access-key secret: base64(nonce ‖ ciphertext ‖ tag).
pub fn encrypt_secret(key: &MasterKey, plaintext: &str) -> Result<String, ApiError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = key
        .cipher()
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| ApiError::with_message(Code::InternalError, "secret encryption failed"))?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(out))
}

/// Decrypts a stored secret. Any malformed input or wrong key surfaces as
/// `InternalError`; the verifier never leaks which.
pub fn decrypt_secret(key: &MasterKey, encoded: &str) -> Result<String, ApiError> {
    let raw = BASE64
        .decode(encoded.as_bytes())
        .map_err(|_| ApiError::with_message(Code::InternalError, "stored secret is malformed"))?;
    if raw.len() <= NONCE_LEN {
        return Err(ApiError::with_message(
            Code::InternalError,
            "stored secret is truncated",
        ));
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let plaintext = key
        .cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| ApiError::with_message(Code::InternalError, "secret decryption failed"))?;
    String::from_utf8(plaintext)
        .map_err(|_| ApiError::with_message(Code::InternalError, "decrypted secret is not utf-8"))
}

/// A fresh 40-character secret access key.
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

/// A fresh entity ID: the given prefix plus 16 characters from the
/// AWS-style uppercase alphabet.
pub fn generate_id(prefix: &str) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("{prefix}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_types::iam::ACCESS_KEY_ID_PREFIX;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let key = MasterKey::generate();
        let secret = generate_secret();
        let encrypted = encrypt_secret(&key, &secret).unwrap();
        assert_ne!(encrypted, secret);
        assert_eq!(decrypt_secret(&key, &encrypted).unwrap(), secret);
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let encrypted = encrypt_secret(&MasterKey::generate(), "super-secret").unwrap();
        assert!(decrypt_secret(&MasterKey::generate(), &encrypted).is_err());
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let key = MasterKey::generate();
        let a = encrypt_secret(&key, "same").unwrap();
        let b = encrypt_secret(&key, "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_material_has_expected_shape() {
        assert_eq!(generate_secret().len(), 40);
        let id = generate_id(ACCESS_KEY_ID_PREFIX);
        assert_eq!(id.len(), 20);
        assert!(id.starts_with("AKIA"));
    }

    #[test]
    fn truncated_ciphertext_is_an_error() {
        let key = MasterKey::generate();
        assert!(decrypt_secret(&key, "AAAA").is_err());
        assert!(decrypt_secret(&key, "not base64 !!!").is_err());
    }
}
