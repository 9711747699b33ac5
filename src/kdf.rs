//! Password-based key derivation using PBKDF2-HMAC-SHA256
//!
//! A [`DerivedKey`] is bound to a single (password, salt, iteration count)
//! triple and is only usable for AES-256-GCM sealing and opening inside this
//! crate. It has no way to read, copy out, or serialize the raw
//! key bytes.

use std::fmt;
use std::sync::Arc;

use aes_gcm::{Aes256Gcm, Key};
use aes_gcm::aead::KeyInit;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{EncryptorError, ErrorCategory, ErrorKind, Result};

/// Length of derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count used by existing envelopes
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Tunable key derivation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Parameters with a custom PBKDF2 iteration count.
    ///
    /// Envelopes are only readable with the iteration count they were
    /// written with, so raising this breaks compatibility with existing data.
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Opaque AES-256-GCM key derived from a password and salt.
///
/// Cloning shares the same key material; it is wiped from memory when the
/// last clone is dropped.
#[derive(Clone)]
pub struct DerivedKey {
    key: Arc<Zeroizing<[u8; KEY_LEN]>>,
}

impl DerivedKey {
    pub(crate) fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]))
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive a key from a password and salt with the default parameters
pub fn derive_key(password: &str, salt: &str) -> Result<DerivedKey> {
    derive_key_with(password, salt, &KdfParams::default())
}

/// Derive a key from a password and salt with explicit parameters
pub fn derive_key_with(password: &str, salt: &str, params: &KdfParams) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(EncryptorError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidPassword,
            "password must not be empty",
        ));
    }
    if params.iterations == 0 {
        return Err(EncryptorError::with_kind(
            ErrorCategory::User,
            ErrorKind::KeyDerivationFailure,
            "PBKDF2 iteration count must be at least 1",
        ));
    }

    tracing::debug!(
        iterations = params.iterations,
        salt_len = salt.len(),
        "deriving key"
    );

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut key[..],
    );

    Ok(DerivedKey { key: Arc::new(key) })
}
