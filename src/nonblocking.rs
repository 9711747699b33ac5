//! Awaitable versions of the key derivation and cipher operations
//!
//! Each call moves its inputs onto tokio's blocking thread pool so that the
//! 100,000-iteration PBKDF2 run does not stall the async executor. Dropping
//! a returned future only discards the result; the operations have no other
//! side effects.

use tokio::task::{self, JoinError};
use zeroize::Zeroizing;

use crate::cipher;
use crate::error::{EncryptorError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{self, DerivedKey, KdfParams};

/// Derive a key with the default parameters on the blocking pool
pub async fn derive_key(password: &str, salt: &str) -> Result<DerivedKey> {
    derive_key_with(password, salt, &KdfParams::default()).await
}

/// Derive a key with explicit parameters on the blocking pool
pub async fn derive_key_with(password: &str, salt: &str, params: &KdfParams) -> Result<DerivedKey> {
    let password = Zeroizing::new(password.to_owned());
    let salt = salt.to_owned();
    let params = *params;
    task::spawn_blocking(move || kdf::derive_key_with(&password, &salt, &params))
        .await
        .map_err(join_error)?
}

/// Encrypt text on the blocking pool
pub async fn encrypt(plaintext: &str, key: &DerivedKey) -> Result<String> {
    let plaintext = Zeroizing::new(plaintext.to_owned());
    let key = key.clone();
    task::spawn_blocking(move || cipher::encrypt(&plaintext, &key))
        .await
        .map_err(join_error)?
}

/// Decrypt an envelope on the blocking pool
pub async fn decrypt(envelope: &str, key: &DerivedKey) -> Result<String> {
    let envelope = envelope.to_owned();
    let key = key.clone();
    task::spawn_blocking(move || cipher::decrypt(&envelope, &key))
        .await
        .map_err(join_error)?
}

fn join_error(e: JoinError) -> EncryptorError {
    EncryptorError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::InternalInvariant,
        format!("blocking crypto task did not complete: {}", e),
        e,
    )
}
