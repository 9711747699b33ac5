//! Password-based text encryption
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 (100,000 iterations by default)
//! and text is sealed with AES-256-GCM into a compact envelope:
//!
//! ```text
//! <base64 ciphertext>,<base64 nonce>
//! ```
//!
//! ```
//! let key = encryptor::derive_key("correct-horse", "batterystaple")?;
//! let envelope = encryptor::encrypt("attack at dawn", &key)?;
//! assert_eq!(encryptor::decrypt(&envelope, &key)?, "attack at dawn");
//! # Ok::<(), encryptor::EncryptorError>(())
//! ```

#![forbid(unsafe_code)]

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod kdf;
#[cfg(feature = "tokio")]
pub mod nonblocking;
pub mod passphrase;

pub use cipher::{decrypt, encrypt};
pub use envelope::Envelope;
pub use error::{EncryptorError, ErrorCategory, ErrorClass, ErrorKind, Result};
pub use kdf::{DerivedKey, KdfParams, derive_key, derive_key_with};
