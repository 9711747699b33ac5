//! Text envelope for encrypted data
//!
//! The envelope format is:
//!
//! ```text
//! <base64 ciphertext>,<base64 nonce>
//! ```
//!
//! Both components use the standard, padded Base64 alphabet, which never
//! contains a comma. The ciphertext component carries the AES-GCM output
//! with its 16-byte authentication tag appended.

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{EncryptorError, ErrorCategory, ErrorKind, Result};

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

const SEPARATOR: char = ',';

/// Ciphertext (including tag) and the nonce it was sealed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_LEN],
}

impl Envelope {
    pub(crate) fn new(ciphertext: Vec<u8>, nonce: [u8; NONCE_LEN]) -> Self {
        Self { ciphertext, nonce }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Parse an envelope string, validating its shape before any decryption
    pub fn parse(envelope: &str) -> Result<Self> {
        let mut parts = envelope.split(SEPARATOR);
        let (ciphertext64, nonce64) = match (parts.next(), parts.next(), parts.next()) {
            (Some(ciphertext64), Some(nonce64), None) => (ciphertext64, nonce64),
            _ => {
                return Err(EncryptorError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::EnvelopeMalformed,
                    "envelope must contain exactly one ',' separating ciphertext and nonce",
                ));
            }
        };

        if ciphertext64.is_empty() {
            return Err(malformed("envelope ciphertext is empty"));
        }
        if nonce64.is_empty() {
            return Err(malformed("envelope nonce is empty"));
        }

        let ciphertext = decode_component("ciphertext", ciphertext64)?;
        let nonce = decode_component("nonce", nonce64)?;

        let nonce: [u8; NONCE_LEN] = nonce.as_slice().try_into().map_err(|_| {
            malformed(format!(
                "envelope nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce.len()
            ))
        })?;

        if ciphertext.len() < TAG_LEN {
            return Err(malformed(format!(
                "envelope ciphertext shorter than the {}-byte authentication tag; likely truncated",
                TAG_LEN
            )));
        }

        Ok(Self { ciphertext, nonce })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            STANDARD.encode(&self.ciphertext),
            SEPARATOR,
            STANDARD.encode(self.nonce)
        )
    }
}

impl FromStr for Envelope {
    type Err = EncryptorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn decode_component(name: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        EncryptorError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::EnvelopeDecode,
            format!("base64 decoding of envelope {} failed: {}", name, e),
            e,
        )
    })
}

fn malformed(msg: impl Into<String>) -> EncryptorError {
    EncryptorError::with_kind(ErrorCategory::User, ErrorKind::EnvelopeMalformed, msg)
}
