//! Text encryption/decryption using AES-256-GCM
//!
//! Every call to [`encrypt`] draws a fresh 96-bit nonce from the operating
//! system RNG and returns the result as an [`Envelope`] string. [`decrypt`]
//! validates the envelope shape first, then fails closed on any
//! authentication failure.

use aes_gcm::Nonce;
use aes_gcm::aead::Aead;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::envelope::{Envelope, NONCE_LEN};
use crate::error::{EncryptorError, ErrorCategory, ErrorKind, Result};
use crate::kdf::DerivedKey;

/// Encrypt text under a derived key with a random nonce
///
/// Returns the envelope string `<base64 ciphertext>,<base64 nonce>`.
pub fn encrypt(plaintext: &str, key: &DerivedKey) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.try_fill_bytes(&mut nonce).map_err(|e| {
        EncryptorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::RandomUnavailable,
            format!("failed to generate nonce: {}", e),
            e,
        )
    })?;

    encrypt_with_nonce(plaintext, key, &nonce)
}

/// Encrypt text under a derived key with a caller-provided nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - reusing a nonce under the same key destroys
/// both confidentiality and integrity. Always use `encrypt()`.
pub fn encrypt_with_nonce(
    plaintext: &str,
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
) -> Result<String> {
    let sealed = key
        .cipher()
        .encrypt(Nonce::from_slice(nonce), plaintext.as_bytes())
        .map_err(|_| {
            EncryptorError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                "AES-GCM encryption failed",
            )
        })?;

    tracing::trace!(
        plaintext_len = plaintext.len(),
        ciphertext_len = sealed.len(),
        "sealed"
    );

    Ok(Envelope::new(sealed, *nonce).to_string())
}

/// Decrypt an envelope string produced by [`encrypt`] under the same key
pub fn decrypt(envelope: &str, key: &DerivedKey) -> Result<String> {
    decrypt_envelope(&Envelope::parse(envelope)?, key)
}

/// Decrypt an already parsed envelope
pub fn decrypt_envelope(envelope: &Envelope, key: &DerivedKey) -> Result<String> {
    let plaintext = key
        .cipher()
        .decrypt(Nonce::from_slice(envelope.nonce()), envelope.ciphertext())
        .map(Zeroizing::new)
        .map_err(|_| {
            tracing::debug!("envelope failed authentication");
            EncryptorError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or bad password or salt",
            )
        })?;

    let text = std::str::from_utf8(&plaintext).map_err(|e| {
        EncryptorError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::PlaintextNotUtf8,
            "decrypted data is not valid UTF-8",
            e,
        )
    })?;

    Ok(text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::kdf::{KdfParams, derive_key, derive_key_with};
    use base64::{Engine, engine::general_purpose::STANDARD};

    fn fast_key(password: &str, salt: &str) -> DerivedKey {
        derive_key_with(password, salt, &KdfParams::with_iterations(1_000)).unwrap()
    }

    fn split(envelope: &str) -> (&str, &str) {
        envelope.split_once(',').unwrap()
    }

    #[test]
    fn test_attack_at_dawn() {
        let key = derive_key("correct-horse", "batterystaple").unwrap();

        let e1 = encrypt("attack at dawn", &key).unwrap();
        let (ciphertext64, nonce64) = split(&e1);
        assert!(STANDARD.decode(ciphertext64).is_ok());
        assert_eq!(STANDARD.decode(nonce64).unwrap().len(), NONCE_LEN);
        assert_eq!(decrypt(&e1, &key).unwrap(), "attack at dawn");

        let e2 = encrypt("attack at dawn", &key).unwrap();
        assert_ne!(e1, e2);
        assert_eq!(decrypt(&e2, &key).unwrap(), "attack at dawn");
    }

    #[test]
    fn test_empty_plaintext() {
        let key = fast_key("test", "salt");
        let envelope = encrypt("", &key).unwrap();
        assert_eq!(decrypt(&envelope, &key).unwrap(), "");
    }

    #[test]
    fn test_non_ascii_plaintext() {
        let key = fast_key("test", "salt");
        let plaintext = "héllo wörld ✓ 日本語, with a comma";
        let envelope = encrypt(plaintext, &key).unwrap();
        assert_eq!(decrypt(&envelope, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_large_plaintext() {
        let key = fast_key("test", "salt");
        let plaintext = "x".repeat(128 * 1024);
        let envelope = encrypt(&plaintext, &key).unwrap();
        assert_eq!(decrypt(&envelope, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let key = fast_key("test", "salt");
        let e1 = encrypt("same text", &key).unwrap();
        let e2 = encrypt("same text", &key).unwrap();

        let (c1, n1) = split(&e1);
        let (c2, n2) = split(&e2);
        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_deterministic_encryption() {
        let key = fast_key("test", "salt");
        let nonce = [2u8; NONCE_LEN];

        let e1 = encrypt_with_nonce("hello world", &key, &nonce).unwrap();
        let e2 = encrypt_with_nonce("hello world", &key, &nonce).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(decrypt(&e1, &key).unwrap(), "hello world");
    }

    #[test]
    fn test_separately_derived_keys_agree() {
        let k1 = fast_key("p", "s");
        let k2 = fast_key("p", "s");
        let nonce = [7u8; NONCE_LEN];

        assert_eq!(
            encrypt_with_nonce("hello", &k1, &nonce).unwrap(),
            encrypt_with_nonce("hello", &k2, &nonce).unwrap()
        );

        let envelope = encrypt("hello", &k1).unwrap();
        assert_eq!(decrypt(&envelope, &k2).unwrap(), "hello");
    }

    #[test]
    fn test_wrong_password() {
        let envelope = encrypt("secret data", &fast_key("correct", "salt")).unwrap();
        let err = decrypt(&envelope, &fast_key("wrong", "salt")).expect_err("expected auth failure");

        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert_eq!(err.class(), Some(ErrorClass::Cryptographic));
        assert!(
            err.to_string()
                .contains("corrupt input, tampered-with data, or bad password or salt")
        );
    }

    #[test]
    fn test_wrong_salt() {
        let envelope = encrypt("secret data", &fast_key("correct", "salt-a")).unwrap();
        let err = decrypt(&envelope, &fast_key("correct", "salt-b")).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_wrong_iterations() {
        let k1 = derive_key_with("correct", "salt", &KdfParams::with_iterations(1_000)).unwrap();
        let k2 = derive_key_with("correct", "salt", &KdfParams::with_iterations(1_001)).unwrap();
        let envelope = encrypt("secret data", &k1).unwrap();
        let err = decrypt(&envelope, &k2).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_every_ciphertext_bit_flip_fails() {
        let key = fast_key("test", "salt");
        let envelope = encrypt("attack at dawn", &key).unwrap();
        let (ciphertext64, nonce64) = split(&envelope);
        let ciphertext = STANDARD.decode(ciphertext64).unwrap();

        for byte in 0..ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = ciphertext.clone();
                tampered[byte] ^= 1 << bit;
                let tampered = format!("{},{}", STANDARD.encode(&tampered), nonce64);

                let err = decrypt(&tampered, &key).expect_err("expected auth failure");
                assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
            }
        }
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = fast_key("test", "salt");
        let envelope = encrypt("attack at dawn", &key).unwrap();
        let (ciphertext64, nonce64) = split(&envelope);
        let mut nonce = STANDARD.decode(nonce64).unwrap();
        nonce[0] ^= 0x01;
        let tampered = format!("{},{}", ciphertext64, STANDARD.encode(&nonce));

        let err = decrypt(&tampered, &key).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_swapped_nonce_fails() {
        let key = fast_key("test", "salt");
        let first = encrypt("first", &key).unwrap();
        let second = encrypt("second", &key).unwrap();
        let (c1, _) = split(&first);
        let (_, n2) = split(&second);

        let err = decrypt(&format!("{},{}", c1, n2), &key).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = fast_key("test", "salt");
        let envelope = encrypt("attack at dawn", &key).unwrap();
        let (ciphertext64, nonce64) = split(&envelope);
        let mut ciphertext = STANDARD.decode(ciphertext64).unwrap();
        ciphertext.pop();
        let truncated = format!("{},{}", STANDARD.encode(&ciphertext), nonce64);

        let err = decrypt(&truncated, &key).expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_malformed_envelopes_fail_validation() {
        let key = fast_key("test", "salt");
        let envelope = encrypt("attack at dawn", &key).unwrap();

        let inputs = [
            String::new(),
            envelope.replace(',', ""),
            format!("{},{}", envelope, "JCQkJCQkJCQkJCQk"),
            format!("{} ", envelope),
            format!("!{}", envelope),
        ];
        for input in &inputs {
            let err = decrypt(input, &key).expect_err("expected validation failure");
            assert_eq!(err.class(), Some(ErrorClass::Validation), "{input:?}");
        }
    }

    #[test]
    fn test_decrypt_parsed_envelope() {
        let key = fast_key("test", "salt");
        let parsed = Envelope::parse(&encrypt("attack at dawn", &key).unwrap()).unwrap();
        assert_eq!(decrypt_envelope(&parsed, &key).unwrap(), "attack at dawn");

        let err = decrypt_envelope(&parsed, &fast_key("test", "pepper"))
            .expect_err("expected auth failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_non_utf8_plaintext_fails_cleanly() {
        let key = fast_key("test", "salt");
        let nonce = [9u8; NONCE_LEN];
        let sealed = key
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), &[0xff, 0xfe, 0x00][..])
            .unwrap();
        let envelope = Envelope::new(sealed, nonce).to_string();

        let err = decrypt(&envelope, &key).expect_err("expected decoding failure");
        assert_eq!(err.kind, Some(ErrorKind::PlaintextNotUtf8));
        assert_eq!(err.class(), Some(ErrorClass::Decoding));
    }
}
