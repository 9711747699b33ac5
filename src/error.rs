use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee that the error is not caused by
    /// the caller - merely that it cannot be confidently determined by the code.
    Internal,

    /// The caller provided invalid input, a wrong password, or data that has
    /// been corrupted or tampered with.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The password is empty or is not valid UTF-8.
    InvalidPassword,
    /// The envelope does not have the `<ciphertext>,<nonce>` shape, or a
    /// decoded component has an impossible length.
    EnvelopeMalformed,
    /// Base64 decoding of an envelope component failed.
    EnvelopeDecode,
    /// Key derivation parameters were rejected.
    KeyDerivationFailure,
    /// Authentication failed due to a wrong password or salt, or due to
    /// tampering or corruption of the envelope.
    AuthenticationFailed,
    /// The AES-GCM primitive refused to seal data.
    CipherFailure,
    /// The operating system random source could not produce a nonce.
    RandomUnavailable,
    /// Authenticated plaintext was not valid UTF-8.
    PlaintextNotUtf8,
    /// Password could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Unexpected state reached within encryptor logic.
    InternalInvariant,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

/// Coarse grouping of [`ErrorKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected before any cryptographic work was attempted.
    Validation,
    /// The cipher, the random source, or tag verification failed.
    Cryptographic,
    /// Decrypted bytes could not be turned back into text.
    Decoding,
    /// Passwords sources, files and the runtime.
    Environment,
}

impl ErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            ErrorKind::InvalidPassword
            | ErrorKind::EnvelopeMalformed
            | ErrorKind::EnvelopeDecode
            | ErrorKind::KeyDerivationFailure => ErrorClass::Validation,
            ErrorKind::AuthenticationFailed
            | ErrorKind::CipherFailure
            | ErrorKind::RandomUnavailable => ErrorClass::Cryptographic,
            ErrorKind::PlaintextNotUtf8 => ErrorClass::Decoding,
            ErrorKind::PassphraseUnavailable | ErrorKind::InternalInvariant | ErrorKind::Io => {
                ErrorClass::Environment
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct EncryptorError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl EncryptorError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// The coarse class of the failure, if the error carries a kind.
    pub fn class(&self) -> Option<ErrorClass> {
        self.kind.map(ErrorKind::class)
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EncryptorError>;
