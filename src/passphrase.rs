//! Sources for the password that keys are derived from
//!
//! Every source hands back the password as UTF-8 text inside `Zeroizing`,
//! so the copy held by the caller is wiped once the key has been derived.

use crate::error::{EncryptorError, ErrorCategory, ErrorKind, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

const PROMPT: &[u8] = b"Password (encryptor): ";

/// Something that can produce the password for one key derivation
pub trait PassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>>;
}

/// A password known up front, e.g. from configuration or a test
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<String>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.passphrase.clone())
    }
}

/// Takes the whole of a byte stream (usually stdin) as the password
///
/// Nothing is trimmed: a trailing newline written by `echo` becomes part of
/// the password, so scripts should use `printf '%s'` or equivalent.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut raw = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut raw).map_err(|e| {
            EncryptorError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading password: {}", e),
                e,
            )
        })?;
        let password = std::str::from_utf8(&raw).map_err(|e| {
            EncryptorError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidPassword,
                "password is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(password.to_owned()))
    }
}

/// Prompts on stderr and reads the password from the controlling terminal
/// with echo turned off
#[derive(Default)]
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(EncryptorError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "stdin is not a terminal; pass --passphrase-stdin to pipe the password in",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(PROMPT)
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                EncryptorError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to show password prompt: {}", e),
                    e,
                )
            })?;

        let typed = rpassword::read_password().map_err(|e| {
            EncryptorError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("could not read password from terminal: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(typed))
    }
}
