//! File encryption/decryption operations
//!
//! High-level helpers for keeping text files at rest as envelope files.
//! The key for every operation is derived from a password obtained from a
//! [`PassphraseReader`] and the caller-supplied salt.

use crate::cipher;
use crate::envelope::Envelope;
use crate::error::{EncryptorError, ErrorCategory, ErrorKind, Result};
use crate::kdf::{self, DerivedKey, KdfParams};
use crate::passphrase::PassphraseReader;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use zeroize::Zeroizing;

/// Encrypt a text file
///
/// Reads UTF-8 plaintext from `input_path`, encrypts it under the key derived
/// from the password and `salt`, and writes the envelope to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    salt: &str,
    params: &KdfParams,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let plaintext = read_text(input_path, "input file is not valid UTF-8")?;
    let key = read_key(salt, params, passphrase_reader)?;
    let envelope =
        cipher::encrypt(&plaintext, &key).map_err(|e| e.with_context("encryption failed"))?;
    write_file_secure(output_path, envelope.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::debug!(output = %output_path.display(), "wrote envelope");
    Ok(())
}

/// Decrypt an envelope file
///
/// Reads the envelope from `input_path`, decrypts it under the key derived
/// from the password and `salt`, and writes the plaintext to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    salt: &str,
    params: &KdfParams,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let envelope = read_envelope(input_path)?;
    let key = read_key(salt, params, passphrase_reader)?;
    let plaintext = Zeroizing::new(
        cipher::decrypt_envelope(&envelope, &key)
            .map_err(|e| e.with_context("failed to decrypt"))?,
    );
    write_file_secure(output_path, plaintext.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::debug!(output = %output_path.display(), "wrote plaintext");
    Ok(())
}

/// Update an envelope file with new plaintext using the same password and salt
///
/// This function:
/// 1. Decrypts the existing file at `crypt_path` to validate the password and salt
/// 2. Reads new plaintext from `plain_path`
/// 3. Encrypts the new plaintext under the validated key with a fresh nonce
/// 4. Atomically writes to `crypt_path` (tempfile + fsync + rename)
///
/// The atomic write ensures that either the old file or the new file exists,
/// never a partial/corrupted file.
pub fn update_file(
    plain_path: &Path,
    crypt_path: &Path,
    salt: &str,
    params: &KdfParams,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let envelope = read_envelope(crypt_path)?;
    let key = read_key(salt, params, passphrase_reader)?;

    // Validate password and salt by decrypting existing file (discard plaintext)
    drop(Zeroizing::new(
        cipher::decrypt_envelope(&envelope, &key)
            .map_err(|e| e.with_context("failed to decrypt"))?,
    ));

    let crypt_dir = match crypt_path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => {
            return Err(EncryptorError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                "crypt_path has no parent directory",
            ));
        }
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(crypt_dir)
        .map_err(|e| internal_io("failed to create tempfile", e))?;
    let new_plaintext = read_text(plain_path, "input file is not valid UTF-8")?;
    let new_envelope =
        cipher::encrypt(&new_plaintext, &key).map_err(|e| e.with_context("failed to encrypt"))?;

    temp_file
        .write_all(new_envelope.as_bytes())
        .map_err(|e| internal_io("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| internal_io("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| internal_io("failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| internal_io("failed to get tempfile metadata", e))?
            .permissions();
        perms.set_mode(0o600);
        temp_file
            .as_file()
            .set_permissions(perms)
            .map_err(|e| internal_io("failed to set tempfile permissions", e))?;
    }
    temp_file.persist(crypt_path).map_err(|e| {
        internal_io(
            format!("failed to rename to target file {}", crypt_path.display()),
            e.error,
        )
    })?;

    tracing::debug!(output = %crypt_path.display(), "replaced envelope");
    Ok(())
}

fn read_key(
    salt: &str,
    params: &KdfParams,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<DerivedKey> {
    let passphrase = passphrase_reader.read_passphrase()?;
    kdf::derive_key_with(&passphrase, salt, params)
        .map_err(|e| e.with_context("failed to derive key"))
}

/// Reads and parses an envelope file; shape errors surface before any password is read.
fn read_envelope(path: &Path) -> Result<Envelope> {
    let text = read_text(path, "envelope file is not valid UTF-8")?;
    Envelope::parse(&text)
        .map_err(|e| e.with_context(format!("invalid envelope in {}", path.display())))
}

fn read_text(path: &Path, not_utf8_msg: &str) -> Result<Zeroizing<String>> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        EncryptorError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            not_utf8_msg,
            e.utf8_error(),
        )
    })?;
    Ok(Zeroizing::new(text))
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                EncryptorError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents)
            .map_err(|e| internal_io(format!("failed to write {}", path.display()), e))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            EncryptorError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> EncryptorError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    EncryptorError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

fn internal_io(msg: impl Into<String>, err: io::Error) -> EncryptorError {
    EncryptorError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}
