//! Encryptor CLI - password-based text file encryption
//!
//! Command-line interface for encrypting and decrypting text files into
//! `<ciphertext>,<nonce>` envelopes using AES-256-GCM with PBKDF2 key
//! derivation.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use encryptor::KdfParams;
use encryptor::file_ops;
use encryptor::kdf::DEFAULT_ITERATIONS;
use encryptor::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};

#[derive(Parser)]
#[command(name = "encryptor")]
#[command(version)]
#[command(about = "Password-based text encryption.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Salt mixed into key derivation; must match the one used to encrypt [required]
    #[arg(long, global = true, env = "ENCRYPTOR_SALT", hide_env_values = true)]
    salt: Option<String>,

    /// PBKDF2-HMAC-SHA256 iteration count
    #[arg(long, global = true, env = "ENCRYPTOR_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a text file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the envelope to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decrypt an envelope file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file holding the envelope
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the decrypted text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Update an envelope file with new content, while validating
    /// that the password and salt are not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing envelope file to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    // clap refuses required global arguments, so presence is checked here.
    let Some(salt) = cli.salt.as_deref() else {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "the --salt option (or ENCRYPTOR_SALT) is required",
            )
            .exit();
    };
    let params = KdfParams::with_iterations(cli.iterations);
    let mut reader = get_passphrase_reader(cli.passphrase_stdin);

    let result = match cli.command {
        Commands::Encrypt { input, output } => {
            file_ops::encrypt_file(&input, &output, salt, &params, &mut *reader)
        }
        Commands::Decrypt { input, output } => {
            file_ops::decrypt_file(&input, &output, salt, &params, &mut *reader)
        }
        Commands::Update { input, output } => {
            file_ops::update_file(&input, &output, salt, &params, &mut *reader)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
