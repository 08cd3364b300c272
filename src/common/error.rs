//! Error types for the BugReport app tester
//!
//! Every variant here is fatal for a test run: it is propagated up to `main`,
//! printed for the operator and the process exits non-zero. Recoverable
//! outcomes of a status wait live in [`crate::bugreport::WaitError`].

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tester
#[derive(Error, Debug)]
pub enum Error {
    // === Device Command Errors ===
    #[error("adb not found. Searched: {0}. Install platform-tools or set device.adb_path in the config")]
    AdbNotFound(String),

    #[error("Failed to spawn '{program}': {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run command {command}, exit_code={exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    #[error("Failed to pull {what}, exit_code={exit_code}: {output}")]
    PullFailed {
        what: String,
        exit_code: i32,
        output: String,
    },

    // === Precondition Errors ===
    #[error("Failure. dumpstate binary is already running")]
    DumpstateRunning,

    #[error("Failure. Expected only 1 bugreport, but there are {0} bugreports")]
    UnexpectedRecordCount(usize),

    // === Status Store Errors ===
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    // === Lifecycle Errors ===
    #[error("{phase} failed: {message}")]
    PhaseFailed { phase: String, message: String },

    // === Archive Errors ===
    #[error("Failed to read bugreport zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a command failed error from an argument list
    pub fn command_failed<S: AsRef<str>>(args: &[S], exit_code: i32) -> Self {
        Self::CommandFailed {
            command: format!(
                "{:?}",
                args.iter().map(|s| s.as_ref()).collect::<Vec<_>>()
            ),
            exit_code,
        }
    }

    /// Create a phase failed error
    pub fn phase_failed(phase: &str, message: impl Into<String>) -> Self {
        Self::PhaseFailed {
            phase: phase.to_string(),
            message: message.into(),
        }
    }
}
