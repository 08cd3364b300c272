//! External command execution
//!
//! [`CommandRunner`] is the seam between the tester and the device. The
//! production implementation shells out to `adb`; tests substitute a scripted
//! runner implementing the same contract.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::common::{Error, Result};

/// Exit code and captured stdout of one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<String>,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: &str) -> Self {
        Self {
            exit_code,
            stdout: split_lines(stdout),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes a device-control command and captures its stdout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the device utility with `args`; a non-zero exit is not an error here
    async fn run(&self, args: &[&str]) -> Result<CommandOutput>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        (**self).run(args).await
    }
}

/// Runs `adb`, optionally pinned to one device serial
#[derive(Debug, Clone)]
pub struct AdbRunner {
    program: PathBuf,
    serial: Option<String>,
}

impl AdbRunner {
    /// Resolve the adb executable (PATH lookup for bare names)
    pub fn new(adb_path: &Path, serial: Option<String>) -> Result<Self> {
        let program = which::which(adb_path)
            .map_err(|_| Error::AdbNotFound(adb_path.display().to_string()))?;
        Ok(Self { program, serial })
    }

    fn full_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s");
            full.push(serial.as_str());
        }
        full.extend_from_slice(args);
        full
    }
}

#[async_trait]
impl CommandRunner for AdbRunner {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let full = self.full_args(args);
        tracing::debug!(program = %self.program.display(), args = ?full, "running adb");

        // stderr goes straight to the operator's terminal
        let output = Command::new(&self.program)
            .args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| Error::CommandSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(exit_code, "adb finished");
        Ok(CommandOutput::new(
            exit_code,
            &String::from_utf8_lossy(&output.stdout),
        ))
    }
}

/// Split command output on `\n` and `\r\n`
///
/// Empty output has no lines. A trailing newline leaves a trailing empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut pieces: Vec<&str> = text.split('\n').collect();
    let last = pieces.len() - 1;
    for piece in &mut pieces[..last] {
        let line: &str = *piece;
        *piece = line.strip_suffix('\r').unwrap_or(line);
    }
    pieces.into_iter().map(str::to_string).collect()
}
