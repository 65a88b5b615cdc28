/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise sysup error types so the classification core
    and the pacman/AUR adapters share one failure taxonomy.

  Security / Safety Notes:
    Error contexts carry package names and command lines only;
    no credentials or file contents are embedded.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Malformed snapshot data aborts classification; adapter
    failures map to stable exit codes for the binary.

  Revision History:
    2024-11-04 COD  Established shared error definitions.
    2025-11-12 COD  Added malformed-input domain for the
                    update classifier.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - Expected outcomes (ignored, not found) modelled as data
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for sysup operations.
pub type Result<T> = std::result::Result<T, SysupError>;

/// Enumerates high-level error domains surfaced by sysup.
#[derive(Debug, Error)]
pub enum SysupError {
    /// A snapshot violates the record invariants; signals a caller bug.
    #[error("Malformed input for `{name}`: {reason}")]
    MalformedInput { name: String, reason: String },
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SysupError {
    /// Shorthand for [`SysupError::MalformedInput`].
    pub fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SysupError::MalformedInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SysupError::CommandMissing { .. } => ExitCode::from(10),
            SysupError::CommandFailure { .. } => ExitCode::from(11),
            SysupError::Config(_) => ExitCode::from(20),
            SysupError::Network(_) => ExitCode::from(30),
            SysupError::Serialization(_) => ExitCode::from(31),
            SysupError::Filesystem(_) => ExitCode::from(40),
            SysupError::Io(_) => ExitCode::from(41),
            SysupError::Runtime(_) => ExitCode::from(50),
            SysupError::MalformedInput { .. } => ExitCode::from(60),
        }
    }
}
