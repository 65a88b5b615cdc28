/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging for update
    classification, filtering and report generation.

  Security / Safety Notes:
    Entries carry package names and counts only; no secrets
    pass through the classification pipeline.

  Dependencies:
    std::fs::File, std::sync::Mutex, chrono for UTC stamps,
    sha2 for session integrity hashing.

  Operational Scope:
    Shared by the classifier (skip notices), the ignore filter
    (ignored/warned decisions) and the binary entry point.

  Revision History:
    2024-11-04 COD  Established logging module for Syn-Syu-Core.
    2025-11-12 COD  Added in-memory capture for notice auditing.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Result, SysupError};

/// Structured log level for sysup events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// One captured entry, kept when the logger runs in capture mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub code: String,
    pub message: String,
}

/// Shared logger that emits append-only entries in Synavera format.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
    echo: bool,
    captured: Option<Mutex<Vec<LogEntry>>>,
}

impl Logger {
    /// Build a logger that writes to stderr and optionally to a file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let file = match path {
            Some(ref file_path) => Some(Mutex::new(BufWriter::new(open_log(file_path)?))),
            None => None,
        };

        Ok(Self {
            file,
            path,
            verbose,
            echo: true,
            captured: None,
        })
    }

    /// Logger that keeps entries in memory and never touches stderr.
    pub fn capturing() -> Self {
        Self {
            file: None,
            path: None,
            verbose: false,
            echo: false,
            captured: Some(Mutex::new(Vec::new())),
        }
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let message = message.as_ref();
        if let Some(captured) = &self.captured {
            if let Ok(mut guard) = captured.lock() {
                guard.push(LogEntry {
                    level,
                    code: code.to_string(),
                    message: message.to_string(),
                });
            }
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let payload = format!("{timestamp} [{}] [{}] {}", level.as_str(), code, message);

        if self.echo && (self.verbose || level == LogLevel::Error || level == LogLevel::Warn) {
            eprintln!("{payload}");
        }

        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                if writeln!(guard, "{payload}").is_err() || guard.flush().is_err() {
                    eprintln!(
                        "{} [{}] [LOGGER] Failed to write to log file",
                        timestamp,
                        LogLevel::Error.as_str()
                    );
                }
            }
        }
    }

    /// Convenience wrapper for `INFO` level events.
    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    /// Convenience wrapper for `WARN` level events.
    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    /// Convenience wrapper for `ERROR` level events.
    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    /// Convenience wrapper for `DEBUG` level events.
    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Entries recorded so far; empty unless built with [`Logger::capturing`].
    pub fn entries(&self) -> Vec<LogEntry> {
        self.captured
            .as_ref()
            .and_then(|captured| captured.lock().ok().map(|guard| guard.clone()))
            .unwrap_or_default()
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compute and persist SHA-256 digest of the log file.
    pub fn finalize(&self) -> Result<()> {
        let Some(path) = self.path() else {
            return Ok(());
        };
        let data = std::fs::read(path).map_err(|err| {
            SysupError::Filesystem(format!(
                "Failed to read log for hashing {}: {err}",
                path.display()
            ))
        })?;
        let digest = Sha256::digest(&data);

        let mut hash_os = path.as_os_str().to_os_string();
        hash_os.push(".hash");
        let hash_path = PathBuf::from(hash_os);
        let line = format!(
            "{:x}  {}\n",
            digest,
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        std::fs::write(&hash_path, line).map_err(|err| {
            SysupError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })
    }
}

fn open_log(file_path: &Path) -> Result<File> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            SysupError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .map_err(|err| {
            SysupError::Filesystem(format!(
                "Failed to open log file {}: {err}",
                file_path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_logger_records_entries_in_order() {
        let logger = Logger::capturing();
        logger.warn("OUTOFDATE", "foo skipped");
        logger.debug("SORT", "sorted 3 records");

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].code, "OUTOFDATE");
        assert_eq!(entries[1].message, "sorted 3 records");
    }

    #[test]
    fn finalize_writes_digest_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("sysup.log");
        let logger = Logger::new(Some(log_path.clone()), false).unwrap();
        logger.info("INIT", "hello");
        logger.finalize().unwrap();

        let sidecar = std::fs::read_to_string(dir.path().join("logs").join("sysup.log.hash"))
            .unwrap();
        let (digest, name) = sidecar.trim_end().split_once("  ").unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(name, "sysup.log");
    }
}
