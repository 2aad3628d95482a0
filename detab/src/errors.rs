/// This module defines the error type shared by every stage of a detab run.
///
/// # Error Categories
///
/// Errors fall into two groups, and the pipeline treats them differently:
///
/// 1. **Run-level errors** abort the run and are returned to the caller:
///    - `InvalidArgument` / `InvalidPattern` are raised while validating the
///      configuration, before any worker thread is started.
///    - `Scan` is raised when a directory cannot be listed. Files that were
///      already handed to a worker are still rewritten.
///
/// 2. **Per-file errors** (`FileIo`, `Encoding`) are recorded in the run summary
///    and never stop other files from being processed:
///    ```rust,ignore
///    let summary = detab::run(&config)?;
///    for failure in &summary.failures {
///        eprintln!("{}: {}", failure.path.display(), failure.message);
///    }
///    ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for detab operations
pub type DetabResult<T> = Result<T, DetabError>;

/// Errors that can occur while scanning and rewriting files
#[derive(Error, Debug)]
pub enum DetabError {
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("I/O error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid UTF-8 in file {path}: {source}")]
    Encoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl DetabError {
    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn encoding(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::Encoding {
            path: path.into(),
            source,
        }
    }

    pub fn worker_pool(msg: impl Into<String>) -> Self {
        Self::WorkerPool(msg.into())
    }

    /// The file or directory this error is tied to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Scan { path, .. } | Self::FileIo { path, .. } | Self::Encoding { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

impl From<config::ConfigError> for DetabError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<regex::Error> for DetabError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}
