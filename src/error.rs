//! Error types for repfor.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for replacement operations.
#[derive(Error, Debug)]
pub enum RepforError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line too long in {} (max {max_mib}MB)", path.display())]
    LineTooLong { path: PathBuf, max_mib: usize },

    #[error("file is read-only: {}", .0.display())]
    ReadOnly(PathBuf),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A specialized Result type for replacement operations.
pub type Result<T> = std::result::Result<T, RepforError>;
