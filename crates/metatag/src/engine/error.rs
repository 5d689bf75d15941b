//! Error types for the tagging engine

use std::io;
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] metatag_db::DbError),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Nothing to undo for file {0}")]
    NothingToUndo(i64),

    #[error("File not found: {0}")]
    FileNotFound(i64),

    #[error("Tag rule not found: {0}")]
    RuleNotFound(i64),

    #[error("Preset rule '{0}' cannot be deleted")]
    PresetRule(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
