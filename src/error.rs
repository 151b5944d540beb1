//! Error types for taskbucket
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, malformed task file)
//! - 4: Operation failed (I/O, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskbucket CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskbucket operations
#[derive(Error, Debug)]
pub enum Error {
    // Per-record errors (quarantined by the loader)
    #[error("Invalid deadline for task {task_id}: {reason}")]
    InvalidDeadline { task_id: String, reason: String },

    #[error("Invalid task record: {0}")]
    InvalidTaskRecord(String),

    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),

    #[error("Task file not found: {0}")]
    TaskFileNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidDeadline { .. }
            | Error::InvalidTaskRecord(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::InvalidTimezone(_)
            | Error::TaskFileNotFound(_)
            | Error::ConfigNotFound(_) => exit_codes::USER_ERROR,

            Error::Io(_) | Error::Json(_) | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for the JSON error envelope, when the variant has any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidDeadline { task_id, reason } => Some(serde_json::json!({
                "task_id": task_id,
                "reason": reason,
            })),
            Error::TaskFileNotFound(path) | Error::ConfigNotFound(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskbucket operations
pub type Result<T> = std::result::Result<T, Error>;
