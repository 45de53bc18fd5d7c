// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for session replay.

use motionboard_timeline::SyncError;

/// Errors raised while loading or replaying a script
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Script could not be parsed
    #[error("Script parse error: {0}")]
    Script(#[from] ron::error::SpannedError),

    /// Report could not be serialized
    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),

    /// Timeline operation failed
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Script refers to an object name never added
    #[error("Unknown object: {0}")]
    UnknownObject(String),

    /// Script refers to a unit name never created
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Script reuses a name
    #[error("Name already in use: {0}")]
    DuplicateName(String),
}

/// Result type for replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;
