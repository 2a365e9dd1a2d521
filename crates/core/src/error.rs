// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for hatch-core operations.

use thiserror::Error;

/// All possible errors that can occur in hatch-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid entity type: '{0}'\n  hint: valid types are: activity, diary_entry, growth_record")]
    InvalidEntityType(String),

    #[error("invalid action: '{0}'\n  hint: valid actions are: create, update, delete")]
    InvalidAction(String),

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data under key '{key}': {reason}")]
    CorruptedData { key: String, reason: String },
}

/// A specialized Result type for hatch-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
