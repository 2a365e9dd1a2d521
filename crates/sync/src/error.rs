// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the sync engine.

use thiserror::Error;

/// Failure of a single Remote API call.
///
/// Every variant is treated the same by a sync pass: one failed attempt for
/// the operation being dispatched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (DNS, connect, reset).
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not what the API promised.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Result type for Remote API calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Errors surfaced by the sync orchestrator and its configuration.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot sync while offline\n  hint: queued changes will sync when the connection returns")]
    Offline,

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("store error: {0}")]
    Store(#[from] hatch_core::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
