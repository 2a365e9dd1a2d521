// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! hatch-sync: offline-first sync engine.
//!
//! Mutations made while offline are queued in a durable store and replayed
//! to the backend when connectivity returns.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ events ┌──────────────────┐      ┌─────────────┐
//! │ Connectivity │───────►│ SyncOrchestrator │─────►│  RemoteApi  │
//! │   Monitor    │ (mpsc) │                  │◄─────│   (trait)   │
//! └──────────────┘        └──────────────────┘      └─────────────┘
//!                            │            │
//!                            ▼            ▼
//!                     ┌────────────┐ ┌───────────┐
//!                     │ QueueStore │ │ Listeners │  (UI callbacks)
//!                     └────────────┘ └───────────┘
//! ```
//!
//! # Features
//!
//! - Per-entity-type FIFO queues persisted in SQLite
//! - At most one sync pass at a time
//! - Retry ceiling with an abandoned-operation log
//! - Cache snapshots for offline reads, optionally updated optimistically
//! - Injectable remote API and connectivity for testing

pub mod config;
pub mod connectivity;
pub mod error;
pub mod http;
pub mod listeners;
pub mod logging;
pub mod orchestrator;
pub mod remote;
pub mod report;

pub use config::{RemoteConfig, SyncConfig};
pub use connectivity::{
    spawn_probe, ConnectivityEvent, ConnectivityHandle, ConnectivityMonitor, ReachabilityProbe,
};
pub use error::{RemoteError, RemoteResult, SyncError, SyncResult};
pub use http::{HttpProbe, HttpRemoteApi};
pub use listeners::Unsubscribe;
pub use orchestrator::SyncOrchestrator;
pub use remote::{ListFilter, RemoteApi, RemoteFuture};
pub use report::{OperationReport, SyncReport, SyncStatus, WriteOutcome};

#[cfg(test)]
mod test_helpers;
