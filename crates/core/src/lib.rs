// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! hatch-core: Shared library for the hatch offline sync engine
//!
//! This crate provides the data model for queued mutations (entity types,
//! actions, pending operations, outcomes) and the durable queue store that
//! persists them alongside cache snapshots across process restarts.

pub mod cache;
pub mod entity;
pub mod error;
pub mod kv;
pub mod op;
pub mod store;

pub use entity::{Action, EntityType};
pub use error::{Error, Result};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore};
pub use op::{new_id, AbandonedOperation, OperationId, OperationOutcome, PendingOperation};
pub use store::QueueStore;
