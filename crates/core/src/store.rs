// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue store for pending operations and cache snapshots.
//!
//! Layout in the underlying [`KeyValueStore`]:
//!
//! | key                  | value                                  |
//! |----------------------|----------------------------------------|
//! | `pending/<entity>`   | JSON array of pending operations, FIFO |
//! | `cache/<entity>`     | JSON array of records                  |
//! | `abandoned`          | JSON array of abandoned operations     |
//! | `last_sync_at`       | RFC 3339 timestamp                     |
//!
//! Every read-modify-write goes through one lock, so appends from the UI can
//! interleave with a drain without losing writes. Reads return snapshots:
//! a list taken before an append does not see that append.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cache;
use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::kv::{KeyValueStore, SqliteStore};
use crate::op::{AbandonedOperation, PendingOperation};

const ABANDONED_KEY: &str = "abandoned";
const LAST_SYNC_KEY: &str = "last_sync_at";

/// Storage key for an entity type's pending queue.
pub fn pending_key(entity: EntityType) -> String {
    format!("pending/{}", entity.as_str())
}

/// Storage key for an entity type's cache snapshot.
pub fn cache_key(entity: EntityType) -> String {
    format!("cache/{}", entity.as_str())
}

/// Persisted queues, cache snapshots, and sync bookkeeping.
pub struct QueueStore<S = SqliteStore> {
    kv: S,
    lock: Mutex<()>,
}

impl<S: KeyValueStore> QueueStore<S> {
    /// Wrap a key-value store.
    pub fn new(kv: S) -> Self {
        QueueStore {
            kv,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.kv.get(key)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| Error::CorruptedData {
                key: key.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.kv.set(key, &json)
    }

    /// Append an operation to the end of its entity type's queue.
    ///
    /// The store does not deduplicate; callers assign unique ids.
    pub fn enqueue(&self, op: &PendingOperation) -> Result<()> {
        let _guard = self.guard();
        let key = pending_key(op.entity_type);
        let mut ops: Vec<PendingOperation> = self.read_list(&key)?;
        ops.push(op.clone());
        self.write_list(&key, &ops)?;
        tracing::debug!(op_id = %op.id, entity = %op.entity_type, action = %op.action, "enqueued");
        Ok(())
    }

    /// Snapshot of an entity type's queue in FIFO order.
    pub fn list_pending(&self, entity: EntityType) -> Result<Vec<PendingOperation>> {
        let _guard = self.guard();
        self.read_list(&pending_key(entity))
    }

    /// Remove an operation by id.
    ///
    /// Returns false if it was not queued; double removal is not an error.
    pub fn remove(&self, entity: EntityType, op_id: &str) -> Result<bool> {
        let _guard = self.guard();
        Ok(self.take(entity, op_id)?.is_some())
    }

    /// Removes and returns an operation. Caller holds the lock.
    fn take(&self, entity: EntityType, op_id: &str) -> Result<Option<PendingOperation>> {
        let key = pending_key(entity);
        let mut ops: Vec<PendingOperation> = self.read_list(&key)?;
        let Some(pos) = ops.iter().position(|op| op.id == op_id) else {
            return Ok(None);
        };
        let op = ops.remove(pos);
        self.write_list(&key, &ops)?;
        Ok(Some(op))
    }

    /// Increment an operation's retry counter.
    ///
    /// Returns the new count, or `None` if the operation no longer exists.
    pub fn increment_retry(&self, entity: EntityType, op_id: &str) -> Result<Option<u32>> {
        let _guard = self.guard();
        let key = pending_key(entity);
        let mut ops: Vec<PendingOperation> = self.read_list(&key)?;
        let Some(op) = ops.iter_mut().find(|op| op.id == op_id) else {
            return Ok(None);
        };
        op.retry_count = op.retry_count.saturating_add(1);
        let count = op.retry_count;
        self.write_list(&key, &ops)?;
        Ok(Some(count))
    }

    /// Number of operations queued for one entity type.
    pub fn pending_count(&self, entity: EntityType) -> Result<usize> {
        Ok(self.list_pending(entity)?.len())
    }

    /// Number of operations queued across all entity types.
    pub fn total_pending(&self) -> Result<usize> {
        let mut total = 0;
        for entity in EntityType::ALL {
            total += self.pending_count(entity)?;
        }
        Ok(total)
    }

    /// Move an operation from its queue to the abandoned log.
    ///
    /// Returns the abandoned record, or `None` if the operation was already
    /// gone.
    pub fn abandon(
        &self,
        entity: EntityType,
        op_id: &str,
        last_error: &str,
    ) -> Result<Option<AbandonedOperation>> {
        let _guard = self.guard();
        let Some(operation) = self.take(entity, op_id)? else {
            return Ok(None);
        };
        let record = AbandonedOperation {
            operation,
            abandoned_at: Utc::now(),
            last_error: last_error.to_string(),
        };
        let mut log: Vec<AbandonedOperation> = self.read_list(ABANDONED_KEY)?;
        log.push(record.clone());
        self.write_list(ABANDONED_KEY, &log)?;
        Ok(Some(record))
    }

    /// All abandoned operations, oldest first.
    pub fn list_abandoned(&self) -> Result<Vec<AbandonedOperation>> {
        let _guard = self.guard();
        self.read_list(ABANDONED_KEY)
    }

    /// Forget every abandoned operation.
    pub fn clear_abandoned(&self) -> Result<()> {
        let _guard = self.guard();
        self.kv.remove(ABANDONED_KEY)
    }

    /// Put an abandoned operation back at the tail of its queue with a fresh
    /// retry budget.
    pub fn requeue_abandoned(&self, op_id: &str) -> Result<PendingOperation> {
        let _guard = self.guard();
        let mut log: Vec<AbandonedOperation> = self.read_list(ABANDONED_KEY)?;
        let pos = log
            .iter()
            .position(|a| a.operation.id == op_id)
            .ok_or_else(|| Error::OperationNotFound(op_id.to_string()))?;
        let mut op = log.remove(pos).operation;
        op.retry_count = 0;
        op.enqueued_at = Utc::now();

        let key = pending_key(op.entity_type);
        let mut ops: Vec<PendingOperation> = self.read_list(&key)?;
        ops.push(op.clone());
        self.write_list(&key, &ops)?;
        self.write_list(ABANDONED_KEY, &log)?;
        Ok(op)
    }

    /// Replace an entity type's cache snapshot wholesale.
    pub fn cache_snapshot(&self, entity: EntityType, records: &[Value]) -> Result<()> {
        let _guard = self.guard();
        self.write_list(&cache_key(entity), records)
    }

    /// Read an entity type's cache snapshot, if one was ever written.
    pub fn read_snapshot(&self, entity: EntityType) -> Result<Option<Vec<Value>>> {
        let _guard = self.guard();
        let key = cache_key(entity);
        if self.kv.get(&key)?.is_none() {
            return Ok(None);
        }
        self.read_list(&key).map(Some)
    }

    /// Reflect a queued operation in the cache snapshot before it syncs.
    pub fn apply_optimistic(&self, op: &PendingOperation) -> Result<()> {
        let _guard = self.guard();
        let key = cache_key(op.entity_type);
        let mut records: Vec<Value> = self.read_list(&key)?;
        cache::apply(&mut records, op);
        self.write_list(&key, &records)
    }

    /// Record when the last sync pass finished.
    pub fn set_last_sync_at(&self, at: DateTime<Utc>) -> Result<()> {
        let _guard = self.guard();
        self.kv.set(LAST_SYNC_KEY, &at.to_rfc3339())
    }

    /// When the last sync pass finished, if ever.
    pub fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        let _guard = self.guard();
        let Some(raw) = self.kv.get(LAST_SYNC_KEY)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| Error::CorruptedData {
                key: LAST_SYNC_KEY.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
