// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending operations for offline mutation tracking.
//!
//! Every write a caregiver makes while the remote API is unreachable becomes a
//! [`PendingOperation`]. Operations are identified by a UUID assigned at
//! enqueue time and target a record by its client-generated UUID, so a
//! `create` and any later `update`/`delete` of the same record always agree
//! on the identifier regardless of when each reaches the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::entity::{Action, EntityType};

/// Unique identifier for a pending operation.
pub type OperationId = String;

/// Generates a fresh globally unique identifier.
///
/// Used both for operation ids and for client-side record ids.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A queued, not-yet-confirmed mutation intent for one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOperation {
    /// Unique identifier, assigned at enqueue time and never reused.
    pub id: OperationId,
    /// The queue this operation belongs to.
    pub entity_type: EntityType,
    /// The mutation to replay.
    pub action: Action,
    /// Client-generated id of the record this operation targets.
    pub record_id: String,
    /// Full record for create, patch plus `id` for update, `id` for delete.
    pub payload: Value,
    /// Number of failed replay attempts so far.
    #[serde(default)]
    pub retry_count: u32,
    /// When the operation was queued. Diagnostics only.
    pub enqueued_at: DateTime<Utc>,
}

impl PendingOperation {
    /// Creates an operation with the given parts and a fresh operation id.
    pub fn new(entity_type: EntityType, action: Action, record_id: String, payload: Value) -> Self {
        PendingOperation {
            id: new_id(),
            entity_type,
            action,
            record_id,
            payload,
            retry_count: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Creates a `create` operation.
    ///
    /// The record id is taken from the payload's `id` field when present;
    /// otherwise a new one is generated and written into the payload.
    pub fn create(entity_type: EntityType, payload: Value) -> Self {
        let record_id = payload
            .get("id")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(new_id);
        let payload = with_id(payload, &record_id);
        Self::new(entity_type, Action::Create, record_id, payload)
    }

    /// Creates an `update` operation carrying a partial patch.
    pub fn update(entity_type: EntityType, record_id: &str, patch: Value) -> Self {
        let payload = with_id(patch, record_id);
        Self::new(entity_type, Action::Update, record_id.to_string(), payload)
    }

    /// Creates a `delete` operation.
    pub fn delete(entity_type: EntityType, record_id: &str) -> Self {
        let payload = with_id(Value::Object(Map::new()), record_id);
        Self::new(entity_type, Action::Delete, record_id.to_string(), payload)
    }

    /// Returns the payload without its `id` field, as sent in an update body.
    pub fn patch(&self) -> Value {
        match &self.payload {
            Value::Object(map) => {
                let mut map = map.clone();
                map.remove("id");
                Value::Object(map)
            }
            other => other.clone(),
        }
    }

    /// Returns true once the retry counter has passed the given ceiling.
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count > max_retries
    }
}

/// Writes `id` into an object payload. Non-object payloads are wrapped.
fn with_id(payload: Value, record_id: &str) -> Value {
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    map.insert("id".to_string(), Value::String(record_id.to_string()));
    Value::Object(map)
}

/// What happened to a single operation during a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "retry_count")]
pub enum OperationOutcome {
    /// Reached the server and was removed from the queue.
    Synced,
    /// Failed and stays queued with the given retry count.
    Retrying(u32),
    /// Failed past the retry ceiling and moved to the abandoned log.
    Abandoned,
    /// Not attempted because an earlier operation on the same record is
    /// still queued.
    Deferred,
}

/// An operation that exhausted its retries, kept so the loss is observable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbandonedOperation {
    /// The operation as it was when abandoned.
    pub operation: PendingOperation,
    /// When it was abandoned.
    pub abandoned_at: DateTime<Utc>,
    /// The error from the final attempt.
    pub last_error: String,
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
