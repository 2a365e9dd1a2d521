// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optimistic application of queued operations to cached records.
//!
//! Cached records are JSON objects keyed by their `id` field. Updates merge
//! top-level fields, so the last writer wins per field until the next full
//! refresh replaces the snapshot wholesale.

use serde_json::Value;

use crate::entity::Action;
use crate::op::PendingOperation;

/// Applies `op` to `records` in place.
pub fn apply(records: &mut Vec<Value>, op: &PendingOperation) {
    match op.action {
        Action::Create => {
            records.retain(|r| record_id(r) != Some(op.record_id.as_str()));
            records.push(op.payload.clone());
        }
        Action::Update => {
            let Value::Object(patch) = &op.payload else {
                return;
            };
            if let Some(Value::Object(record)) = records
                .iter_mut()
                .find(|r| record_id(r) == Some(op.record_id.as_str()))
            {
                for (field, value) in patch {
                    record.insert(field.clone(), value.clone());
                }
            }
        }
        Action::Delete => {
            records.retain(|r| record_id(r) != Some(op.record_id.as_str()));
        }
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
