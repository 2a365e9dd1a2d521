// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Results of sync passes and writes.

use chrono::{DateTime, Utc};
use hatch_core::{EntityType, OperationId, OperationOutcome};
use serde::Serialize;
use serde_json::Value;

/// Outcome of one operation within a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub op_id: OperationId,
    pub entity_type: EntityType,
    pub outcome: OperationOutcome,
}

/// Summary of one completed sync pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Per-operation outcomes in dispatch order.
    pub outcomes: Vec<OperationReport>,
    /// Entity types whose cache snapshot was refreshed.
    pub refreshed: Vec<EntityType>,
    /// Connectivity dropped mid-pass; the rest of the queue was left alone.
    pub interrupted: bool,
}

impl SyncReport {
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        SyncReport {
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
            refreshed: Vec::new(),
            interrupted: false,
        }
    }

    pub(crate) fn record(
        &mut self,
        op_id: &str,
        entity_type: EntityType,
        outcome: OperationOutcome,
    ) {
        self.outcomes.push(OperationReport {
            op_id: op_id.to_string(),
            entity_type,
            outcome,
        });
    }

    fn count(&self, pred: impl Fn(&OperationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::Synced))
    }

    pub fn retrying(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::Retrying(_)))
    }

    pub fn abandoned(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::Abandoned))
    }

    pub fn deferred(&self) -> usize {
        self.count(|o| matches!(o, OperationOutcome::Deferred))
    }

    /// Outcome of a specific operation, if it was visited this pass.
    pub fn outcome_of(&self, op_id: &str) -> Option<OperationOutcome> {
        self.outcomes
            .iter()
            .find(|r| r.op_id == op_id)
            .map(|r| r.outcome)
    }
}

/// Snapshot of engine state for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub online: bool,
    pub is_syncing: bool,
    /// Operations queued across all entity types.
    pub pending: usize,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Result of a direct write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The server accepted the write; carries its response.
    Delivered(Value),
    /// The write was queued for a later pass.
    Queued(OperationId),
}

impl WriteOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, WriteOutcome::Delivered(_))
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
