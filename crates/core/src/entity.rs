// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity types and mutation actions.
//!
//! Only the record kinds a caregiver mutates offline are queued: activities,
//! diary entries, and growth records. Children are read-mostly and never go
//! through the queue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The mutable record kinds synchronized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Feeding, sleep, diaper change, and other timed activities.
    Activity,
    /// Free-form diary notes.
    DiaryEntry,
    /// Height, weight, and head-circumference measurements.
    GrowthRecord,
}

impl EntityType {
    /// Every entity type, in the default drain order.
    pub const ALL: [EntityType; 3] = [
        EntityType::Activity,
        EntityType::DiaryEntry,
        EntityType::GrowthRecord,
    ];

    /// Returns the string representation used in storage keys and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Activity => "activity",
            EntityType::DiaryEntry => "diary_entry",
            EntityType::GrowthRecord => "growth_record",
        }
    }

    /// Returns the REST collection path segment for this entity type.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Activity => "activities",
            EntityType::DiaryEntry => "diary-entries",
            EntityType::GrowthRecord => "growth-records",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "activity" => Ok(EntityType::Activity),
            "diary_entry" | "diaryentry" | "diary-entry" => Ok(EntityType::DiaryEntry),
            "growth_record" | "growthrecord" | "growth-record" => Ok(EntityType::GrowthRecord),
            _ => Err(Error::InvalidEntityType(s.to_string())),
        }
    }
}

/// The kind of mutation a pending operation replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create a new record from a full payload.
    Create,
    /// Apply a partial patch to an existing record.
    Update,
    /// Delete a record by id.
    Delete,
}

impl Action {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
