// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    activity = { "activity", EntityType::Activity },
    diary_snake = { "diary_entry", EntityType::DiaryEntry },
    diary_camel = { "diaryEntry", EntityType::DiaryEntry },
    diary_kebab = { "diary-entry", EntityType::DiaryEntry },
    growth_snake = { "growth_record", EntityType::GrowthRecord },
    growth_camel = { "growthRecord", EntityType::GrowthRecord },
    activity_upper = { "ACTIVITY", EntityType::Activity },
)]
fn entity_type_from_str_valid(input: &str, expected: EntityType) {
    assert_eq!(input.parse::<EntityType>().unwrap(), expected);
}

#[parameterized(
    child = { "child" },
    empty = { "" },
)]
fn entity_type_from_str_invalid(input: &str) {
    assert!(input.parse::<EntityType>().is_err());
}

#[parameterized(
    activity = { EntityType::Activity, "activities" },
    diary = { EntityType::DiaryEntry, "diary-entries" },
    growth = { EntityType::GrowthRecord, "growth-records" },
)]
fn entity_type_collection(entity: EntityType, expected: &str) {
    assert_eq!(entity.collection(), expected);
}

#[test]
fn entity_type_default_order() {
    assert_eq!(
        EntityType::ALL,
        [
            EntityType::Activity,
            EntityType::DiaryEntry,
            EntityType::GrowthRecord
        ]
    );
}

#[test]
fn entity_type_serde_uses_snake_case() {
    let json = serde_json::to_string(&EntityType::GrowthRecord).unwrap();
    assert_eq!(json, "\"growth_record\"");
    let parsed: EntityType = serde_json::from_str("\"diary_entry\"").unwrap();
    assert_eq!(parsed, EntityType::DiaryEntry);
}

#[parameterized(
    create = { "create", Action::Create },
    update = { "Update", Action::Update },
    delete = { "DELETE", Action::Delete },
)]
fn action_from_str_valid(input: &str, expected: Action) {
    assert_eq!(input.parse::<Action>().unwrap(), expected);
}

#[test]
fn action_from_str_invalid() {
    assert!("upsert".parse::<Action>().is_err());
}

#[test]
fn action_display_matches_as_str() {
    for action in [Action::Create, Action::Update, Action::Delete] {
        assert_eq!(action.to_string(), action.as_str());
    }
}
