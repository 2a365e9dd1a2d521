// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine configuration.
//!
//! Stored as TOML. Every field has a default except the remote base URL,
//! which must be an absolute `http` or `https` URL:
//!
//! ```toml
//! max_retries = 3
//! drain_order = ["activity", "diary_entry", "growth_record"]
//!
//! [remote]
//! base_url = "https://api.example.com/v1"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use hatch_core::EntityType;

use crate::error::{SyncError, SyncResult};
use crate::remote::ListFilter;

/// Configuration for the sync orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Failed attempts tolerated before an operation is abandoned (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Order in which entity-type queues are drained during a pass.
    #[serde(default = "default_drain_order")]
    pub drain_order: Vec<EntityType>,
    /// Refresh cache snapshots after background passes (default: true).
    /// Manual syncs always refresh.
    #[serde(default = "default_true")]
    pub refresh_cache_after_sync: bool,
    /// Reflect queued writes in the cache snapshot immediately (default: true).
    #[serde(default = "default_true")]
    pub optimistic_cache: bool,
    /// Filter passed to `list` when refreshing caches.
    #[serde(default)]
    pub cache_filter: ListFilter,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API root, e.g. `https://api.example.com/v1`.
    #[serde(default)]
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_drain_order() -> Vec<EntityType> {
    EntityType::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: default_max_retries(),
            drain_order: default_drain_order(),
            refresh_cache_after_sync: true,
            optimistic_cache: true,
            cache_filter: ListFilter::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            base_url: String::new(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SyncConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let config: SyncConfig = toml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        config.remote.validate()?;
        Ok(config)
    }

    /// Saves configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SyncError::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks that the drain order names every entity type exactly once.
    pub fn validate(&self) -> SyncResult<()> {
        for entity in EntityType::ALL {
            let count = self.drain_order.iter().filter(|e| **e == entity).count();
            match count {
                1 => {}
                0 => {
                    return Err(SyncError::Config(format!(
                        "drain_order is missing '{}'",
                        entity
                    )))
                }
                _ => {
                    return Err(SyncError::Config(format!(
                        "drain_order lists '{}' more than once",
                        entity
                    )))
                }
            }
        }
        Ok(())
    }
}

impl RemoteConfig {
    /// Checks that `base_url` is an absolute http(s) URL.
    pub fn validate(&self) -> SyncResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(SyncError::Config("remote.base_url is required".to_string()));
        }
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            SyncError::Config(format!("invalid remote.base_url '{}': {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(SyncError::Config(format!(
                "remote.base_url must use http or https, not '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
