// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API abstraction.
//!
//! The orchestrator talks to the backend only through [`RemoteApi`], so
//! passes can be driven against a mock in tests and against
//! [`HttpRemoteApi`](crate::http::HttpRemoteApi) in production.

use std::future::Future;
use std::pin::Pin;

use hatch_core::EntityType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RemoteResult;

/// Boxed future returned by Remote API calls.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// Filter for [`RemoteApi::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Restrict results to one child's records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
}

impl ListFilter {
    pub fn for_child(child_id: impl Into<String>) -> Self {
        ListFilter {
            child_id: Some(child_id.into()),
        }
    }
}

/// Server-side CRUD for each entity type.
///
/// `create` may be retried after the server already applied it but the
/// response was lost; callers send a client-generated `id` so the server can
/// recognize the duplicate.
pub trait RemoteApi: Send + Sync {
    /// Create a record. Returns the server's view of it.
    fn create(&self, entity: EntityType, payload: Value) -> RemoteFuture<'_, Value>;

    /// Apply a partial update to a record. Returns the updated record.
    fn update(&self, entity: EntityType, id: String, patch: Value) -> RemoteFuture<'_, Value>;

    fn delete(&self, entity: EntityType, id: String) -> RemoteFuture<'_, ()>;

    /// Fetch the current server state for a collection.
    fn list(&self, entity: EntityType, filter: ListFilter) -> RemoteFuture<'_, Vec<Value>>;
}
