// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for sync engine integration tests.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hatch_core::{EntityType, QueueStore, SqliteStore};
use hatch_sync::{
    ConnectivityEvent, ConnectivityMonitor, ListFilter, RemoteApi, RemoteError, RemoteFuture,
    SyncConfig, SyncOrchestrator,
};
use serde_json::Value;
use tokio::sync::mpsc;

/// A mutation received by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    pub entity: EntityType,
    pub method: &'static str,
    pub body: Value,
}

#[derive(Default)]
struct State {
    received: Vec<Received>,
    down: HashSet<EntityType>,
    delay: Option<Duration>,
}

/// In-process stand-in for the backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn take_down(&self, entity: EntityType) {
        self.state.lock().unwrap().down.insert(entity);
    }

    pub fn bring_up(&self) {
        self.state.lock().unwrap().down.clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn received_for(&self, entity: EntityType) -> Vec<Received> {
        self.received()
            .into_iter()
            .filter(|r| r.entity == entity)
            .collect()
    }

    fn handle<T: Send + 'static>(
        &self,
        entity: EntityType,
        method: &'static str,
        body: Value,
        value: T,
    ) -> RemoteFuture<'_, T> {
        let (down, delay) = {
            let mut state = self.state.lock().unwrap();
            state.received.push(Received {
                entity,
                method,
                body,
            });
            (state.down.contains(&entity), state.delay)
        };
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if down {
                return Err(RemoteError::Status {
                    status: 500,
                    body: "internal error".to_string(),
                });
            }
            Ok(value)
        })
    }
}

impl RemoteApi for FakeBackend {
    fn create(&self, entity: EntityType, payload: Value) -> RemoteFuture<'_, Value> {
        self.handle(entity, "create", payload.clone(), payload)
    }

    fn update(&self, entity: EntityType, id: String, patch: Value) -> RemoteFuture<'_, Value> {
        let body = serde_json::json!({"id": id, "patch": patch});
        self.handle(entity, "update", body, patch)
    }

    fn delete(&self, entity: EntityType, id: String) -> RemoteFuture<'_, ()> {
        self.handle(entity, "delete", Value::String(id), ())
    }

    fn list(&self, _entity: EntityType, _filter: ListFilter) -> RemoteFuture<'_, Vec<Value>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

pub type Engine = SyncOrchestrator<FakeBackend, SqliteStore>;

/// Build an engine over a SQLite database at `db_path`.
pub fn open_engine(
    db_path: &Path,
    backend: &FakeBackend,
    online: bool,
) -> (Engine, ConnectivityMonitor, mpsc::Receiver<ConnectivityEvent>) {
    let (monitor, events) = ConnectivityMonitor::new(online);
    let store = QueueStore::new(SqliteStore::open(db_path).unwrap());
    let engine = SyncOrchestrator::new(
        store,
        backend.clone(),
        monitor.handle(),
        SyncConfig::default(),
    )
    .unwrap();
    (engine, monitor, events)
}
