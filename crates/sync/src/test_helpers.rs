// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync engine tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hatch_core::{EntityType, KeyValueStore, MemoryStore, QueueStore};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityEvent, ConnectivityHandle, ConnectivityMonitor};
use crate::error::{RemoteError, RemoteResult};
use crate::orchestrator::SyncOrchestrator;
use crate::remote::{ListFilter, RemoteApi, RemoteFuture};

/// A call received by [`MockRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Create(EntityType, Value),
    Update(EntityType, String, Value),
    Delete(EntityType, String),
    List(EntityType, ListFilter),
}

impl RemoteCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RemoteCall::List(..))
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<RemoteCall>,
    failing_entities: HashSet<EntityType>,
    failing_records: HashSet<String>,
    lists: HashMap<EntityType, Vec<Value>>,
    delay: Option<Duration>,
    /// Flip this handle offline once this many mutations have arrived.
    offline_after: Option<(usize, ConnectivityHandle)>,
}

/// Remote API double that records calls and fails on request.
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<MockState>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call for this entity type fail with a 503.
    pub fn fail_entity(&self, entity: EntityType) {
        self.state.lock().unwrap().failing_entities.insert(entity);
    }

    /// Make every mutation of this record fail with a 503.
    pub fn fail_record(&self, record_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_records
            .insert(record_id.to_string());
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_entities.clear();
        state.failing_records.clear();
    }

    pub fn set_list(&self, entity: EntityType, records: Vec<Value>) {
        self.state.lock().unwrap().lists.insert(entity, records);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Drop connectivity right after the `n`th mutation is received.
    pub fn go_offline_after(&self, n: usize, handle: ConnectivityHandle) {
        self.state.lock().unwrap().offline_after = Some((n, handle));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.calls().into_iter().filter(RemoteCall::is_mutation).collect()
    }

    fn record(
        &self,
        call: RemoteCall,
        entity: EntityType,
        record_id: Option<&str>,
    ) -> (RemoteResult<()>, Option<Duration>) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        let mutations = state.calls.iter().filter(|c| c.is_mutation()).count();
        if let Some((n, handle)) = &state.offline_after {
            if mutations >= *n {
                handle.swap(false);
            }
        }
        let failing = state.failing_entities.contains(&entity)
            || record_id.is_some_and(|id| state.failing_records.contains(id));
        let result = if failing {
            Err(RemoteError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        } else {
            Ok(())
        };
        (result, state.delay)
    }
}

async fn respond<T>(
    result: RemoteResult<()>,
    delay: Option<Duration>,
    value: T,
) -> RemoteResult<T> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    result.map(|()| value)
}

impl RemoteApi for MockRemote {
    fn create(&self, entity: EntityType, payload: Value) -> RemoteFuture<'_, Value> {
        let id = payload.get("id").and_then(Value::as_str).map(String::from);
        let call = RemoteCall::Create(entity, payload.clone());
        let (result, delay) = self.record(call, entity, id.as_deref());
        Box::pin(respond(result, delay, payload))
    }

    fn update(&self, entity: EntityType, id: String, patch: Value) -> RemoteFuture<'_, Value> {
        let (result, delay) = self.record(
            RemoteCall::Update(entity, id.clone(), patch.clone()),
            entity,
            Some(&id),
        );
        Box::pin(respond(result, delay, patch))
    }

    fn delete(&self, entity: EntityType, id: String) -> RemoteFuture<'_, ()> {
        let call = RemoteCall::Delete(entity, id.clone());
        let (result, delay) = self.record(call, entity, Some(&id));
        Box::pin(respond(result, delay, ()))
    }

    fn list(&self, entity: EntityType, filter: ListFilter) -> RemoteFuture<'_, Vec<Value>> {
        let (result, delay) = self.record(RemoteCall::List(entity, filter), entity, None);
        let records = self
            .state
            .lock()
            .unwrap()
            .lists
            .get(&entity)
            .cloned()
            .unwrap_or_default();
        Box::pin(respond(result, delay, records))
    }
}

/// Key-value store whose queue writes can be made to fail, as on a full disk.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_queue_writes: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write to a pending queue until [`FaultyStore::heal`].
    pub fn fail_queue_writes(&self) {
        self.fail_queue_writes.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.fail_queue_writes.store(false, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> hatch_core::Result<()> {
        if key.starts_with("pending/") && self.fail_queue_writes.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("disk full").into());
        }
        Ok(())
    }
}

impl KeyValueStore for FaultyStore {
    fn get(&self, key: &str) -> hatch_core::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> hatch_core::Result<()> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> hatch_core::Result<()> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

/// Orchestrator over a test store and a mock remote, with the monitor that
/// drives its connectivity.
pub struct Harness<S = MemoryStore> {
    pub orchestrator: SyncOrchestrator<MockRemote, S>,
    pub remote: MockRemote,
    pub monitor: ConnectivityMonitor,
    pub events: mpsc::Receiver<ConnectivityEvent>,
}

impl Harness {
    pub fn new(online: bool) -> Self {
        Self::with_config(online, SyncConfig::default())
    }

    pub fn with_config(online: bool, config: SyncConfig) -> Self {
        Harness::with_store(online, config, MemoryStore::new())
    }
}

impl<S: KeyValueStore + 'static> Harness<S> {
    pub fn with_store(online: bool, config: SyncConfig, kv: S) -> Self {
        let remote = MockRemote::new();
        let (monitor, events) = ConnectivityMonitor::new(online);
        let orchestrator =
            SyncOrchestrator::new(QueueStore::new(kv), remote.clone(), monitor.handle(), config)
                .unwrap();
        Harness {
            orchestrator,
            remote,
            monitor,
            events,
        }
    }

    pub fn pending(&self) -> usize {
        self.orchestrator.pending_operations_count().unwrap()
    }
}
