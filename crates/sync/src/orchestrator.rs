// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync orchestrator: drains pending operations to the Remote API.
//!
//! The orchestrator is the only component that removes operations from the
//! queue store. It runs at most one sync pass at a time; a pass requested
//! while another is running is declined rather than queued.
//!
//! A pass walks the entity-type queues in the configured drain order and
//! dispatches each operation sequentially in FIFO order:
//!
//! ```text
//!  dispatch ──ok──► remove ──ok──────────────────────► Synced
//!     │                │
//!     └─err────────────┴─err──► count attempt ──≤ max──► Retrying(n)
//!                                     │
//!                                     └────────> max──► Abandoned
//! ```
//!
//! Once an operation on a record stays queued, later operations on the same
//! record are `Deferred` until the next pass so they never overtake it.
//!
//! Failed attempts are also counted in memory, so the ceiling holds even when
//! the store cannot record them. An operation the server accepted but the
//! store could not remove is never dispatched again or abandoned; later
//! passes only retry the removal. A pass stops early, leaving the rest of the queue untouched,
//! if connectivity drops.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use hatch_core::{
    cache, AbandonedOperation, Action, EntityType, KeyValueStore, OperationId, OperationOutcome,
    PendingOperation, QueueStore, SqliteStore,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::connectivity::{ConnectivityEvent, ConnectivityHandle};
use crate::error::{RemoteResult, SyncError, SyncResult};
use crate::http::HttpRemoteApi;
use crate::listeners::{Listeners, Unsubscribe};
use crate::remote::RemoteApi;
use crate::report::{SyncReport, SyncStatus, WriteOutcome};

struct Inner<R, S> {
    store: QueueStore<S>,
    remote: R,
    connectivity: ConnectivityHandle,
    config: SyncConfig,
    syncing: AtomicBool,
    listeners: Listeners,
    /// Failed attempts seen this session, by operation id.
    attempts: Mutex<HashMap<OperationId, Attempts>>,
    /// Operations the server accepted that are still queued.
    delivered: Mutex<HashSet<OperationId>>,
}

struct Attempts {
    count: u32,
    last_error: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the `syncing` flag for the duration of a pass.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Offline-first sync engine.
///
/// Cloning is cheap and every clone shares the same queue, flag, and
/// listeners. Create one per application and hand clones to whoever needs it.
pub struct SyncOrchestrator<R = HttpRemoteApi, S = SqliteStore> {
    inner: Arc<Inner<R, S>>,
}

impl<R, S> Clone for SyncOrchestrator<R, S> {
    fn clone(&self) -> Self {
        SyncOrchestrator {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SyncOrchestrator<HttpRemoteApi, SqliteStore> {
    /// Open the SQLite-backed store at `db_path` and talk to the configured
    /// HTTP API.
    pub fn open(
        db_path: &Path,
        connectivity: ConnectivityHandle,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let store = QueueStore::new(SqliteStore::open(db_path)?);
        let remote = HttpRemoteApi::new(&config.remote)?;
        Self::new(store, remote, connectivity, config)
    }
}

impl<R, S> SyncOrchestrator<R, S>
where
    R: RemoteApi + 'static,
    S: KeyValueStore + 'static,
{
    /// Create an orchestrator. Fails if the configuration is invalid.
    pub fn new(
        store: QueueStore<S>,
        remote: R,
        connectivity: ConnectivityHandle,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        config.validate()?;
        Ok(SyncOrchestrator {
            inner: Arc::new(Inner {
                store,
                remote,
                connectivity,
                config,
                syncing: AtomicBool::new(false),
                listeners: Listeners::new(),
                attempts: Mutex::new(HashMap::new()),
                delivered: Mutex::new(HashSet::new()),
            }),
        })
    }

    pub fn store(&self) -> &QueueStore<S> {
        &self.inner.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    /// True while a sync pass is running.
    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::Acquire)
    }

    /// Register a callback for connectivity transitions and completed passes.
    pub fn add_sync_listener<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.listeners.add(callback)
    }

    /// Operations queued across all entity types, for UI badges.
    pub fn pending_operations_count(&self) -> SyncResult<usize> {
        Ok(self.inner.store.total_pending()?)
    }

    pub fn last_sync_at(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.inner.store.last_sync_at()?)
    }

    pub fn status(&self) -> SyncResult<SyncStatus> {
        Ok(SyncStatus {
            online: self.is_online(),
            is_syncing: self.is_syncing(),
            pending: self.inner.store.total_pending()?,
            last_sync_at: self.inner.store.last_sync_at()?,
        })
    }

    /// Last known records for offline reads. Empty if never cached.
    pub fn cached_records(&self, entity: EntityType) -> SyncResult<Vec<Value>> {
        Ok(self.inner.store.read_snapshot(entity)?.unwrap_or_default())
    }

    pub fn abandoned_operations(&self) -> SyncResult<Vec<AbandonedOperation>> {
        Ok(self.inner.store.list_abandoned()?)
    }

    /// Give an abandoned operation a fresh retry budget at the tail of its
    /// queue.
    pub fn requeue_abandoned(&self, op_id: &str) -> SyncResult<PendingOperation> {
        let op = self.inner.store.requeue_abandoned(op_id)?;
        info!(op_id, entity = %op.entity_type, "requeued abandoned operation");
        Ok(op)
    }

    /// Queue a mutation and, if online, attempt a pass right away.
    ///
    /// `update` and `delete` payloads must carry the record's `id`. A
    /// `create` payload without one gets a fresh id.
    pub async fn enqueue_for_offline_sync(
        &self,
        entity: EntityType,
        payload: Value,
        action: Action,
    ) -> SyncResult<OperationId> {
        let op = build_operation(entity, payload, action)?;
        self.queue(&op)?;
        if self.is_online() {
            self.try_sync().await;
        }
        Ok(op.id)
    }

    /// Write through to the server when possible, otherwise queue.
    ///
    /// The write goes direct only when online and nothing is queued for this
    /// entity type, so it cannot overtake queued operations. A successful
    /// direct write that finds backlog in other queues triggers a pass.
    pub async fn write(
        &self,
        entity: EntityType,
        payload: Value,
        action: Action,
    ) -> SyncResult<WriteOutcome> {
        let op = build_operation(entity, payload, action)?;

        if self.is_online() && self.inner.store.pending_count(entity)? == 0 {
            match self.dispatch(&op).await {
                Ok(response) => {
                    debug!(
                        record_id = %op.record_id,
                        %entity,
                        action = %op.action,
                        "delivered directly"
                    );
                    if self.inner.config.optimistic_cache {
                        self.update_cache(&op);
                    }
                    if self.inner.store.total_pending()? > 0 {
                        self.try_sync().await;
                    }
                    return Ok(WriteOutcome::Delivered(response));
                }
                Err(e) => {
                    warn!(
                        record_id = %op.record_id,
                        %entity,
                        error = %e,
                        "direct write failed, queueing"
                    );
                }
            }
        }

        self.queue(&op)?;
        Ok(WriteOutcome::Queued(op.id))
    }

    /// Run a pass and a full cache refresh now.
    ///
    /// Returns `Ok(None)` if another pass is already running; that pass will
    /// pick up everything queued.
    pub async fn force_sync(&self) -> SyncResult<Option<SyncReport>> {
        if !self.is_online() {
            return Err(SyncError::Offline);
        }
        Ok(self.run_pass(true).await)
    }

    /// Run a background pass if online and idle. Returns `None` when declined.
    pub async fn try_sync(&self) -> Option<SyncReport> {
        if !self.is_online() {
            debug!("offline, skipping sync pass");
            return None;
        }
        self.run_pass(self.inner.config.refresh_cache_after_sync).await
    }

    /// React to one connectivity transition.
    pub async fn handle_event(&self, event: ConnectivityEvent) -> Option<SyncReport> {
        self.inner.listeners.notify(event.is_online());
        match event {
            ConnectivityEvent::Online => self.try_sync().await,
            ConnectivityEvent::Offline => None,
        }
    }

    /// Consume connectivity events until the channel closes or `cancel` fires.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<ConnectivityEvent>,
        cancel: CancellationToken,
    ) {
        info!("sync orchestrator started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => break,
                },
            }
        }
        info!("sync orchestrator stopped");
    }

    /// Run [`SyncOrchestrator::run`] on a tokio task.
    pub fn spawn(
        &self,
        events: mpsc::Receiver<ConnectivityEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(events, cancel))
    }

    fn queue(&self, op: &PendingOperation) -> SyncResult<()> {
        self.inner.store.enqueue(op)?;
        if self.inner.config.optimistic_cache {
            self.update_cache(op);
        }
        Ok(())
    }

    fn update_cache(&self, op: &PendingOperation) {
        if let Err(e) = self.inner.store.apply_optimistic(op) {
            warn!(op_id = %op.id, error = %e, "failed to update cache snapshot");
        }
    }

    async fn dispatch(&self, op: &PendingOperation) -> RemoteResult<Value> {
        let remote = &self.inner.remote;
        match op.action {
            Action::Create => remote.create(op.entity_type, op.payload.clone()).await,
            Action::Update => {
                remote
                    .update(op.entity_type, op.record_id.clone(), op.patch())
                    .await
            }
            Action::Delete => remote
                .delete(op.entity_type, op.record_id.clone())
                .await
                .map(|()| Value::Null),
        }
    }

    async fn run_pass(&self, refresh: bool) -> Option<SyncReport> {
        let Some(_guard) = PassGuard::acquire(&self.inner.syncing) else {
            debug!("sync pass already running");
            return None;
        };

        info!("sync pass started");
        let mut report = SyncReport::begin();
        for entity in &self.inner.config.drain_order {
            if !self.drain(*entity, &mut report).await {
                info!(%entity, "connectivity lost, stopping sync pass");
                report.interrupted = true;
                break;
            }
        }
        if refresh && !report.interrupted {
            self.refresh_caches(&mut report).await;
        }

        report.finished_at = Utc::now();
        if !report.interrupted {
            if let Err(e) = self.inner.store.set_last_sync_at(report.finished_at) {
                warn!(error = %e, "failed to record last sync time");
            }
        }
        info!(
            interrupted = report.interrupted,
            synced = report.synced(),
            retrying = report.retrying(),
            abandoned = report.abandoned(),
            deferred = report.deferred(),
            "sync pass finished"
        );
        self.inner.listeners.notify(self.is_online());
        Some(report)
    }

    /// Drains one queue. Returns false if connectivity dropped.
    async fn drain(&self, entity: EntityType, report: &mut SyncReport) -> bool {
        let ops = match self.inner.store.list_pending(entity) {
            Ok(ops) => ops,
            Err(e) => {
                warn!(%entity, error = %e, "failed to read pending queue");
                return true;
            }
        };

        let mut blocked: HashSet<String> = HashSet::new();
        for op in ops {
            if blocked.contains(&op.record_id) {
                report.record(&op.id, entity, OperationOutcome::Deferred);
                continue;
            }

            let Some(outcome) = self.sync_one(&op).await else {
                return false;
            };
            if let OperationOutcome::Retrying(_) = outcome {
                blocked.insert(op.record_id.clone());
            }
            report.record(&op.id, entity, outcome);
        }
        true
    }

    /// Delivers one operation and removes it from its queue.
    ///
    /// Returns `None`, leaving the operation untouched, when offline.
    async fn sync_one(&self, op: &PendingOperation) -> Option<OperationOutcome> {
        let delivered = lock(&self.inner.delivered).contains(&op.id);
        if !delivered {
            if let Some(last_error) = self.exhausted(op) {
                return Some(self.abandon(op, &last_error));
            }
            if !self.is_online() {
                return None;
            }
            if let Err(e) = self.dispatch(op).await {
                return Some(self.record_failure(op, &e.to_string()));
            }
            lock(&self.inner.delivered).insert(op.id.clone());
        }

        Some(match self.inner.store.remove(op.entity_type, &op.id) {
            Ok(_) => {
                debug!(op_id = %op.id, entity = %op.entity_type, action = %op.action, "synced");
                self.forget(&op.id);
                OperationOutcome::Synced
            }
            // Delivered, so never abandoned; only the removal is retried.
            Err(e) => OperationOutcome::Retrying(self.count_failure(op, &e.to_string())),
        })
    }

    /// Failed attempts so far, stored or seen this session.
    fn attempts_for(&self, op: &PendingOperation) -> u32 {
        let seen = lock(&self.inner.attempts)
            .get(&op.id)
            .map_or(0, |a| a.count);
        seen.max(op.retry_count)
    }

    /// The last error of an operation already past the ceiling.
    fn exhausted(&self, op: &PendingOperation) -> Option<String> {
        if self.attempts_for(op) <= self.inner.config.max_retries {
            return None;
        }
        let last_error = lock(&self.inner.attempts)
            .get(&op.id)
            .map(|a| a.last_error.clone())
            .unwrap_or_else(|| "retry limit reached".to_string());
        Some(last_error)
    }

    fn forget(&self, op_id: &str) {
        lock(&self.inner.attempts).remove(op_id);
        lock(&self.inner.delivered).remove(op_id);
    }

    /// Count a failed dispatch and abandon the operation past the ceiling.
    fn record_failure(&self, op: &PendingOperation, error: &str) -> OperationOutcome {
        let count = self.count_failure(op, error);
        if count <= self.inner.config.max_retries {
            debug!(op_id = %op.id, retry_count = count, "will retry");
            return OperationOutcome::Retrying(count);
        }
        self.abandon(op, error)
    }

    /// Record a failed attempt in the store and in memory. Returns the count.
    fn count_failure(&self, op: &PendingOperation, error: &str) -> u32 {
        let entity = op.entity_type;
        warn!(op_id = %op.id, %entity, action = %op.action, error, "sync attempt failed");

        let mut count = self.attempts_for(op).saturating_add(1);
        match self.inner.store.increment_retry(entity, &op.id) {
            Ok(Some(stored)) => count = count.max(stored),
            Ok(None) => {}
            Err(e) => warn!(op_id = %op.id, error = %e, "failed to record retry"),
        }
        lock(&self.inner.attempts).insert(
            op.id.clone(),
            Attempts {
                count,
                last_error: error.to_string(),
            },
        );
        count
    }

    /// Move an operation to the abandoned log.
    ///
    /// If the store cannot do that, the operation stays queued but is never
    /// dispatched again; the next pass retries the move.
    fn abandon(&self, op: &PendingOperation, error: &str) -> OperationOutcome {
        match self.inner.store.abandon(op.entity_type, &op.id, error) {
            Ok(_) => {
                warn!(op_id = %op.id, entity = %op.entity_type, "operation abandoned");
                self.forget(&op.id);
            }
            Err(e) => {
                warn!(op_id = %op.id, error = %e, "failed to move operation to abandoned log");
            }
        }
        OperationOutcome::Abandoned
    }

    /// Replace each cache snapshot with server state, re-applying operations
    /// still queued so local changes stay visible.
    async fn refresh_caches(&self, report: &mut SyncReport) {
        let config = &self.inner.config;
        for entity in &config.drain_order {
            let entity = *entity;
            let listed = self.inner.remote.list(entity, config.cache_filter.clone()).await;
            let mut records = match listed {
                Ok(records) => records,
                Err(e) => {
                    warn!(%entity, error = %e, "cache refresh failed");
                    continue;
                }
            };

            if config.optimistic_cache {
                match self.inner.store.list_pending(entity) {
                    Ok(pending) => {
                        for op in &pending {
                            cache::apply(&mut records, op);
                        }
                    }
                    Err(e) => warn!(%entity, error = %e, "failed to read pending queue"),
                }
            }

            match self.inner.store.cache_snapshot(entity, &records) {
                Ok(()) => report.refreshed.push(entity),
                Err(e) => warn!(%entity, error = %e, "failed to write cache snapshot"),
            }
        }
    }
}

/// Builds a pending operation from a UI payload.
fn build_operation(
    entity: EntityType,
    payload: Value,
    action: Action,
) -> SyncResult<PendingOperation> {
    if action == Action::Create {
        return Ok(PendingOperation::create(entity, payload));
    }
    let record_id = payload
        .get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| {
            hatch_core::Error::InvalidInput(format!("{} payload requires an 'id'", action))
        })?;
    Ok(match action {
        Action::Delete => PendingOperation::delete(entity, &record_id),
        _ => PendingOperation::update(entity, &record_id, payload),
    })
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
