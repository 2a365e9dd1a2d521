// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of connectivity status to UI listeners.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback invoked with the current online status.
pub type SyncListener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, SyncListener)>,
}

/// Registered sync listeners, in registration order.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Dropping the returned handle does not remove it;
    /// call [`Unsubscribe::unsubscribe`].
    pub fn add<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(callback)));
        Unsubscribe {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener with `online`.
    ///
    /// Callbacks run outside the registry lock, so a callback may add or
    /// remove listeners.
    pub fn notify(&self, online: bool) {
        let snapshot: Vec<SyncListener> = lock(&self.inner)
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in snapshot {
            callback(online);
        }
    }
}

/// Removes a listener registered with [`Listeners::add`].
#[derive(Debug)]
#[must_use = "keep the handle to be able to remove the listener"]
pub struct Unsubscribe {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Unsubscribe {
    /// Remove the listener. No-op if the registry is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "listeners_tests.rs"]
mod tests;
