// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitoring.
//!
//! The platform (or a [`ReachabilityProbe`]) reports raw reachability to the
//! [`ConnectivityMonitor`], which turns it into `Online`/`Offline` transition
//! events on a channel consumed by the orchestrator. The current state is
//! also published through a lock-free [`ConnectivityHandle`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the monitor's event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

impl ConnectivityEvent {
    pub fn from_online(online: bool) -> Self {
        if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityEvent::Online)
    }
}

/// Read side of the monitor's state, shared with the orchestrator.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    online: Arc<AtomicBool>,
}

impl ConnectivityHandle {
    /// A handle not attached to any monitor.
    pub fn fixed(online: bool) -> Self {
        ConnectivityHandle {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Set the state, returning the previous one.
    pub(crate) fn swap(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }
}

/// Translates reachability signals into transition events.
pub struct ConnectivityMonitor {
    handle: ConnectivityHandle,
    event_tx: mpsc::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state.
    ///
    /// Returns the monitor and the receiver for its transition events. The
    /// initial state itself is not emitted.
    pub fn new(initial_online: bool) -> (Self, mpsc::Receiver<ConnectivityEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let monitor = ConnectivityMonitor {
            handle: ConnectivityHandle::fixed(initial_online),
            event_tx,
        };
        (monitor, event_rx)
    }

    pub fn handle(&self) -> ConnectivityHandle {
        self.handle.clone()
    }

    pub fn is_online(&self) -> bool {
        self.handle.is_online()
    }

    /// Record a reachability signal.
    ///
    /// Emits an event only when the state actually changes. Returns whether
    /// it did. If the receiver is gone the state is still updated.
    pub async fn report(&self, online: bool) -> bool {
        let previous = self.handle.swap(online);
        if previous == online {
            return false;
        }
        let event = ConnectivityEvent::from_online(online);
        tracing::info!(?event, "connectivity changed");
        if self.event_tx.send(event).await.is_err() {
            tracing::debug!("connectivity receiver dropped");
        }
        true
    }
}

/// Boxed future returned by a reachability check.
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Active reachability check, for platforms without a push signal.
pub trait ReachabilityProbe: Send + Sync {
    fn check(&self) -> ProbeFuture<'_>;
}

/// Poll a probe on an interval and feed the results to the monitor.
///
/// The first check runs immediately. Stops when `cancel` fires.
pub fn spawn_probe<P>(
    monitor: ConnectivityMonitor,
    probe: P,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    P: ReachabilityProbe + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("reachability probe stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let online = probe.check().await;
                    monitor.report(online).await;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
