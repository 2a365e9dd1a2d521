// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

#[tokio::test]
async fn initial_state_is_not_emitted() {
    let (monitor, mut rx) = ConnectivityMonitor::new(false);
    assert!(!monitor.is_online());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn report_emits_only_on_transition() {
    let (monitor, mut rx) = ConnectivityMonitor::new(false);

    assert!(!monitor.report(false).await);
    assert!(monitor.report(true).await);
    assert!(!monitor.report(true).await);
    assert!(monitor.report(false).await);

    assert_eq!(rx.recv().await, Some(ConnectivityEvent::Online));
    assert_eq!(rx.recv().await, Some(ConnectivityEvent::Offline));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn handle_tracks_reported_state() {
    let (monitor, _rx) = ConnectivityMonitor::new(true);
    let handle = monitor.handle();
    assert!(handle.is_online());

    monitor.report(false).await;

    assert!(!handle.is_online());
}

#[tokio::test]
async fn report_survives_dropped_receiver() {
    let (monitor, rx) = ConnectivityMonitor::new(false);
    drop(rx);

    assert!(monitor.report(true).await);
    assert!(monitor.is_online());
}

struct ScriptedProbe {
    results: Mutex<VecDeque<bool>>,
}

impl ReachabilityProbe for ScriptedProbe {
    fn check(&self) -> ProbeFuture<'_> {
        let next = self.results.lock().unwrap().pop_front().unwrap_or(true);
        Box::pin(async move { next })
    }
}

#[tokio::test(start_paused = true)]
async fn probe_feeds_monitor() {
    let (monitor, mut rx) = ConnectivityMonitor::new(false);
    let handle = monitor.handle();
    let probe = ScriptedProbe {
        results: Mutex::new(VecDeque::from([false, true, true, false])),
    };
    let cancel = CancellationToken::new();

    let task = spawn_probe(monitor, probe, Duration::from_secs(5), cancel.clone());

    assert_eq!(rx.recv().await, Some(ConnectivityEvent::Online));
    assert_eq!(rx.recv().await, Some(ConnectivityEvent::Offline));
    assert!(!handle.is_online());

    cancel.cancel();
    task.await.unwrap();
}

#[test]
fn event_from_online() {
    assert_eq!(ConnectivityEvent::from_online(true), ConnectivityEvent::Online);
    assert!(!ConnectivityEvent::from_online(false).is_online());
}
