// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Log output for host applications.
//!
//! The engine itself only emits `tracing` events. Applications without their
//! own subscriber can call [`init`] once at startup.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install a formatting subscriber as the global default.
///
/// `RUST_LOG` overrides the level. Returns false if a global subscriber was
/// already installed.
pub fn init(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
