//! Process-wide shutdown hooks.
//!
//! Containers built with
//! [`close_on_shutdown`](crate::ContainerBuilder::close_on_shutdown) are kept
//! here until they close. [`run_shutdown_hooks`] closes every one of them.
//!
//! Shutdown is any of:
//!
//! - a [`ShutdownGuard`] being dropped, normally at the end of `main`
//!   (including unwinding out of it)
//! - SIGINT or SIGTERM, once [`install_signal_handler`] was called
//!   (`signals` feature)
//! - SIGINT or SIGTERM received by the task spawned with
//!   [`close_on_signal`] (`async` feature)
//! - an explicit call to [`run_shutdown_hooks`]
//!
//! Rust runs no code at `std::process::exit`, so a process that exits
//! without any of the above leaves its containers open.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::provider::Container;

static HOOKS: Lazy<Mutex<HashMap<u64, Container>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) fn register(container: &Container) {
    HOOKS.lock().insert(container.id(), container.clone());
    tracing::debug!(container = container.id(), "shutdown hook registered");
}

pub(crate) fn unregister(id: u64) -> bool {
    let removed = HOOKS.lock().remove(&id).is_some();
    if removed {
        tracing::debug!(container = id, "shutdown hook removed");
    }
    removed
}

/// Number of containers waiting to be closed at shutdown.
pub fn registered_hooks() -> usize {
    HOOKS.lock().len()
}

/// Closes every registered container, oldest first.
///
/// Every container is closed even when an earlier one fails. Close failures
/// of all containers are aggregated into one
/// [`DiError::AggregatedCloseFailure`]; any other error is logged and
/// skipped.
pub fn run_shutdown_hooks() -> DiResult<()> {
    let mut containers: Vec<_> = HOOKS.lock().drain().collect();
    containers.sort_by_key(|(id, _)| *id);

    tracing::debug!(containers = containers.len(), "running shutdown hooks");
    let mut failures = Vec::new();
    for (id, container) in containers {
        match container.close() {
            Ok(()) => {}
            Err(DiError::AggregatedCloseFailure(inner)) => failures.extend(inner),
            Err(other) => tracing::warn!(container = id, error = %other, "shutdown hook failed"),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(DiError::AggregatedCloseFailure(failures))
    }
}

fn run_and_log(reason: &str) -> DiResult<()> {
    tracing::info!(reason, "closing containers");
    let result = run_shutdown_hooks();
    if let Err(error) = &result {
        tracing::error!(reason, %error, "shutdown hooks failed");
    }
    result
}

/// Runs the shutdown hooks when dropped.
///
/// Keep one alive for the lifetime of `main`:
///
/// ```
/// let _shutdown = ferrous_inject::shutdown::guard();
/// ```
#[must_use = "the hooks run when the guard is dropped"]
#[derive(Debug)]
pub struct ShutdownGuard {
    _private: (),
}

/// Creates a [`ShutdownGuard`].
pub fn guard() -> ShutdownGuard {
    ShutdownGuard { _private: () }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if registered_hooks() > 0 {
            let _ = run_and_log("shutdown guard dropped");
        }
    }
}

/// Runs the shutdown hooks on SIGINT or SIGTERM (Ctrl-C on Windows), then
/// exits the process with status 0, or 1 when a container failed to close.
///
/// Works without a runtime. Only one handler can be installed per process.
#[cfg(feature = "signals")]
pub fn install_signal_handler() -> DiResult<()> {
    ctrlc::set_handler(|| {
        let code = match run_and_log("termination signal") {
            Ok(()) => 0,
            Err(_) => 1,
        };
        std::process::exit(code);
    })
    .map_err(|e| DiError::Config(format!("cannot install signal handler: {}", e)))
}

/// Completes on SIGINT or SIGTERM.
#[cfg(all(feature = "async", unix))]
async fn termination() -> DiResult<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())
        .map_err(|e| DiError::Config(format!("cannot listen for SIGTERM: {}", e)))?;
    tokio::select! {
        interrupt = tokio::signal::ctrl_c() => {
            interrupt.map_err(|e| DiError::Config(format!("cannot listen for SIGINT: {}", e)))?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Completes on Ctrl-C.
#[cfg(all(feature = "async", not(unix)))]
async fn termination() -> DiResult<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| DiError::Config(format!("cannot listen for ctrl-c: {}", e)))?;
    Ok("ctrl-c")
}

/// Spawns a task that runs [`run_shutdown_hooks`] on SIGINT or SIGTERM
/// (Ctrl-C on non-unix targets).
///
/// Must be called from within a tokio runtime. The process keeps running
/// afterwards; the application decides when to exit.
#[cfg(feature = "async")]
pub fn close_on_signal() -> tokio::task::JoinHandle<DiResult<()>> {
    tokio::spawn(async {
        let signal = termination().await?;
        tracing::info!(signal, "termination signal received");
        run_and_log(signal)
    })
}
