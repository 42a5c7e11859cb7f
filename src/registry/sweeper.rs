//! Background idle sweep.
//!
//! The registry never schedules work by itself. A `SweepWorker` is an explicit
//! opt-in: the composition root spawns it, and stops it (or drops it) on
//! shutdown. The worker holds only a weak reference, so dropping the registry
//! also ends the loop.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{HubError, HubResult};

use super::scopes::ScopeRegistry;

/// Periodically calls [`ScopeRegistry::sweep`] on a dedicated thread.
#[derive(Debug)]
pub struct SweepWorker {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SweepWorker {
    /// Start sweeping with the registry's configured interval and idle timeout.
    pub fn spawn(registry: &Arc<ScopeRegistry>) -> HubResult<Self> {
        let cfg = registry.config();
        Self::spawn_with(registry, cfg.sweep_interval, cfg.idle_timeout)
    }

    /// Start sweeping every `interval`, evicting sessions idle beyond `idle_timeout`.
    pub fn spawn_with(
        registry: &Arc<ScopeRegistry>,
        interval: Duration,
        idle_timeout: Duration,
    ) -> HubResult<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let registry = Arc::downgrade(registry);

        let join = thread::Builder::new()
            .name("scopehub-sweep".to_string())
            .spawn(move || worker_loop(&registry, &stop_rx, interval, idle_timeout))
            .map_err(|e| HubError::Worker {
                message: format!("failed to spawn sweep worker: {e}"),
            })?;

        tracing::debug!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            idle_timeout_secs = idle_timeout.as_secs(),
            "sweep worker started"
        );

        Ok(Self {
            stop_tx: Some(stop_tx),
            join: Some(join),
        })
    }

    /// Stop the worker and wait for its thread to exit.
    pub fn stop(mut self) -> HubResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> HubResult<()> {
        // Closing the channel wakes the worker out of its wait.
        drop(self.stop_tx.take());
        if let Some(handle) = self.join.take() {
            handle.join().map_err(|_| HubError::Worker {
                message: "sweep worker panicked".to_string(),
            })?;
            tracing::debug!("sweep worker stopped");
        }
        Ok(())
    }
}

impl Drop for SweepWorker {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn worker_loop(
    registry: &Weak<ScopeRegistry>,
    stop_rx: &Receiver<()>,
    interval: Duration,
    idle_timeout: Duration,
) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                if let Err(e) = registry.sweep(idle_timeout) {
                    tracing::warn!(error = %e, "idle sweep failed");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
