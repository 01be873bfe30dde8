//! `Supervisor`: owns the worker fleet's lifecycle — start, graceful
//! shutdown, single-worker restart, and status reporting (spec §4.10).

pub mod ipc;

use crate::workers::{Worker, WorkerCommand, WorkerHandle, WorkerStatus, spawn_worker};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A worker plus the factory that can rebuild it, so `restart_worker` can
/// replace a dead task without the caller re-wiring dependencies.
struct Managed {
    name: &'static str,
    factory: Box<dyn Fn() -> Arc<dyn Worker> + Send + Sync>,
    handle: WorkerHandle,
    join: JoinHandle<()>,
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub name: &'static str,
    pub status: WorkerStatus,
}

pub struct Supervisor {
    cycle_timeout: Duration,
    workers: Vec<Managed>,
}

impl Supervisor {
    pub fn new(cycle_timeout: Duration) -> Self {
        Self { cycle_timeout, workers: Vec::new() }
    }

    /// Register and start a worker, keeping its factory around so
    /// `restart_worker` can rebuild it from scratch after a crash.
    pub fn spawn<F>(&mut self, name: &'static str, factory: F)
    where
        F: Fn() -> Arc<dyn Worker> + Send + Sync + 'static,
    {
        let worker = factory();
        let (handle, join) = spawn_worker(worker, self.cycle_timeout);
        self.workers.push(Managed { name, factory: Box::new(factory), handle, join });
        info!(worker = name, "worker started");
    }

    pub async fn status(&self) -> Vec<WorkerReport> {
        let mut out = Vec::with_capacity(self.workers.len());
        for w in &self.workers {
            out.push(WorkerReport { name: w.name, status: w.handle.counters.snapshot().await });
        }
        out
    }

    /// Force a worker to refresh its target set before its next tick.
    pub async fn refresh_worker(&self, name: &str) -> bool {
        if let Some(w) = self.workers.iter().find(|w| w.name == name) {
            w.handle.commands.send(WorkerCommand::Refresh).await.is_ok()
        } else {
            false
        }
    }

    /// Stop the named worker's task and replace it with a fresh instance
    /// from its original factory (spec §4.10 "restart a single worker").
    pub async fn restart_worker(&mut self, name: &str) -> bool {
        let Some(idx) = self.workers.iter().position(|w| w.name == name) else {
            return false;
        };
        let old = self.workers.remove(idx);
        let _ = old.handle.commands.send(WorkerCommand::Shutdown).await;
        old.join.abort();

        let worker = (old.factory)();
        let (handle, join) = spawn_worker(worker, self.cycle_timeout);
        self.workers.push(Managed { name: old.name, factory: old.factory, handle, join });
        info!(worker = name, "worker restarted");
        true
    }

    /// Signal every worker to shut down and wait up to `timeout` for all of
    /// them to finish their in-flight cycle (spec §4.10 "graceful shutdown
    /// protocol"). Any worker still running past the deadline is aborted.
    pub async fn stop(self, timeout: Duration) {
        for w in &self.workers {
            let _ = w.handle.commands.send(WorkerCommand::Shutdown).await;
        }

        let deadline = tokio::time::Instant::now() + timeout;
        for w in self.workers {
            let abort_handle = w.join.abort_handle();
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, w.join).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(worker = w.name, error = %e, "worker task panicked during shutdown"),
                Err(_) => {
                    warn!(worker = w.name, "worker did not stop before the shutdown deadline, aborting");
                    abort_handle.abort();
                }
            }
        }
        info!("supervisor stopped");
    }
}
