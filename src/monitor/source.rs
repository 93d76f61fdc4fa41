//! Status Source
//!
//! The seam between the monitor and whatever actually asks the ledger about a
//! transaction (Horizon, an RPC node, an indexer). The monitor only consumes it.
//!
//! Contract:
//!     - Ok(snapshot) reports what the ledger knows right now
//!     - Err(_) is a transport-level problem (network, not indexed yet, 5xx)
//!       and is always treated as transient by the polling loop
//!     - Sources should prefer `StatusSnapshot::pending()` over Err for
//!       "not found yet"; both conventions are tolerated

use crate::types::{StatusSnapshot, TxHandle};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Query interface for point-in-time transaction status
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn query(&self, handle: &TxHandle) -> Result<StatusSnapshot>;
}

#[async_trait]
impl<S: StatusSource + ?Sized> StatusSource for Arc<S> {
    async fn query(&self, handle: &TxHandle) -> Result<StatusSnapshot> {
        (**self).query(handle).await
    }
}

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Snapshot(StatusSnapshot),
    TransportError(String),
}

impl From<StatusSnapshot> for ScriptStep {
    fn from(snapshot: StatusSnapshot) -> Self {
        ScriptStep::Snapshot(snapshot)
    }
}

/// In-memory source that replays a fixed script (for tests and demos)
///
/// Steps are consumed in order; once exhausted the last step repeats forever.
/// An empty script always answers pending.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    queries: AtomicUsize,
    latency: Duration,
}

impl ScriptedSource {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = ScriptStep>,
    {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            queries: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Source that answers the same snapshot on every query
    pub fn always(snapshot: StatusSnapshot) -> Self {
        Self::new([ScriptStep::Snapshot(snapshot)])
    }

    /// Simulated round-trip time for every query
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of queries answered (or started) so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> ScriptStep {
        let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            return step;
        }
        last.clone()
            .unwrap_or_else(|| ScriptStep::Snapshot(StatusSnapshot::pending()))
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn query(&self, _handle: &TxHandle) -> Result<StatusSnapshot> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.next_step() {
            ScriptStep::Snapshot(snapshot) => Ok(snapshot),
            ScriptStep::TransportError(msg) => Err(anyhow!(msg)),
        }
    }
}
