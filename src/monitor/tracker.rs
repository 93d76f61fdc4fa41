//! Transaction Monitor - abortable, single-flight poller
//!
//! Wraps the shared polling loop with:
//!     - a single-flight guard (a second `start` while polling is rejected, not queued)
//!     - cooperative cancellation via `abort`, observed at the next query or sleep
//!     - an inspectable `polling` flag that is cleared on every exit path
//!
//! The monitor can be reused sequentially for different handles. Share it
//! behind an `Arc` to call `abort` from another task while `start` is in flight.

use super::policy::PollPolicy;
use super::poller::poll_until_terminal;
use super::source::StatusSource;
use crate::error::MonitorError;
use crate::explorer::Network;
use crate::types::{MonitorState, PollOutcome, TxHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct TransactionMonitor<S> {
    source: S,
    network: Network,
    polling: AtomicBool,
    /// Token of the current (or most recent) run; replaced on every start
    cancel: Mutex<CancellationToken>,
}

/// Clears the polling flag when a run ends, including when its future is dropped
struct PollingGuard<'a>(&'a AtomicBool);

impl Drop for PollingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: StatusSource> TransactionMonitor<S> {
    pub fn new(source: S, network: Network) -> Self {
        Self {
            source,
            network,
            polling: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Poll `handle` until terminal, deadline, or `abort`.
    ///
    /// Fails immediately with `AlreadyRunning` if another run is in flight;
    /// that run is not affected.
    pub async fn start(
        &self,
        handle: &TxHandle,
        policy: &PollPolicy,
    ) -> Result<PollOutcome, MonitorError> {
        let (token, _guard) = {
            // Flag flip and token install happen under the lock so an abort
            // either lands before this run (ignored) or on its token.
            let mut current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
            if self
                .polling
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                warn!("Monitor already running, rejecting start for {}", handle);
                return Err(MonitorError::AlreadyRunning {
                    handle: handle.to_string(),
                });
            }
            let guard = PollingGuard(&self.polling);
            *current = CancellationToken::new();
            (current.clone(), guard)
        };

        poll_until_terminal(&self.source, handle, self.network, policy, &token).await
    }

    /// Cancel the in-flight run, if any. Idempotent; a no-op while idle.
    pub fn abort(&self) {
        let current = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        if self.polling() && !current.is_cancelled() {
            info!("Aborting transaction polling");
        }
        current.cancel();
    }

    /// True exactly while a `start` call is in flight
    pub fn polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    pub fn state(&self) -> MonitorState {
        if self.polling() {
            MonitorState::Polling
        } else {
            MonitorState::Idle
        }
    }
}
