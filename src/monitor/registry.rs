//! Monitor Registry - many transactions, one watcher task each
//!
//! Keeps a table of handles currently being watched and spawns one tokio task
//! per handle running the shared polling loop. At most one watch per handle
//! is active; a second `watch` for the same handle is rejected.
//!
//! Lifecycle events (pending, success, failed, timeout, aborted) are
//! broadcast to every subscriber, so a notification layer can render them
//! without holding on to the individual join handles.
//!
//! Design:
//!     - Table: DashMap<TxHandle, WatchEntry>, entry removed when its task ends
//!     - Each entry carries a generation id so a finished task never removes a
//!       newer watch for the same handle
//!     - Every watch token is a child of the registry's root token; dropping the
//!       registry cancels all outstanding watches

use super::policy::PollPolicy;
use super::poller::poll_until_terminal;
use super::source::StatusSource;
use crate::error::MonitorError;
use crate::explorer::Network;
use crate::types::{PollOutcome, TxHandle};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, Sender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle status published for a watched transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationStatus {
    Pending,
    Success,
    Failed,
    Timeout,
    Aborted,
}

impl ConfirmationStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, ConfirmationStatus::Pending)
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfirmationStatus::Pending => write!(f, "pending"),
            ConfirmationStatus::Success => write!(f, "success"),
            ConfirmationStatus::Failed => write!(f, "failed"),
            ConfirmationStatus::Timeout => write!(f, "timeout"),
            ConfirmationStatus::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorEvent {
    pub hash: TxHandle,
    pub status: ConfirmationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PollOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MonitorEvent {
    fn started(hash: &TxHandle) -> Self {
        Self {
            hash: hash.clone(),
            status: ConfirmationStatus::Pending,
            outcome: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    fn finished(hash: &TxHandle, result: &Result<PollOutcome, MonitorError>) -> Self {
        let (status, outcome, error) = match result {
            Ok(outcome) => (ConfirmationStatus::Success, Some(outcome.clone()), None),
            Err(MonitorError::TransactionFailed { cause }) => {
                (ConfirmationStatus::Failed, None, Some(cause.clone()))
            }
            Err(e @ MonitorError::ConfirmationTimeout { .. }) => {
                (ConfirmationStatus::Timeout, None, Some(e.to_string()))
            }
            Err(MonitorError::Aborted) => (ConfirmationStatus::Aborted, None, None),
            Err(e) => (ConfirmationStatus::Failed, None, Some(e.to_string())),
        };
        Self {
            hash: hash.clone(),
            status,
            outcome,
            error,
            timestamp: Utc::now(),
        }
    }

    /// One-line notification text for this event
    pub fn notice(&self) -> String {
        let short = self.hash.short();
        match self.status {
            ConfirmationStatus::Pending => format!("⏳ Monitoring transaction {}...", short),
            ConfirmationStatus::Success => format!("✅ Transaction confirmed! {}...", short),
            ConfirmationStatus::Failed => format!(
                "❌ Transaction failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
            ConfirmationStatus::Timeout => format!(
                "⏰ Transaction monitoring timed out. Check manually: {}...",
                short
            ),
            ConfirmationStatus::Aborted => format!("Stopped monitoring {}...", short),
        }
    }
}

struct WatchEntry {
    id: u64,
    cancel: CancellationToken,
}

/// Default capacity of the event broadcast channel
const DEFAULT_EVENT_CAPACITY: usize = 256;

pub struct MonitorRegistry<S> {
    source: Arc<S>,
    network: Network,
    entries: Arc<DashMap<TxHandle, WatchEntry>>,
    root: CancellationToken,
    events: Sender<MonitorEvent>,
    next_id: AtomicU64,
}

impl<S> MonitorRegistry<S>
where
    S: StatusSource + 'static,
{
    pub fn new(source: Arc<S>, network: Network) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            source,
            network,
            entries: Arc::new(DashMap::new()),
            root: CancellationToken::new(),
            events,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        self.events = events;
        self
    }

    /// Stream of lifecycle events for every watch started after subscribing
    pub fn subscribe(&self) -> BroadcastStream<MonitorEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// Start watching `handle` on a new task. Must be called within a tokio runtime.
    ///
    /// Fails with `AlreadyRunning` if `handle` is already being watched.
    pub fn watch(
        &self,
        handle: TxHandle,
        policy: PollPolicy,
    ) -> Result<JoinHandle<Result<PollOutcome, MonitorError>>, MonitorError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.root.child_token();

        match self.entries.entry(handle.clone()) {
            Entry::Occupied(_) => {
                debug!("Already watching {}, rejecting duplicate", handle);
                return Err(MonitorError::AlreadyRunning {
                    handle: handle.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(WatchEntry {
                    id,
                    cancel: cancel.clone(),
                });
            }
        }

        // No subscribers is fine
        let _ = self.events.send(MonitorEvent::started(&handle));

        let source = Arc::clone(&self.source);
        let entries = Arc::clone(&self.entries);
        let events = self.events.clone();
        let network = self.network;

        Ok(tokio::spawn(async move {
            let result = poll_until_terminal(source.as_ref(), &handle, network, &policy, &cancel).await;
            entries.remove_if(&handle, |_, entry| entry.id == id);
            let _ = events.send(MonitorEvent::finished(&handle, &result));
            result
        }))
    }

    /// Cancel the watch for `handle`. Returns false if it was not being watched.
    pub fn stop(&self, handle: &TxHandle) -> bool {
        match self.entries.remove(handle) {
            Some((_, entry)) => {
                info!("Stopping transaction monitoring: {}", handle);
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every active watch. The registry stays usable.
    pub fn stop_all(&self) {
        let mut stopped = 0usize;
        self.entries.retain(|_, entry| {
            entry.cancel.cancel();
            stopped += 1;
            false
        });
        if stopped > 0 {
            info!("Stopped {} transaction monitors", stopped);
        }
    }

    pub fn is_watching(&self, handle: &TxHandle) -> bool {
        self.entries.contains_key(handle)
    }

    /// Handles currently being watched (unordered)
    pub fn active(&self) -> Vec<TxHandle> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn network(&self) -> Network {
        self.network
    }
}

impl<S> Drop for MonitorRegistry<S> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::source::{ScriptStep, ScriptedSource};
    use crate::types::StatusSnapshot;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    fn h(s: &str) -> TxHandle {
        s.parse().unwrap()
    }

    fn policy() -> PollPolicy {
        PollPolicy::new(Duration::from_secs(10), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_publishes_pending_then_success() {
        let source = Arc::new(ScriptedSource::new([
            ScriptStep::Snapshot(StatusSnapshot::pending()),
            ScriptStep::Snapshot(StatusSnapshot::succeeded()),
        ]));
        let registry = MonitorRegistry::new(source, Network::Testnet);
        let mut events = registry.subscribe();

        let task = registry.watch(h("abcdef0123456789"), policy()).unwrap();
        assert!(registry.is_watching(&h("abcdef0123456789")));

        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.succeeded);
        assert!(registry.is_empty());

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.status, ConfirmationStatus::Pending);
        assert_eq!(first.notice(), "⏳ Monitoring transaction abcdef01...");

        let last = events.next().await.unwrap().unwrap();
        assert_eq!(last.status, ConfirmationStatus::Success);
        assert!(last.outcome.as_ref().unwrap().succeeded);
        assert_eq!(last.notice(), "✅ Transaction confirmed! abcdef01...");
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_handle_rejected() {
        let source = Arc::new(ScriptedSource::always(StatusSnapshot::pending()));
        let registry = MonitorRegistry::new(source, Network::Testnet);

        let first = registry.watch(h("dup"), policy()).unwrap();
        let second = registry.watch(h("dup"), policy());
        assert!(matches!(second, Err(MonitorError::AlreadyRunning { .. })));

        // A different handle is fine
        let other = registry.watch(h("other"), policy()).unwrap();
        assert_eq!(registry.len(), 2);

        registry.stop_all();
        assert!(registry.is_empty());
        assert_eq!(first.await.unwrap(), Err(MonitorError::Aborted));
        assert_eq!(other.await.unwrap(), Err(MonitorError::Aborted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_one_leaves_others() {
        let source = Arc::new(ScriptedSource::always(StatusSnapshot::pending()));
        let registry = MonitorRegistry::new(source, Network::Testnet);
        let mut events = registry.subscribe();

        let a = registry.watch(h("aaaa"), policy()).unwrap();
        let _b = registry.watch(h("bbbb"), policy()).unwrap();

        assert!(registry.stop(&h("aaaa")));
        assert!(!registry.stop(&h("aaaa")));
        assert_eq!(a.await.unwrap(), Err(MonitorError::Aborted));
        assert_eq!(registry.active(), vec![h("bbbb")]);

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let ev = events.next().await.unwrap().unwrap();
            statuses.push((ev.hash.to_string(), ev.status));
        }
        assert!(statuses.contains(&("aaaa".to_string(), ConfirmationStatus::Aborted)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewatch_after_stop_not_clobbered_by_stale_task() {
        let source = Arc::new(ScriptedSource::always(StatusSnapshot::pending()));
        let registry = MonitorRegistry::new(source, Network::Testnet);

        let old = registry.watch(h("same"), policy()).unwrap();
        assert!(registry.stop(&h("same")));
        let _new = registry.watch(h("same"), policy()).unwrap();

        assert_eq!(old.await.unwrap(), Err(MonitorError::Aborted));
        assert!(registry.is_watching(&h("same")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_and_timeout_events() {
        let failing = Arc::new(ScriptedSource::always(StatusSnapshot::failed("tx_failed")));
        let registry = MonitorRegistry::new(failing, Network::Mainnet);
        let mut events = registry.subscribe();

        let err = registry.watch(h("f1"), policy()).unwrap().await.unwrap().unwrap_err();
        assert_eq!(err, MonitorError::TransactionFailed { cause: "tx_failed".into() });
        let _pending = events.next().await.unwrap().unwrap();
        let failed = events.next().await.unwrap().unwrap();
        assert_eq!(failed.status, ConfirmationStatus::Failed);
        assert_eq!(failed.notice(), "❌ Transaction failed: tx_failed");

        let slow = Arc::new(ScriptedSource::always(StatusSnapshot::pending()));
        let registry = MonitorRegistry::new(slow, Network::Testnet);
        let mut events = registry.subscribe();
        let short = PollPolicy::new(Duration::from_secs(2), Duration::from_secs(1));
        let err = registry.watch(h("t1"), short).unwrap().await.unwrap().unwrap_err();
        assert!(err.is_retryable());
        let _pending = events.next().await.unwrap().unwrap();
        let timeout = events.next().await.unwrap().unwrap();
        assert_eq!(timeout.status, ConfirmationStatus::Timeout);
        assert!(timeout.status.is_final());
        assert!(timeout.notice().contains("Check manually: t1..."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_outstanding_watches() {
        let source = Arc::new(ScriptedSource::always(StatusSnapshot::pending()));
        let registry = MonitorRegistry::new(Arc::clone(&source), Network::Testnet);
        let task = registry.watch(h("orphan"), PollPolicy::default()).unwrap();
        drop(registry);
        assert_eq!(task.await.unwrap(), Err(MonitorError::Aborted));
    }
}
