//! Polling Loop
//!
//! The one algorithm behind both the one-shot waiter and the abortable
//! monitor: query, classify, report progress, sleep, repeat until a terminal
//! state, the deadline, or cancellation.
//!
//! Suspension points:
//!     - the StatusSource query (raced against cancellation and the deadline)
//!     - the inter-poll sleep (raced against cancellation, clamped to the deadline)
//! Cancellation and timeout can only take effect at these two points.

use super::policy::{PollPolicy, MIN_INTERVAL};
use super::source::StatusSource;
use crate::error::MonitorError;
use crate::explorer::{explorer_url, Network};
use crate::types::{Classification, PollOutcome, TxHandle};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Deadline used when `now + timeout` is not representable (about 30 years out)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Poll `source` for `handle` until success, definite failure, deadline or cancellation.
///
/// Transport errors from the source are absorbed and reported to the progress
/// observer as a still-pending outcome.
pub(crate) async fn poll_until_terminal<S>(
    source: &S,
    handle: &TxHandle,
    network: Network,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<PollOutcome, MonitorError>
where
    S: StatusSource + ?Sized,
{
    let started = Instant::now();
    let deadline = started
        .checked_add(policy.timeout)
        .unwrap_or_else(|| started + FAR_FUTURE);
    let url = explorer_url(handle, network);

    info!("Starting transaction monitoring for {} ({})", handle, network);
    debug!("Explorer URL: {}", url);

    let mut attempts = 0u32;

    while Instant::now() < deadline {
        if cancel.is_cancelled() {
            return Err(aborted(handle, attempts));
        }

        attempts += 1;
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(aborted(handle, attempts)),
            _ = sleep_until(deadline) => break,
            reply = source.query(handle) => reply,
        };
        let elapsed = started.elapsed();

        match reply {
            Ok(snapshot) => {
                let class = snapshot.classify();
                let outcome = PollOutcome::from_snapshot(handle.clone(), snapshot, url.clone(), elapsed);
                policy.notify(&outcome);

                match class {
                    Classification::Succeeded => {
                        info!(
                            "✅ Transaction confirmed in {}ms after {} polls: {}",
                            elapsed.as_millis(),
                            attempts,
                            handle
                        );
                        return Ok(outcome);
                    }
                    Classification::Failed(cause) => {
                        error!("Transaction failed: {} ({})", cause, handle);
                        return Err(MonitorError::TransactionFailed { cause });
                    }
                    Classification::Pending => {
                        debug!(
                            "Transaction pending ({}s, poll #{}): {}",
                            elapsed.as_secs(),
                            attempts,
                            handle
                        );
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Error checking transaction status (poll #{}), retrying: {:#}",
                    attempts, e
                );
                policy.notify(&PollOutcome::transient(handle.clone(), url.clone(), elapsed));
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(aborted(handle, attempts)),
            _ = sleep(policy.interval.max(MIN_INTERVAL).min(remaining)) => {}
        }
    }

    let elapsed = started.elapsed();
    error!(
        "Transaction monitoring timeout after {}s ({} polls): {}",
        elapsed.as_secs(),
        attempts,
        handle
    );
    Err(MonitorError::ConfirmationTimeout { elapsed })
}

fn aborted(handle: &TxHandle, attempts: u32) -> MonitorError {
    info!("Transaction monitoring aborted after {} polls: {}", attempts, handle);
    MonitorError::Aborted
}
