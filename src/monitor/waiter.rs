//! One-shot confirmation wait
//!
//! Stateless: nothing is shared between calls, so any number of waits can run
//! concurrently for different handles.

use super::policy::PollPolicy;
use super::poller::poll_until_terminal;
use super::source::StatusSource;
use crate::error::MonitorError;
use crate::explorer::Network;
use crate::types::{PollOutcome, TxHandle};
use tokio_util::sync::CancellationToken;

/// Wait for `handle` to confirm.
///
/// Resolves with the final outcome on success. Fails with
/// `TransactionFailed` on a definite ledger failure and with
/// `ConfirmationTimeout` once `policy.timeout` elapses; transport errors in
/// between are retried.
pub async fn wait_for_confirmation<S>(
    source: &S,
    handle: &TxHandle,
    network: Network,
    policy: &PollPolicy,
) -> Result<PollOutcome, MonitorError>
where
    S: StatusSource + ?Sized,
{
    // Never cancelled; a one-shot wait ends only on a terminal state or the deadline
    let cancel = CancellationToken::new();
    poll_until_terminal(source, handle, network, policy, &cancel).await
}
