//! Monitor Errors
//!
//! Caller-visible failure taxonomy for confirmation waits and monitors.
//! Transient StatusSource errors never appear here: the polling loop
//! absorbs them until the deadline.
//!
//! Created: 2026-10-18

use std::time::Duration;
use thiserror::Error;

/// Generic cause used when the ledger reports a failed transaction without a reason
pub const GENERIC_FAILURE_CAUSE: &str = "transaction failed on network";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The monitored transaction reached a definite failure state. Not retried.
    #[error("Transaction failed: {cause}")]
    TransactionFailed { cause: String },

    /// Deadline exceeded while still pending. Says nothing about the transaction itself.
    #[error("Timeout waiting for confirmation after {}s", .elapsed.as_secs())]
    ConfirmationTimeout { elapsed: Duration },

    /// Caller cancelled the poll
    #[error("Transaction monitoring aborted")]
    Aborted,

    /// A poll for this monitor (or handle, in a registry) is already in flight
    #[error("Monitor is already running for {handle}")]
    AlreadyRunning { handle: String },

    #[error("Invalid transaction handle: {0:?}")]
    InvalidHandle(String),

    #[error("Invalid network: {0:?} (expected testnet, mainnet or public)")]
    InvalidNetwork(String),
}

impl MonitorError {
    /// True when a fresh wait on the same handle can still produce a result.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::ConfirmationTimeout { .. })
    }

    /// Short message suitable for a notification or status line.
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::TransactionFailed { cause } => format!("Transaction failed: {}", cause),
            MonitorError::ConfirmationTimeout { elapsed } => format!(
                "Still pending after {}s, check the explorer later",
                elapsed.as_secs()
            ),
            MonitorError::Aborted => "Transaction monitoring cancelled".to_string(),
            MonitorError::AlreadyRunning { .. } => {
                "This transaction is already being monitored".to_string()
            }
            MonitorError::InvalidHandle(_) | MonitorError::InvalidNetwork(_) => self.to_string(),
        }
    }
}
