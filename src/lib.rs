//! Transaction Confirmation Monitor Library
//!
//! Polls an external status source for a submitted ledger transaction until
//! it confirms, fails, runs out of time, or is cancelled, reporting progress
//! along the way. Provides a one-shot wait, an abortable single-flight
//! monitor, and a multi-transaction registry built on the same loop.
//!
//! Created: 2026-10-18

pub mod config;
pub mod error;
pub mod explorer;
pub mod logging;
pub mod monitor;
pub mod types;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use error::MonitorError;
pub use explorer::{explorer_url, Network};
pub use monitor::{
    wait_for_confirmation, ConfirmationStatus, MonitorEvent, MonitorRegistry, PollPolicy,
    ScriptStep, ScriptedSource, StatusSource, TransactionMonitor,
};
pub use types::{Classification, MonitorState, PollOutcome, StatusSnapshot, TxHandle};
