//! Transaction Confirmation Monitor
//!
//! Turns a stream of ledger status snapshots for one transaction into a
//! single deterministic outcome: confirmed, failed, timed out, or aborted.
//!
//! Architecture:
//!     source.rs    — StatusSource trait (consumed seam) + ScriptedSource
//!     policy.rs    — PollPolicy: timeout, interval, progress observer
//!     poller.rs    — the shared query/classify/sleep loop
//!     waiter.rs    — wait_for_confirmation: stateless one-shot wait
//!     tracker.rs   — TransactionMonitor: single-flight, abortable, reusable
//!     registry.rs  — MonitorRegistry: one watch task per handle + event feed
//!
//! Usage:
//! ```ignore
//! use tx_confirm::monitor::{wait_for_confirmation, PollPolicy};
//!
//! let policy = PollPolicy::default().with_progress(|o| println!("{}ms", o.elapsed.as_millis()));
//! let outcome = wait_for_confirmation(&horizon, &hash, Network::Testnet, &policy).await?;
//! ```

pub mod policy;
mod poller;
pub mod registry;
pub mod source;
pub mod tracker;
pub mod waiter;

pub use policy::{PollPolicy, ProgressFn, DEFAULT_INTERVAL, DEFAULT_TIMEOUT, MIN_INTERVAL};
pub use registry::{ConfirmationStatus, MonitorEvent, MonitorRegistry};
pub use source::{ScriptStep, ScriptedSource, StatusSource};
pub use tracker::TransactionMonitor;
pub use waiter::wait_for_confirmation;
