//! Core value types for confirmation monitoring
//!
//! Handles, per-poll status snapshots, and the outcomes reported to callers.

use crate::error::{MonitorError, GENERIC_FAILURE_CAUSE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Opaque identifier of a monitored transaction (e.g. a ledger tx hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHandle(String);

impl TxHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for log lines and notifications
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl FromStr for TxHandle {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(is_url_safe) {
            return Err(MonitorError::InvalidHandle(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// RFC 3986 unreserved characters; handles end up verbatim in explorer URL paths
fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

impl TryFrom<String> for TxHandle {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxHandle> for String {
    fn from(handle: TxHandle) -> Self {
        handle.0
    }
}

impl AsRef<str> for TxHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time status returned by a StatusSource
///
/// `pending=false` with `succeeded=false` is a definite failure, whether or
/// not `error` carries a cause. Anything else the source knows (e.g. the
/// confirming ledger) rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(alias = "successful")]
    pub succeeded: bool,
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StatusSnapshot {
    pub fn pending() -> Self {
        Self {
            pending: true,
            ..Self::default()
        }
    }

    pub fn succeeded() -> Self {
        Self {
            succeeded: true,
            ..Self::default()
        }
    }

    pub fn failed(cause: impl Into<String>) -> Self {
        Self {
            error: Some(cause.into()),
            ..Self::default()
        }
    }

    /// Attach a metadata field (builder style)
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Structural classification; no inspection of error text
    pub fn classify(&self) -> Classification {
        if self.succeeded {
            Classification::Succeeded
        } else if self.pending {
            Classification::Pending
        } else {
            Classification::Failed(
                self.error
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE_CAUSE.to_string()),
            )
        }
    }
}

/// What a single snapshot means for the polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Pending,
    Succeeded,
    Failed(String),
}

impl Classification {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Classification::Pending)
    }
}

/// Reported to the caller after every poll attempt, and returned on success
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    pub hash: TxHandle,
    #[serde(rename = "successful")]
    pub succeeded: bool,
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub explorer_url: String,
    #[serde(rename = "elapsedTime", with = "duration_millis")]
    pub elapsed: Duration,
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PollOutcome {
    /// Outcome for an attempt whose query failed in transport: still pending as far as we know
    pub fn transient(hash: TxHandle, explorer_url: String, elapsed: Duration) -> Self {
        Self {
            hash,
            succeeded: false,
            pending: true,
            error: None,
            explorer_url,
            elapsed,
            observed_at: Utc::now(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn from_snapshot(
        hash: TxHandle,
        snapshot: StatusSnapshot,
        explorer_url: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            hash,
            succeeded: snapshot.succeeded,
            pending: snapshot.pending,
            error: snapshot.error,
            explorer_url,
            elapsed,
            observed_at: Utc::now(),
            extra: snapshot.extra,
        }
    }
}

/// TransactionMonitor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorState {
    Idle,
    Polling,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MonitorState::Idle => write!(f, "idle"),
            MonitorState::Polling => write!(f, "polling"),
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
