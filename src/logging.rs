//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured default level.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install a human-readable global subscriber. Fails if one is already installed.
pub fn init_tracing(default_level: &str) -> Result<()> {
    fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Same as `init_tracing` but emits one JSON object per line
pub fn init_json_tracing(default_level: &str) -> Result<()> {
    fmt()
        .json()
        .with_env_filter(env_filter(default_level))
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
