//! Configuration management
//!
//! Monitor settings from a TOML file (`[monitor]` section) or from the
//! environment / `.env` file.
//!
//! Environment:
//!     STELLAR_NETWORK          testnet | mainnet | public   (default testnet)
//!     TX_MONITOR_TIMEOUT_MS    total wait budget            (default 90000)
//!     TX_MONITOR_INTERVAL_MS   delay between polls          (default 3000)
//!     LOG_LEVEL                default tracing filter       (default info)

use crate::explorer::Network;
use crate::monitor::PollPolicy;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub network: Network,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout_ms() -> u64 { 90_000 }
fn default_interval_ms() -> u64 { 3_000 }
fn default_log_level() -> String { "info".to_string() }

/// Top-level TOML layout
#[derive(Debug, Deserialize)]
struct ConfigFile {
    monitor: MonitorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            timeout_ms: default_timeout_ms(),
            interval_ms: default_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        file.monitor.validate()?;
        Ok(file.monitor)
    }

    /// Load from process environment (after reading `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(network) = lookup("STELLAR_NETWORK") {
            config.network = network
                .parse()
                .with_context(|| "STELLAR_NETWORK is invalid")?;
        }
        if let Some(timeout) = lookup("TX_MONITOR_TIMEOUT_MS") {
            config.timeout_ms = timeout
                .trim()
                .parse()
                .with_context(|| format!("TX_MONITOR_TIMEOUT_MS is not a number: {}", timeout))?;
        }
        if let Some(interval) = lookup("TX_MONITOR_INTERVAL_MS") {
            config.interval_ms = interval
                .trim()
                .parse()
                .with_context(|| format!("TX_MONITOR_INTERVAL_MS is not a number: {}", interval))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Poll policy with these timings and no progress observer
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy::new(self.timeout(), self.interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[monitor]
network = "public"
timeout_ms = 60000
interval_ms = 2000
"#;

        let config = MonitorConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.interval(), Duration::from_secs(2));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_toml_defaults() {
        let config = MonitorConfig::from_toml_str("[monitor]\n").unwrap();
        assert_eq!(config, MonitorConfig::default());

        let policy = config.to_policy();
        assert_eq!(policy.timeout, crate::monitor::DEFAULT_TIMEOUT);
        assert_eq!(policy.interval, crate::monitor::DEFAULT_INTERVAL);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(MonitorConfig::from_toml_str("[monitor]\ninterval_ms = 0\n").is_err());
    }

    #[test]
    fn test_unknown_network_rejected() {
        let err = MonitorConfig::from_toml_str("[monitor]\nnetwork = \"devnet\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid network"));
    }

    #[test]
    fn test_toml_network_ignores_case() {
        let config = MonitorConfig::from_toml_str("[monitor]\nnetwork = \"Testnet\"\n").unwrap();
        assert_eq!(config.network, Network::Testnet);
        let config = MonitorConfig::from_toml_str("[monitor]\nnetwork = \"PUBLIC\"\n").unwrap();
        assert_eq!(config.network, Network::Mainnet);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("STELLAR_NETWORK", "mainnet"),
            ("TX_MONITOR_TIMEOUT_MS", "5000"),
            ("TX_MONITOR_INTERVAL_MS", " 1000 "),
        ]
        .into_iter()
        .collect();

        let config = MonitorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.timeout_ms, 5_000);
        assert_eq!(config.interval_ms, 1_000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_lookup_bad_number() {
        let result = MonitorConfig::from_lookup(|k| {
            (k == "TX_MONITOR_TIMEOUT_MS").then(|| "ninety".to_string())
        });
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("TX_MONITOR_TIMEOUT_MS"));
    }

    #[test]
    fn test_load_example_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("monitor.example.toml");
        let config = MonitorConfig::load(path).unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MonitorConfig::load("/nonexistent/tx-monitor.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
