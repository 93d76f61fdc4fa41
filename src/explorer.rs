//! Explorer links
//!
//! Pure mapping from (handle, network) to a stellar.expert transaction URL.

use crate::error::MonitorError;
use crate::types::TxHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const EXPLORER_BASE: &str = "https://stellar.expert/explorer";

/// Ledger network the transaction was submitted to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    /// Path segment the explorer uses for this network
    pub fn explorer_segment(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "public",
        }
    }
}

impl FromStr for Network {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" | "public" => Ok(Network::Mainnet),
            _ => Err(MonitorError::InvalidNetwork(s.to_string())),
        }
    }
}

impl TryFrom<String> for Network {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Handles are restricted to URL-unreserved characters, so no escaping is needed
pub fn explorer_url(handle: &TxHandle, network: Network) -> String {
    format!("{}/{}/tx/{}", EXPLORER_BASE, network.explorer_segment(), handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_url_per_network() {
        let h: TxHandle = "test-tx-hash-123456789abcdef".parse().unwrap();
        assert_eq!(
            explorer_url(&h, Network::Testnet),
            "https://stellar.expert/explorer/testnet/tx/test-tx-hash-123456789abcdef"
        );
        assert_eq!(
            explorer_url(&h, Network::Mainnet),
            "https://stellar.expert/explorer/public/tx/test-tx-hash-123456789abcdef"
        );
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("public".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!(" mainnet ".parse::<Network>().unwrap(), Network::Mainnet);
        assert!(matches!(
            "futurenet".parse::<Network>(),
            Err(MonitorError::InvalidNetwork(_))
        ));
    }

    #[test]
    fn test_network_deserialize_ignores_case() {
        let n: Network = serde_json::from_str("\"Testnet\"").unwrap();
        assert_eq!(n, Network::Testnet);
        let n: Network = serde_json::from_str("\"PUBLIC\"").unwrap();
        assert_eq!(n, Network::Mainnet);
        let n: Network = serde_json::from_str("\"Mainnet\"").unwrap();
        assert_eq!(n, Network::Mainnet);
        assert_eq!(serde_json::to_string(&Network::Mainnet).unwrap(), "\"mainnet\"");

        let err = serde_json::from_str::<Network>("\"devnet\"").unwrap_err();
        assert!(err.to_string().contains("Invalid network"));
    }

    #[test]
    fn test_explorer_url_has_single_path_segment_for_handle() {
        let h: TxHandle = "a1B2-c3_d4.e5~f6".parse().unwrap();
        let url = explorer_url(&h, Network::Testnet);
        let tail = url.strip_prefix("https://stellar.expert/explorer/testnet/tx/").unwrap();
        assert_eq!(tail, "a1B2-c3_d4.e5~f6");
        assert!(!url.contains('?') && !url.contains('#'));
        assert!("evil/../../x".parse::<TxHandle>().is_err());
    }
}
