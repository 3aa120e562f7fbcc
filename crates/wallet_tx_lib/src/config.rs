use serde::Deserialize;
use std::collections::btree_map::BTreeMap as Map;

use std::path::Path;

use crate::error::*;
use crate::{err_custom_create, err_from, err_from_msg};
use tokio::fs;

fn default_history_poll_interval() -> u64 {
    180
}

fn default_fee_history_max_concurrent_chunks() -> usize {
    4
}

fn default_transaction_history_limit() -> usize {
    40
}

fn default_max_response_time_ms() -> u64 {
    5000
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Engine {
    /// Seconds between incoming history polls
    #[serde(default = "default_history_poll_interval")]
    pub history_poll_interval: u64,
    #[serde(default = "default_fee_history_max_concurrent_chunks")]
    pub fee_history_max_concurrent_chunks: usize,
    #[serde(default = "default_transaction_history_limit")]
    pub transaction_history_limit: usize,
    #[serde(default)]
    pub verify_confirmed: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            history_poll_interval: default_history_poll_interval(),
            fee_history_max_concurrent_chunks: default_fee_history_max_concurrent_chunks(),
            transaction_history_limit: default_transaction_history_limit(),
            verify_confirmed: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub chain: Map<String, Chain>,
    #[serde(default)]
    pub engine: Engine,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Chain {
    pub chain_name: String,
    pub chain_id: u64,
    pub rpc_endpoints: Vec<String>,
    pub eip1559: bool,
    pub currency_symbol: String,
    pub indexer_api_url: Option<String>,
    pub indexer_page_limit: Option<u64>,
    pub gas_api_url: Option<String>,
    #[serde(default = "default_max_response_time_ms")]
    pub max_response_time_ms: u64,
}

impl Config {
    pub fn load_from_str(str: &str) -> Result<Self, TrackerError> {
        toml::from_str(str).map_err(err_from_msg!("Failed to parse config"))
    }

    pub async fn load<P: AsRef<Path> + std::fmt::Display>(path: P) -> Result<Self, TrackerError> {
        let content = fs::read_to_string(&path).await.map_err(err_from!())?;
        toml::from_str(&content).map_err(err_from_msg!("Failed to parse config file {}", path))
    }

    pub fn change_rpc_endpoints(
        &mut self,
        chain: &str,
        rpc_endpoints: Vec<String>,
    ) -> Result<(), TrackerError> {
        self.chain
            .get_mut(chain)
            .ok_or(err_custom_create!("Chain {} not found", chain))?
            .rpc_endpoints = rpc_endpoints;
        Ok(())
    }

    pub fn get_chain_by_name(&self, chain_name: &str) -> Result<&Chain, TrackerError> {
        self.chain
            .get(chain_name)
            .ok_or(err_custom_create!("Chain {} not found in config", chain_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[engine]
history-poll-interval = 60
transaction-history-limit = 10

[chain.mainnet]
chain-name = "Mainnet"
chain-id = 1
rpc-endpoints = ["https://ethereum.example.org"]
eip1559 = true
currency-symbol = "ETH"
indexer-api-url = "https://api.etherscan.io/api"
gas-api-url = "https://gas.example.org/networks/1/suggestedGasFees"

[chain.bsc]
chain-name = "BSC"
chain-id = 56
rpc-endpoints = ["https://bsc.example.org"]
eip1559 = false
currency-symbol = "BNB"
max-response-time-ms = 2000
"#;

    #[test]
    fn test_load_config() -> Result<(), anyhow::Error> {
        let config = Config::load_from_str(TEST_CONFIG)?;
        assert_eq!(config.engine.history_poll_interval, 60);
        assert_eq!(config.engine.transaction_history_limit, 10);
        assert_eq!(config.engine.fee_history_max_concurrent_chunks, 4);
        assert!(!config.engine.verify_confirmed);

        let mainnet = config.get_chain_by_name("mainnet")?;
        assert_eq!(mainnet.chain_id, 1);
        assert!(mainnet.eip1559);
        assert_eq!(mainnet.max_response_time_ms, 5000);
        assert_eq!(mainnet.indexer_page_limit, None);

        let bsc = config.get_chain_by_name("bsc")?;
        assert!(bsc.indexer_api_url.is_none());
        assert_eq!(bsc.max_response_time_ms, 2000);
        assert!(config.get_chain_by_name("goerli").is_err());
        Ok(())
    }

    #[test]
    fn test_change_rpc_endpoints() -> Result<(), anyhow::Error> {
        let mut config = Config::load_from_str(TEST_CONFIG)?;
        config.change_rpc_endpoints("bsc", vec!["http://127.0.0.1:8545".to_string()])?;
        assert_eq!(
            config.get_chain_by_name("bsc")?.rpc_endpoints,
            vec!["http://127.0.0.1:8545".to_string()]
        );
        assert!(config.change_rpc_endpoints("missing", vec![]).is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_shipped_config() -> Result<(), anyhow::Error> {
        let config = Config::load("../../config-tracker.toml").await?;
        assert_eq!(config.get_chain_by_name("holesky")?.chain_id, 17000);
        assert!(!config.get_chain_by_name("bsc")?.eip1559);
        Ok(())
    }
}
