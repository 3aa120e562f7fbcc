use crate::config::Config;
use crate::err_custom_create;
use crate::error::TrackerError;
use crate::fee_history::FeeHistoryFetcher;
use crate::oracle::{DefaultGasFeeOracle, FeeHistoryGasFeeOracle, HttpGasFeeOracle};
use crate::remote::{EtherscanClient, EtherscanRemoteTransactionSource};
use crate::sync::HistorySync;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wallet_rpc_pool::Web3RpcPool;

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChainSetup {
    pub network: String,
    #[serde(skip_serializing)]
    pub provider: Arc<Web3RpcPool>,
    pub chain_name: String,
    pub chain_id: u64,
    pub eip1559: bool,
    pub currency_symbol: String,
    pub indexer_api_url: Option<String>,
    pub indexer_page_limit: Option<u64>,
    pub gas_api_url: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSetup {
    pub chain_setup: BTreeMap<u64, ChainSetup>,
    pub history_poll_interval: Duration,
    pub fee_history_max_concurrent_chunks: usize,
    pub transaction_history_limit: usize,
    pub verify_confirmed: bool,
    #[serde(skip_serializing)]
    pub indexer_api_key: Option<String>,
}

impl TrackerSetup {
    pub fn new(config: &Config, indexer_api_key: Option<String>) -> Result<Self, TrackerError> {
        let mut chain_setup = BTreeMap::new();
        for (network, chain) in &config.chain {
            let provider = Web3RpcPool::new_from_urls(
                chain.chain_id,
                chain.rpc_endpoints.clone(),
                chain.max_response_time_ms,
            )
            .map_err(|e| {
                err_custom_create!("Failed to create rpc pool for {}: {}", network, e)
            })?;
            if chain_setup.contains_key(&chain.chain_id) {
                return Err(err_custom_create!(
                    "Chain id {} configured more than once",
                    chain.chain_id
                ));
            }
            chain_setup.insert(
                chain.chain_id,
                ChainSetup {
                    network: network.clone(),
                    provider,
                    chain_name: chain.chain_name.clone(),
                    chain_id: chain.chain_id,
                    eip1559: chain.eip1559,
                    currency_symbol: chain.currency_symbol.clone(),
                    indexer_api_url: chain.indexer_api_url.clone(),
                    indexer_page_limit: chain.indexer_page_limit,
                    gas_api_url: chain.gas_api_url.clone(),
                },
            );
        }
        Ok(TrackerSetup {
            chain_setup,
            history_poll_interval: Duration::from_secs(config.engine.history_poll_interval),
            fee_history_max_concurrent_chunks: config.engine.fee_history_max_concurrent_chunks,
            transaction_history_limit: config.engine.transaction_history_limit,
            verify_confirmed: config.engine.verify_confirmed,
            indexer_api_key,
        })
    }

    pub fn get_chain_setup(&self, chain_id: u64) -> Result<&ChainSetup, TrackerError> {
        self.chain_setup
            .get(&chain_id)
            .ok_or_else(|| err_custom_create!("No setup for chain id: {}", chain_id))
    }

    pub fn get_chain_setup_by_network(&self, network: &str) -> Result<&ChainSetup, TrackerError> {
        self.chain_setup
            .values()
            .find(|setup| setup.network == network)
            .ok_or_else(|| err_custom_create!("No setup for network: {}", network))
    }

    pub fn fee_history_fetcher(&self, chain_id: u64) -> Result<FeeHistoryFetcher<Arc<Web3RpcPool>>, TrackerError> {
        Ok(FeeHistoryFetcher::new(
            self.get_chain_setup(chain_id)?.provider.clone(),
            self.fee_history_max_concurrent_chunks,
        ))
    }

    pub fn gas_fee_oracle(
        &self,
        chain_id: u64,
    ) -> Result<DefaultGasFeeOracle<Arc<Web3RpcPool>>, TrackerError> {
        let chain = self.get_chain_setup(chain_id)?;
        Ok(DefaultGasFeeOracle::new(
            chain.gas_api_url.as_deref().map(HttpGasFeeOracle::new),
            FeeHistoryGasFeeOracle::new(self.fee_history_fetcher(chain_id)?),
            chain.eip1559,
        ))
    }

    /// Indexer backed history source covering every chain with an indexer url
    pub fn remote_transaction_source(&self) -> EtherscanRemoteTransactionSource<EtherscanClient> {
        let api_urls = self
            .chain_setup
            .values()
            .filter_map(|setup| {
                setup
                    .indexer_api_url
                    .as_ref()
                    .map(|url| (setup.chain_id, url.clone()))
            })
            .collect();
        EtherscanRemoteTransactionSource::new(EtherscanClient::new(
            api_urls,
            self.indexer_api_key.clone(),
        ))
    }

    pub fn history_sync(&self, chain_id: u64) -> Result<HistorySync, TrackerError> {
        Ok(HistorySync::new(
            self.transaction_history_limit,
            self.get_chain_setup(chain_id)?.indexer_page_limit,
        ))
    }
}
