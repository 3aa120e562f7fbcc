use super::eth_generic_call::EthMethod;
use super::Web3RpcPool;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use web3::api::{Eth, Namespace};
use web3::helpers::{self, CallFuture};
use web3::types::*;

/// Raw `eth_feeHistory` answer. Nodes are inconsistent about which fields they send,
/// so every part is optional and individual entries may be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistoryResponse {
    #[serde(default)]
    pub oldest_block: Option<U64>,
    #[serde(default)]
    pub base_fee_per_gas: Option<Vec<Option<U256>>>,
    #[serde(default)]
    pub gas_used_ratio: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub reward: Option<Vec<Vec<U256>>>,
}

pub struct EthFeeHistory;

impl<T: web3::Transport> EthMethod<T> for EthFeeHistory {
    const METHOD: &'static str = "fee_history";
    /// (block count, newest block, reward percentiles)
    type Args = (U64, BlockNumber, Vec<u8>);
    type Return = Option<FeeHistoryResponse>;

    fn do_call(
        eth: Eth<T>,
        args: Self::Args,
    ) -> CallFuture<Self::Return, <T as web3::Transport>::Out> {
        let block_count = helpers::serialize(&args.0);
        let newest_block = helpers::serialize(&args.1);
        let reward_percentiles = helpers::serialize(&args.2);
        CallFuture::new(eth.transport().execute(
            "eth_feeHistory",
            vec![block_count, newest_block, reward_percentiles],
        ))
    }
}

impl Web3RpcPool {
    pub async fn eth_fee_history(
        self: Arc<Self>,
        block_count: U64,
        newest_block: BlockNumber,
        reward_percentiles: Vec<u8>,
    ) -> Result<Option<FeeHistoryResponse>, web3::Error> {
        self.eth_generic_call::<EthFeeHistory>((block_count, newest_block, reward_percentiles))
            .await
    }
}
