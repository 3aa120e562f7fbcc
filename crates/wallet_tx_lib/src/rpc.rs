use crate::err_from;
use crate::error::TrackerError;
use std::future::Future;
use std::sync::Arc;
use wallet_rpc_pool::{FeeHistoryResponse, Web3RpcPool};
use web3::types::{Block, BlockId, BlockNumber, TransactionReceipt, H256, U256, U64};

/// Node queries needed by the tracker
///
/// Implemented for the rpc pool; tests provide in-process fakes.
pub trait NodeRpc {
    fn block_number(
        &self,
    ) -> impl Future<Output = Result<u64, TrackerError>> + std::marker::Send;

    fn fee_history(
        &self,
        block_count: u64,
        newest_block: u64,
        reward_percentiles: Vec<u8>,
    ) -> impl Future<Output = Result<Option<FeeHistoryResponse>, TrackerError>> + std::marker::Send;

    fn gas_price(&self) -> impl Future<Output = Result<U256, TrackerError>> + std::marker::Send;

    fn transaction_receipt(
        &self,
        hash: H256,
    ) -> impl Future<Output = Result<Option<TransactionReceipt>, TrackerError>> + std::marker::Send;

    fn block(
        &self,
        block_number: u64,
    ) -> impl Future<Output = Result<Option<Block<H256>>, TrackerError>> + std::marker::Send;
}

impl NodeRpc for Arc<Web3RpcPool> {
    async fn block_number(&self) -> Result<u64, TrackerError> {
        log::debug!("eth_blockNumber on chain {}", self.get_chain_id());
        let res = self.clone().eth_block_number().await.map_err(err_from!())?;
        Ok(res.as_u64())
    }

    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: u64,
        reward_percentiles: Vec<u8>,
    ) -> Result<Option<FeeHistoryResponse>, TrackerError> {
        log::debug!(
            "eth_feeHistory on chain {}: count {} newest {} percentiles {:?}",
            self.get_chain_id(),
            block_count,
            newest_block,
            reward_percentiles
        );
        self.clone()
            .eth_fee_history(
                U64::from(block_count),
                BlockNumber::Number(U64::from(newest_block)),
                reward_percentiles,
            )
            .await
            .map_err(err_from!())
    }

    async fn gas_price(&self) -> Result<U256, TrackerError> {
        log::debug!("eth_gasPrice on chain {}", self.get_chain_id());
        self.clone().eth_gas_price().await.map_err(err_from!())
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, TrackerError> {
        log::debug!("eth_getTransactionReceipt {:#x}", hash);
        self.clone()
            .eth_transaction_receipt(hash)
            .await
            .map_err(err_from!())
    }

    async fn block(&self, block_number: u64) -> Result<Option<Block<H256>>, TrackerError> {
        log::debug!("eth_getBlockByNumber {}", block_number);
        self.clone()
            .eth_block(BlockId::Number(BlockNumber::Number(U64::from(block_number))))
            .await
            .map_err(err_from!())
    }
}
