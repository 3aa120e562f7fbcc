mod etherscan;
mod normalize;
mod source;

pub use etherscan::{
    parse_indexer_response, EtherscanClient, EtherscanTokenTransaction, EtherscanTransaction,
    EtherscanTransactionBase, IndexerApi,
};
pub use normalize::{normalize_token_transaction, normalize_transaction, remote_transaction_id};
pub use source::EtherscanRemoteTransactionSource;

use crate::error::TrackerError;
use std::future::Future;
use wallet_tx_common::model::TransactionRecord;
use web3::types::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTransactionSourceRequest {
    pub address: Address,
    pub chain_id: u64,
    /// Only transactions mined in this block or later
    pub from_block: Option<u64>,
    /// Page size, oldest transactions come first
    pub limit: Option<u64>,
}

/// Transaction history of an account as seen on chain.
///
/// A result holds every transaction of the account up to its newest block, so the next
/// request may start right after that block.
pub trait RemoteTransactionSource {
    fn is_supported_network(&self, chain_id: u64) -> bool;

    fn fetch_transactions(
        &self,
        request: RemoteTransactionSourceRequest,
    ) -> impl Future<Output = Result<Vec<TransactionRecord>, TrackerError>> + std::marker::Send;
}
