use crate::err_custom_create;
use crate::error::TrackerError;
use crate::oracle::GasFeeOracle;
use crate::rpc::NodeRpc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wallet_rpc_pool::FeeHistoryResponse;
use wallet_tx_common::model::GasFeeEstimate;
use web3::types::{Block, TransactionReceipt, H256, U256, U64};

pub const GWEI: u64 = 1_000_000_000;

type FeeHistoryResponder = dyn Fn(u64, u64, &[u8]) -> Option<FeeHistoryResponse> + Send + Sync;

/// Well formed answer for any chunk: base fee of block `n` is `n` gwei, every reward is
/// `percentile` gwei
pub fn synthetic_fee_history(
    block_count: u64,
    newest_block: u64,
    percentiles: &[u8],
) -> Option<FeeHistoryResponse> {
    let oldest = newest_block + 1 - block_count;
    Some(FeeHistoryResponse {
        oldest_block: Some(U64::from(oldest)),
        base_fee_per_gas: Some(
            (oldest..=newest_block + 1)
                .map(|n| Some(U256::from(n * GWEI)))
                .collect(),
        ),
        gas_used_ratio: Some((0..block_count).map(|_| Some(0.5)).collect()),
        reward: if percentiles.is_empty() {
            None
        } else {
            Some(
                (0..block_count)
                    .map(|_| {
                        percentiles
                            .iter()
                            .map(|p| U256::from(*p as u64 * GWEI))
                            .collect()
                    })
                    .collect(),
            )
        },
    })
}

#[derive(Clone)]
pub struct FakeNode {
    pub latest_block: u64,
    pub gas_price: Option<U256>,
    pub fee_history_responder: Arc<FeeHistoryResponder>,
    /// delay per chunk, keyed by newest block of the chunk
    pub fee_history_delays_ms: Arc<BTreeMap<u64, u64>>,
    pub fail_fee_history_at: Option<u64>,
    pub receipts: Arc<BTreeMap<H256, TransactionReceipt>>,
    pub blocks: Arc<BTreeMap<u64, Block<H256>>>,
    pub block_number_calls: Arc<AtomicUsize>,
    pub gas_price_calls: Arc<AtomicUsize>,
    pub fee_history_calls: Arc<Mutex<Vec<(u64, u64, Vec<u8>)>>>,
}

impl FakeNode {
    pub fn new(latest_block: u64) -> Self {
        FakeNode {
            latest_block,
            gas_price: Some(U256::from(7 * GWEI)),
            fee_history_responder: Arc::new(synthetic_fee_history),
            fee_history_delays_ms: Arc::new(BTreeMap::new()),
            fail_fee_history_at: None,
            receipts: Arc::new(BTreeMap::new()),
            blocks: Arc::new(BTreeMap::new()),
            block_number_calls: Arc::new(AtomicUsize::new(0)),
            gas_price_calls: Arc::new(AtomicUsize::new(0)),
            fee_history_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_fee_history<F>(mut self, responder: F) -> Self
    where
        F: Fn(u64, u64, &[u8]) -> Option<FeeHistoryResponse> + Send + Sync + 'static,
    {
        self.fee_history_responder = Arc::new(responder);
        self
    }

    pub fn fee_history_call_sizes(&self) -> Vec<u64> {
        self.fee_history_calls.lock().iter().map(|c| c.0).collect()
    }

    pub fn gas_price_call_count(&self) -> usize {
        self.gas_price_calls.load(Ordering::SeqCst)
    }
}

impl NodeRpc for FakeNode {
    async fn block_number(&self) -> Result<u64, TrackerError> {
        self.block_number_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.latest_block)
    }

    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: u64,
        reward_percentiles: Vec<u8>,
    ) -> Result<Option<FeeHistoryResponse>, TrackerError> {
        self.fee_history_calls
            .lock()
            .push((block_count, newest_block, reward_percentiles.clone()));
        if let Some(delay) = self.fee_history_delays_ms.get(&newest_block) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if self.fail_fee_history_at == Some(newest_block) {
            return Err(err_custom_create!("fee history unavailable"));
        }
        Ok((self.fee_history_responder)(
            block_count,
            newest_block,
            &reward_percentiles,
        ))
    }

    async fn gas_price(&self) -> Result<U256, TrackerError> {
        self.gas_price_calls.fetch_add(1, Ordering::SeqCst);
        self.gas_price
            .ok_or_else(|| err_custom_create!("gas price unavailable"))
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, TrackerError> {
        Ok(self.receipts.get(&hash).cloned())
    }

    async fn block(&self, block_number: u64) -> Result<Option<Block<H256>>, TrackerError> {
        Ok(self.blocks.get(&block_number).cloned())
    }
}

#[derive(Clone)]
pub struct FakeOracle {
    pub estimate: Option<GasFeeEstimate>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeOracle {
    pub fn new(estimate: Option<GasFeeEstimate>) -> Self {
        FakeOracle {
            estimate,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GasFeeOracle for FakeOracle {
    async fn fetch_gas_fee_estimates(&self) -> Result<GasFeeEstimate, TrackerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.estimate
            .clone()
            .ok_or_else(|| err_custom_create!("gas api unavailable"))
    }
}
