use super::GasFeeOracle;
use crate::error::TrackerError;
use crate::fee_history::{FeeHistoryFetcher, FeeHistoryRequest};
use crate::rpc::NodeRpc;
use crate::{err_custom_create, err_from};
use tokio_util::sync::CancellationToken;
use wallet_tx_common::model::{
    BlockFeeRecord, Eip1559GasFee, FeeMarketGasFeeEstimates, GasFeeEstimate,
};
use wallet_tx_common::utils::wei_to_gwei_decimal;
use web3::types::U256;

const NUMBER_OF_RECENT_BLOCKS: u64 = 5;

#[derive(Debug, Clone, Copy)]
pub struct PriorityLevelSettings {
    pub percentile: u8,
    pub base_fee_percentage_multiplier: u64,
    pub priority_fee_percentage_multiplier: u64,
    pub min_suggested_max_priority_fee_per_gas: U256,
}

fn priority_levels() -> [PriorityLevelSettings; 3] {
    [
        PriorityLevelSettings {
            percentile: 10,
            base_fee_percentage_multiplier: 110,
            priority_fee_percentage_multiplier: 94,
            min_suggested_max_priority_fee_per_gas: U256::from(1_000_000_000u64),
        },
        PriorityLevelSettings {
            percentile: 20,
            base_fee_percentage_multiplier: 120,
            priority_fee_percentage_multiplier: 97,
            min_suggested_max_priority_fee_per_gas: U256::from(1_500_000_000u64),
        },
        PriorityLevelSettings {
            percentile: 30,
            base_fee_percentage_multiplier: 125,
            priority_fee_percentage_multiplier: 98,
            min_suggested_max_priority_fee_per_gas: U256::from(2_000_000_000u64),
        },
    ]
}

fn median(values: &mut [U256]) -> U256 {
    if values.is_empty() {
        return U256::zero();
    }
    values.sort();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2
    } else {
        values[mid]
    }
}

fn estimate_for_level(
    settings: &PriorityLevelSettings,
    blocks: &[BlockFeeRecord],
    base_fee: U256,
) -> Result<Eip1559GasFee, TrackerError> {
    let mut rewards = blocks
        .iter()
        .filter_map(|b| b.priority_fees_by_percentile.as_ref())
        .filter_map(|fees| fees.get(&settings.percentile).copied())
        .filter(|reward| !reward.is_zero())
        .collect::<Vec<_>>();
    let priority_fee = std::cmp::max(
        median(&mut rewards) * settings.priority_fee_percentage_multiplier / 100,
        settings.min_suggested_max_priority_fee_per_gas,
    );
    let max_fee = base_fee * settings.base_fee_percentage_multiplier / 100 + priority_fee;
    Ok(Eip1559GasFee {
        suggested_max_priority_fee_per_gas: wei_to_gwei_decimal(priority_fee)
            .map_err(err_from!())?,
        suggested_max_fee_per_gas: wei_to_gwei_decimal(max_fee).map_err(err_from!())?,
        min_wait_time_estimate: None,
        max_wait_time_estimate: None,
    })
}

/// Builds low/medium/high fee-market suggestions out of recent blocks.
/// The base fee used is the one projected for the next block, or the latest known one.
pub fn calculate_fee_market_estimates(
    blocks: &[BlockFeeRecord],
) -> Result<FeeMarketGasFeeEstimates, TrackerError> {
    let base_fee = blocks
        .iter()
        .rev()
        .find_map(|b| b.base_fee_per_gas)
        .ok_or_else(|| err_custom_create!("No base fee in fee history, chain is not EIP-1559"))?;
    let [low, medium, high] = priority_levels();
    Ok(FeeMarketGasFeeEstimates {
        low: estimate_for_level(&low, blocks, base_fee)?,
        medium: estimate_for_level(&medium, blocks, base_fee)?,
        high: estimate_for_level(&high, blocks, base_fee)?,
        estimated_base_fee: wei_to_gwei_decimal(base_fee).map_err(err_from!())?,
    })
}

/// Fee-market suggestions computed from the node's own fee history
#[derive(Debug, Clone)]
pub struct FeeHistoryGasFeeOracle<N: NodeRpc> {
    fetcher: FeeHistoryFetcher<N>,
}

impl<N: NodeRpc + Sync> FeeHistoryGasFeeOracle<N> {
    pub fn new(fetcher: FeeHistoryFetcher<N>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &FeeHistoryFetcher<N> {
        &self.fetcher
    }
}

impl<N: NodeRpc + Send + Sync> GasFeeOracle for FeeHistoryGasFeeOracle<N> {
    async fn fetch_gas_fee_estimates(&self) -> Result<GasFeeEstimate, TrackerError> {
        let blocks = self
            .fetcher
            .fetch(
                FeeHistoryRequest {
                    end_block: None,
                    number_of_blocks: NUMBER_OF_RECENT_BLOCKS,
                    percentiles: priority_levels()
                        .iter()
                        .map(|l| l.percentile as u32)
                        .collect(),
                    include_next_block: true,
                },
                &CancellationToken::new(),
            )
            .await?;
        Ok(GasFeeEstimate::FeeMarket(calculate_fee_market_estimates(
            &blocks,
        )?))
    }
}
