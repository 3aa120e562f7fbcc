use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use web3::types::U256;

/// Fee data of a single block as returned by eth_feeHistory.
///
/// `base_fee_per_gas` is `None` when the node did not report it, `gas_used_ratio` and
/// `priority_fees_by_percentile` are `None` for the synthetic entry describing the next
/// (not yet mined) block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockFeeRecord {
    pub number: u64,
    pub base_fee_per_gas: Option<U256>,
    pub gas_used_ratio: Option<f64>,
    pub priority_fees_by_percentile: Option<BTreeMap<u8, U256>>,
}

impl BlockFeeRecord {
    pub fn is_next_block(&self) -> bool {
        self.priority_fees_by_percentile.is_none() && self.gas_used_ratio.is_none()
    }
}
