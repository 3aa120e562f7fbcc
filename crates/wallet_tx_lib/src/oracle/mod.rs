mod default;
mod fee_history;
mod http;

pub use default::DefaultGasFeeOracle;
pub use fee_history::{calculate_fee_market_estimates, FeeHistoryGasFeeOracle, PriorityLevelSettings};
pub use http::{parse_gas_api_response, HttpGasFeeOracle};

use crate::error::TrackerError;
use std::future::Future;
use wallet_tx_common::model::GasFeeEstimate;

/// Source of suggested gas fees
pub trait GasFeeOracle {
    fn fetch_gas_fee_estimates(
        &self,
    ) -> impl Future<Output = Result<GasFeeEstimate, TrackerError>> + std::marker::Send;
}
