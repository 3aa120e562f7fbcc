use super::{FeeHistoryGasFeeOracle, GasFeeOracle, HttpGasFeeOracle};
use crate::err_from;
use crate::error::TrackerError;
use crate::rpc::NodeRpc;
use wallet_tx_common::model::{EthGasPriceEstimate, GasFeeEstimate};
use wallet_tx_common::utils::wei_to_gwei_decimal;

/// Gas API when configured, otherwise estimates computed from the node.
///
/// On fee-market chains a failing gas API falls back to fee history. Legacy chains
/// without a gas API get the node's current gas price.
#[derive(Debug, Clone)]
pub struct DefaultGasFeeOracle<N: NodeRpc> {
    api: Option<HttpGasFeeOracle>,
    fee_history: FeeHistoryGasFeeOracle<N>,
    eip1559: bool,
}

impl<N: NodeRpc + Sync> DefaultGasFeeOracle<N> {
    pub fn new(
        api: Option<HttpGasFeeOracle>,
        fee_history: FeeHistoryGasFeeOracle<N>,
        eip1559: bool,
    ) -> Self {
        Self {
            api,
            fee_history,
            eip1559,
        }
    }
}

impl<N: NodeRpc + Send + Sync> GasFeeOracle for DefaultGasFeeOracle<N> {
    async fn fetch_gas_fee_estimates(&self) -> Result<GasFeeEstimate, TrackerError> {
        if let Some(api) = &self.api {
            match api.fetch_gas_fee_estimates().await {
                Ok(estimate) => return Ok(estimate),
                Err(err) if self.eip1559 => {
                    log::warn!(
                        "Gas API {} failed, using fee history instead: {}",
                        api.url(),
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }
        if self.eip1559 {
            self.fee_history.fetch_gas_fee_estimates().await
        } else {
            let gas_price = self.fee_history.fetcher().node().gas_price().await?;
            Ok(GasFeeEstimate::EthGasPrice(EthGasPriceEstimate {
                gas_price: wei_to_gwei_decimal(gas_price).map_err(err_from!())?,
            }))
        }
    }
}
