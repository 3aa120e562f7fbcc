use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Suggested fee-market values for one priority tier, in gwei
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eip1559GasFee {
    pub suggested_max_priority_fee_per_gas: Decimal,
    pub suggested_max_fee_per_gas: Decimal,
    #[serde(default)]
    pub min_wait_time_estimate: Option<u64>,
    #[serde(default)]
    pub max_wait_time_estimate: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeMarketGasFeeEstimates {
    pub low: Eip1559GasFee,
    pub medium: Eip1559GasFee,
    pub high: Eip1559GasFee,
    pub estimated_base_fee: Decimal,
}

/// Legacy gas prices per tier, in gwei
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGasPriceEstimates {
    pub low: Decimal,
    pub medium: Decimal,
    pub high: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EthGasPriceEstimate {
    pub gas_price: Decimal,
}

/// Oracle result. Shapes that do not match one of the variants are rejected while parsing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "gasEstimateType", content = "gasFeeEstimates")]
pub enum GasFeeEstimate {
    #[serde(rename = "fee-market")]
    FeeMarket(FeeMarketGasFeeEstimates),
    #[serde(rename = "legacy")]
    Legacy(LegacyGasPriceEstimates),
    #[serde(rename = "eth_gasPrice")]
    EthGasPrice(EthGasPriceEstimate),
}

impl GasFeeEstimate {
    pub fn estimate_type(&self) -> &'static str {
        match self {
            GasFeeEstimate::FeeMarket(_) => "fee-market",
            GasFeeEstimate::Legacy(_) => "legacy",
            GasFeeEstimate::EthGasPrice(_) => "eth_gasPrice",
        }
    }
}
