use super::GasFeeOracle;
use crate::error::TrackerError;
use crate::{err_custom_create, err_from};
use reqwest::Client;
use wallet_tx_common::model::{FeeMarketGasFeeEstimates, GasFeeEstimate};

/// Gas fee suggestions served by an HTTP gas API
#[derive(Debug, Clone)]
pub struct HttpGasFeeOracle {
    client: Client,
    url: String,
}

impl HttpGasFeeOracle {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Accepts a tagged estimate or a bare fee-market body, any other shape is an error
pub fn parse_gas_api_response(body: &str) -> Result<GasFeeEstimate, TrackerError> {
    if let Ok(estimate) = serde_json::from_str::<GasFeeEstimate>(body) {
        return Ok(estimate);
    }
    match serde_json::from_str::<FeeMarketGasFeeEstimates>(body) {
        Ok(fee_market) => Ok(GasFeeEstimate::FeeMarket(fee_market)),
        Err(e) => Err(err_custom_create!(
            "Unrecognized gas fee estimate: {} {}",
            e,
            body
        )),
    }
}

impl GasFeeOracle for HttpGasFeeOracle {
    async fn fetch_gas_fee_estimates(&self) -> Result<GasFeeEstimate, TrackerError> {
        log::debug!("Fetching gas fee estimates from {}", self.url);
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(err_from!())?
            .error_for_status()
            .map_err(err_from!())?
            .text()
            .await
            .map_err(err_from!())?;
        parse_gas_api_response(&body)
    }
}
