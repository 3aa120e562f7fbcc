use super::RemoteTransactionSourceRequest;
use crate::error::TrackerError;
use crate::{err_custom_create, err_from};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use url::Url;

fn default_is_error() -> String {
    "0".to_string()
}

/// Fields shared by the txlist and tokentx answers. Everything is a string there,
/// numbers in base 10.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtherscanTransactionBase {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    pub gas_used: String,
    pub nonce: String,
    /// tokentx answers do not carry it
    #[serde(default = "default_is_error")]
    pub is_error: String,
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanTransaction {
    #[serde(flatten)]
    pub base: EtherscanTransactionBase,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtherscanTokenTransaction {
    #[serde(flatten)]
    pub base: EtherscanTransactionBase,
    pub contract_address: String,
    pub token_decimal: String,
    pub token_symbol: String,
    #[serde(default)]
    pub token_name: String,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

/// Unpacks the `{status, message, result}` envelope.
///
/// Status "0" with an empty list is how the indexer reports an account without history.
pub fn parse_indexer_response<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, TrackerError> {
    let response: EtherscanResponse = serde_json::from_str(body)
        .map_err(|e| err_custom_create!("Error parsing indexer response: {} {}", e, body))?;
    match response.status.as_str() {
        "1" => serde_json::from_value(response.result).map_err(err_from!()),
        "0" if response
            .result
            .as_array()
            .map(|a| a.is_empty())
            .unwrap_or(false) =>
        {
            log::debug!("Indexer returned no records: {}", response.message);
            Ok(Vec::new())
        }
        _ => Err(err_custom_create!(
            "Indexer error: {} {}",
            response.message,
            response.result
        )),
    }
}

/// Raw access to an indexer account API
pub trait IndexerApi {
    fn is_supported_network(&self, chain_id: u64) -> bool;

    fn fetch_transactions(
        &self,
        request: &RemoteTransactionSourceRequest,
    ) -> impl Future<Output = Result<Vec<EtherscanTransaction>, TrackerError>> + std::marker::Send;

    fn fetch_token_transactions(
        &self,
        request: &RemoteTransactionSourceRequest,
    ) -> impl Future<Output = Result<Vec<EtherscanTokenTransaction>, TrackerError>> + std::marker::Send;
}

/// Etherscan compatible indexer client, one api url per chain
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    client: Client,
    api_urls: BTreeMap<u64, String>,
    api_key: Option<String>,
}

impl EtherscanClient {
    pub fn new(api_urls: BTreeMap<u64, String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_urls,
            api_key,
        }
    }

    pub fn build_url(
        &self,
        action: &str,
        request: &RemoteTransactionSourceRequest,
    ) -> Result<Url, TrackerError> {
        let base = self.api_urls.get(&request.chain_id).ok_or_else(|| {
            err_custom_create!("No indexer configured for chain {}", request.chain_id)
        })?;
        let mut url = Url::parse(base)
            .map_err(|e| err_custom_create!("Invalid indexer url {}: {}", base, e))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("module", "account")
                .append_pair("action", action)
                .append_pair("address", &format!("{:#x}", request.address));
            if let Some(from_block) = request.from_block {
                query.append_pair("startBlock", &from_block.to_string());
            }
            if let Some(limit) = request.limit {
                query
                    .append_pair("offset", &limit.to_string())
                    .append_pair("page", "1");
            }
            // oldest first, so a page limit cuts off the newest transactions
            query.append_pair("sort", "asc");
            if let Some(api_key) = &self.api_key {
                query.append_pair("apikey", api_key);
            }
        }
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        action: &str,
        request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<T>, TrackerError> {
        let url = self.build_url(action, request)?;
        log::debug!(
            "Fetching {} for {:#x} on chain {}",
            action,
            request.address,
            request.chain_id
        );
        let body = self
            .client
            .get(url)
            .send()
            .await
            .map_err(err_from!())?
            .text()
            .await
            .map_err(err_from!())?;
        parse_indexer_response(&body)
    }
}

impl IndexerApi for EtherscanClient {
    fn is_supported_network(&self, chain_id: u64) -> bool {
        self.api_urls.contains_key(&chain_id)
    }

    async fn fetch_transactions(
        &self,
        request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<EtherscanTransaction>, TrackerError> {
        self.fetch("txlist", request).await
    }

    async fn fetch_token_transactions(
        &self,
        request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<EtherscanTokenTransaction>, TrackerError> {
        self.fetch("tokentx", request).await
    }
}
