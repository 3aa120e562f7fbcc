use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use web3::types::{Address, H256, U256};

/// Origin value used for transactions created by the wallet itself (as opposed to a dapp)
pub const WALLET_ORIGIN: &str = "wallet";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Unapproved,
    Approved,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    Dropped,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Confirmed
                | TransactionStatus::Failed
                | TransactionStatus::Dropped
                | TransactionStatus::Cancelled
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UserFeeLevel {
    Custom,
    DappSuggested,
    Medium,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransactionEnvelopeType {
    Legacy,
    FeeMarket,
}

impl TransactionEnvelopeType {
    pub fn type_id(&self) -> u64 {
        match self {
            TransactionEnvelopeType::Legacy => 0,
            TransactionEnvelopeType::FeeMarket => 2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    pub from: Address,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub data: Option<String>,
    pub nonce: Option<u64>,
    /// gas limit
    pub gas: Option<U256>,
    pub gas_used: Option<U256>,
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

impl TransactionParams {
    pub fn has_fee_market_fields(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }
}

/// Fee values chosen by the resolver, kept to be able to go back to them
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefaultGasEstimates {
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub estimate_type: Option<UserFeeLevel>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransferInformation {
    pub contract_address: Address,
    pub decimals: u32,
    pub symbol: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    pub message: String,
}

impl TransactionError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub chain_id: u64,
    pub hash: Option<H256>,
    pub status: TransactionStatus,
    #[serde(default)]
    pub origin: Option<String>,
    pub time: DateTime<Utc>,
    pub tx_params: TransactionParams,
    #[serde(default)]
    pub tx_type: Option<TransactionEnvelopeType>,
    #[serde(default)]
    pub user_fee_level: Option<UserFeeLevel>,
    #[serde(default)]
    pub default_gas_estimates: Option<DefaultGasEstimates>,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub transfer_information: Option<TransferInformation>,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub base_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub verified_on_blockchain: bool,
    #[serde(default)]
    pub error: Option<TransactionError>,
}

impl TransactionRecord {
    /// Fresh unapproved record for a transaction originated locally
    pub fn new_unapproved(chain_id: u64, origin: Option<&str>, tx_params: TransactionParams) -> Self {
        TransactionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            chain_id,
            hash: None,
            status: TransactionStatus::Unapproved,
            origin: origin.map(|s| s.to_string()),
            time: Utc::now(),
            tx_params,
            tx_type: None,
            user_fee_level: None,
            default_gas_estimates: None,
            is_transfer: false,
            transfer_information: None,
            block_number: None,
            block_timestamp: None,
            base_fee_per_gas: None,
            verified_on_blockchain: false,
            error: None,
        }
    }

    pub fn is_wallet_originated(&self) -> bool {
        self.origin.as_deref() == Some(WALLET_ORIGIN)
    }
}
