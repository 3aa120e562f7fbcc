use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySyncInfo {
    pub chain_id: u64,
    pub address: String,
    pub added: usize,
    pub updated: usize,
    pub last_fetched_block: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEventContent {
    /// Whole transaction list replaced (reconciliation run)
    TransactionsReplaced {
        total: usize,
        sync: Option<HistorySyncInfo>,
    },
    /// Single record written (e.g. after gas fee resolution)
    TransactionUpdated { id: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    pub create_date: DateTime<Utc>,
    pub content: LedgerEventContent,
}

impl LedgerEvent {
    pub fn now(content: LedgerEventContent) -> Self {
        LedgerEvent {
            create_date: Utc::now(),
            content,
        }
    }
}
