use crate::err_custom_create;
use crate::error::TrackerError;
use crate::reconcile::reconcile_history;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wallet_tx_common::channels::{ZeroBroadcastReceiver, ZeroBroadcastSender};
use wallet_tx_common::model::TransactionRecord;
use wallet_tx_common::{HistorySyncInfo, LedgerEvent, LedgerEventContent};

/// Key under which the last fetched remote block of an account is kept
pub fn last_fetched_block_key(chain_id: u64, address: &str) -> String {
    format!("{}#{}", chain_id, address.to_lowercase())
}

/// Owned copy of the ledger state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub last_fetched_block_numbers: BTreeMap<String, u64>,
}

impl LedgerSnapshot {
    /// Sync cursor only moves forward
    fn advance_sync_cursor(&mut self, sync: &HistorySyncInfo) {
        if let Some(block) = sync.last_fetched_block {
            let entry = self
                .last_fetched_block_numbers
                .entry(last_fetched_block_key(sync.chain_id, &sync.address))
                .or_insert(block);
            *entry = std::cmp::max(*entry, block);
        }
    }
}

#[derive(Debug, Clone)]
pub enum LedgerPatch {
    /// Replaces the whole transaction list, optionally advancing the sync cursor
    ReplaceTransactions {
        transactions: Vec<TransactionRecord>,
        sync: Option<HistorySyncInfo>,
    },
    UpsertTransaction(TransactionRecord),
    /// Merges remote history into the transactions stored at the time of the write and
    /// advances the sync cursor of `address`
    MergeRemote {
        chain_id: u64,
        address: String,
        remote: Vec<TransactionRecord>,
        transaction_history_limit: usize,
        last_fetched_block: Option<u64>,
    },
}

/// Ledger state right after a patch together with the published change
#[derive(Debug, Clone)]
pub struct LedgerChange {
    pub snapshot: LedgerSnapshot,
    pub content: LedgerEventContent,
}

impl LedgerChange {
    pub fn sync_info(&self) -> Option<&HistorySyncInfo> {
        match &self.content {
            LedgerEventContent::TransactionsReplaced { sync, .. } => sync.as_ref(),
            _ => None,
        }
    }
}

/// Storage of the transaction ledger.
///
/// `apply` has to be atomic: a patch is either fully visible or not at all, and is
/// computed against the state it is written to.
pub trait LedgerStore {
    fn get(&self) -> LedgerSnapshot;
    fn apply(&self, patch: LedgerPatch) -> Result<LedgerChange, TrackerError>;
    fn subscribe(&self) -> ZeroBroadcastReceiver<LedgerEvent>;
}

pub struct MemoryLedgerStore {
    snapshot: Mutex<LedgerSnapshot>,
    events: ZeroBroadcastSender<LedgerEvent>,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::from_snapshot(LedgerSnapshot::default())
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            events: ZeroBroadcastSender::new(),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn get(&self) -> LedgerSnapshot {
        self.snapshot.lock().clone()
    }

    fn apply(&self, patch: LedgerPatch) -> Result<LedgerChange, TrackerError> {
        let change = {
            let mut snapshot = self.snapshot.lock();
            let content = match patch {
                LedgerPatch::ReplaceTransactions { transactions, sync } => {
                    snapshot.transactions = transactions;
                    if let Some(sync) = &sync {
                        snapshot.advance_sync_cursor(sync);
                    }
                    LedgerEventContent::TransactionsReplaced {
                        total: snapshot.transactions.len(),
                        sync,
                    }
                }
                LedgerPatch::MergeRemote {
                    chain_id,
                    address,
                    remote,
                    transaction_history_limit,
                    last_fetched_block,
                } => {
                    let (transactions, counts) = reconcile_history(
                        &snapshot.transactions,
                        &remote,
                        transaction_history_limit,
                    );
                    let sync = HistorySyncInfo {
                        chain_id,
                        address,
                        added: counts.added,
                        updated: counts.updated,
                        last_fetched_block,
                    };
                    snapshot.transactions = transactions;
                    snapshot.advance_sync_cursor(&sync);
                    LedgerEventContent::TransactionsReplaced {
                        total: snapshot.transactions.len(),
                        sync: Some(sync),
                    }
                }
                LedgerPatch::UpsertTransaction(record) => {
                    if record.id.is_empty() {
                        return Err(err_custom_create!("Cannot store transaction without id"));
                    }
                    let id = record.id.clone();
                    match snapshot.transactions.iter_mut().find(|tx| tx.id == id) {
                        Some(existing) => *existing = record,
                        None => snapshot.transactions.push(record),
                    }
                    LedgerEventContent::TransactionUpdated { id }
                }
            };
            LedgerChange {
                snapshot: snapshot.clone(),
                content,
            }
        };
        let receivers = self.events.send(LedgerEvent::now(change.content.clone()));
        log::trace!("Ledger change published to {} subscriber(s)", receivers);
        Ok(change)
    }

    fn subscribe(&self) -> ZeroBroadcastReceiver<LedgerEvent> {
        self.events.subscribe()
    }
}
