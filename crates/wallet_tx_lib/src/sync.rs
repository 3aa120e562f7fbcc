use crate::cancel::with_cancel;
use crate::error::{CancelledError, TrackerError};
use crate::remote::{RemoteTransactionSource, RemoteTransactionSourceRequest};
use crate::store::{last_fetched_block_key, LedgerPatch, LedgerStore};
use crate::{err_create, err_custom_create};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use web3::types::Address;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub added: usize,
    pub updated: usize,
    pub total: usize,
}

/// Pulls incoming history of an account into the ledger
#[derive(Debug, Clone)]
pub struct HistorySync {
    pub transaction_history_limit: usize,
    pub page_limit: Option<u64>,
}

impl HistorySync {
    pub fn new(transaction_history_limit: usize, page_limit: Option<u64>) -> Self {
        Self {
            transaction_history_limit,
            page_limit,
        }
    }

    /// Fetches new remote transactions and merges them into the ledger in one patch.
    /// The merge runs against the ledger at the time of the write, so changes made while
    /// fetching are kept. Nothing is written when the fetch fails or is cancelled.
    pub async fn update<S: LedgerStore, R: RemoteTransactionSource>(
        &self,
        store: &S,
        source: &R,
        address: Address,
        chain_id: u64,
        cancel: &CancellationToken,
    ) -> Result<SyncSummary, TrackerError> {
        if !source.is_supported_network(chain_id) {
            log::debug!("Incoming history not supported on chain {}", chain_id);
            return Ok(SyncSummary::default());
        }
        let address_str = format!("{:#x}", address);
        let last_fetched_block = store
            .get()
            .last_fetched_block_numbers
            .get(&last_fetched_block_key(chain_id, &address_str))
            .copied();

        let remote = with_cancel(
            cancel,
            "history sync",
            source.fetch_transactions(RemoteTransactionSourceRequest {
                address,
                chain_id,
                from_block: last_fetched_block.map(|b| b.saturating_add(1)),
                limit: self.page_limit,
            }),
        )
        .await?;

        // source leaves out blocks a full page may not hold completely
        let newest_block = remote
            .iter()
            .filter_map(|tx| tx.block_number)
            .max()
            .or(last_fetched_block);

        if cancel.is_cancelled() {
            return Err(err_create!(CancelledError::new("history sync")));
        }
        let change = store.apply(LedgerPatch::MergeRemote {
            chain_id,
            address: address_str,
            remote,
            transaction_history_limit: self.transaction_history_limit,
            last_fetched_block: newest_block,
        })?;
        let sync = change
            .sync_info()
            .ok_or_else(|| err_custom_create!("Ledger merge did not report sync info"))?;
        let summary = SyncSummary {
            added: sync.added,
            updated: sync.updated,
            total: change.snapshot.transactions.len(),
        };
        log::info!(
            "History of {:#x} on chain {} synced: {} added, {} updated, {} total",
            address,
            chain_id,
            summary.added,
            summary.updated,
            summary.total
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedgerStore;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use wallet_tx_common::model::{TransactionParams, TransactionRecord, TransactionStatus};
    use web3::types::H256;

    #[derive(Clone, Default)]
    struct FakeSource {
        records: Vec<TransactionRecord>,
        fail: bool,
        delay_ms: u64,
        requests: Arc<Mutex<Vec<RemoteTransactionSourceRequest>>>,
    }

    impl RemoteTransactionSource for FakeSource {
        fn is_supported_network(&self, chain_id: u64) -> bool {
            chain_id == 1
        }

        async fn fetch_transactions(
            &self,
            request: RemoteTransactionSourceRequest,
        ) -> Result<Vec<TransactionRecord>, TrackerError> {
            self.requests.lock().push(request);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                return Err(err_custom_create!("indexer down"));
            }
            Ok(self.records.clone())
        }
    }

    fn remote(hash: u8, block: u64) -> TransactionRecord {
        TransactionRecord {
            id: format!("remote-{hash}"),
            hash: Some(H256::repeat_byte(hash)),
            status: TransactionStatus::Confirmed,
            block_number: Some(block),
            time: Utc.timestamp_opt(block as i64, 0).single().unwrap_or_default(),
            ..TransactionRecord::new_unapproved(1, None, TransactionParams::default())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sync_writes_merged_history() -> Result<(), anyhow::Error> {
        let store = MemoryLedgerStore::new();
        let mut local = remote(0x01, 5);
        local.id = "local".to_string();
        local.status = TransactionStatus::Submitted;
        local.block_number = None;
        store.apply(LedgerPatch::UpsertTransaction(local))?;

        let source = FakeSource {
            records: vec![remote(0x01, 10), remote(0x02, 12)],
            ..Default::default()
        };
        let sync = HistorySync::new(40, Some(100));
        let address = Address::repeat_byte(0xaa);
        let summary = sync
            .update(&store, &source, address, 1, &CancellationToken::new())
            .await?;
        assert_eq!(
            summary,
            SyncSummary {
                added: 1,
                updated: 1,
                total: 2
            }
        );

        let snapshot = store.get();
        assert_eq!(snapshot.transactions[0].id, "local");
        assert_eq!(snapshot.transactions[0].status, TransactionStatus::Confirmed);
        let key = last_fetched_block_key(1, &format!("{:#x}", address));
        assert_eq!(snapshot.last_fetched_block_numbers.get(&key), Some(&12));

        // second run asks only for newer blocks and changes nothing
        let summary = sync
            .update(&store, &source, address, 1, &CancellationToken::new())
            .await?;
        assert_eq!(summary.added, 0);
        assert_eq!(summary.updated, 0);
        let requests = source.requests.lock();
        assert_eq!(requests[0].from_block, None);
        assert_eq!(requests[1].from_block, Some(13));
        assert_eq!(requests[1].limit, Some(100));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_upsert_during_fetch_survives_sync() -> Result<(), anyhow::Error> {
        let store = Arc::new(MemoryLedgerStore::new());
        let source = FakeSource {
            records: vec![remote(0x01, 10)],
            delay_ms: 200,
            ..Default::default()
        };

        let writer = store.clone();
        let upsert = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let mut created = TransactionRecord::new_unapproved(1, None, TransactionParams::default());
            created.id = "created-while-syncing".to_string();
            writer.apply(LedgerPatch::UpsertTransaction(created))
        });
        let summary = HistorySync::new(40, None)
            .update(&*store, &source, Address::zero(), 1, &CancellationToken::new())
            .await?;
        upsert.await??;

        assert_eq!(
            summary,
            SyncSummary {
                added: 1,
                updated: 0,
                total: 2
            }
        );
        let mut ids = store
            .get()
            .transactions
            .into_iter()
            .map(|t| t.id)
            .collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec!["created-while-syncing", "remote-1"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unsupported_chain_is_skipped() -> Result<(), anyhow::Error> {
        let store = MemoryLedgerStore::new();
        let source = FakeSource::default();
        let summary = HistorySync::new(40, None)
            .update(&store, &source, Address::zero(), 56, &CancellationToken::new())
            .await?;
        assert_eq!(summary, SyncSummary::default());
        assert!(source.requests.lock().is_empty());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_or_cancelled_fetch_writes_nothing() -> Result<(), anyhow::Error> {
        let store = MemoryLedgerStore::new();
        let mut events = store.subscribe();

        let failing = FakeSource {
            fail: true,
            ..Default::default()
        };
        let res = HistorySync::new(40, None)
            .update(&store, &failing, Address::zero(), 1, &CancellationToken::new())
            .await;
        assert!(res.is_err());

        let slow = FakeSource {
            records: vec![remote(0x05, 1)],
            delay_ms: 5_000,
            ..Default::default()
        };
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel_clone.cancel();
        });
        let res = HistorySync::new(40, None)
            .update(&store, &slow, Address::zero(), 1, &cancel)
            .await;
        assert!(res.is_err_and(|e| e.is_cancelled()));

        assert!(store.get().transactions.is_empty());
        assert!(events.try_recv().is_none());
        Ok(())
    }
}
