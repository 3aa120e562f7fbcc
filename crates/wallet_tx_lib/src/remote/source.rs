use super::etherscan::IndexerApi;
use super::normalize::{normalize_token_transaction, normalize_transaction};
use super::{RemoteTransactionSource, RemoteTransactionSourceRequest};
use crate::error::TrackerError;
use itertools::Itertools;
use wallet_tx_common::model::TransactionRecord;

/// Newest block of an ascending page that the page is known to hold completely.
/// `None` when the page is not full, every block in it is then complete.
fn complete_through(page: &[TransactionRecord], limit: Option<u64>) -> Option<u64> {
    let limit = limit?;
    if (page.len() as u64) < limit {
        return None;
    }
    let (oldest, newest) = page
        .iter()
        .filter_map(|record| record.block_number)
        .minmax()
        .into_option()?;
    if oldest == newest {
        // cannot move past a block holding a whole page, rest of it is lost
        log::warn!(
            "Block {} alone fills a page of {} transaction(s), remaining ones are skipped",
            newest,
            page.len()
        );
        return Some(newest);
    }
    Some(newest - 1)
}

/// Account history from an Etherscan compatible indexer.
///
/// Plain transactions and token transfers are fetched together and either both succeed
/// or the whole fetch fails. When a page comes back full, transactions of blocks that may
/// continue on the next page are left out so they are fetched again by the next request.
#[derive(Debug, Clone)]
pub struct EtherscanRemoteTransactionSource<A: IndexerApi> {
    api: A,
}

impl<A: IndexerApi> EtherscanRemoteTransactionSource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: IndexerApi + Send + Sync> RemoteTransactionSource for EtherscanRemoteTransactionSource<A> {
    fn is_supported_network(&self, chain_id: u64) -> bool {
        self.api.is_supported_network(chain_id)
    }

    async fn fetch_transactions(
        &self,
        request: RemoteTransactionSourceRequest,
    ) -> Result<Vec<TransactionRecord>, TrackerError> {
        let (transactions, token_transactions) = tokio::try_join!(
            self.api.fetch_transactions(&request),
            self.api.fetch_token_transactions(&request)
        )?;

        let mut records = transactions
            .iter()
            .map(|raw| normalize_transaction(raw, request.chain_id))
            .collect::<Result<Vec<_>, _>>()?;
        let token_records = token_transactions
            .iter()
            .map(|raw| normalize_token_transaction(raw, request.chain_id))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "Fetched {} transaction(s) and {} token transfer(s) for {:#x} on chain {}",
            transactions.len(),
            token_transactions.len(),
            request.address,
            request.chain_id
        );

        let horizon = [
            complete_through(&records, request.limit),
            complete_through(&token_records, request.limit),
        ]
        .into_iter()
        .flatten()
        .min();
        records.extend(token_records);
        if let Some(horizon) = horizon {
            let fetched = records.len();
            records.retain(|record| record.block_number.map_or(true, |block| block <= horizon));
            log::debug!(
                "Page limit reached, keeping {} of {} transaction(s) up to block {}",
                records.len(),
                fetched,
                horizon
            );
        }
        Ok(records)
    }
}
