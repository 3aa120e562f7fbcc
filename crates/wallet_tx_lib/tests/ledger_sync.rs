use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wallet_rpc_pool::FeeHistoryResponse;
use wallet_tx_common::LedgerEventContent;
use wallet_tx_lib::error::TrackerError;
use wallet_tx_lib::gas_fees::update_transaction_gas_fees;
use wallet_tx_lib::model::{
    GasFeeEstimate, TransactionParams, TransactionRecord, TransactionStatus, UserFeeLevel,
    WALLET_ORIGIN,
};
use wallet_tx_lib::oracle::GasFeeOracle;
use wallet_tx_lib::remote::{
    EtherscanRemoteTransactionSource, EtherscanTokenTransaction, EtherscanTransaction,
    IndexerApi, RemoteTransactionSourceRequest,
};
use wallet_tx_lib::rpc::NodeRpc;
use wallet_tx_lib::store::{LedgerStore, MemoryLedgerStore};
use wallet_tx_lib::sync::HistorySync;
use wallet_tx_lib::err_custom_create;
use web3::types::{Address, Block, TransactionReceipt, H256, U256};

const ACCOUNT: &str = "0x2222222222222222222222222222222222222222";
const HASH_SENT: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
const HASH_RECEIVED: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";

fn indexer_body(hash: &str, nonce: u64, block: u64, from: &str, to: &str) -> String {
    format!(
        r#"{{"blockNumber":"{block}","timeStamp":"{ts}","hash":"{hash}","nonce":"{nonce}",
        "from":"{from}","to":"{to}","value":"1000","gas":"21000","gasPrice":"2000000000",
        "gasUsed":"21000","isError":"0","input":"0x"}}"#,
        ts = 1_700_000_000 + block
    )
}

struct StaticIndexer;

impl IndexerApi for StaticIndexer {
    fn is_supported_network(&self, chain_id: u64) -> bool {
        chain_id == 17000
    }

    async fn fetch_transactions(
        &self,
        _request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<EtherscanTransaction>, TrackerError> {
        let body = format!(
            r#"{{"status":"1","message":"OK","result":[{},{}]}}"#,
            indexer_body(
                HASH_SENT,
                0,
                100,
                ACCOUNT,
                "0x4444444444444444444444444444444444444444"
            ),
            indexer_body(
                HASH_RECEIVED,
                9,
                90,
                "0x5555555555555555555555555555555555555555",
                ACCOUNT
            ),
        );
        wallet_tx_lib::remote::parse_indexer_response(&body)
    }

    async fn fetch_token_transactions(
        &self,
        _request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<EtherscanTokenTransaction>, TrackerError> {
        wallet_tx_lib::remote::parse_indexer_response(
            r#"{"status":"0","message":"No transactions found","result":[]}"#,
        )
    }
}

struct LegacyOracle;

impl GasFeeOracle for LegacyOracle {
    async fn fetch_gas_fee_estimates(&self) -> Result<GasFeeEstimate, TrackerError> {
        Ok(serde_json::from_str(
            r#"{"gasEstimateType":"legacy","gasFeeEstimates":{"low":"1","medium":"2","high":"3"}}"#,
        )
        .map_err(|e| err_custom_create!("{}", e))?)
    }
}

struct UnusedNode;

impl NodeRpc for UnusedNode {
    async fn block_number(&self) -> Result<u64, TrackerError> {
        Err(err_custom_create!("not expected"))
    }

    async fn fee_history(
        &self,
        _block_count: u64,
        _newest_block: u64,
        _reward_percentiles: Vec<u8>,
    ) -> Result<Option<FeeHistoryResponse>, TrackerError> {
        Err(err_custom_create!("not expected"))
    }

    async fn gas_price(&self) -> Result<U256, TrackerError> {
        Err(err_custom_create!("not expected"))
    }

    async fn transaction_receipt(
        &self,
        _hash: H256,
    ) -> Result<Option<TransactionReceipt>, TrackerError> {
        Ok(None)
    }

    async fn block(&self, _block_number: u64) -> Result<Option<Block<H256>>, TrackerError> {
        Ok(None)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_local_transaction_confirmed_by_indexer() -> Result<(), anyhow::Error> {
    let _ = env_logger::builder().is_test(true).try_init();

    let account: Address = ACCOUNT.parse()?;
    let store = MemoryLedgerStore::new();
    let mut events = store.subscribe();

    // wallet creates a transaction and resolves its fees before signing
    let mut local = TransactionRecord::new_unapproved(
        17000,
        Some(WALLET_ORIGIN),
        TransactionParams {
            from: account,
            to: Some("0x4444444444444444444444444444444444444444".parse()?),
            value: Some(U256::from(1000)),
            nonce: Some(0),
            ..Default::default()
        },
    );
    local.hash = Some(HASH_SENT.parse()?);
    local.status = TransactionStatus::Submitted;
    let local_id = local.id.clone();
    store.apply(wallet_tx_lib::store::LedgerPatch::UpsertTransaction(local))?;
    let resolved =
        update_transaction_gas_fees(&store, &local_id, false, &LegacyOracle, &UnusedNode).await?;
    assert_eq!(resolved.tx_params.gas_price, Some(U256::from(2_000_000_000u64)));

    let source = EtherscanRemoteTransactionSource::new(StaticIndexer);
    let sync = HistorySync::new(40, None);
    let summary = sync
        .update(&store, &source, account, 17000, &CancellationToken::new())
        .await?;
    assert_eq!(summary.added, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.total, 2);

    let snapshot = store.get();
    let ids = snapshot
        .transactions
        .iter()
        .map(|t| t.tx_params.nonce)
        .collect::<Vec<_>>();
    // received transaction was mined earlier
    assert_eq!(ids, vec![Some(9), Some(0)]);
    let sent = &snapshot.transactions[1];
    assert_eq!(sent.id, local_id);
    assert_eq!(sent.status, TransactionStatus::Confirmed);
    assert_eq!(sent.block_number, Some(100));
    assert_eq!(sent.user_fee_level, None);
    assert_eq!(sent.tx_params.gas_price, Some(U256::from(2_000_000_000u64)));
    assert_eq!(
        snapshot.last_fetched_block_numbers,
        BTreeMap::from([(format!("17000#{}", ACCOUNT), 100)])
    );

    let mut replaced = 0;
    while let Some(event) = events.try_recv() {
        if let LedgerEventContent::TransactionsReplaced { total, sync } = event.content {
            assert_eq!(total, 2);
            assert_eq!(sync.and_then(|s| s.last_fetched_block), Some(100));
            replaced += 1;
        }
    }
    assert_eq!(replaced, 1);

    // same indexer answer again leaves the ledger unchanged
    let summary = sync
        .update(&store, &source, account, 17000, &CancellationToken::new())
        .await?;
    assert_eq!((summary.added, summary.updated), (0, 0));
    assert_eq!(store.get().transactions, snapshot.transactions);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fee_market_user_fee_level_survives_sync() -> Result<(), anyhow::Error> {
    let account: Address = ACCOUNT.parse()?;
    let mut local = TransactionRecord::new_unapproved(
        17000,
        Some("https://dapp.example"),
        TransactionParams {
            from: account,
            nonce: Some(0),
            ..Default::default()
        },
    );
    local.hash = Some(HASH_SENT.parse()?);
    local.status = TransactionStatus::Submitted;
    local.user_fee_level = Some(UserFeeLevel::DappSuggested);
    let store = MemoryLedgerStore::new();
    store.apply(wallet_tx_lib::store::LedgerPatch::UpsertTransaction(local))?;

    HistorySync::new(40, None)
        .update(
            &store,
            &EtherscanRemoteTransactionSource::new(StaticIndexer),
            account,
            17000,
            &CancellationToken::new(),
        )
        .await?;
    let sent = store
        .get()
        .transactions
        .into_iter()
        .find(|t| t.hash == Some(HASH_SENT.parse().unwrap_or_default()))
        .ok_or(anyhow::anyhow!("sent transaction missing"))?;
    assert_eq!(sent.status, TransactionStatus::Confirmed);
    assert_eq!(sent.user_fee_level, Some(UserFeeLevel::DappSuggested));
    Ok(())
}

/// Indexer answering like Etherscan: ascending from `startBlock`, `offset` per page
#[derive(Clone, Default)]
struct PagedIndexer {
    /// (hash byte, block) in mining order
    transactions: Vec<(u8, u64)>,
    requested_from: Arc<Mutex<Vec<Option<u64>>>>,
}

impl IndexerApi for PagedIndexer {
    fn is_supported_network(&self, chain_id: u64) -> bool {
        chain_id == 17000
    }

    async fn fetch_transactions(
        &self,
        request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<EtherscanTransaction>, TrackerError> {
        self.requested_from.lock().push(request.from_block);
        let page = self
            .transactions
            .iter()
            .filter(|(_, block)| *block >= request.from_block.unwrap_or(0))
            .take(request.limit.map_or(usize::MAX, |l| l as usize))
            .map(|(hash_byte, block)| {
                indexer_body(
                    &format!("0x{}", format!("{:02x}", hash_byte).repeat(32)),
                    *block,
                    *block,
                    "0x5555555555555555555555555555555555555555",
                    ACCOUNT,
                )
            })
            .collect::<Vec<_>>();
        let body = if page.is_empty() {
            r#"{"status":"0","message":"No transactions found","result":[]}"#.to_string()
        } else {
            format!(
                r#"{{"status":"1","message":"OK","result":[{}]}}"#,
                page.join(",")
            )
        };
        wallet_tx_lib::remote::parse_indexer_response(&body)
    }

    async fn fetch_token_transactions(
        &self,
        _request: &RemoteTransactionSourceRequest,
    ) -> Result<Vec<EtherscanTokenTransaction>, TrackerError> {
        Ok(vec![])
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_paged_sync_reaches_every_transaction() -> Result<(), anyhow::Error> {
    let account: Address = ACCOUNT.parse()?;
    // block 12 continues past the first page
    let indexer = PagedIndexer {
        transactions: vec![(1, 10), (2, 11), (3, 12), (4, 12), (5, 13), (6, 20), (7, 21)],
        ..Default::default()
    };
    let source = EtherscanRemoteTransactionSource::new(indexer.clone());
    let store = MemoryLedgerStore::new();
    let sync = HistorySync::new(40, Some(3));

    let mut added = Vec::new();
    for _ in 0..10 {
        let summary = sync
            .update(&store, &source, account, 17000, &CancellationToken::new())
            .await?;
        added.push(summary.added);
        if summary.added == 0 {
            break;
        }
    }
    assert_eq!(added, vec![2, 2, 2, 1, 0]);

    let mut blocks = store
        .get()
        .transactions
        .iter()
        .filter_map(|t| t.block_number)
        .collect::<Vec<_>>();
    blocks.sort();
    assert_eq!(blocks, vec![10, 11, 12, 12, 13, 20, 21]);
    assert_eq!(
        *indexer.requested_from.lock(),
        vec![None, Some(12), Some(13), Some(21), Some(22)]
    );
    Ok(())
}
