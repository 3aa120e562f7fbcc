use crate::options::SyncHistoryOptions;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use wallet_tx_common::{err_custom_create, err_from, LedgerEventContent};
use wallet_tx_lib::error::TrackerError;
use wallet_tx_lib::setup::{ChainSetup, TrackerSetup};
use wallet_tx_lib::store::{LedgerPatch, LedgerSnapshot, LedgerStore, MemoryLedgerStore};
use wallet_tx_lib::verify::verify_confirmed_transactions;

async fn load_ledger(path: &Path) -> Result<LedgerSnapshot, TrackerError> {
    if !tokio::fs::try_exists(path).await.map_err(err_from!())? {
        log::info!("Ledger file {} not found, starting empty", path.display());
        return Ok(LedgerSnapshot::default());
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(err_from!())?;
    serde_json::from_str(&content).map_err(err_from!())
}

async fn save_ledger(path: &Path, snapshot: &LedgerSnapshot) -> Result<(), TrackerError> {
    let content = serde_json::to_string_pretty(snapshot).map_err(err_from!())?;
    tokio::fs::write(path, content).await.map_err(err_from!())?;
    log::debug!(
        "Ledger with {} transaction(s) saved to {}",
        snapshot.transactions.len(),
        path.display()
    );
    Ok(())
}

async fn verify_ledger(
    store: &MemoryLedgerStore,
    chain_setup: &ChainSetup,
) -> Result<(), TrackerError> {
    let snapshot = store.get();
    let verified =
        verify_confirmed_transactions(&chain_setup.provider, snapshot.transactions.clone())
            .await?;
    if verified != snapshot.transactions {
        store.apply(LedgerPatch::ReplaceTransactions {
            transactions: verified,
            sync: None,
        })?;
    }
    Ok(())
}

pub async fn sync_history_local(
    sync_history_options: SyncHistoryOptions,
    setup: &TrackerSetup,
) -> Result<(), TrackerError> {
    let chain_setup = setup.get_chain_setup_by_network(&sync_history_options.chain_name)?;
    let source = setup.remote_transaction_source();
    let history_sync = setup.history_sync(chain_setup.chain_id)?;
    if chain_setup.indexer_api_url.is_none() {
        return Err(err_custom_create!(
            "Chain {} has no indexer-api-url configured",
            sync_history_options.chain_name
        ));
    }

    let store = MemoryLedgerStore::from_snapshot(load_ledger(&sync_history_options.ledger).await?);
    let mut events = store.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.content {
                LedgerEventContent::TransactionsReplaced {
                    total,
                    sync: Some(sync),
                } => log::info!(
                    "Ledger updated from chain {}: {} added, {} updated, {} total",
                    sync.chain_id,
                    sync.added,
                    sync.updated,
                    total
                ),
                content => log::debug!("Ledger event: {:?}", content),
            }
        }
    });

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, stopping history sync");
            cancel_on_signal.cancel();
        }
    });

    loop {
        match history_sync
            .update(
                &store,
                &source,
                sync_history_options.account,
                chain_setup.chain_id,
                &cancel,
            )
            .await
        {
            Ok(_) => {
                if setup.verify_confirmed {
                    verify_ledger(&store, chain_setup).await?;
                }
                save_ledger(&sync_history_options.ledger, &store.get()).await?;
            }
            Err(err) if err.is_cancelled() => break,
            Err(err) if sync_history_options.keep_running => {
                log::error!("History sync failed, retrying in next interval: {}", err);
            }
            Err(err) => return Err(err),
        }
        if !sync_history_options.keep_running {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(setup.history_poll_interval) => {}
        }
    }
    Ok(())
}
