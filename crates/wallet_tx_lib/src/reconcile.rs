use std::collections::HashMap;
use wallet_tx_common::model::TransactionRecord;
use web3::types::H256;

/// A plain transaction and a token transfer reported for the same hash describe the same
/// chain transaction. Keep the first one and move transfer details onto it.
fn collapse_remote_by_hash(remote: &[TransactionRecord]) -> Vec<TransactionRecord> {
    let mut collapsed: Vec<TransactionRecord> = Vec::with_capacity(remote.len());
    let mut by_hash: HashMap<H256, usize> = HashMap::new();
    for record in remote {
        let Some(hash) = record.hash else {
            collapsed.push(record.clone());
            continue;
        };
        match by_hash.get(&hash) {
            Some(idx) => {
                let existing = &mut collapsed[*idx];
                if record.is_transfer && existing.transfer_information.is_none() {
                    existing.is_transfer = true;
                    existing.transfer_information = record.transfer_information.clone();
                }
            }
            None => {
                by_hash.insert(hash, collapsed.len());
                collapsed.push(record.clone());
            }
        }
    }
    collapsed
}

/// Remote is the source of truth for chain state, everything only known locally stays
fn apply_remote(local: &mut TransactionRecord, remote: &TransactionRecord) {
    local.status = remote.status;
    local.block_number = remote.block_number;
    local.time = remote.time;
    local.error = remote.error.clone();
    local.hash = remote.hash.or(local.hash);
    local.tx_params.gas_used = remote.tx_params.gas_used.or(local.tx_params.gas_used);
    if local.transfer_information.is_none() && remote.transfer_information.is_some() {
        local.is_transfer = remote.is_transfer;
        local.transfer_information = remote.transfer_information.clone();
    }
    local.verified_on_blockchain = local.verified_on_blockchain || remote.verified_on_blockchain;
}

/// Merges the local ledger with transactions reported by the indexer.
///
/// Records are matched by hash, then by id. Local records without a hash take part in
/// neither and are kept as they are. Remote records without a hash are dropped.
/// Output is sorted by time, then nonce (missing nonce first), then id. Merging the same
/// remote list again gives the same result.
pub fn merge_transactions(
    local: &[TransactionRecord],
    remote: &[TransactionRecord],
) -> Vec<TransactionRecord> {
    let mut merged = local.to_vec();
    let mut by_hash: HashMap<H256, usize> = HashMap::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (idx, record) in merged.iter().enumerate() {
        if let Some(hash) = record.hash {
            by_hash.entry(hash).or_insert(idx);
            by_id.entry(record.id.clone()).or_insert(idx);
        }
    }

    for remote_record in collapse_remote_by_hash(remote) {
        let Some(hash) = remote_record.hash else {
            // could not be told apart from its copy in the next merge
            log::warn!("Skipping remote transaction {} without hash", remote_record.id);
            continue;
        };
        match by_hash
            .get(&hash)
            .or_else(|| by_id.get(&remote_record.id))
            .copied()
        {
            Some(idx) => apply_remote(&mut merged[idx], &remote_record),
            None => {
                let idx = merged.len();
                by_hash.insert(hash, idx);
                by_id.insert(remote_record.id.clone(), idx);
                merged.push(remote_record);
            }
        }
    }

    merged.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.tx_params.nonce.cmp(&b.tx_params.nonce))
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}

/// Drops the oldest finished transactions until at most `limit` remain.
/// Pending transactions are never dropped, so the result may still exceed the limit.
pub fn trim_transaction_history(
    records: Vec<TransactionRecord>,
    limit: usize,
) -> Vec<TransactionRecord> {
    let mut to_drop = records.len().saturating_sub(limit);
    if to_drop == 0 {
        return records;
    }
    log::debug!("Trimming up to {} transaction(s) from history", to_drop);
    records
        .into_iter()
        .filter(|record| {
            if to_drop > 0 && record.status.is_terminal() {
                to_drop -= 1;
                false
            } else {
                true
            }
        })
        .collect()
}

/// How a merge changed the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub added: usize,
    pub updated: usize,
}

/// Merges `remote` into `local`, trims the result to `limit` and counts records that are
/// new or differ from their local version. Trimmed records are still counted.
pub fn reconcile_history(
    local: &[TransactionRecord],
    remote: &[TransactionRecord],
    limit: usize,
) -> (Vec<TransactionRecord>, MergeCounts) {
    let merged = merge_transactions(local, remote);
    let previous = local
        .iter()
        .map(|tx| (tx.id.as_str(), tx))
        .collect::<HashMap<_, _>>();
    let mut counts = MergeCounts::default();
    for tx in &merged {
        match previous.get(tx.id.as_str()) {
            None => counts.added += 1,
            Some(old) if *old != tx => counts.updated += 1,
            Some(_) => {}
        }
    }
    (trim_transaction_history(merged, limit), counts)
}
