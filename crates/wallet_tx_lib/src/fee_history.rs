use crate::cancel::with_cancel;
use crate::err_create;
use crate::error::{FeeHistoryValidationError, TrackerError};
use crate::rpc::NodeRpc;
use futures::{StreamExt, TryStreamExt};
use itertools::Itertools;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use wallet_rpc_pool::FeeHistoryResponse;
use wallet_tx_common::model::BlockFeeRecord;

/// Nodes refuse eth_feeHistory requests spanning more blocks than this
pub const MAX_FEE_HISTORY_BLOCK_COUNT: u64 = 1024;

#[derive(Debug, Clone, Default)]
pub struct FeeHistoryRequest {
    /// Latest block to include, latest block on chain when not set
    pub end_block: Option<u64>,
    pub number_of_blocks: u64,
    pub percentiles: Vec<u32>,
    /// Append the projected fee data of the block following `end_block`
    pub include_next_block: bool,
}

/// Inclusive block range requested in a single eth_feeHistory call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeHistoryChunk {
    pub start_block: u64,
    pub end_block: u64,
}

impl FeeHistoryChunk {
    pub fn size(&self) -> u64 {
        self.end_block - self.start_block + 1
    }
}

/// Returns percentiles sorted ascending without duplicates, node rejects anything else
pub fn validate_percentiles(percentiles: &[u32]) -> Result<Vec<u8>, FeeHistoryValidationError> {
    if let Some(invalid) = percentiles.iter().find(|p| **p > 100) {
        return Err(FeeHistoryValidationError::InvalidPercentile(*invalid));
    }
    Ok(percentiles
        .iter()
        .map(|p| *p as u8)
        .sorted()
        .dedup()
        .collect())
}

/// Splits `[end_block - number_of_blocks + 1, end_block]` into chunks, cut from the end
/// backwards so only the oldest chunk may be shorter. Chunks are returned oldest first.
pub fn split_into_chunks(end_block: u64, number_of_blocks: u64) -> Vec<FeeHistoryChunk> {
    let mut chunks = Vec::new();
    if number_of_blocks == 0 || number_of_blocks - 1 > end_block {
        return chunks;
    }
    let first_block = end_block - (number_of_blocks - 1);
    let mut chunk_end = end_block;
    loop {
        // no `+ 1` on block numbers, end_block may be u64::MAX
        let last_offset = std::cmp::min(MAX_FEE_HISTORY_BLOCK_COUNT - 1, chunk_end - first_block);
        let chunk_start = chunk_end - last_offset;
        chunks.push(FeeHistoryChunk {
            start_block: chunk_start,
            end_block: chunk_end,
        });
        if chunk_start == first_block {
            break;
        }
        chunk_end = chunk_start - 1;
    }
    chunks.reverse();
    chunks
}

fn is_empty_response(response: &FeeHistoryResponse) -> bool {
    let no_base_fees = response
        .base_fee_per_gas
        .as_ref()
        .map(|v| v.iter().all(Option::is_none))
        .unwrap_or(true);
    let no_ratios = response
        .gas_used_ratio
        .as_ref()
        .map(|v| v.iter().all(Option::is_none))
        .unwrap_or(true);
    let no_rewards = response
        .reward
        .as_ref()
        .map(|v| v.iter().all(Vec::is_empty))
        .unwrap_or(true);
    response.oldest_block.is_none() || (no_base_fees && no_ratios && no_rewards)
}

/// Converts a single chunk answer into per block records.
///
/// `baseFeePerGas` carries one more entry than there are blocks, the trailing one being
/// the projected base fee of the next block. It is only turned into a record when
/// `include_next_block` is set.
pub fn records_from_response(
    chunk: &FeeHistoryChunk,
    response: &FeeHistoryResponse,
    percentiles: &[u8],
    include_next_block: bool,
) -> Vec<BlockFeeRecord> {
    if is_empty_response(response) {
        return Vec::new();
    }
    let Some(oldest_block) = response.oldest_block.map(|b| b.as_u64()) else {
        return Vec::new();
    };
    let base_fees = response.base_fee_per_gas.as_deref().unwrap_or_default();
    let ratios = response.gas_used_ratio.as_deref().unwrap_or_default();
    let rewards = response.reward.as_deref().unwrap_or_default();

    let existing_blocks = if !ratios.is_empty() {
        ratios.len()
    } else if !rewards.is_empty() {
        rewards.len()
    } else {
        base_fees.len().saturating_sub(1)
    };
    let existing_blocks = std::cmp::min(existing_blocks as u64, chunk.size()) as usize;

    let mut records = Vec::with_capacity(existing_blocks + 1);
    for idx in 0..existing_blocks {
        let priority_fees = match rewards.get(idx) {
            Some(block_rewards) if !percentiles.is_empty() && !block_rewards.is_empty() => {
                percentiles
                    .iter()
                    .copied()
                    .zip(block_rewards.iter().copied())
                    .collect::<BTreeMap<_, _>>()
            }
            _ => BTreeMap::new(),
        };
        records.push(BlockFeeRecord {
            number: oldest_block + idx as u64,
            base_fee_per_gas: base_fees.get(idx).copied().flatten(),
            gas_used_ratio: ratios.get(idx).copied().flatten(),
            priority_fees_by_percentile: Some(priority_fees),
        });
    }
    if include_next_block {
        let next_block = oldest_block.checked_add(existing_blocks as u64);
        if let (Some(number), Some(next_base_fee)) =
            (next_block, base_fees.get(existing_blocks).copied().flatten())
        {
            records.push(BlockFeeRecord {
                number,
                base_fee_per_gas: Some(next_base_fee),
                gas_used_ratio: None,
                priority_fees_by_percentile: None,
            });
        }
    }
    records
}

/// Retrieves per block fee data for an arbitrary long range of blocks
#[derive(Debug, Clone)]
pub struct FeeHistoryFetcher<N: NodeRpc> {
    node: N,
    max_concurrent_chunks: usize,
}

impl<N: NodeRpc + Sync> FeeHistoryFetcher<N> {
    pub fn new(node: N, max_concurrent_chunks: usize) -> Self {
        Self {
            node,
            max_concurrent_chunks: std::cmp::max(1, max_concurrent_chunks),
        }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub async fn fetch(
        &self,
        request: FeeHistoryRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlockFeeRecord>, TrackerError> {
        let percentiles = validate_percentiles(&request.percentiles).map_err(|e| err_create!(e))?;
        if request.number_of_blocks == 0 {
            return Ok(Vec::new());
        }

        let end_block = match request.end_block {
            Some(end_block) => end_block,
            None => with_cancel(cancel, "fee history", self.node.block_number()).await?,
        };
        let number_of_blocks = std::cmp::min(request.number_of_blocks, end_block);
        let chunks = split_into_chunks(end_block, number_of_blocks);
        let Some(first_chunk) = chunks.first() else {
            return Ok(Vec::new());
        };
        log::debug!(
            "Fetching fee history for blocks {}..={} in {} chunk(s)",
            first_chunk.start_block,
            end_block,
            chunks.len()
        );

        let node = &self.node;
        let percentiles_ref = &percentiles;
        let responses = with_cancel(
            cancel,
            "fee history",
            futures::stream::iter(chunks.into_iter().map(move |chunk| {
                let percentiles = percentiles_ref.clone();
                async move {
                    node.fee_history(chunk.size(), chunk.end_block, percentiles)
                        .await
                        .map(|response| (chunk, response))
                }
            }))
            .buffered(self.max_concurrent_chunks)
            .try_collect::<Vec<_>>(),
        )
        .await?;

        let last_chunk_idx = responses.len() - 1;
        let mut records = Vec::new();
        for (idx, (chunk, response)) in responses.into_iter().enumerate() {
            let Some(response) = response else {
                log::debug!(
                    "Empty fee history for blocks {}..={}",
                    chunk.start_block,
                    chunk.end_block
                );
                continue;
            };
            records.extend(records_from_response(
                &chunk,
                &response,
                &percentiles,
                request.include_next_block && idx == last_chunk_idx,
            ));
        }
        Ok(records)
    }
}
