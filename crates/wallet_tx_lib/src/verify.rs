use crate::error::TrackerError;
use crate::rpc::NodeRpc;
use wallet_tx_common::model::{TransactionError, TransactionRecord, TransactionStatus};
use wallet_tx_common::utils::datetime_from_u256_timestamp;
use web3::types::U64;

fn needs_verification(tx: &TransactionRecord) -> bool {
    tx.status == TransactionStatus::Confirmed && tx.hash.is_some() && !tx.verified_on_blockchain
}

/// Checks indexer-confirmed transactions against the node.
///
/// A transaction is verified once its receipt points to a block that the node returns
/// with the same hash. Transactions without receipt are left as they are.
pub async fn verify_confirmed_transactions<N: NodeRpc>(
    node: &N,
    mut records: Vec<TransactionRecord>,
) -> Result<Vec<TransactionRecord>, TrackerError> {
    let mut verified = 0;
    for tx in records.iter_mut().filter(|tx| needs_verification(tx)) {
        let Some(hash) = tx.hash else {
            continue;
        };
        let Some(receipt) = node.transaction_receipt(hash).await? else {
            log::debug!("No receipt yet for {:#x}", hash);
            continue;
        };
        if receipt.status == Some(U64::from(0)) {
            log::warn!("Transaction {:#x} reverted on chain", hash);
            tx.status = TransactionStatus::Failed;
            tx.error = Some(TransactionError::new("Transaction failed"));
            tx.block_number = receipt.block_number.map(|b| b.as_u64());
            tx.tx_params.gas_used = receipt.gas_used.or(tx.tx_params.gas_used);
            continue;
        }
        let (Some(block_number), Some(block_hash)) = (receipt.block_number, receipt.block_hash)
        else {
            continue;
        };
        let Some(block) = node.block(block_number.as_u64()).await? else {
            log::debug!("Block {} not found for {:#x}", block_number, hash);
            continue;
        };
        if block.hash != Some(block_hash) {
            log::warn!(
                "Block hash mismatch for {:#x} at block {}, chain reorganized?",
                hash,
                block_number
            );
            continue;
        }
        tx.verified_on_blockchain = true;
        tx.block_number = Some(block_number.as_u64());
        tx.block_timestamp = datetime_from_u256_timestamp(block.timestamp);
        tx.base_fee_per_gas = block.base_fee_per_gas;
        tx.tx_params.gas_used = receipt.gas_used.or(tx.tx_params.gas_used);
        verified += 1;
    }
    if verified > 0 {
        log::info!("Verified {} transaction(s) on chain", verified);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeNode;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use wallet_tx_common::model::TransactionParams;
    use web3::types::{Block, TransactionReceipt, H256, U256};

    fn confirmed(hash: u8) -> TransactionRecord {
        TransactionRecord {
            hash: Some(H256::repeat_byte(hash)),
            status: TransactionStatus::Confirmed,
            ..TransactionRecord::new_unapproved(1, None, TransactionParams::default())
        }
    }

    fn receipt(hash: u8, status: u64, block_hash: u8) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: H256::repeat_byte(hash),
            block_hash: Some(H256::repeat_byte(block_hash)),
            block_number: Some(U64::from(500)),
            gas_used: Some(U256::from(21000)),
            status: Some(U64::from(status)),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify() -> Result<(), anyhow::Error> {
        let mut node = FakeNode::new(1000);
        node.receipts = Arc::new(BTreeMap::from([
            (H256::repeat_byte(1), receipt(1, 1, 0xb1)),
            (H256::repeat_byte(2), receipt(2, 0, 0xb1)),
            (H256::repeat_byte(3), receipt(3, 1, 0xff)),
        ]));
        node.blocks = Arc::new(BTreeMap::from([(
            500,
            Block {
                hash: Some(H256::repeat_byte(0xb1)),
                number: Some(U64::from(500)),
                timestamp: U256::from(1_700_000_000u64),
                base_fee_per_gas: Some(U256::from(30_000_000_000u64)),
                ..Default::default()
            },
        )]));

        let mut pending = confirmed(5);
        pending.status = TransactionStatus::Submitted;
        let records = vec![confirmed(1), confirmed(2), confirmed(3), confirmed(4), pending];
        let res = verify_confirmed_transactions(&node, records.clone()).await?;

        assert!(res[0].verified_on_blockchain);
        assert_eq!(res[0].block_number, Some(500));
        assert_eq!(res[0].base_fee_per_gas, Some(U256::from(30_000_000_000u64)));
        assert!(res[0].block_timestamp.is_some());
        assert_eq!(res[0].tx_params.gas_used, Some(U256::from(21000)));

        assert_eq!(res[1].status, TransactionStatus::Failed);
        assert!(!res[1].verified_on_blockchain);

        // reorganized block and missing receipt stay untouched
        assert_eq!(res[2], records[2]);
        assert_eq!(res[3], records[3]);
        assert_eq!(res[4], records[4]);
        Ok(())
    }
}
