use super::etherscan::{EtherscanTokenTransaction, EtherscanTransaction, EtherscanTransactionBase};
use crate::error::TrackerError;
use crate::{err_custom_create, err_from};
use uuid::Uuid;
use wallet_tx_common::model::{
    TransactionError, TransactionParams, TransactionRecord, TransactionStatus, TransferInformation,
};
use wallet_tx_common::utils::{datetime_from_u256_timestamp, u256_from_dec_str, u64_from_dec_str};
use web3::types::{Address, H256, U256};

fn decode_hex_field(name: &str, value: &str, expected_len: usize) -> Result<Vec<u8>, TrackerError> {
    let bytes = hex::decode(value.trim_start_matches("0x")).map_err(err_from!())?;
    if bytes.len() != expected_len {
        return Err(err_custom_create!(
            "Invalid {} {:?}, expected {} bytes",
            name,
            value,
            expected_len
        ));
    }
    Ok(bytes)
}

fn parse_h256(name: &str, value: &str) -> Result<H256, TrackerError> {
    Ok(H256::from_slice(&decode_hex_field(name, value, 32)?))
}

fn parse_address(name: &str, value: &str) -> Result<Address, TrackerError> {
    Ok(Address::from_slice(&decode_hex_field(name, value, 20)?))
}

fn parse_optional_address(name: &str, value: &str) -> Result<Option<Address>, TrackerError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_address(name, value).map(Some)
    }
}

/// Same chain transaction always maps to the same id, so repeated fetches deduplicate
pub fn remote_transaction_id(hash: H256, timestamp: u64) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{:#x}-{}", hash, timestamp).as_bytes(),
    )
    .to_string()
}

fn normalize_base(
    base: &EtherscanTransactionBase,
    chain_id: u64,
) -> Result<TransactionRecord, TrackerError> {
    let hash = parse_h256("hash", &base.hash)?;
    let timestamp = u64_from_dec_str(&base.time_stamp).map_err(err_from!())?;
    let time = datetime_from_u256_timestamp(U256::from(timestamp))
        .ok_or_else(|| err_custom_create!("Invalid timestamp {}", base.time_stamp))?;
    let (status, error) = if base.is_error == "0" {
        (TransactionStatus::Confirmed, None)
    } else {
        (
            TransactionStatus::Failed,
            Some(TransactionError::new("Transaction failed")),
        )
    };

    Ok(TransactionRecord {
        id: remote_transaction_id(hash, timestamp),
        chain_id,
        hash: Some(hash),
        status,
        origin: None,
        time,
        tx_params: TransactionParams {
            from: parse_address("from", &base.from)?,
            to: parse_optional_address("to", &base.to)?,
            value: Some(u256_from_dec_str(&base.value).map_err(err_from!())?),
            data: None,
            nonce: Some(u64_from_dec_str(&base.nonce).map_err(err_from!())?),
            gas: Some(u256_from_dec_str(&base.gas).map_err(err_from!())?),
            gas_used: Some(u256_from_dec_str(&base.gas_used).map_err(err_from!())?),
            gas_price: Some(u256_from_dec_str(&base.gas_price).map_err(err_from!())?),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        },
        tx_type: None,
        user_fee_level: None,
        default_gas_estimates: None,
        is_transfer: false,
        transfer_information: None,
        block_number: Some(u64_from_dec_str(&base.block_number).map_err(err_from!())?),
        block_timestamp: None,
        base_fee_per_gas: None,
        verified_on_blockchain: false,
        error,
    })
}

pub fn normalize_transaction(
    raw: &EtherscanTransaction,
    chain_id: u64,
) -> Result<TransactionRecord, TrackerError> {
    let mut record = normalize_base(&raw.base, chain_id)?;
    if !raw.base.input.is_empty() {
        record.tx_params.data = Some(raw.base.input.clone());
    }
    Ok(record)
}

pub fn normalize_token_transaction(
    raw: &EtherscanTokenTransaction,
    chain_id: u64,
) -> Result<TransactionRecord, TrackerError> {
    let mut record = normalize_base(&raw.base, chain_id)?;
    let decimals = u64_from_dec_str(&raw.token_decimal).map_err(err_from!())?;
    record.is_transfer = true;
    record.transfer_information = Some(TransferInformation {
        contract_address: parse_address("contractAddress", &raw.contract_address)?,
        decimals: u32::try_from(decimals)
            .map_err(|_| err_custom_create!("Invalid token decimals {}", raw.token_decimal))?,
        symbol: raw.token_symbol.clone(),
    });
    Ok(record)
}
