use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use web3::types::U256;

pub fn datetime_from_u256_timestamp(timestamp: U256) -> Option<DateTime<Utc>> {
    if timestamp > U256::from(i64::MAX as u64) {
        return None;
    }
    DateTime::from_timestamp(timestamp.as_u64() as i64, 0)
}

#[derive(Debug, Clone)]
pub struct ConversionError {
    pub msg: String,
}

impl ConversionError {
    pub fn from(msg: String) -> Self {
        Self { msg }
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error during conversion: {}", self.msg)
    }
}

impl Error for ConversionError {}

const GWEI_DECIMALS: u32 = 9;
const ETH_DECIMALS: u32 = 18;

/// Moves the decimal point `decimals` places right. Fails when a fraction of wei would remain.
fn decimal_to_u256(amount: Decimal, decimals: u32) -> Result<U256, ConversionError> {
    let amount = amount.normalize();
    if amount < Decimal::ZERO {
        return Err(ConversionError::from(format!(
            "Negative amount cannot be converted {amount}"
        )));
    }
    if amount.scale() > decimals {
        return Err(ConversionError::from(format!(
            "Amount {amount} has more than {decimals} decimal places"
        )));
    }
    U256::from(amount.mantissa().unsigned_abs())
        .checked_mul(U256::exp10((decimals - amount.scale()) as usize))
        .ok_or_else(|| ConversionError::from(format!("Overflow converting {amount}")))
}

fn u256_to_decimal(amount: U256, decimals: u32) -> Result<Decimal, ConversionError> {
    if amount > U256::from(i128::MAX as u128) {
        return Err(ConversionError::from(format!(
            "Amount {amount} does not fit into decimal"
        )));
    }
    Decimal::try_from_i128_with_scale(amount.as_u128() as i128, decimals)
        .map(|d| d.normalize())
        .map_err(|err| ConversionError::from(format!("Amount {amount} does not fit: {err}")))
}

/// Oracles publish fee values as gwei decimals, anything below 1 wei is rounded away
pub fn gwei_decimal_to_wei(gwei: Decimal) -> Result<U256, ConversionError> {
    decimal_to_u256(gwei.round_dp(GWEI_DECIMALS), GWEI_DECIMALS)
}

pub fn eth_decimal_to_wei(eth: Decimal) -> Result<U256, ConversionError> {
    decimal_to_u256(eth, ETH_DECIMALS)
}

pub fn wei_to_gwei_decimal(wei: U256) -> Result<Decimal, ConversionError> {
    u256_to_decimal(wei, GWEI_DECIMALS)
}

/// Parse base-10 string coming from indexer payloads
pub fn u256_from_dec_str(val: &str) -> Result<U256, ConversionError> {
    U256::from_dec_str(val.trim())
        .map_err(|err| ConversionError::from(format!("Invalid decimal string {val:?}: {err:?}")))
}

pub fn u64_from_dec_str(val: &str) -> Result<u64, ConversionError> {
    val.trim()
        .parse::<u64>()
        .map_err(|err| ConversionError::from(format!("Invalid integer string {val:?}: {err}")))
}

pub trait U256ConvExt {
    fn to_gwei(&self) -> Result<Decimal, ConversionError>;
    fn to_gwei_str(&self) -> String;
    fn to_eth_str(&self) -> String;
}

impl U256ConvExt for U256 {
    fn to_gwei(&self) -> Result<Decimal, ConversionError> {
        wei_to_gwei_decimal(*self)
    }
    fn to_gwei_str(&self) -> String {
        match self.to_gwei() {
            Ok(gwei) => gwei.to_string(),
            Err(_) => format!("{self} wei"),
        }
    }
    fn to_eth_str(&self) -> String {
        match u256_to_decimal(*self, ETH_DECIMALS) {
            Ok(eth) => eth.to_string(),
            Err(_) => format!("{self} wei"),
        }
    }
}

pub trait DecimalConvExt {
    fn to_u256_from_gwei(&self) -> Result<U256, ConversionError>;
    fn to_u256_from_eth(&self) -> Result<U256, ConversionError>;
}

impl DecimalConvExt for Decimal {
    fn to_u256_from_gwei(&self) -> Result<U256, ConversionError> {
        gwei_decimal_to_wei(*self)
    }
    fn to_u256_from_eth(&self) -> Result<U256, ConversionError> {
        eth_decimal_to_wei(*self)
    }
}
