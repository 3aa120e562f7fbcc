mod block_fee;
mod gas_fee_estimate;
mod transaction_record;

pub use block_fee::BlockFeeRecord;
pub use gas_fee_estimate::{
    Eip1559GasFee, EthGasPriceEstimate, FeeMarketGasFeeEstimates, GasFeeEstimate,
    LegacyGasPriceEstimates,
};
pub use transaction_record::{
    DefaultGasEstimates, TransactionEnvelopeType, TransactionError, TransactionParams,
    TransactionRecord, TransactionStatus, TransferInformation, UserFeeLevel, WALLET_ORIGIN,
};
