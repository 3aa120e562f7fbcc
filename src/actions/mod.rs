pub mod fee_history;
pub mod gas_fees;
pub mod sync_history;
