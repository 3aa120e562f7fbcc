pub mod cancel;
pub mod config;
pub mod fee_history;
pub mod gas_fees;
pub mod oracle;
pub mod reconcile;
pub mod remote;
pub mod rpc;
pub mod setup;
pub mod store;
pub mod sync;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_utils;

pub use wallet_tx_common::error;
pub use wallet_tx_common::model;
pub use wallet_tx_common::utils;
pub use wallet_tx_common::{err_create, err_custom_create, err_from, err_from_msg};
