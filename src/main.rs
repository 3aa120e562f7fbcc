mod actions;
mod options;

use crate::actions::fee_history::fee_history_local;
use crate::actions::gas_fees::gas_fees_local;
use crate::actions::sync_history::sync_history_local;
use crate::options::{TrackerCommands, TrackerOptions};
use std::env;
use structopt::StructOpt;
use wallet_tx_lib::config::Config;
use wallet_tx_lib::error::TrackerError;
use wallet_tx_lib::setup::TrackerSetup;

async fn main_internal() -> Result<(), TrackerError> {
    dotenv::dotenv().ok();
    env::set_var(
        "RUST_LOG",
        env::var("RUST_LOG").unwrap_or("info,web3=warn,reqwest=warn".to_string()),
    );

    env_logger::init();
    let cli: TrackerOptions = TrackerOptions::from_args();

    let config = Config::load(cli.config.display().to_string()).await?;
    let setup = TrackerSetup::new(&config, env::var("INDEXER_API_KEY").ok())?;
    log::debug!("Configured chains: {:?}", setup.chain_setup.keys());

    match cli.commands {
        TrackerCommands::FeeHistory {
            fee_history_options,
        } => fee_history_local(fee_history_options, &setup).await?,
        TrackerCommands::GasFees { gas_fees_options } => {
            gas_fees_local(gas_fees_options, &setup).await?
        }
        TrackerCommands::SyncHistory {
            sync_history_options,
        } => sync_history_local(sync_history_options, &setup).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    match main_internal().await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            Err(e)
        }
    }
}
