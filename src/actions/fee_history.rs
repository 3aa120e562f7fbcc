use crate::options::FeeHistoryOptions;
use tokio_util::sync::CancellationToken;
use wallet_tx_common::err_custom_create;
use wallet_tx_common::utils::U256ConvExt;
use wallet_tx_lib::error::TrackerError;
use wallet_tx_lib::fee_history::FeeHistoryRequest;
use wallet_tx_lib::setup::TrackerSetup;

pub async fn fee_history_local(
    fee_history_options: FeeHistoryOptions,
    setup: &TrackerSetup,
) -> Result<(), TrackerError> {
    let chain_setup = setup.get_chain_setup_by_network(&fee_history_options.chain_name)?;
    let fetcher = setup.fee_history_fetcher(chain_setup.chain_id)?;

    let records = fetcher
        .fetch(
            FeeHistoryRequest {
                end_block: fee_history_options.end_block,
                number_of_blocks: fee_history_options.blocks,
                percentiles: fee_history_options.percentiles,
                include_next_block: fee_history_options.include_next_block,
            },
            &CancellationToken::new(),
        )
        .await?;

    if let Some(newest) = records.last() {
        log::info!(
            "Fetched {} fee record(s) on {}, newest block {} base fee {} gwei",
            records.len(),
            chain_setup.chain_name,
            newest.number,
            newest
                .base_fee_per_gas
                .map(|fee| fee.to_gwei_str())
                .unwrap_or("-".to_string())
        );
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&records).map_err(|err| err_custom_create!(
            "Something went wrong when serializing to json {err}"
        ))?
    );
    Ok(())
}
