use crate::options::GasFeesOptions;
use wallet_tx_common::utils::DecimalConvExt;
use wallet_tx_common::{err_custom_create, err_from};
use wallet_tx_lib::error::TrackerError;
use wallet_tx_lib::gas_fees::update_gas_fees;
use wallet_tx_lib::model::{TransactionParams, TransactionRecord, WALLET_ORIGIN};
use wallet_tx_lib::setup::TrackerSetup;

pub async fn gas_fees_local(
    gas_fees_options: GasFeesOptions,
    setup: &TrackerSetup,
) -> Result<(), TrackerError> {
    let chain_setup = setup.get_chain_setup_by_network(&gas_fees_options.chain_name)?;

    let to_wei_from_gwei = |val: Option<rust_decimal::Decimal>| {
        val.map(|v| v.to_u256_from_gwei()).transpose()
    };
    let tx_params = TransactionParams {
        from: gas_fees_options.from,
        to: gas_fees_options.to,
        value: gas_fees_options
            .value
            .map(|v| v.to_u256_from_eth())
            .transpose()
            .map_err(err_from!())?,
        gas_price: to_wei_from_gwei(gas_fees_options.gas_price).map_err(err_from!())?,
        max_fee_per_gas: to_wei_from_gwei(gas_fees_options.max_fee_per_gas)
            .map_err(err_from!())?,
        max_priority_fee_per_gas: to_wei_from_gwei(gas_fees_options.max_priority_fee_per_gas)
            .map_err(err_from!())?,
        ..Default::default()
    };
    let tx = TransactionRecord::new_unapproved(
        chain_setup.chain_id,
        Some(
            gas_fees_options
                .origin
                .as_deref()
                .unwrap_or(WALLET_ORIGIN),
        ),
        tx_params,
    );

    let oracle = setup.gas_fee_oracle(chain_setup.chain_id)?;
    let tx = update_gas_fees(tx, chain_setup.eip1559, &oracle, &chain_setup.provider).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&tx).map_err(|err| err_custom_create!(
            "Something went wrong when serializing to json {err}"
        ))?
    );
    Ok(())
}
