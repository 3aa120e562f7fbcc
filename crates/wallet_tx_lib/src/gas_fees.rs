use crate::err_custom_create;
use crate::error::TrackerError;
use crate::oracle::GasFeeOracle;
use crate::rpc::NodeRpc;
use crate::store::{LedgerPatch, LedgerStore};
use wallet_tx_common::model::{
    DefaultGasEstimates, GasFeeEstimate, TransactionEnvelopeType, TransactionParams,
    TransactionRecord, UserFeeLevel,
};
use wallet_tx_common::utils::{gwei_decimal_to_wei, ConversionError};
use web3::types::U256;

/// Fee values suggested for a transaction, all in wei
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestedGasFees {
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub gas_price: Option<U256>,
}

impl SuggestedGasFees {
    fn from_estimate(
        estimate: &GasFeeEstimate,
        eip1559: bool,
    ) -> Result<Option<Self>, ConversionError> {
        Ok(match estimate {
            GasFeeEstimate::FeeMarket(estimates) if eip1559 => Some(SuggestedGasFees {
                max_fee_per_gas: Some(gwei_decimal_to_wei(
                    estimates.medium.suggested_max_fee_per_gas,
                )?),
                max_priority_fee_per_gas: Some(gwei_decimal_to_wei(
                    estimates.medium.suggested_max_priority_fee_per_gas,
                )?),
                gas_price: None,
            }),
            GasFeeEstimate::FeeMarket(_) => None,
            GasFeeEstimate::Legacy(estimates) => Some(SuggestedGasFees {
                gas_price: Some(gwei_decimal_to_wei(estimates.medium)?),
                ..Default::default()
            }),
            GasFeeEstimate::EthGasPrice(estimate) => Some(SuggestedGasFees {
                gas_price: Some(gwei_decimal_to_wei(estimate.gas_price)?),
                ..Default::default()
            }),
        })
    }

    fn has_fee_market_values(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }
}

fn fees_fully_specified(user: &TransactionParams, eip1559: bool) -> bool {
    if eip1559 {
        user.max_fee_per_gas.is_some() && user.max_priority_fee_per_gas.is_some()
    } else {
        user.gas_price.is_some()
    }
}

/// Asks the oracle for the fields the user left empty.
///
/// Oracle failures only mean "no suggestion". When nothing usable came back the node
/// gas price is queried and its failure is returned to the caller.
pub async fn get_suggested_gas_fees<O: GasFeeOracle, N: NodeRpc>(
    user: &TransactionParams,
    eip1559: bool,
    oracle: &O,
    node: &N,
) -> Result<SuggestedGasFees, TrackerError> {
    if fees_fully_specified(user, eip1559) {
        return Ok(SuggestedGasFees::default());
    }

    match oracle.fetch_gas_fee_estimates().await {
        Ok(estimate) => match SuggestedGasFees::from_estimate(&estimate, eip1559) {
            Ok(Some(suggested)) => return Ok(suggested),
            Ok(None) => log::debug!(
                "Gas fee estimate of type {} not usable (eip1559: {})",
                estimate.estimate_type(),
                eip1559
            ),
            Err(err) => log::warn!("Invalid gas fee estimate {:?}: {}", estimate, err),
        },
        Err(err) => log::warn!("Failed to get gas fee estimates: {}", err),
    }

    let gas_price = node.gas_price().await?;
    log::debug!("Using node gas price {}", gas_price);
    Ok(SuggestedGasFees {
        gas_price: (!gas_price.is_zero()).then_some(gas_price),
        ..Default::default()
    })
}

fn resolve_max_fee_per_gas(
    eip1559: bool,
    user: &TransactionParams,
    suggested: &SuggestedGasFees,
) -> Option<U256> {
    if !eip1559 {
        return None;
    }
    if user.max_fee_per_gas.is_some() {
        return user.max_fee_per_gas;
    }
    if user.gas_price.is_some() && user.max_priority_fee_per_gas.is_none() {
        return user.gas_price;
    }
    suggested.max_fee_per_gas.or(suggested.gas_price)
}

fn resolve_max_priority_fee_per_gas(
    eip1559: bool,
    user: &TransactionParams,
    suggested: &SuggestedGasFees,
    max_fee_per_gas: Option<U256>,
) -> Option<U256> {
    if !eip1559 {
        return None;
    }
    if user.max_priority_fee_per_gas.is_some() {
        return user.max_priority_fee_per_gas;
    }
    if user.gas_price.is_some() && user.max_fee_per_gas.is_none() {
        return user.gas_price;
    }
    suggested.max_priority_fee_per_gas.or(max_fee_per_gas)
}

fn resolve_gas_price(
    eip1559: bool,
    user: &TransactionParams,
    suggested: &SuggestedGasFees,
) -> Option<U256> {
    if eip1559 {
        return None;
    }
    user.gas_price.or(suggested.gas_price)
}

fn resolve_user_fee_level(
    eip1559: bool,
    user: &TransactionParams,
    suggested: &SuggestedGasFees,
    wallet_originated: bool,
) -> Option<UserFeeLevel> {
    if !eip1559 {
        return None;
    }
    let dapp_or_custom = |custom| {
        if wallet_originated {
            custom
        } else {
            UserFeeLevel::DappSuggested
        }
    };
    if user.gas_price.is_some() && !user.has_fee_market_fields() {
        return Some(dapp_or_custom(UserFeeLevel::Custom));
    }
    if !user.has_fee_market_fields() && suggested.has_fee_market_values() {
        return Some(UserFeeLevel::Medium);
    }
    Some(dapp_or_custom(UserFeeLevel::Medium))
}

/// Resolves the final gas fields of a not yet signed transaction.
///
/// Afterwards either `gas_price` or the fee-market pair is set, never both.
pub async fn update_gas_fees<O: GasFeeOracle, N: NodeRpc>(
    mut tx: TransactionRecord,
    eip1559: bool,
    oracle: &O,
    node: &N,
) -> Result<TransactionRecord, TrackerError> {
    let user = tx.tx_params.clone();
    let suggested = get_suggested_gas_fees(&user, eip1559, oracle, node).await?;

    let max_fee_per_gas = resolve_max_fee_per_gas(eip1559, &user, &suggested);
    let max_priority_fee_per_gas =
        resolve_max_priority_fee_per_gas(eip1559, &user, &suggested, max_fee_per_gas);
    let gas_price = resolve_gas_price(eip1559, &user, &suggested);

    let params = &mut tx.tx_params;
    params.max_fee_per_gas = max_fee_per_gas;
    params.max_priority_fee_per_gas = max_priority_fee_per_gas;
    params.gas_price = gas_price;
    if params.has_fee_market_fields() {
        params.gas_price = None;
    }
    if params.gas_price.is_some() {
        params.max_fee_per_gas = None;
        params.max_priority_fee_per_gas = None;
    }

    if params.has_fee_market_fields() {
        tx.tx_type = Some(TransactionEnvelopeType::FeeMarket);
    } else if params.gas_price.is_some() {
        tx.tx_type = Some(TransactionEnvelopeType::Legacy);
    }

    if let Some(level) =
        resolve_user_fee_level(eip1559, &user, &suggested, tx.is_wallet_originated())
    {
        tx.user_fee_level = Some(level);
    }

    tx.default_gas_estimates = Some(DefaultGasEstimates {
        gas_price: tx.tx_params.gas_price,
        max_fee_per_gas: tx.tx_params.max_fee_per_gas,
        max_priority_fee_per_gas: tx.tx_params.max_priority_fee_per_gas,
        estimate_type: tx.user_fee_level,
    });
    log::debug!(
        "Resolved gas fees for {}: gas price {:?}, max fee {:?}, priority fee {:?}, level {:?}",
        tx.id,
        tx.tx_params.gas_price,
        tx.tx_params.max_fee_per_gas,
        tx.tx_params.max_priority_fee_per_gas,
        tx.user_fee_level
    );
    Ok(tx)
}

/// Resolves gas fees of a ledger record and writes the result back.
/// Callers must not run this concurrently for the same id.
pub async fn update_transaction_gas_fees<S: LedgerStore, O: GasFeeOracle, N: NodeRpc>(
    store: &S,
    id: &str,
    eip1559: bool,
    oracle: &O,
    node: &N,
) -> Result<TransactionRecord, TrackerError> {
    let tx = store
        .get()
        .transactions
        .into_iter()
        .find(|tx| tx.id == id)
        .ok_or_else(|| err_custom_create!("Transaction {} not found", id))?;
    let resolved = update_gas_fees(tx, eip1559, oracle, node).await?;
    store.apply(LedgerPatch::UpsertTransaction(resolved.clone()))?;
    Ok(resolved)
}
