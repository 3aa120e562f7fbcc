use std::path::PathBuf;

use structopt::StructOpt;
use web3::types::Address;

#[derive(Debug, StructOpt)]
#[structopt(about = "Fee history options")]
pub struct FeeHistoryOptions {
    #[structopt(short = "c", long = "chain-name", default_value = "holesky")]
    pub chain_name: String,

    #[structopt(short = "n", long = "blocks", help = "Number of blocks to fetch")]
    pub blocks: u64,

    #[structopt(long = "end-block", help = "Newest block, latest if not given")]
    pub end_block: Option<u64>,

    #[structopt(
        long = "percentiles",
        help = "Reward percentiles (comma separated, 0-100)",
        use_delimiter = true,
        default_value = "10,20,30"
    )]
    pub percentiles: Vec<u32>,

    #[structopt(
        long = "include-next-block",
        help = "Append base fee of the not yet mined block"
    )]
    pub include_next_block: bool,
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Gas fee resolution options")]
pub struct GasFeesOptions {
    #[structopt(short = "c", long = "chain-name", default_value = "holesky")]
    pub chain_name: String,

    #[structopt(long = "from")]
    pub from: Address,

    #[structopt(long = "to")]
    pub to: Option<Address>,

    #[structopt(long = "value", help = "Value in native currency (decimal, i.e. 0.01)")]
    pub value: Option<rust_decimal::Decimal>,

    #[structopt(long = "gas-price", help = "Gas price in gwei")]
    pub gas_price: Option<rust_decimal::Decimal>,

    #[structopt(long = "max-fee-per-gas", help = "Max fee per gas in gwei")]
    pub max_fee_per_gas: Option<rust_decimal::Decimal>,

    #[structopt(long = "max-priority-fee-per-gas", help = "Max priority fee per gas in gwei")]
    pub max_priority_fee_per_gas: Option<rust_decimal::Decimal>,

    #[structopt(
        long = "origin",
        help = "Origin of the transaction (dapp url), wallet if not given"
    )]
    pub origin: Option<String>,
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Incoming history sync options")]
pub struct SyncHistoryOptions {
    #[structopt(short = "c", long = "chain-name", default_value = "holesky")]
    pub chain_name: String,

    #[structopt(short = "a", long = "account")]
    pub account: Address,

    #[structopt(
        long = "ledger",
        help = "Ledger file (created if missing)",
        default_value = "./ledger.json"
    )]
    pub ledger: PathBuf,

    #[structopt(
        long = "keep-running",
        help = "Poll for new transactions until stopped with Ctrl-C"
    )]
    pub keep_running: bool,
}

#[derive(Debug, StructOpt)]
pub enum TrackerCommands {
    #[structopt(about = "Print fee history of a block range")]
    FeeHistory {
        #[structopt(flatten)]
        fee_history_options: FeeHistoryOptions,
    },
    #[structopt(about = "Resolve gas fees of a new transaction")]
    GasFees {
        #[structopt(flatten)]
        gas_fees_options: GasFeesOptions,
    },
    #[structopt(about = "Sync incoming transactions of an account into the ledger")]
    SyncHistory {
        #[structopt(flatten)]
        sync_history_options: SyncHistoryOptions,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Wallet transaction tracker")]
pub struct TrackerOptions {
    #[structopt(
        long = "config",
        help = "Config file",
        default_value = "config-tracker.toml"
    )]
    pub config: PathBuf,

    #[structopt(subcommand)]
    pub commands: TrackerCommands,
}
