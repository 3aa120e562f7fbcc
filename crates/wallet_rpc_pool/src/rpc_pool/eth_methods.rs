use super::eth_generic_call::EthMethod;
use super::Web3RpcPool;
use std::sync::Arc;
use web3::api::Eth;
use web3::helpers::CallFuture;
use web3::types::{Block, BlockId, TransactionReceipt, H256, U256, U64};

/// Declares a call marker for a plain `web3::api::Eth` method together with
/// a `Web3RpcPool` wrapper going through failover.
macro_rules! eth_method {
    ($marker:ident, $pool_fn:ident, $eth_fn:ident, ($($arg:ident: $arg_ty:ty),*) -> $ret:ty) => {
        pub struct $marker;

        impl<T: web3::Transport> EthMethod<T> for $marker {
            const METHOD: &'static str = stringify!($eth_fn);
            type Args = ($($arg_ty,)*);
            type Return = $ret;

            #[allow(unused_variables)]
            fn do_call(eth: Eth<T>, args: Self::Args) -> CallFuture<Self::Return, T::Out> {
                let ($($arg,)*) = args;
                eth.$eth_fn($($arg),*)
            }
        }

        impl Web3RpcPool {
            pub async fn $pool_fn(self: Arc<Self>, $($arg: $arg_ty),*) -> Result<$ret, web3::Error> {
                self.eth_generic_call::<$marker>(($($arg,)*)).await
            }
        }
    };
}

eth_method!(EthBlockNumber, eth_block_number, block_number, () -> U64);
eth_method!(EthGasPrice, eth_gas_price, gas_price, () -> U256);
eth_method!(EthBlock, eth_block, block, (block: BlockId) -> Option<Block<H256>>);
eth_method!(
    EthTransactionReceipt,
    eth_transaction_receipt,
    transaction_receipt,
    (hash: H256) -> Option<TransactionReceipt>
);
