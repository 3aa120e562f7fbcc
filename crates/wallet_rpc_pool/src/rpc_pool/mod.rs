mod eth_fee_history;
mod eth_generic_call;
mod eth_methods;
mod pool;

pub use eth_fee_history::FeeHistoryResponse;
pub use pool::{
    ReqStats, Web3EndpointParams, Web3RpcEndpoint, Web3RpcInfo, Web3RpcPool, Web3RpcSingleParams,
    Web3RpcStats,
};
