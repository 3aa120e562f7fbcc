mod rpc_pool;

pub use rpc_pool::FeeHistoryResponse;
pub use rpc_pool::ReqStats;
pub use rpc_pool::Web3EndpointParams;
pub use rpc_pool::Web3RpcEndpoint;
pub use rpc_pool::Web3RpcInfo;
pub use rpc_pool::Web3RpcPool;
pub use rpc_pool::Web3RpcSingleParams;
pub use rpc_pool::Web3RpcStats;
