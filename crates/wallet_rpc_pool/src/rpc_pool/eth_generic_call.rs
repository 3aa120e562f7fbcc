use crate::Web3RpcPool;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use web3::{api::Eth, helpers::CallFuture};

const MAX_ATTEMPTS: usize = 4;

pub trait EthMethod<T: web3::Transport> {
    const METHOD: &'static str;
    type Args: Clone;
    type Return: DeserializeOwned;

    fn do_call(eth: Eth<T>, args: Self::Args) -> CallFuture<Self::Return, T::Out>;
}

/// Errors that the node returns for a well formed request it could not satisfy.
/// The endpoint itself is healthy when it answers with one of these.
fn is_node_answer(rpc_error: &web3::error::Error) -> bool {
    match rpc_error {
        web3::Error::Rpc(e) => {
            let msg = e.message.to_lowercase();
            msg.contains("execution reverted")
                || msg.contains("not found")
                || msg.contains("header not found")
                || msg.contains("invalid")
                || msg.contains("exceed")
                || msg.contains("range")
        }
        _ => false,
    }
}

impl Web3RpcPool {
    pub async fn eth_generic_call<EthMethodCall: EthMethod<web3::transports::Http>>(
        self: Arc<Self>,
        args: EthMethodCall::Args,
    ) -> Result<EthMethodCall::Return, web3::Error> {
        let mut last_error = web3::Error::Unreachable;
        for loop_no in 0..MAX_ATTEMPTS {
            let endpoints = self.choose_best_endpoints();
            if endpoints.is_empty() {
                return Err(web3::Error::Unreachable);
            }
            let idx = endpoints[loop_no % endpoints.len()];
            let Some(web3) = self.get_web3(idx) else {
                continue;
            };
            self.mark_rpc_chosen(idx);

            let res = tokio::time::timeout(
                self.get_max_timeout(idx),
                EthMethodCall::do_call(web3.eth(), args.clone()),
            );

            match res.await {
                Ok(Ok(value)) => {
                    self.mark_rpc_success(idx, EthMethodCall::METHOD);
                    return Ok(value);
                }
                Ok(Err(e)) => match e {
                    web3::Error::Rpc(_) => {
                        if is_node_answer(&e) {
                            self.mark_rpc_success(idx, EthMethodCall::METHOD);
                        } else {
                            log::warn!("Unknown RPC error: {}", e);
                            self.mark_rpc_error(idx, EthMethodCall::METHOD, e.to_string());
                        }
                        return Err(e);
                    }
                    _ => {
                        log::warn!(
                            "Error doing call {} from endpoint {}: {}",
                            EthMethodCall::METHOD,
                            self.get_name(idx),
                            e
                        );
                        self.mark_rpc_error(idx, EthMethodCall::METHOD, e.to_string());
                        last_error = e;
                    }
                },
                Err(e) => {
                    log::warn!(
                        "Timeout when getting data from endpoint {}: {}",
                        self.get_name(idx),
                        e
                    );
                    self.mark_rpc_error(idx, EthMethodCall::METHOD, "timeout".to_string());
                    last_error = web3::Error::Unreachable;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        Err(last_error)
    }
}
