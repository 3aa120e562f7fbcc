use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thunderdome::{Arena, Index};
use web3::transports::Http;
use web3::Web3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3EndpointParams {
    pub backup_level: i64,
    pub max_number_of_consecutive_errors: u64,
    pub max_response_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3RpcSingleParams {
    pub chain_id: u64,
    pub name: String,
    pub endpoint: String,
    pub web3_endpoint_params: Web3EndpointParams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReqStats {
    pub request_succeeded_count: u64,
    pub request_error_count: u64,
    pub last_success_request: Option<DateTime<Utc>>,
    pub last_error_request: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3RpcStats {
    pub request_stats: BTreeMap<String, ReqStats>,
    pub request_count_total_succeeded: u64,
    pub request_count_total_error: u64,
    pub last_success_request: Option<DateTime<Utc>>,
    pub last_error_request: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3RpcInfo {
    pub web3_rpc_stats: Web3RpcStats,
    pub endpoint_consecutive_errors: u64,
    pub penalty_from_errors: i64,
    pub bonus_from_last_chosen: i64,
    pub last_chosen: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3RpcEndpoint {
    #[serde(skip)]
    pub web3: Option<Web3<Http>>,
    pub web3_rpc_params: Web3RpcSingleParams,
    pub web3_rpc_info: Web3RpcInfo,
}

impl Web3RpcEndpoint {
    pub fn get_score(&self) -> f64 {
        let negative_score = self.web3_rpc_info.penalty_from_errors as f64
            + self.web3_rpc_params.web3_endpoint_params.backup_level as f64 * 100.0;

        let negative_score_exp = (-negative_score / 200.0).exp();
        //negative_score_exp should be in 0 to 1 range
        negative_score_exp * 75.0 + self.web3_rpc_info.bonus_from_last_chosen as f64
    }

    pub fn is_over_error_limit(&self) -> bool {
        self.web3_rpc_info.endpoint_consecutive_errors
            > self
                .web3_rpc_params
                .web3_endpoint_params
                .max_number_of_consecutive_errors
    }
}

pub type Web3PoolType = Mutex<Arena<Arc<RwLock<Web3RpcEndpoint>>>>;

/// Set of interchangeable JSON-RPC endpoints serving a single chain.
///
/// Calls go to the endpoint with the best score; transport failures and timeouts
/// lower the score of the endpoint and the call is retried on the next best one.
#[derive(Debug)]
pub struct Web3RpcPool {
    pub chain_id: u64,
    pub endpoints: Web3PoolType,
    pub last_success_endpoints: Mutex<VecDeque<Index>>,
}

impl Web3RpcPool {
    pub fn new(
        chain_id: u64,
        endpoints: Vec<Web3RpcSingleParams>,
    ) -> Result<Arc<Self>, web3::Error> {
        let mut arena = Arena::new();
        for params in endpoints {
            if params.chain_id != chain_id {
                log::error!(
                    "Chain id mismatch {} vs {} for endpoint {}",
                    params.chain_id,
                    chain_id,
                    params.name
                );
                continue;
            }
            let http = Http::new(&params.endpoint)?;
            log::debug!("Added endpoint {} ({})", params.name, params.endpoint);
            arena.insert(Arc::new(RwLock::new(Web3RpcEndpoint {
                web3: Some(Web3::new(http)),
                web3_rpc_params: params,
                web3_rpc_info: Default::default(),
            })));
        }
        Ok(Arc::new(Self {
            chain_id,
            endpoints: Mutex::new(arena),
            last_success_endpoints: Mutex::new(VecDeque::new()),
        }))
    }

    pub fn new_from_urls(
        chain_id: u64,
        endpoints: Vec<String>,
        max_response_time_ms: u64,
    ) -> Result<Arc<Self>, web3::Error> {
        let params = endpoints
            .iter()
            .map(|endpoint| Web3RpcSingleParams {
                chain_id,
                name: endpoint.clone(),
                endpoint: endpoint.clone(),
                web3_endpoint_params: Web3EndpointParams {
                    backup_level: 0,
                    max_number_of_consecutive_errors: 5,
                    max_response_time_ms,
                },
            })
            .collect();
        Self::new(chain_id, params)
    }

    pub fn get_chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn extra_score_from_last_chosen(&self) -> (Option<Index>, i64) {
        let mut last_success_endpoints = self.last_success_endpoints.lock();
        while last_success_endpoints.len() > 4 {
            last_success_endpoints.pop_back();
        }

        let Some(first) = last_success_endpoints.front().copied() else {
            return (None, 0);
        };
        let mut extra_score = 10;
        for (pos, bonus) in [(1, 7), (2, 5), (3, 3)] {
            if last_success_endpoints.get(pos) == Some(&first) {
                extra_score += bonus;
            } else {
                break;
            }
        }
        (Some(first), extra_score)
    }

    /// Endpoint indices ordered from best to worst. Endpoints over their consecutive
    /// error limit are moved to the end but never dropped, so a pool with only failing
    /// endpoints still gets tried.
    pub fn choose_best_endpoints(&self) -> Vec<Index> {
        let (extra_idx, extra_score) = self.extra_score_from_last_chosen();
        let endpoints = self.endpoints.lock();
        let mut scored = endpoints
            .iter()
            .map(|(idx, el)| {
                let mut el = el.write();
                el.web3_rpc_info.bonus_from_last_chosen = if Some(idx) == extra_idx {
                    extra_score
                } else {
                    0
                };
                (idx, el.is_over_error_limit(), el.get_score())
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
        });
        scored.into_iter().map(|(idx, _, _)| idx).collect()
    }

    pub fn get_web3(&self, idx: Index) -> Option<Web3<Http>> {
        let endpoints = self.endpoints.lock();
        endpoints.get(idx).and_then(|el| el.read().web3.clone())
    }

    pub fn get_name(&self, idx: Index) -> String {
        let endpoints = self.endpoints.lock();
        endpoints
            .get(idx)
            .map(|el| el.read().web3_rpc_params.name.clone())
            .unwrap_or_else(|| "NoData".to_string())
    }

    pub fn get_max_timeout(&self, idx: Index) -> Duration {
        let endpoints = self.endpoints.lock();
        Duration::from_millis(
            endpoints
                .get(idx)
                .map(|el| {
                    el.read()
                        .web3_rpc_params
                        .web3_endpoint_params
                        .max_response_time_ms
                })
                .unwrap_or(10000),
        )
    }

    pub fn mark_rpc_chosen(&self, idx: Index) {
        let endpoints = self.endpoints.lock();
        if let Some(el) = endpoints.get(idx) {
            el.write().web3_rpc_info.last_chosen = Some(Utc::now());
        }
    }

    pub fn mark_rpc_success(&self, idx: Index, method: &str) {
        let endpoints = self.endpoints.lock();
        let Some(el) = endpoints.get(idx) else {
            log::error!("mark_rpc_success - no endpoint found for given index");
            return;
        };
        self.last_success_endpoints.lock().push_front(idx);

        let mut el = el.write();
        let name = el.web3_rpc_params.name.clone();
        let info = &mut el.web3_rpc_info;
        let stats = info
            .web3_rpc_stats
            .request_stats
            .entry(method.to_string())
            .or_default();
        stats.request_succeeded_count += 1;
        stats.last_success_request = Some(Utc::now());

        metrics::counter!("web3_rpc_success", 1, "chain_id" => self.chain_id.to_string(), "endpoint" => name);
        metrics::counter!("web3_rpc_success", 1, "chain_id" => self.chain_id.to_string(), "method" => method.to_string());

        info.endpoint_consecutive_errors = 0;
        info.penalty_from_errors = (info.penalty_from_errors - 5).max(0);
        info.web3_rpc_stats.last_success_request = Some(Utc::now());
        info.web3_rpc_stats.request_count_total_succeeded += 1;
    }

    pub fn mark_rpc_error(&self, idx: Index, method: &str, error: String) {
        let endpoints = self.endpoints.lock();
        let Some(el) = endpoints.get(idx) else {
            log::error!("mark_rpc_error - no endpoint found for given index");
            return;
        };
        let mut el = el.write();
        let name = el.web3_rpc_params.name.clone();
        let info = &mut el.web3_rpc_info;
        let stats = info
            .web3_rpc_stats
            .request_stats
            .entry(method.to_string())
            .or_default();
        stats.request_error_count += 1;
        stats.last_error_request = Some(Utc::now());

        metrics::counter!("web3_rpc_error", 1, "chain_id" => self.chain_id.to_string(), "endpoint" => name);
        metrics::counter!("web3_rpc_error", 1, "chain_id" => self.chain_id.to_string(), "method" => method.to_string());

        info.web3_rpc_stats.last_error_request = Some(Utc::now());
        info.web3_rpc_stats.request_count_total_error += 1;
        info.endpoint_consecutive_errors += 1;
        info.penalty_from_errors += 10;
        info.last_error = Some(error);
    }

    pub fn get_endpoints_info(&self) -> Vec<(Index, Web3RpcSingleParams, Web3RpcInfo)> {
        self.endpoints
            .lock()
            .iter()
            .map(|(idx, el)| {
                let el = el.read();
                (idx, el.web3_rpc_params.clone(), el.web3_rpc_info.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> Result<Arc<Web3RpcPool>, anyhow::Error> {
        Ok(Web3RpcPool::new_from_urls(
            987789,
            vec![
                "http://127.0.0.1:18545".to_string(),
                "http://127.0.0.1:18546".to_string(),
            ],
            1000,
        )?)
    }

    #[test]
    fn test_errors_move_endpoint_to_the_back() -> Result<(), anyhow::Error> {
        let pool = test_pool()?;
        let order = pool.choose_best_endpoints();
        assert_eq!(order.len(), 2);
        let first = order[0];
        let second = order[1];

        for _ in 0..6 {
            pool.mark_rpc_error(first, "block_number", "connection refused".to_string());
        }
        let order = pool.choose_best_endpoints();
        assert_eq!(order, vec![second, first]);

        let info = pool.get_endpoints_info();
        let (_, _, first_info) = info
            .iter()
            .find(|(idx, _, _)| *idx == first)
            .ok_or(anyhow::anyhow!("missing endpoint"))?;
        assert_eq!(first_info.endpoint_consecutive_errors, 6);
        assert_eq!(first_info.web3_rpc_stats.request_count_total_error, 6);
        Ok(())
    }

    #[test]
    fn test_success_resets_consecutive_errors() -> Result<(), anyhow::Error> {
        let pool = test_pool()?;
        let idx = pool.choose_best_endpoints()[0];
        pool.mark_rpc_error(idx, "gas_price", "timeout".to_string());
        pool.mark_rpc_success(idx, "gas_price");

        let (extra_idx, extra_score) = pool.extra_score_from_last_chosen();
        assert_eq!(extra_idx, Some(idx));
        assert_eq!(extra_score, 10);

        let info = pool.get_endpoints_info();
        let (_, _, info) = info
            .iter()
            .find(|(i, _, _)| *i == idx)
            .ok_or(anyhow::anyhow!("missing endpoint"))?;
        assert_eq!(info.endpoint_consecutive_errors, 0);
        assert_eq!(info.penalty_from_errors, 5);
        assert_eq!(
            info.web3_rpc_stats
                .request_stats
                .get("gas_price")
                .map(|s| (s.request_succeeded_count, s.request_error_count)),
            Some((1, 1))
        );
        Ok(())
    }
}
