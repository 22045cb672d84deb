use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::config::{FLOOD_RPC_TIMEOUT, PING_TIMEOUT, RPC_TIMEOUT};
use crate::error::NodeError;
use crate::kv::Version;
use crate::rpc::dto::*;
use crate::types::{Address, HashPos, NodeRef};

/// Every outbound peer call a node ever makes, abstracted behind a trait so
/// the ring/replication/election/flood logic can be driven in tests without
/// real sockets. `None` always means "peer not available now" — a timeout,
/// a refused connection, and a non-success status are indistinguishable to
/// callers, exactly as in the error handling design.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn ping(&self, addr: &Address) -> bool;
    async fn get_predecessor(&self, addr: &Address) -> Option<Option<NodeRef>>;
    async fn notify(&self, addr: &Address, node: &NodeRef) -> Option<()>;
    async fn get_successor(&self, addr: &Address) -> Option<NodeRef>;
    async fn get_successor_list(&self, addr: &Address) -> Option<Vec<NodeRef>>;
    async fn find_successor(&self, addr: &Address, id: HashPos) -> Option<NodeRef>;
    async fn closest_preceding_or_self(&self, addr: &Address, id: HashPos) -> Option<NodeRef>;
    async fn replica_put(&self, addr: &Address, key: &str, version: &Version) -> Option<()>;
    async fn replica_get(&self, addr: &Address, key: &str) -> Option<Option<Version>>;
    async fn replica_sync(&self, addr: &Address, kv: &HashMap<String, Version>) -> Option<()>;
    async fn g_query(
        &self,
        addr: &Address,
        msg_id: &str,
        key: &str,
        ttl: u32,
        origin: &Address,
    ) -> Option<FloodResult>;
}

/// Production `PeerClient`: every call is a single HTTP POST with a JSON
/// body and a bounded timeout, binding the §6 endpoint surface.
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        HttpPeerClient {
            client: reqwest::Client::new(),
        }
    }
}

impl HttpPeerClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn post_json<Req: serde::Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        addr: &Address,
        path: &str,
        body: &Req,
        timeout: Duration,
    ) -> Option<Resp> {
        let url = format!("http://{addr}{path}");
        let result = self.client.post(&url).json(body).timeout(timeout).send().await;
        match result {
            Ok(resp) if resp.status().is_success() => match resp.json::<Resp>().await {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    self.log_failure(NodeError::MalformedRequest(format!("{addr}{path}: {e}")));
                    None
                }
            },
            Ok(resp) => {
                self.log_failure(NodeError::TransportFailure {
                    addr: addr.clone(),
                    reason: format!("{path} returned status {}", resp.status()),
                });
                None
            }
            Err(e) => {
                self.log_failure(NodeError::TransportFailure {
                    addr: addr.clone(),
                    reason: format!("{path}: {e}"),
                });
                None
            }
        }
    }

    /// Every outbound failure collapses to `None` for callers; the typed
    /// error exists only to carry structured context into the log line.
    fn log_failure(&self, err: NodeError) {
        warn!("{err}");
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn ping(&self, addr: &Address) -> bool {
        self.post_json::<_, OkResponse>(addr, "/ping", &serde_json::json!({}), PING_TIMEOUT)
            .await
            .is_some()
    }

    async fn get_predecessor(&self, addr: &Address) -> Option<Option<NodeRef>> {
        self.post_json::<_, GetPredecessorResponse>(addr, "/get_predecessor", &serde_json::json!({}), RPC_TIMEOUT)
            .await
            .map(|r| r.predecessor)
    }

    async fn notify(&self, addr: &Address, node: &NodeRef) -> Option<()> {
        let body = NotifyRequest { node: node.clone() };
        self.post_json::<_, OkResponse>(addr, "/notify", &body, RPC_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn get_successor(&self, addr: &Address) -> Option<NodeRef> {
        self.post_json::<_, GetSuccessorResponse>(addr, "/get_successor", &serde_json::json!({}), RPC_TIMEOUT)
            .await
            .map(|r| r.successor)
    }

    async fn get_successor_list(&self, addr: &Address) -> Option<Vec<NodeRef>> {
        self.post_json::<_, GetSuccessorListResponse>(
            addr,
            "/get_successor_list",
            &serde_json::json!({}),
            RPC_TIMEOUT,
        )
        .await
        .map(|r| r.successor_list)
    }

    async fn find_successor(&self, addr: &Address, id: HashPos) -> Option<NodeRef> {
        let body = FindSuccessorRequest { id };
        self.post_json::<_, FindSuccessorResponse>(addr, "/find_successor", &body, RPC_TIMEOUT)
            .await
            .map(|r| r.node)
    }

    async fn closest_preceding_or_self(&self, addr: &Address, id: HashPos) -> Option<NodeRef> {
        let body = ClosestPrecedingRequest { id };
        self.post_json::<_, ClosestPrecedingResponse>(addr, "/closest_preceding_or_self", &body, RPC_TIMEOUT)
            .await
            .map(|r| r.node)
    }

    async fn replica_put(&self, addr: &Address, key: &str, version: &Version) -> Option<()> {
        let body = ReplicaPutRequest {
            key: key.to_string(),
            value: version.value.clone(),
            ts: version.ts,
            writer_id: version.writer_id.clone(),
        };
        self.post_json::<_, OkResponse>(addr, "/replica_put", &body, RPC_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn replica_get(&self, addr: &Address, key: &str) -> Option<Option<Version>> {
        let body = GetRequest { key: key.to_string() };
        self.post_json::<_, GetResponse>(addr, "/replica_get", &body, RPC_TIMEOUT)
            .await
            .map(|r| {
                if r.found {
                    Some(Version::new(r.value.unwrap_or_default(), r.ts.unwrap_or(0), r.writer_id.unwrap_or_default()))
                } else {
                    None
                }
            })
    }

    async fn replica_sync(&self, addr: &Address, kv: &HashMap<String, Version>) -> Option<()> {
        let body = ReplicaSyncRequest {
            kv: kv
                .iter()
                .map(|(k, v)| (k.clone(), (v.value.clone(), v.ts, v.writer_id.clone())))
                .collect(),
        };
        self.post_json::<_, OkResponse>(addr, "/replica_sync", &body, RPC_TIMEOUT)
            .await
            .map(|_| ())
    }

    async fn g_query(
        &self,
        addr: &Address,
        msg_id: &str,
        key: &str,
        ttl: u32,
        origin: &Address,
    ) -> Option<FloodResult> {
        let body = GQueryRequest {
            msg_id: Some(msg_id.to_string()),
            key: key.to_string(),
            ttl: Some(ttl),
            origin: Some(origin.clone()),
        };
        self.post_json::<_, FloodResult>(addr, "/g_query", &body, FLOOD_RPC_TIMEOUT).await
    }
}
