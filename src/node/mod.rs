pub mod lookup;
pub mod maintenance;
pub mod replication;
pub mod ring_state;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::clock::LamportClock;
use crate::config::GNUTELLA_TTL_DEFAULT;
use crate::election::ElectionManager;
use crate::flood::{self, FloodSearch};
use crate::kv::{KvStore, Version};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::rpc::client::PeerClient;
use crate::rpc::dto::FloodResult;
use crate::types::{Address, HashPos, NodeRef};

pub use maintenance::RingParticipation;
use ring_state::RingState;

/// Composes every component a node owns: ring state, the KV replica, the
/// Lamport clock, the per-key election cache, the flood search component,
/// and the metrics aggregator — each behind its own lock, per the
/// concurrency model. This is the explicit handler-context value threaded
/// through the transport's routing layer; there is no process-wide
/// mutable singleton.
pub struct ChordNode {
    pub self_node: NodeRef,
    pub ring: RingState,
    pub kv: KvStore,
    pub clock: LamportClock,
    pub election: ElectionManager,
    pub flood: FloodSearch,
    pub metrics: Metrics,
    pub peer_client: Box<dyn PeerClient>,
    participation: Mutex<RingParticipation>,
}

impl ChordNode {
    pub fn new(addr: impl Into<Address>, peer_client: Box<dyn PeerClient>) -> Self {
        let addr = addr.into();
        let self_node = NodeRef::new(addr.clone());
        ChordNode {
            ring: RingState::new(self_node.clone()),
            kv: KvStore::new(),
            clock: LamportClock::new(0),
            election: ElectionManager::new(),
            flood: FloodSearch::new(),
            metrics: Metrics::new(addr),
            peer_client,
            participation: Mutex::new(RingParticipation::Standalone),
            self_node,
        }
    }

    pub fn addr(&self) -> &Address {
        &self.self_node.addr
    }

    pub fn participation(&self) -> RingParticipation {
        *self.participation.lock().unwrap()
    }

    fn set_participation(&self, state: RingParticipation) {
        *self.participation.lock().unwrap() = state;
    }

    /// Attempts to join via `bootstrap`; an unreachable bootstrap is never
    /// fatal and falls back to a standalone ring.
    pub async fn join(&self, bootstrap: &Address) -> bool {
        let joined = lookup::join(&self.ring, self.peer_client.as_ref(), bootstrap).await;
        self.flood.set_neighbors(self.ring.neighbors());
        self.set_participation(if joined {
            RingParticipation::Joining
        } else {
            RingParticipation::Standalone
        });
        joined
    }

    // ---- Ring RPC surface ----

    pub async fn find_successor(&self, key_id: HashPos) -> NodeRef {
        lookup::find_successor(&self.ring, self.peer_client.as_ref(), &self.metrics, key_id).await
    }

    pub fn closest_preceding_or_self(&self, key_id: HashPos) -> NodeRef {
        lookup::closest_preceding_finger_local(&self.ring, key_id).unwrap_or_else(|| self.self_node.clone())
    }

    pub fn get_predecessor(&self) -> Option<NodeRef> {
        self.ring.predecessor()
    }

    pub fn get_successor(&self) -> NodeRef {
        self.ring.successor()
    }

    pub fn get_successor_list(&self) -> Vec<NodeRef> {
        self.ring.successor_list()
    }

    /// `notify` handler: adopt `peer` as predecessor when appropriate.
    pub fn notify_received(&self, peer: &NodeRef) {
        self.ring.maybe_adopt_predecessor(peer);
    }

    // ---- Maintenance ----

    pub async fn stabilize_once(&self) {
        let state = maintenance::stabilize_once(&self.ring, self.peer_client.as_ref(), &self.flood).await;
        self.set_participation(state);
    }

    pub async fn fix_fingers_tick(&self) {
        maintenance::fix_fingers_tick(&self.ring, self.peer_client.as_ref(), &self.metrics).await;
    }

    pub async fn heartbeat_tick(&self) {
        let state = maintenance::heartbeat_tick(&self.ring, self.peer_client.as_ref()).await;
        self.set_participation(state);
    }

    pub async fn anti_entropy_tick(&self) {
        maintenance::anti_entropy_tick(&self.ring, &self.kv, self.peer_client.as_ref()).await;
    }

    // ---- KV / replication ----

    pub async fn handle_put(
        &self,
        key: &str,
        value: &str,
        client_ts: Option<u64>,
        writer_id: &str,
    ) -> u64 {
        replication::handle_put(
            &self.ring,
            &self.kv,
            &self.clock,
            &self.election,
            &self.metrics,
            self.peer_client.as_ref(),
            &self.self_node.addr,
            key,
            value,
            client_ts,
            writer_id,
        )
        .await
    }

    pub async fn handle_get(&self, key: &str) -> Option<Version> {
        replication::handle_get(
            &self.ring,
            &self.kv,
            &self.election,
            &self.metrics,
            self.peer_client.as_ref(),
            &self.self_node.addr,
            key,
        )
        .await
    }

    /// `replica_put` handler: updates the Lamport clock past the incoming
    /// timestamp, then LWW-merges locally.
    pub fn replica_put_received(&self, key: &str, version: Version) {
        self.clock.update(version.ts);
        self.kv.put(key, version);
    }

    pub fn replica_get_local(&self, key: &str) -> Option<Version> {
        self.kv.get(key)
    }

    /// `replica_sync` handler: merges every incoming entry by LWW.
    pub fn replica_sync_received(&self, incoming: HashMap<String, Version>) {
        for (key, version) in incoming {
            self.clock.update(version.ts);
            self.kv.put(&key, version);
        }
    }

    // ---- Flood ----

    pub async fn start_query(&self, key: &str, ttl: Option<u32>) -> FloodResult {
        let ttl = ttl.unwrap_or(GNUTELLA_TTL_DEFAULT);
        flood::start_query(
            &self.flood,
            self.peer_client.as_ref(),
            &self.kv,
            &self.metrics,
            &self.self_node.addr,
            key,
            ttl,
        )
        .await
    }

    pub async fn query_received(&self, msg_id: Option<String>, key: &str, ttl: Option<u32>, origin: Option<Address>) -> FloodResult {
        let ttl = ttl.unwrap_or(GNUTELLA_TTL_DEFAULT);
        let origin = origin.unwrap_or_else(|| self.self_node.addr.clone());
        let msg_id = msg_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        flood::query_received(
            &self.flood,
            self.peer_client.as_ref(),
            &self.kv,
            &self.self_node.addr,
            &msg_id,
            key,
            ttl,
            &origin,
        )
        .await
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::dto::FloodResult as Fr;
    use async_trait::async_trait;
    use std::collections::HashMap as Map;

    /// A node's own replica reads/writes go through `peer_client` just like
    /// any other replica's, so the fake needs real storage behind it rather
    /// than unconditionally returning `None`.
    #[derive(Default)]
    struct StoringPeer {
        stored: Mutex<HashMap<(Address, String), Version>>,
    }

    #[async_trait]
    impl PeerClient for StoringPeer {
        async fn ping(&self, _addr: &Address) -> bool {
            false
        }
        async fn get_predecessor(&self, _addr: &Address) -> Option<Option<NodeRef>> {
            None
        }
        async fn notify(&self, _addr: &Address, _node: &NodeRef) -> Option<()> {
            None
        }
        async fn get_successor(&self, _addr: &Address) -> Option<NodeRef> {
            None
        }
        async fn get_successor_list(&self, _addr: &Address) -> Option<Vec<NodeRef>> {
            None
        }
        async fn find_successor(&self, _addr: &Address, _id: HashPos) -> Option<NodeRef> {
            None
        }
        async fn closest_preceding_or_self(&self, _addr: &Address, _id: HashPos) -> Option<NodeRef> {
            None
        }
        async fn replica_put(&self, addr: &Address, key: &str, version: &Version) -> Option<()> {
            self.stored.lock().unwrap().insert((addr.clone(), key.to_string()), version.clone());
            Some(())
        }
        async fn replica_get(&self, addr: &Address, key: &str) -> Option<Option<Version>> {
            Some(self.stored.lock().unwrap().get(&(addr.clone(), key.to_string())).cloned())
        }
        async fn replica_sync(&self, _addr: &Address, _kv: &Map<String, Version>) -> Option<()> {
            None
        }
        async fn g_query(&self, _addr: &Address, _msg_id: &str, _key: &str, _ttl: u32, _origin: &Address) -> Option<Fr> {
            None
        }
    }

    #[tokio::test]
    async fn fresh_node_is_singleton_and_standalone() {
        let node = ChordNode::new("a:1000", Box::new(StoringPeer::default()));
        assert_eq!(node.participation(), RingParticipation::Standalone);
        assert_eq!(node.get_successor(), node.self_node);
        assert!(node.get_predecessor().is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips_on_a_singleton() {
        let node = ChordNode::new("a:1000", Box::new(StoringPeer::default()));
        let ts = node.handle_put("k", "v", None, "writer").await;
        assert_eq!(ts, 1);
        let got = node.handle_get("k").await;
        assert_eq!(got.unwrap().value, "v");
    }

    #[tokio::test]
    async fn notify_adopts_predecessor() {
        let node = ChordNode::new("a:1000", Box::new(StoringPeer::default()));
        let peer = NodeRef::new("b:2000");
        node.notify_received(&peer);
        assert_eq!(node.get_predecessor(), Some(peer));
    }

    #[tokio::test]
    async fn start_query_matches_local_key() {
        let node = ChordNode::new("a:1000", Box::new(StoringPeer::default()));
        node.handle_put("k", "v", None, "writer").await;
        let result = node.start_query("k", Some(2)).await;
        assert_eq!(result.matches.len(), 1);
    }
}
