use std::collections::{HashMap, HashSet};
use std::time::Instant;

use log::warn;

use crate::clock::LamportClock;
use crate::config::K_REPLICATION;
use crate::crypto::hash_str;
use crate::election::ElectionManager;
use crate::error::NodeError;
use crate::kv::{KvStore, Version};
use crate::metrics::Metrics;
use crate::node::lookup::find_successor;
use crate::node::ring_state::RingState;
use crate::rpc::client::PeerClient;
use crate::types::{Address, HashPos, NodeRef};

/// Walks clockwise from the hash owner via remote `get_successor` calls,
/// collecting up to `K_REPLICATION` distinct addresses. Stops early on a
/// repeated successor or an unreachable hop — this can under-replicate on
/// small rings; see the design notes.
pub async fn get_replicas_for_key(
    ring: &RingState,
    peer_client: &dyn PeerClient,
    metrics: &Metrics,
    key: &str,
) -> Vec<NodeRef> {
    let key_id = hash_str(key);
    let owner = find_successor(ring, peer_client, metrics, key_id).await;
    let mut replicas = vec![owner.clone()];
    let mut current = owner;

    while replicas.len() < K_REPLICATION {
        let next = match peer_client.get_successor(&current.addr).await {
            Some(n) => n,
            None => break,
        };
        if next.addr == replicas.last().unwrap().addr {
            break;
        }
        if !replicas.iter().any(|r| r.addr == next.addr) {
            replicas.push(next.clone());
        }
        current = next;
    }

    if replicas.len() < K_REPLICATION {
        warn!(
            "{}",
            NodeError::RingInconsistency {
                key_id,
                reason: format!("replica walk for {key:?} yielded only {} of {K_REPLICATION} replicas", replicas.len()),
            }
        );
    }

    replicas
}

async fn is_alive(peer_client: &dyn PeerClient, node: &NodeRef, self_addr: &Address) -> bool {
    if node.addr == *self_addr {
        return true;
    }
    peer_client.ping(&node.addr).await
}

/// Bully election over a key's replica set: the cached leader is reused if
/// still a member and alive; otherwise every replica is probed in
/// descending id order and the first live one wins.
pub async fn ensure_replica_leader(
    election: &ElectionManager,
    peer_client: &dyn PeerClient,
    self_addr: &Address,
    key: &str,
    replicas: &[NodeRef],
) -> Option<HashPos> {
    if replicas.is_empty() {
        election.set_leader(key, None);
        return None;
    }

    let valid_ids: HashSet<HashPos> = replicas.iter().map(|r| r.id).collect();
    if let Some(current) = election.get_leader(key) {
        if valid_ids.contains(&current) {
            if let Some(leader) = replicas.iter().find(|r| r.id == current) {
                if is_alive(peer_client, leader, self_addr).await {
                    return Some(current);
                }
            }
        }
    }

    election.start_election_local(key);

    let mut by_id_desc: Vec<&NodeRef> = replicas.iter().collect();
    by_id_desc.sort_by(|a, b| b.id.cmp(&a.id));

    for candidate in by_id_desc {
        if is_alive(peer_client, candidate, self_addr).await {
            election.set_leader(key, Some(candidate.id));
            return Some(candidate.id);
        }
    }

    election.set_leader(key, None);
    None
}

/// Write path: ticks/updates the clock, stores locally, then fans the
/// version out to the whole replica set best-effort. There is no quorum
/// ack — the write reports success once the local store and the fan-out
/// attempt complete, even if every replica RPC failed.
#[allow(clippy::too_many_arguments)]
pub async fn handle_put(
    ring: &RingState,
    kv: &KvStore,
    clock: &LamportClock,
    election: &ElectionManager,
    metrics: &Metrics,
    peer_client: &dyn PeerClient,
    self_addr: &Address,
    key: &str,
    value: &str,
    client_ts: Option<u64>,
    writer_id: &str,
) -> u64 {
    let start = Instant::now();
    let ts = match client_ts {
        Some(t) => clock.update(t),
        None => clock.tick(),
    };
    let version = Version::new(value, ts, writer_id);
    kv.put(key, version.clone());

    let replicas = get_replicas_for_key(ring, peer_client, metrics, key).await;
    ensure_replica_leader(election, peer_client, self_addr, key, &replicas).await;

    for r in &replicas {
        let _ = peer_client.replica_put(&r.addr, key, &version).await;
    }

    metrics.record_put(start.elapsed());
    ts
}

/// Read path: queries the replica set (leader first), takes the LWW-max
/// of whatever responds, fires off read-repair to any replica that was
/// missing or stale, and returns the winner.
pub async fn handle_get(
    ring: &RingState,
    kv: &KvStore,
    election: &ElectionManager,
    metrics: &Metrics,
    peer_client: &dyn PeerClient,
    self_addr: &Address,
    key: &str,
) -> Option<Version> {
    let start = Instant::now();
    let replicas = get_replicas_for_key(ring, peer_client, metrics, key).await;
    let leader_id = ensure_replica_leader(election, peer_client, self_addr, key, &replicas).await;

    let leader_addr = leader_id.and_then(|lid| replicas.iter().find(|r| r.id == lid)).map(|r| r.addr.clone());

    let mut query_order: Vec<&NodeRef> = Vec::with_capacity(replicas.len());
    if let Some(addr) = &leader_addr {
        if let Some(leader) = replicas.iter().find(|r| &r.addr == addr) {
            query_order.push(leader);
        }
    }
    for r in &replicas {
        if leader_addr.as_deref() != Some(r.addr.as_str()) {
            query_order.push(r);
        }
    }

    let mut per_replica: HashMap<Address, Option<Version>> = HashMap::new();
    let mut best: Option<Version> = None;

    for r in &query_order {
        let found = peer_client.replica_get(&r.addr, key).await.flatten();
        if let Some(v) = &found {
            if best.as_ref().map_or(true, |b| v > b) {
                best = Some(v.clone());
            }
        }
        per_replica.insert(r.addr.clone(), found);
    }

    let winner = best?;

    for r in &replicas {
        let stale = match per_replica.get(&r.addr) {
            Some(Some(v)) => winner > *v,
            _ => true,
        };
        if stale {
            let _ = peer_client.replica_put(&r.addr, key, &winner).await;
        }
    }

    metrics.record_get(start.elapsed(), true);
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePeer {
        successors: Mutex<HashMap<Address, NodeRef>>,
        alive: Mutex<HashSet<Address>>,
        stored: Mutex<HashMap<(Address, String), Version>>,
    }

    #[async_trait]
    impl PeerClient for FakePeer {
        async fn ping(&self, addr: &Address) -> bool {
            self.alive.lock().unwrap().contains(addr)
        }
        async fn get_predecessor(&self, _addr: &Address) -> Option<Option<NodeRef>> {
            None
        }
        async fn notify(&self, _addr: &Address, _node: &NodeRef) -> Option<()> {
            None
        }
        async fn get_successor(&self, addr: &Address) -> Option<NodeRef> {
            self.successors.lock().unwrap().get(addr).cloned()
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
        async fn replica_sync(&self, _addr: &Address, _kv: &HashMap<String, Version>) -> Option<()> {
            None
        }
        async fn g_query(
            &self,
            _addr: &Address,
            _msg_id: &str,
            _key: &str,
            _ttl: u32,
            _origin: &Address,
        ) -> Option<crate::rpc::dto::FloodResult> {
            None
        }
    }

    #[tokio::test]
    async fn replica_set_stops_on_loop() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let metrics = Metrics::new("a:1");
        let peer = FakePeer::default();
        let owner = ring.self_node();
        peer.successors.lock().unwrap().insert(owner.addr.clone(), owner.clone());

        let replicas = get_replicas_for_key(&ring, &peer, &metrics, "k").await;
        assert_eq!(replicas, vec![owner]);
    }

    #[tokio::test]
    async fn election_prefers_highest_live_id() {
        let election = ElectionManager::new();
        let peer = FakePeer::default();
        let low = NodeRef::new("low");
        let high = NodeRef::new("high-node-with-a-longer-address-to-bias-hash");
        let replicas = vec![low.clone(), high.clone()];
        peer.alive.lock().unwrap().insert(low.addr.clone());
        peer.alive.lock().unwrap().insert(high.addr.clone());

        let self_addr = "self:0".to_string();
        let leader = ensure_replica_leader(&election, &peer, &self_addr, "k", &replicas).await;
        let expected = replicas.iter().map(|r| r.id).max();
        assert_eq!(leader, expected);
    }

    #[tokio::test]
    async fn election_returns_none_when_no_replica_alive() {
        let election = ElectionManager::new();
        let peer = FakePeer::default();
        let replicas = vec![NodeRef::new("x"), NodeRef::new("y")];
        let self_addr = "self:0".to_string();
        let leader = ensure_replica_leader(&election, &peer, &self_addr, "k", &replicas).await;
        assert_eq!(leader, None);
        assert_eq!(election.get_leader("k"), None);
    }

    #[tokio::test]
    async fn handle_put_then_handle_get_round_trips_through_replicas() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let kv = KvStore::new();
        let clock = LamportClock::new(0);
        let election = ElectionManager::new();
        let metrics = Metrics::new("a:1");
        let peer = FakePeer::default();
        let self_addr = ring.self_node().addr.clone();
        peer.alive.lock().unwrap().insert(self_addr.clone());

        let ts = handle_put(
            &ring, &kv, &clock, &election, &metrics, &peer, &self_addr, "k", "v1", None, "w",
        )
        .await;
        assert_eq!(ts, 1);

        let got = handle_get(&ring, &kv, &election, &metrics, &peer, &self_addr, "k").await;
        assert_eq!(got.unwrap().value, "v1");
    }

    #[tokio::test]
    async fn read_repair_pushes_winner_to_stale_replica() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let kv = KvStore::new();
        let election = ElectionManager::new();
        let metrics = Metrics::new("a:1");
        let peer = FakePeer::default();
        let self_addr = ring.self_node().addr.clone();
        let other = NodeRef::new("b:2");

        // owner(self) -> other -> other (loop stop), so the replica set is [self, other]
        peer.successors.lock().unwrap().insert(self_addr.clone(), other.clone());
        peer.successors.lock().unwrap().insert(other.addr.clone(), other.clone());
        peer.alive.lock().unwrap().insert(self_addr.clone());
        peer.alive.lock().unwrap().insert(other.addr.clone());

        peer.stored
            .lock()
            .unwrap()
            .insert((self_addr.clone(), "k".to_string()), Version::new("new", 5, "w"));
        peer.stored
            .lock()
            .unwrap()
            .insert((other.addr.clone(), "k".to_string()), Version::new("old", 1, "w"));

        let got = handle_get(&ring, &kv, &election, &metrics, &peer, &self_addr, "k").await;
        assert_eq!(got.as_ref().unwrap().value, "new");

        let repaired = peer.stored.lock().unwrap().get(&(other.addr.clone(), "k".to_string())).cloned();
        assert_eq!(repaired.unwrap().value, "new");
    }
}
