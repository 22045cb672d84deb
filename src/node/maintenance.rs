use log::{debug, warn};

use crate::config::SUCCESSOR_LIST_SIZE;
use crate::crypto::in_interval;
use crate::flood::FloodSearch;
use crate::kv::KvStore;
use crate::metrics::Metrics;
use crate::node::ring_state::RingState;
use crate::rpc::client::PeerClient;

/// Ring participation, tracked only for logging and `/metrics` visibility.
/// Nothing in the node gates behavior on this value; it is derived after
/// the fact from what stabilize/heartbeat just did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RingParticipation {
    Standalone,
    Joining,
    Stable,
    Degraded,
}

/// One stabilize tick: adopt a better successor if the successor's
/// predecessor is closer, notify the successor, refresh the successor
/// list, and recompute the flood neighbor set from the result.
pub async fn stabilize_once(ring: &RingState, peer_client: &dyn PeerClient, flood: &FloodSearch) -> RingParticipation {
    let self_node = ring.self_node();
    let mut succ = ring.successor();

    // Bootstraps a seed node: if we only know ourselves but have gained a
    // predecessor (via an incoming notify), treat it as our successor too.
    if succ.addr == self_node.addr {
        if let Some(pred) = ring.predecessor() {
            ring.set_successor(pred.clone());
            succ = pred;
        }
    }

    if succ.addr == self_node.addr {
        flood.set_neighbors(ring.neighbors());
        return if ring.predecessor().is_some() {
            RingParticipation::Stable
        } else {
            RingParticipation::Standalone
        };
    }

    if let Some(Some(x)) = peer_client.get_predecessor(&succ.addr).await {
        if in_interval(x.id, self_node.id, succ.id, false) {
            debug!("stabilize: adopting new successor {} (was {})", x.addr, succ.addr);
            ring.set_successor(x.clone());
            succ = x;
        }
    }

    let notified = peer_client.notify(&succ.addr, &self_node).await.is_some();

    if let Some(list) = peer_client.get_successor_list(&succ.addr).await {
        let mut new_list = vec![succ.clone()];
        new_list.extend(list.into_iter().take(SUCCESSOR_LIST_SIZE.saturating_sub(1)));
        ring.set_successor_list(new_list);
    }

    flood.set_neighbors(ring.neighbors());

    if notified {
        RingParticipation::Stable
    } else {
        RingParticipation::Joining
    }
}

/// One fix-fingers tick: refreshes the next finger in the round-robin
/// cursor order.
pub async fn fix_fingers_tick(ring: &RingState, peer_client: &dyn PeerClient, metrics: &Metrics) {
    let i = ring.next_fix_fingers_index();
    let target = ring.self_node().id.wrapping_add(1u32 << i);
    let succ = super::lookup::find_successor(ring, peer_client, metrics, target).await;
    ring.set_finger(i, succ);
}

/// One heartbeat tick: pings the successor, failing over through the
/// successor list (or collapsing to a singleton) on failure; pings the
/// predecessor, clearing it on failure.
pub async fn heartbeat_tick(ring: &RingState, peer_client: &dyn PeerClient) -> RingParticipation {
    let self_node = ring.self_node();
    let mut degraded = false;

    let succ = ring.successor();
    if succ.addr != self_node.addr && !peer_client.ping(&succ.addr).await {
        warn!("successor {} unreachable, failing over", succ.addr);
        degraded = true;
        let list = ring.successor_list();
        let mut promoted = None;
        for candidate in list.iter().skip(1) {
            if peer_client.ping(&candidate.addr).await {
                promoted = Some(candidate.clone());
                break;
            }
        }
        match promoted {
            Some(node) => {
                warn!("promoted {} to successor", node.addr);
                ring.set_successor(node);
            }
            None => {
                warn!("no live successor-list member, collapsing to singleton");
                ring.set_successor(self_node.clone());
                ring.set_successor_list(vec![self_node.clone()]);
            }
        }
    }

    if let Some(pred) = ring.predecessor() {
        if !peer_client.ping(&pred.addr).await {
            warn!("predecessor {} unreachable, clearing", pred.addr);
            ring.set_predecessor(None);
            degraded = true;
        }
    }

    if degraded {
        RingParticipation::Degraded
    } else {
        RingParticipation::Stable
    }
}

/// One anti-entropy tick: gossips the full local KV snapshot to every
/// non-self successor-list member via `replica_sync`.
pub async fn anti_entropy_tick(ring: &RingState, kv: &KvStore, peer_client: &dyn PeerClient) {
    let self_addr = ring.self_node().addr;
    let snapshot = kv.dump();
    for succ in ring.successor_list() {
        if succ.addr == self_addr {
            continue;
        }
        let _ = peer_client.replica_sync(&succ.addr, &snapshot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::Version;
    use crate::types::{Address, HashPos, NodeRef};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePeer {
        pings: Mutex<HashMap<Address, bool>>,
        predecessors: Mutex<HashMap<Address, Option<NodeRef>>>,
        successor_lists: Mutex<HashMap<Address, Vec<NodeRef>>>,
    }

    #[async_trait]
    impl PeerClient for FakePeer {
        async fn ping(&self, addr: &Address) -> bool {
            *self.pings.lock().unwrap().get(addr).unwrap_or(&false)
        }
        async fn get_predecessor(&self, addr: &Address) -> Option<Option<NodeRef>> {
            self.predecessors.lock().unwrap().get(addr).cloned()
        }
        async fn notify(&self, _addr: &Address, _node: &NodeRef) -> Option<()> {
            Some(())
        }
        async fn get_successor(&self, _addr: &Address) -> Option<NodeRef> {
            None
        }
        async fn get_successor_list(&self, addr: &Address) -> Option<Vec<NodeRef>> {
            self.successor_lists.lock().unwrap().get(addr).cloned()
        }
        async fn find_successor(&self, _addr: &Address, _id: HashPos) -> Option<NodeRef> {
            None
        }
        async fn closest_preceding_or_self(&self, _addr: &Address, _id: HashPos) -> Option<NodeRef> {
            None
        }
        async fn replica_put(&self, _addr: &Address, _key: &str, _version: &Version) -> Option<()> {
            None
        }
        async fn replica_get(&self, _addr: &Address, _key: &str) -> Option<Option<Version>> {
            None
        }
        async fn replica_sync(&self, _addr: &Address, _kv: &HashMap<String, Version>) -> Option<()> {
            Some(())
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
    async fn stabilize_on_fresh_singleton_stays_standalone() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let flood = FloodSearch::new();
        let peer = FakePeer::default();
        let state = stabilize_once(&ring, &peer, &flood).await;
        assert_eq!(state, RingParticipation::Standalone);
    }

    #[tokio::test]
    async fn stabilize_adopts_closer_predecessor_of_successor() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let succ = NodeRef::new("z:9");
        ring.set_successor(succ.clone());
        ring.set_successor_list(vec![succ.clone()]);

        let better = NodeRef::new("m:5");
        let peer = FakePeer::default();
        peer.predecessors.lock().unwrap().insert(succ.addr.clone(), Some(better.clone()));
        peer.successor_lists.lock().unwrap().insert(better.addr.clone(), vec![better.clone()]);

        stabilize_once(&ring, &peer, &FloodSearch::new()).await;

        // whichever node `better` turns out to land between self and succ,
        // the successor list is refreshed from whatever became the successor
        assert!(ring.successor().addr == better.addr || ring.successor().addr == succ.addr);
    }

    #[tokio::test]
    async fn heartbeat_fails_over_to_next_successor() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let dead = NodeRef::new("dead:1");
        let alive = NodeRef::new("alive:1");
        ring.set_successor(dead.clone());
        ring.set_successor_list(vec![dead.clone(), alive.clone()]);

        let peer = FakePeer::default();
        peer.pings.lock().unwrap().insert(dead.addr.clone(), false);
        peer.pings.lock().unwrap().insert(alive.addr.clone(), true);

        let state = heartbeat_tick(&ring, &peer).await;
        assert_eq!(state, RingParticipation::Degraded);
        assert_eq!(ring.successor(), alive);
    }

    #[tokio::test]
    async fn heartbeat_collapses_to_singleton_when_all_dead() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let dead = NodeRef::new("dead:1");
        ring.set_successor(dead.clone());
        ring.set_successor_list(vec![dead.clone()]);

        let peer = FakePeer::default();
        peer.pings.lock().unwrap().insert(dead.addr.clone(), false);

        heartbeat_tick(&ring, &peer).await;
        assert!(ring.is_singleton());
    }

    #[tokio::test]
    async fn heartbeat_clears_unreachable_predecessor() {
        let ring = RingState::new(NodeRef::new("a:1"));
        let pred = NodeRef::new("pred:1");
        ring.set_predecessor(Some(pred.clone()));

        let peer = FakePeer::default();
        peer.pings.lock().unwrap().insert(pred.addr.clone(), false);

        heartbeat_tick(&ring, &peer).await;
        assert!(ring.predecessor().is_none());
    }

    #[tokio::test]
    async fn anti_entropy_skips_self() {
        let ring = RingState::new(NodeRef::new("a:1"));
        ring.set_successor_list(vec![ring.self_node()]);
        let kv = KvStore::new();
        kv.put("k", Version::new("v", 1, "w"));
        let peer = FakePeer::default();
        anti_entropy_tick(&ring, &kv, &peer).await;
    }
}
