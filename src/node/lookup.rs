use crate::crypto::in_interval;
use crate::metrics::Metrics;
use crate::node::ring_state::RingState;
use crate::rpc::client::PeerClient;
use crate::types::{Address, HashPos, NodeRef};

/// Scans the finger table from `B-1` down to `0` for the first entry
/// strictly between self and `key_id`.
pub fn closest_preceding_finger_local(ring: &RingState, key_id: HashPos) -> Option<NodeRef> {
    let self_id = ring.self_node().id;
    for i in (0..crate::types::RING_BITS as usize).rev() {
        if let Some(f) = ring.finger(i) {
            if in_interval(f.id, self_id, key_id, false) {
                return Some(f);
            }
        }
    }
    None
}

/// Iterative Chord lookup. The termination check is always against this
/// node's own successor (not the current candidate `n`'s) — each hop only
/// advances the candidate via a remote `closest_preceding_or_self` call.
pub async fn find_successor(
    ring: &RingState,
    peer_client: &dyn PeerClient,
    metrics: &Metrics,
    key_id: HashPos,
) -> NodeRef {
    let self_node = ring.self_node();
    let mut n = self_node.clone();
    let mut hops: u64 = 0;

    loop {
        hops += 1;
        let succ = ring.successor();
        if in_interval(key_id, n.id, succ.id, true) {
            metrics.record_chord_lookup(hops);
            return succ;
        }

        let cp = closest_preceding_finger_local(ring, key_id);
        let target = match &cp {
            Some(cp) if cp.addr != n.addr => cp.clone(),
            _ => succ.clone(),
        };

        match peer_client.closest_preceding_or_self(&target.addr, key_id).await {
            Some(next) => n = next,
            None => {
                metrics.record_chord_lookup(hops);
                return target;
            }
        }
    }
}

/// Asks `bootstrap` for the successor of this node's id and installs it as
/// both successor and (singleton) successor list. An unreachable bootstrap
/// falls back to a standalone ring rather than failing the join.
pub async fn join(ring: &RingState, peer_client: &dyn PeerClient, bootstrap: &Address) -> bool {
    let self_node = ring.self_node();
    match peer_client.find_successor(bootstrap, self_node.id).await {
        Some(node) => {
            ring.set_successor(node.clone());
            ring.set_successor_list(vec![node]);
            true
        }
        None => {
            ring.set_successor(self_node.clone());
            ring.set_successor_list(vec![self_node]);
            false
        }
    }
}
