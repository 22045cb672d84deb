use std::collections::HashSet;
use std::sync::Mutex;

use uuid::Uuid;

use crate::kv::KvStore;
use crate::metrics::Metrics;
use crate::rpc::client::PeerClient;
use crate::rpc::dto::{FloodMatch, FloodResult, FloodStats};
use crate::types::Address;

/// Gnutella-style flood state: the neighbor set (seeded from the ring view
/// by stabilize) and the set of message ids already processed. Duplicate
/// suppression is global per node, not per-origin — it bounds fan-out but
/// can cut off a late-arriving path; that's intentional.
#[derive(Debug, Default)]
pub struct FloodSearch {
    neighbors: Mutex<HashSet<Address>>,
    seen: Mutex<HashSet<String>>,
}

impl FloodSearch {
    pub fn new() -> Self {
        FloodSearch::default()
    }

    /// Replaces the neighbor set wholesale; called by stabilize with the
    /// union of the successor list and the predecessor.
    pub fn set_neighbors(&self, neighbors: HashSet<Address>) {
        *self.neighbors.lock().unwrap() = neighbors;
    }

    pub fn neighbors(&self) -> Vec<Address> {
        self.neighbors.lock().unwrap().iter().cloned().collect()
    }

    /// Atomic check-and-insert: returns `true` if this is the first time
    /// `msg_id` has been seen (and it is now marked seen), `false` if it
    /// was already present.
    fn mark_seen(&self, msg_id: &str) -> bool {
        self.seen.lock().unwrap().insert(msg_id.to_string())
    }
}

fn local_match(kv: &KvStore, self_addr: &Address, key: &str) -> Vec<FloodMatch> {
    if kv.get(key).is_some() {
        vec![FloodMatch {
            addr: self_addr.clone(),
            key: key.to_string(),
        }]
    } else {
        Vec::new()
    }
}

async fn forward_to(
    peer_client: &dyn PeerClient,
    neighbors: &[Address],
    msg_id: &str,
    key: &str,
    ttl: u32,
    self_addr: &Address,
) -> (Vec<FloodMatch>, u64) {
    if ttl == 0 {
        return (Vec::new(), 0);
    }
    let calls = neighbors
        .iter()
        .map(|nb| peer_client.g_query(nb, msg_id, key, ttl - 1, self_addr));
    let results = futures::future::join_all(calls).await;

    let mut matches = Vec::new();
    let mut forwarded = 0u64;
    for result in results {
        if let Some(child) = result {
            forwarded += 1 + child.stats.forwarded;
            matches.extend(child.matches);
        }
    }
    (matches, forwarded)
}

/// Starts a fresh flood from this node: mints a message id, checks the
/// local store, and (if `ttl > 0`) forwards to every neighbor.
pub async fn start_query(
    flood: &FloodSearch,
    peer_client: &dyn PeerClient,
    kv: &KvStore,
    metrics: &Metrics,
    self_addr: &Address,
    key: &str,
    ttl: u32,
) -> FloodResult {
    let msg_id = Uuid::new_v4().to_string();
    flood.mark_seen(&msg_id);

    let mut matches = local_match(kv, self_addr, key);
    let neighbors = flood.neighbors();
    let (child_matches, forwarded) = forward_to(peer_client, &neighbors, &msg_id, key, ttl, self_addr).await;
    matches.extend(child_matches);

    metrics.record_gnutella_query(forwarded);
    FloodResult {
        matches,
        stats: FloodStats { forwarded },
    }
}

/// Handles a flood message arriving from another node. Duplicate `msg_id`s
/// return an empty result immediately. Forwarding is split-horizon: never
/// back to `origin`.
pub async fn query_received(
    flood: &FloodSearch,
    peer_client: &dyn PeerClient,
    kv: &KvStore,
    self_addr: &Address,
    msg_id: &str,
    key: &str,
    ttl: u32,
    origin: &Address,
) -> FloodResult {
    if !flood.mark_seen(msg_id) {
        return FloodResult::default();
    }

    let mut matches = local_match(kv, self_addr, key);
    let neighbors: Vec<Address> = flood.neighbors().into_iter().filter(|n| n != origin).collect();
    let (child_matches, forwarded) = forward_to(peer_client, &neighbors, msg_id, key, ttl, self_addr).await;
    matches.extend(child_matches);

    FloodResult {
        matches,
        stats: FloodStats { forwarded },
    }
}
