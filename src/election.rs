use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::HashPos;

/// Bully-style election state for a single key's replica set. `node_priority`
/// fields are omitted here deliberately: priority is always the candidate's
/// ring id, passed in by the caller rather than stored per-state.
#[derive(Debug, Default)]
pub struct ReplicaElectionState {
    pub current_leader: Option<HashPos>,
    /// Set while a new election is being resolved. Advisory only: nothing
    /// currently consults this flag to prevent a second concurrent election
    /// for the same key (open question #4 in the source).
    pub in_election: bool,
}

/// Per-key election cache. Lazily creates state for keys it hasn't seen.
/// A global mutex protects the map; each key's state has its own mutex so
/// concurrent elections for different keys don't serialize on each other.
#[derive(Debug, Default)]
pub struct ElectionManager {
    per_key: Mutex<HashMap<String, Arc<Mutex<ReplicaElectionState>>>>,
}

impl ElectionManager {
    pub fn new() -> Self {
        ElectionManager {
            per_key: Mutex::new(HashMap::new()),
        }
    }

    fn state_for(&self, key: &str) -> Arc<Mutex<ReplicaElectionState>> {
        let mut map = self.per_key.lock().unwrap();
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ReplicaElectionState::default())))
            .clone()
    }

    pub fn get_leader(&self, key: &str) -> Option<HashPos> {
        self.state_for(key).lock().unwrap().current_leader
    }

    pub fn start_election_local(&self, key: &str) {
        self.state_for(key).lock().unwrap().in_election = true;
    }

    pub fn set_leader(&self, key: &str, leader: Option<HashPos>) {
        let state = self.state_for(key);
        let mut guard = state.lock().unwrap();
        guard.current_leader = leader;
        guard.in_election = false;
    }
}
