use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

/// A stored value together with the Lamport timestamp and writer id that
/// produced it. Ordered by the total order from the data model: greater
/// `ts` wins, ties broken by writer id lexicographically. This `Ord` impl
/// is the single place the LWW rule is expressed; `KVStore::put`,
/// `handle_get`'s max selection, and read-repair all compare through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub value: String,
    pub ts: u64,
    pub writer_id: String,
}

impl Version {
    pub fn new(value: impl Into<String>, ts: u64, writer_id: impl Into<String>) -> Self {
        Version {
            value: value.into(),
            ts,
            writer_id: writer_id.into(),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ts
            .cmp(&other.ts)
            .then_with(|| self.writer_id.cmp(&other.writer_id))
    }
}

/// In-memory replica of the key-value map. Every read, write, and dump
/// holds the single guarding mutex only briefly; no lock is ever held
/// across an RPC.
#[derive(Debug, Default)]
pub struct KvStore {
    map: Mutex<HashMap<String, Version>>,
}

impl KvStore {
    pub fn new() -> Self {
        KvStore {
            map: Mutex::new(HashMap::new()),
        }
    }

    /// Merges `version` into the store, keeping it only if it strictly
    /// exceeds any version already stored for `key`. Idempotent and
    /// commutative: applying the same version twice, or out of order,
    /// converges to the same state.
    pub fn put(&self, key: &str, version: Version) {
        let mut map = self.map.lock().unwrap();
        match map.get(key) {
            Some(existing) if *existing >= version => {}
            _ => {
                map.insert(key.to_string(), version);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Version> {
        self.map.lock().unwrap().get(key).cloned()
    }

    pub fn dump(&self) -> HashMap<String, Version> {
        self.map.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
