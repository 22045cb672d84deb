use std::collections::HashSet;
use std::sync::Mutex;

use crate::crypto::in_interval;
use crate::types::{Address, HashPos, NodeRef, RING_BITS};

struct RingStateInner {
    predecessor: Option<NodeRef>,
    successor: NodeRef,
    successor_list: Vec<NodeRef>,
    fingers: Vec<Option<NodeRef>>,
    fix_fingers_cursor: usize,
}

/// Single-lock ring state: successor, successor list, predecessor, and
/// finger table behind one mutex with brief critical sections (the
/// concurrency model's option (a) — no immutable-snapshot-behind-an-atomic
/// alternative). Only the four maintenance tasks ever write through these
/// setters; request handlers only read.
pub struct RingState {
    self_node: NodeRef,
    inner: Mutex<RingStateInner>,
}

impl RingState {
    pub fn new(self_node: NodeRef) -> Self {
        let successor = self_node.clone();
        RingState {
            self_node: self_node.clone(),
            inner: Mutex::new(RingStateInner {
                predecessor: None,
                successor: successor.clone(),
                successor_list: vec![successor],
                fingers: vec![None; RING_BITS as usize],
                fix_fingers_cursor: 0,
            }),
        }
    }

    pub fn self_node(&self) -> NodeRef {
        self.self_node.clone()
    }

    pub fn successor(&self) -> NodeRef {
        self.inner.lock().unwrap().successor.clone()
    }

    pub fn predecessor(&self) -> Option<NodeRef> {
        self.inner.lock().unwrap().predecessor.clone()
    }

    pub fn successor_list(&self) -> Vec<NodeRef> {
        self.inner.lock().unwrap().successor_list.clone()
    }

    pub fn finger(&self, i: usize) -> Option<NodeRef> {
        self.inner.lock().unwrap().fingers[i].clone()
    }

    pub fn set_successor(&self, node: NodeRef) {
        self.inner.lock().unwrap().successor = node;
    }

    pub fn set_predecessor(&self, node: Option<NodeRef>) {
        self.inner.lock().unwrap().predecessor = node;
    }

    pub fn set_successor_list(&self, list: Vec<NodeRef>) {
        self.inner.lock().unwrap().successor_list = list;
    }

    pub fn set_finger(&self, i: usize, node: NodeRef) {
        self.inner.lock().unwrap().fingers[i] = Some(node);
    }

    /// Returns the finger index due for refresh and advances the
    /// round-robin cursor past it.
    pub fn next_fix_fingers_index(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let i = inner.fix_fingers_cursor;
        inner.fix_fingers_cursor = (i + 1) % RING_BITS as usize;
        i
    }

    /// Adopts `peer` as predecessor if there is none, or if `peer` lies
    /// strictly between the current predecessor and self. Returns whether
    /// it was adopted.
    pub fn maybe_adopt_predecessor(&self, peer: &NodeRef) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let should_adopt = match &inner.predecessor {
            None => true,
            Some(pred) => in_interval(peer.id, pred.id, self.self_node.id, false),
        };
        if should_adopt {
            inner.predecessor = Some(peer.clone());
        }
        should_adopt
    }

    pub fn is_singleton(&self) -> bool {
        self.inner.lock().unwrap().successor.addr == self.self_node.addr
    }

    /// Flood-neighbor set: union of the successor list and the predecessor,
    /// self excluded.
    pub fn neighbors(&self) -> HashSet<Address> {
        let inner = self.inner.lock().unwrap();
        let mut set: HashSet<Address> = inner.successor_list.iter().map(|n| n.addr.clone()).collect();
        if let Some(pred) = &inner.predecessor {
            set.insert(pred.addr.clone());
        }
        set.remove(&self.self_node.addr);
        set
    }
}
