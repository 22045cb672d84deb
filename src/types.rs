use serde::{Deserialize, Serialize};

use crate::crypto::hash_str;

/// Ring identifier width, fixed at 32 bits. The bit-width is not dynamically
/// reconfigurable.
pub const RING_BITS: u32 = 32;

/// A position on the `2^RING_BITS` ring.
pub type HashPos = u32;

/// `host:port` style peer address.
pub type Address = String;

/// A value object identifying a node: its ring position and its address.
/// Immutable once created; `id` is always `hash(addr)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: HashPos,
    pub addr: Address,
}

impl NodeRef {
    pub fn new(addr: impl Into<Address>) -> Self {
        let addr = addr.into();
        let id = hash_str(&addr);
        NodeRef { id, addr }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.addr, self.id)
    }
}
