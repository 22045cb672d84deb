use sha1::{Digest, Sha1};

use crate::types::HashPos;

/// Hashes an address or key string onto the ring.
///
/// Takes the low 32 bits of the SHA-1 digest (the last 4 bytes, read
/// big-endian), which is arithmetically the same as treating the full
/// 160-bit digest as a big integer and reducing it modulo `2^32`.
pub fn hash(data: &[u8]) -> HashPos {
    let mut hasher = Sha1::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut low = [0u8; 4];
    low.copy_from_slice(&digest[16..20]);
    HashPos::from_be_bytes(low)
}

pub fn hash_str(data: &str) -> HashPos {
    hash(data.as_bytes())
}

/// Tests whether `x` lies in the circular interval `(a, b]`, or `(a, b)`
/// when `inclusive_right` is false. The sole primitive for ring reasoning;
/// must behave identically on every node.
pub fn in_interval(x: HashPos, a: HashPos, b: HashPos, inclusive_right: bool) -> bool {
    if a < b {
        if inclusive_right {
            a < x && x <= b
        } else {
            a < x && x < b
        }
    } else if a > b {
        if inclusive_right {
            x > a || x <= b
        } else {
            x > a || x < b
        }
    } else {
        inclusive_right
    }
}
