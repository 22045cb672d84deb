use thiserror::Error;

/// Internal error kinds used for control flow and logging context. None of
/// these cross the wire as structured payloads — peers only ever see
/// presence/absence of a successful response, per the error handling design.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("peer {addr} unavailable: {reason}")]
    TransportFailure { addr: String, reason: String },

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("ring inconsistency while resolving {key_id}: {reason}")]
    RingInconsistency { key_id: u32, reason: String },
}
