use std::time::Duration;

/// Number of replicas held per key (owner + successors).
pub const K_REPLICATION: usize = 3;

/// Number of successors tracked for failover.
pub const SUCCESSOR_LIST_SIZE: usize = 4;

pub const STABILIZE_INTERVAL: Duration = Duration::from_secs(3);
pub const FIX_FINGERS_INTERVAL: Duration = Duration::from_secs(5);
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);
pub const ANTI_ENTROPY_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on how long a per-key election is allowed to take before a
/// caller should stop waiting on it. Advisory only: `ensure_replica_leader`
/// resolves synchronously via sequential pings, never blocking this long in
/// practice.
pub const ELECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub const GNUTELLA_TTL_DEFAULT: u32 = 5;

/// Default timeout for most outbound RPCs.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness probes get a tighter budget than regular RPCs.
pub const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout used for flood forwards, matching the source's per-hop budget.
pub const FLOOD_RPC_TIMEOUT: Duration = Duration::from_secs(1);
