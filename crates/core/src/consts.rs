//! Constant variables.

/// Default size of the identifier space in bits.
pub const DEFAULT_RING_BITS: u32 = 64;
/// Upper bound of the identifier space, ids are stored in `u128`.
pub const MAX_RING_BITS: u32 = 128;

pub const DEFAULT_STABILIZE_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_FIX_FINGERS_INTERVAL_MS: u64 = 500;
pub const DEFAULT_CHECK_PREDECESSOR_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LIVENESS_TIMEOUT_MS: u64 = 1500;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_WORKER_POOL_SIZE: usize = 16;
