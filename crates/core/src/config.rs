//! Protocol configuration shared by every node of a ring.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::consts::*;

/// Ring size, periodic task cadences and timeouts. Durations are in milliseconds.
/// `ring_bits` must match across the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub ring_bits: u32,
    pub stabilize_interval: u64,
    pub fix_fingers_interval: u64,
    pub check_predecessor_interval: u64,
    /// Emit a ring snapshot at this cadence, disabled when absent.
    pub dump_interval: Option<u64>,
    pub lookup_timeout: u64,
    pub join_timeout: u64,
    pub liveness_timeout: u64,
    pub connect_timeout: u64,
    pub worker_pool_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ring_bits: DEFAULT_RING_BITS,
            stabilize_interval: DEFAULT_STABILIZE_INTERVAL_MS,
            fix_fingers_interval: DEFAULT_FIX_FINGERS_INTERVAL_MS,
            check_predecessor_interval: DEFAULT_CHECK_PREDECESSOR_INTERVAL_MS,
            dump_interval: None,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT_MS,
            join_timeout: DEFAULT_JOIN_TIMEOUT_MS,
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT_MS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_MS,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
        }
    }
}

impl ProtocolConfig {
    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_millis(self.stabilize_interval)
    }

    pub fn fix_fingers_interval(&self) -> Duration {
        Duration::from_millis(self.fix_fingers_interval)
    }

    pub fn check_predecessor_interval(&self) -> Duration {
        Duration::from_millis(self.check_predecessor_interval)
    }

    pub fn dump_interval(&self) -> Option<Duration> {
        self.dump_interval.map(Duration::from_millis)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }
}
