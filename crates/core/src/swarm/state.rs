use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

/// Lifecycle of a node.
///
/// `Unjoined -> Stable` on ring creation, `Unjoined -> Joining -> Stable` on a successful
/// join, `Joining -> Failed` when the join times out. There is no retry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeState {
    Unjoined = 0,
    Joining = 1,
    Stable = 2,
    Failed = 3,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<u8> for NodeState {
    fn from(v: u8) -> Self {
        match v {
            0 => NodeState::Unjoined,
            1 => NodeState::Joining,
            2 => NodeState::Stable,
            _ => NodeState::Failed,
        }
    }
}

/// Atomic holder of a [NodeState].
#[derive(Debug)]
pub struct NodeLifecycle(AtomicU8);

impl Default for NodeLifecycle {
    fn default() -> Self {
        Self(AtomicU8::new(NodeState::Unjoined as u8))
    }
}

impl NodeLifecycle {
    pub fn get(&self) -> NodeState {
        self.0.load(Ordering::SeqCst).into()
    }

    /// Move from `from` to `to`, fails if the current state is not `from`.
    pub fn transition(&self, from: NodeState, to: NodeState) -> bool {
        let moved = self
            .0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if moved {
            tracing::info!("Node state {from} -> {to}");
        }
        moved
    }
}
