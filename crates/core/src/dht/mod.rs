#![warn(missing_docs)]
//! Implementation of the ring, which is based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, the number of nodes that must be contacted to find a successor in an N-node network is O(log N).

mod chord;
/// Finger table of the ring
pub mod finger;
pub mod id;
mod stabilization;
pub mod types;

pub use chord::RingState;
pub use finger::FingerTable;
pub use id::IdSpace;
pub use id::RingId;
pub use stabilization::Stabilizer;
pub use types::NodeInfo;
