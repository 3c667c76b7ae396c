//! Per-node view of the ring.
//!
//! [RingState] only stores and guards the ring pointers. Every mutation is a
//! compare-and-set keyed on node identity, so a concurrent better update is never
//! overwritten by a task acting on a stale read.

use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::dht::FingerTable;
use crate::dht::IdSpace;
use crate::dht::NodeInfo;
use crate::dht::RingId;
use crate::error::Error;
use crate::error::Result;

/// Ring pointers of the local node: itself, its predecessor and its fingers.
pub struct RingState {
    /// The local node.
    pub me: NodeInfo,
    /// The identifier space of the ring.
    pub space: IdSpace,
    finger: Mutex<FingerTable>,
    predecessor: Mutex<Option<NodeInfo>>,
}

impl RingState {
    /// Create an empty state, no successor and no predecessor.
    pub fn new(me: NodeInfo, space: IdSpace) -> Self {
        Self {
            me,
            space,
            finger: Mutex::new(FingerTable::new(space.bits() as usize)),
            predecessor: Mutex::new(None),
        }
    }

    /// Lock and return MutexGuard of finger table.
    pub fn lock_finger(&self) -> Result<MutexGuard<FingerTable>> {
        self.finger.lock().map_err(|_| Error::RingStateLockError)
    }

    /// Lock and return MutexGuard of predecessor.
    pub fn lock_predecessor(&self) -> Result<MutexGuard<Option<NodeInfo>>> {
        self.predecessor
            .lock()
            .map_err(|_| Error::RingStateLockError)
    }

    /// finger[1]
    pub fn successor(&self) -> Result<Option<NodeInfo>> {
        Ok(self.lock_finger()?.get(1))
    }

    pub fn predecessor(&self) -> Result<Option<NodeInfo>> {
        Ok(*self.lock_predecessor()?)
    }

    pub fn finger(&self, index: usize) -> Result<Option<NodeInfo>> {
        Ok(self.lock_finger()?.get(index))
    }

    /// Snapshot of every finger slot.
    pub fn fingers(&self) -> Result<Vec<Option<NodeInfo>>> {
        Ok(self.lock_finger()?.list().clone())
    }

    /// Set finger `index` to `new` if it still holds `expected`.
    pub fn compare_and_set_finger(
        &self,
        index: usize,
        expected: Option<&NodeInfo>,
        new: Option<NodeInfo>,
    ) -> Result<bool> {
        let updated = self.lock_finger()?.compare_and_set(index, expected, new);
        if updated && index == 1 {
            match new {
                Some(n) => tracing::info!("[{}] successor -> {}", self.me, n),
                None => tracing::info!("[{}] successor cleared", self.me),
            }
        }
        Ok(updated)
    }

    /// Set the predecessor to `new` if it still is `expected`.
    pub fn compare_and_set_predecessor(
        &self,
        expected: Option<&NodeInfo>,
        new: Option<NodeInfo>,
    ) -> Result<bool> {
        let mut predecessor = self.lock_predecessor()?;
        if predecessor.as_ref() != expected {
            return Ok(false);
        }
        *predecessor = new;
        match new {
            Some(n) => tracing::info!("[{}] predecessor -> {}", self.me, n),
            None => tracing::info!("[{}] predecessor cleared", self.me),
        }
        Ok(true)
    }

    /// Drop every pointer to `node` after it was found unreachable.
    pub fn invalidate(&self, node: &NodeInfo) -> Result<()> {
        let cleared = self.lock_finger()?.remove(node);
        if !cleared.is_empty() {
            tracing::warn!("[{}] drop unreachable {} from fingers {:?}", self.me, node, cleared);
        }
        self.compare_and_set_predecessor(Some(node), None)?;
        Ok(())
    }

    /// Whether the local node owns `id`.
    ///
    /// With a predecessor this is the arc (predecessor, me]. Without one the node owns
    /// its own id, and the whole ring while its successor is itself.
    pub fn is_responsible(&self, id: RingId) -> Result<bool> {
        if let Some(predecessor) = self.predecessor()? {
            return Ok(self.space.in_half_open_arc(predecessor.id, id, self.me.id));
        }
        if id == self.me.id {
            return Ok(true);
        }
        Ok(self.successor()? == Some(self.me))
    }

    /// Fingers strictly between me and `target`, scanning from the highest slot down.
    pub fn closest_preceding_fingers(&self, target: RingId) -> Result<Vec<(usize, NodeInfo)>> {
        Ok(self
            .lock_finger()?
            .closest_preceding(&self.space, &self.me, target))
    }

    /// Advance the rotating fix-finger index.
    pub fn next_fix_finger_index(&self) -> Result<usize> {
        Ok(self.lock_finger()?.next_fix_index())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn node(space: &IdSpace, id: u128, port: u16) -> NodeInfo {
        NodeInfo::with_id(
            space.id(id).unwrap(),
            format!("127.0.0.1:{port}").parse().unwrap(),
        )
    }

    #[test]
    fn test_alone_on_the_ring() -> Result<()> {
        let space = IdSpace::new(8)?;
        let me = node(&space, 10, 1);
        let ring = RingState::new(me, space);

        // Not part of a ring yet: only its own id.
        assert!(ring.is_responsible(me.id)?);
        assert!(!ring.is_responsible(space.id(11)?)?);

        assert!(ring.compare_and_set_finger(1, None, Some(me))?);
        for id in [0, 9, 10, 11, 255] {
            assert!(ring.is_responsible(space.id(id)?)?);
        }
        Ok(())
    }

    #[test]
    fn test_predecessor_compare_and_set() -> Result<()> {
        let space = IdSpace::new(8)?;
        let ring = RingState::new(node(&space, 10, 1), space);
        let a = node(&space, 90, 2);
        let b = node(&space, 160, 3);

        assert!(ring.compare_and_set_predecessor(None, Some(a))?);
        assert!(!ring.compare_and_set_predecessor(None, Some(b))?);
        assert!(ring.compare_and_set_predecessor(Some(&a), Some(b))?);
        assert_eq!(ring.predecessor()?, Some(b));
        assert!(ring.is_responsible(space.id(200)?)?);
        assert!(!ring.is_responsible(space.id(100)?)?);
        Ok(())
    }

    #[test]
    fn test_invalidate_clears_every_slot() -> Result<()> {
        let space = IdSpace::new(8)?;
        let ring = RingState::new(node(&space, 10, 1), space);
        let a = node(&space, 90, 2);
        let b = node(&space, 160, 3);
        ring.compare_and_set_finger(1, None, Some(a))?;
        ring.compare_and_set_finger(2, None, Some(a))?;
        ring.compare_and_set_finger(8, None, Some(b))?;
        ring.compare_and_set_predecessor(None, Some(a))?;

        ring.invalidate(&a)?;
        assert_eq!(ring.successor()?, None);
        assert_eq!(ring.finger(2)?, None);
        assert_eq!(ring.finger(8)?, Some(b));
        assert_eq!(ring.predecessor()?, None);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_responsible_for_predecessor_arc(pred in any::<u16>(), me in any::<u16>(), id in any::<u16>()) {
            prop_assume!(pred != me);
            let space = IdSpace::new(16).unwrap();
            let me = node(&space, me.into(), 1);
            let pred = node(&space, pred.into(), 2);
            let id = space.id(id.into()).unwrap();
            let ring = RingState::new(me, space);
            ring.compare_and_set_predecessor(None, Some(pred)).unwrap();

            prop_assert_eq!(
                ring.is_responsible(id).unwrap(),
                space.in_half_open_arc(pred.id, id, me.id)
            );
        }
    }
}
