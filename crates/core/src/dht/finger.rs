#![warn(missing_docs)]
use serde::Deserialize;
use serde::Serialize;

use crate::dht::IdSpace;
use crate::dht::NodeInfo;
use crate::dht::RingId;

/// Finger table of Chord DHT.
/// Slots are numbered `1..=size`, slot 1 is the successor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
    size: usize,
    finger: Vec<Option<NodeInfo>>,
    fix_finger_index: usize,
}

impl FingerTable {
    /// builder
    pub fn new(size: usize) -> Self {
        Self {
            size,
            finger: vec![None; size],
            fix_finger_index: 0,
        }
    }

    /// Number of slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// getter, out of range slots are empty
    pub fn get(&self, index: usize) -> Option<NodeInfo> {
        if index == 0 || index > self.size {
            return None;
        }
        self.finger[index - 1]
    }

    /// Replace slot `index` with `new` only if it still holds `expected`.
    pub fn compare_and_set(
        &mut self,
        index: usize,
        expected: Option<&NodeInfo>,
        new: Option<NodeInfo>,
    ) -> bool {
        if index == 0 || index > self.size {
            return false;
        }
        let slot = &mut self.finger[index - 1];
        if slot.as_ref() != expected {
            return false;
        }
        *slot = new;
        true
    }

    /// Clear every slot holding `node`, returns the cleared slots.
    pub fn remove(&mut self, node: &NodeInfo) -> Vec<usize> {
        let mut cleared = vec![];
        for (i, slot) in self.finger.iter_mut().enumerate() {
            if slot.as_ref() == Some(node) {
                *slot = None;
                cleared.push(i + 1);
            }
        }
        cleared
    }

    /// Candidates of the closest preceding node of `target`, best first.
    /// A candidate is a finger other than `me` lying strictly between `me` and `target`.
    pub fn closest_preceding(
        &self,
        space: &IdSpace,
        me: &NodeInfo,
        target: RingId,
    ) -> Vec<(usize, NodeInfo)> {
        (1..=self.size)
            .rev()
            .filter_map(|i| self.get(i).map(|f| (i, f)))
            .filter(|(_, f)| f != me && space.strictly_between(me.id, f.id, target))
            .collect()
    }

    /// Advance the rotating fix-finger index, wrapping within `1..=size`.
    pub fn next_fix_index(&mut self) -> usize {
        self.fix_finger_index = self.fix_finger_index % self.size + 1;
        self.fix_finger_index
    }

    /// get length of finger
    pub fn len(&self) -> usize {
        self.finger.iter().flatten().count()
    }

    /// is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// get finger list
    pub fn list(&self) -> &Vec<Option<NodeInfo>> {
        &self.finger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(space: &IdSpace, id: u128, port: u16) -> NodeInfo {
        NodeInfo::with_id(
            space.id(id).unwrap(),
            format!("127.0.0.1:{port}").parse().unwrap(),
        )
    }

    #[test]
    fn test_compare_and_set() {
        let space = IdSpace::new(8).unwrap();
        let a = node(&space, 10, 1);
        let b = node(&space, 20, 2);
        let mut table = FingerTable::new(8);

        assert!(table.compare_and_set(1, None, Some(a)));
        assert!(!table.compare_and_set(1, None, Some(b)));
        assert!(table.compare_and_set(1, Some(&a), Some(b)));
        assert_eq!(table.get(1), Some(b));
        assert!(!table.compare_and_set(0, None, Some(a)));
        assert!(!table.compare_and_set(9, None, Some(a)));
        assert_eq!(table.get(9), None);
    }

    #[test]
    fn test_remove_and_closest() {
        let space = IdSpace::new(8).unwrap();
        let me = node(&space, 10, 1);
        let a = node(&space, 90, 2);
        let b = node(&space, 160, 3);
        let mut table = FingerTable::new(8);
        for i in 1..=7 {
            table.compare_and_set(i, None, Some(a));
        }
        table.compare_and_set(8, None, Some(b));

        let target = space.id(100).unwrap();
        let candidates = table.closest_preceding(&space, &me, target);
        assert_eq!(candidates.first(), Some(&(7, a)));
        assert_eq!(candidates.len(), 7);

        let target = space.id(5).unwrap();
        let candidates = table.closest_preceding(&space, &me, target);
        assert_eq!(candidates.first(), Some(&(8, b)));

        assert_eq!(table.remove(&a), (1..=7).collect::<Vec<_>>());
        assert_eq!(table.len(), 1);
        assert!(table
            .closest_preceding(&space, &me, space.id(100).unwrap())
            .is_empty());
    }

    #[test]
    fn test_fix_index_rotates() {
        let mut table = FingerTable::new(3);
        let seen: Vec<usize> = (0..7).map(|_| table.next_fix_index()).collect();
        assert_eq!(seen, vec![1, 2, 3, 1, 2, 3, 1]);
    }
}
