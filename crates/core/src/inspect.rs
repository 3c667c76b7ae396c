use serde::Deserialize;
use serde::Serialize;

use crate::dht::RingState;
use crate::swarm::NodeState;

/// Snapshot of a node's view of the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingInspect {
    pub id: String,
    pub endpoint: String,
    pub state: NodeState,
    #[serde(default)]
    pub predecessor: Option<String>,
    #[serde(default)]
    pub successor: Option<String>,
    /// Runs of equal fingers as `(finger, first slot, last slot)`, slots count from 1.
    pub finger_table: Vec<(Option<String>, u64, u64)>,
    pub connections: Vec<String>,
}

impl RingInspect {
    pub fn inspect(dht: &RingState, state: NodeState, connections: Vec<String>) -> Self {
        let predecessor = dht
            .predecessor()
            .ok()
            .flatten()
            .map(|x| x.to_string());

        let successor = dht.successor().ok().flatten().map(|x| x.to_string());

        let finger_table = {
            dht.lock_finger()
                .map(|ft| {
                    let finger = ft.list().iter().map(|x| x.map(|n| n.to_string()));
                    compress_iter(finger)
                        .into_iter()
                        .map(|(n, start, end)| (n, start + 1, end + 1))
                        .collect()
                })
                .unwrap_or_default()
        };

        Self {
            id: dht.me.id.to_string(),
            endpoint: dht.me.endpoint.to_string(),
            state,
            predecessor,
            successor,
            finger_table,
            connections,
        }
    }
}

pub fn compress_iter<T>(iter: impl Iterator<Item = T>) -> Vec<(T, u64, u64)>
where T: PartialEq {
    let mut result = vec![];
    let mut start = 0u64;
    let mut count = 0u64;
    let mut prev: Option<T> = None;

    for (i, x) in iter.enumerate() {
        match prev {
            Some(p) if p == x => {
                count += 1;
            }
            _ => {
                if let Some(p) = prev {
                    result.push((p, start, start + count - 1));
                }
                start = i as u64;
                count = 1;
            }
        }
        prev = Some(x);
    }

    if let Some(p) = prev {
        result.push((p, start, start + count - 1));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht::IdSpace;
    use crate::dht::NodeInfo;

    #[test]
    fn test_compress_iter() {
        let v = vec![None, None, Some(3), Some(3), Some(3), None];
        assert_eq!(
            vec![(None, 0, 1), (Some(3), 2, 4), (None, 5, 5)],
            compress_iter(v.into_iter())
        );
        assert!(compress_iter(Vec::<u8>::new().into_iter()).is_empty());
    }

    #[test]
    fn test_inspect_ring() {
        let space = IdSpace::new(4).unwrap();
        let me = NodeInfo::with_id(space.id(1).unwrap(), "127.0.0.1:1".parse().unwrap());
        let other = NodeInfo::with_id(space.id(9).unwrap(), "127.0.0.1:2".parse().unwrap());
        let dht = RingState::new(me, space);
        for i in 1..=3 {
            dht.compare_and_set_finger(i, None, Some(other)).unwrap();
        }

        let inspect = RingInspect::inspect(&dht, NodeState::Stable, vec![]);
        assert_eq!(inspect.successor, Some(other.to_string()));
        assert_eq!(inspect.predecessor, None);
        assert_eq!(inspect.finger_table, vec![
            (Some(other.to_string()), 1, 3),
            (None, 4, 4)
        ]);
        let json = serde_json::to_string(&inspect).unwrap();
        assert!(json.contains("\"state\":\"Stable\""));
    }
}
