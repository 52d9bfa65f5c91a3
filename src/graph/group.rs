//! Connected-component grouping for users whose payload carries no group label.

use std::collections::HashMap;

use super::model::{Interaction, NodeId};

/// Union-find over user ids with path compression and union by rank.
#[derive(Clone, Debug, Default)]
pub struct DisjointSet {
    slot_by_id: HashMap<NodeId, usize>,
    ids: Vec<NodeId>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    /// One singleton set per id. Repeated ids are ignored.
    pub fn make_set(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = Self::default();
        for id in ids {
            if set.slot_by_id.contains_key(&id) {
                continue;
            }
            let slot = set.ids.len();
            set.slot_by_id.insert(id, slot);
            set.ids.push(id);
            set.parent.push(slot);
            set.rank.push(0);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Representative of the set holding `id`, or `None` for an unknown id.
    pub fn find(&mut self, id: NodeId) -> Option<NodeId> {
        let slot = *self.slot_by_id.get(&id)?;
        let root = self.find_slot(slot);
        Some(self.ids[root])
    }

    /// Merges the sets holding `left` and `right` and returns the new representative.
    pub fn union(&mut self, left: NodeId, right: NodeId) -> Option<NodeId> {
        let left = *self.slot_by_id.get(&left)?;
        let right = *self.slot_by_id.get(&right)?;
        let mut left = self.find_slot(left);
        let mut right = self.find_slot(right);
        if left == right {
            return Some(self.ids[left]);
        }

        let left_rank = self.rank[left];
        let right_rank = self.rank[right];
        if left_rank < right_rank {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if left_rank == right_rank {
            self.rank[left] = left_rank.saturating_add(1);
        }
        Some(self.ids[left])
    }

    fn find_slot(&mut self, mut slot: usize) -> usize {
        let mut root = slot;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[slot] != slot {
            let parent = self.parent[slot];
            self.parent[slot] = root;
            slot = parent;
        }

        root
    }
}

/// Dense 1-based component labels, numbered in order of first encounter over `ids`.
pub fn connected_components(
    ids: &[NodeId],
    interactions: &[Interaction],
) -> HashMap<NodeId, u32> {
    let mut sets = DisjointSet::make_set(ids.iter().copied());
    for interaction in interactions {
        sets.union(interaction.source, interaction.target);
    }

    let mut group_by_root: HashMap<NodeId, u32> = HashMap::new();
    let mut groups = HashMap::with_capacity(ids.len());
    for &id in ids {
        let Some(root) = sets.find(id) else {
            continue;
        };
        let next = group_by_root.len() as u32 + 1;
        let group = *group_by_root.entry(root).or_insert(next);
        groups.insert(id, group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::*;
    use crate::graph::InteractionWeight;

    fn link(source: NodeId, target: NodeId) -> Interaction {
        Interaction {
            source,
            target,
            assignment_id: 1,
            weight: InteractionWeight::default(),
        }
    }

    #[test]
    fn find_compresses_paths() {
        let mut sets = DisjointSet::make_set(0..4);
        sets.union(0, 1);
        sets.union(2, 3);
        sets.union(1, 3);
        let root = sets.find(3).unwrap();
        for id in 0..4 {
            assert_eq!(sets.find(id), Some(root));
        }
        let root_slot = sets.slot_by_id[&root];
        assert!(sets.parent.iter().all(|&parent| parent == root_slot));
    }

    #[test]
    fn union_attaches_lower_rank_under_higher() {
        let mut sets = DisjointSet::make_set([10, 11, 12]);
        let pair_root = sets.union(10, 11).unwrap();
        assert_eq!(sets.rank[sets.slot_by_id[&pair_root]], 1);
        assert_eq!(sets.union(12, 10), Some(pair_root));
        assert_eq!(sets.rank[sets.slot_by_id[&pair_root]], 1);
    }

    #[test]
    fn unknown_ids_are_reported_as_none() {
        let mut sets = DisjointSet::make_set([1, 2]);
        assert_eq!(sets.find(7), None);
        assert_eq!(sets.union(1, 7), None);
    }

    #[test]
    fn groups_follow_first_encounter_order() {
        let groups = connected_components(&[5, 6, 7, 8], &[link(8, 6)]);
        assert_eq!(groups[&5], 1);
        assert_eq!(groups[&6], 2);
        assert_eq!(groups[&7], 3);
        assert_eq!(groups[&8], 2);
    }

    #[test]
    fn isolated_users_get_unique_groups() {
        let groups = connected_components(&[1, 2, 3], &[]);
        let mut labels = groups.values().copied().collect::<Vec<_>>();
        labels.sort_unstable();
        assert_eq!(labels, vec![1, 2, 3]);
    }

    fn reachable(from: NodeId, count: u32, edges: &[(NodeId, NodeId)]) -> Vec<bool> {
        let mut seen = vec![false; count as usize];
        let mut queue = VecDeque::from([from]);
        seen[from as usize] = true;
        while let Some(current) = queue.pop_front() {
            for &(a, b) in edges {
                let next = if a == current {
                    b
                } else if b == current {
                    a
                } else {
                    continue;
                };
                if !seen[next as usize] {
                    seen[next as usize] = true;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    proptest! {
        #[test]
        fn same_group_iff_connected(
            (count, edges) in (1u32..24).prop_flat_map(|count| {
                (Just(count), proptest::collection::vec((0..count, 0..count), 0..40))
            })
        ) {
            let ids = (0..count).collect::<Vec<_>>();
            let links = edges.iter().map(|&(a, b)| link(a, b)).collect::<Vec<_>>();
            let groups = connected_components(&ids, &links);
            for a in 0..count {
                let seen = reachable(a, count, &edges);
                for b in 0..count {
                    prop_assert_eq!(groups[&a] == groups[&b], seen[b as usize]);
                }
            }
        }
    }
}
