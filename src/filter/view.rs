use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{Interaction, NodeId, SocialGraph};

use super::selection::FilterSelection;

/// Edges whose assignment is part of `selection`, in their original order.
pub fn apply_filter(selection: &FilterSelection, edges: &[Interaction]) -> Vec<Interaction> {
    match selection {
        FilterSelection::All => edges.to_vec(),
        FilterSelection::Only(ids) => edges
            .iter()
            .filter(|edge| ids.contains(&edge.assignment_id))
            .cloned()
            .collect(),
    }
}

/// Per-node endpoint counts over `active_edges` and the nodes left with none.
///
/// A self loop counts twice for its node. Endpoints outside `node_ids` are ignored.
pub fn derive_counts(
    active_edges: &[Interaction],
    node_ids: impl IntoIterator<Item = NodeId>,
) -> (BTreeMap<NodeId, usize>, BTreeSet<NodeId>) {
    let mut counts = node_ids
        .into_iter()
        .map(|id| (id, 0usize))
        .collect::<BTreeMap<_, _>>();

    for edge in active_edges {
        for id in [edge.source, edge.target] {
            if let Some(count) = counts.get_mut(&id) {
                *count += 1;
            }
        }
    }

    let isolated = counts
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&id, _)| id)
        .collect();

    (counts, isolated)
}

/// Filter-dependent state handed to the layout engine and to renderers.
/// A new view is derived for every selection; views are never patched.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedView {
    selection: FilterSelection,
    active_edges: Vec<Interaction>,
    interaction_counts: BTreeMap<NodeId, usize>,
    isolated_nodes: BTreeSet<NodeId>,
}

impl DerivedView {
    pub fn derive(graph: &SocialGraph, selection: &FilterSelection) -> Self {
        let active_edges = apply_filter(selection, graph.interactions());
        let (interaction_counts, isolated_nodes) = derive_counts(&active_edges, graph.node_ids());
        Self {
            selection: selection.clone(),
            active_edges,
            interaction_counts,
            isolated_nodes,
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn active_edges(&self) -> &[Interaction] {
        &self.active_edges
    }

    pub fn interaction_counts(&self) -> &BTreeMap<NodeId, usize> {
        &self.interaction_counts
    }

    pub fn isolated_nodes(&self) -> &BTreeSet<NodeId> {
        &self.isolated_nodes
    }

    pub fn interaction_count(&self, id: NodeId) -> usize {
        self.interaction_counts.get(&id).copied().unwrap_or(0)
    }

    pub fn is_isolated(&self, id: NodeId) -> bool {
        self.isolated_nodes.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::graph::{AssignmentId, InteractionWeight, User};

    fn link(source: NodeId, target: NodeId, assignment_id: AssignmentId) -> Interaction {
        Interaction {
            source,
            target,
            assignment_id,
            weight: InteractionWeight::default(),
        }
    }

    fn selection(ids: &[AssignmentId]) -> FilterSelection {
        FilterSelection::Only(ids.iter().copied().collect())
    }

    #[test]
    fn explicit_selection_keeps_matching_edges_in_order() {
        let edges = vec![link(1, 2, 1), link(2, 3, 2), link(3, 4, 1)];
        let active = apply_filter(&selection(&[1]), &edges);
        assert_eq!(active, vec![link(1, 2, 1), link(3, 4, 1)]);
    }

    #[test]
    fn empty_selection_isolates_everyone() {
        let edges = vec![link(1, 2, 1), link(2, 3, 2)];
        let active = apply_filter(&selection(&[]), &edges);
        let (counts, isolated) = derive_counts(&active, [1, 2, 3]);
        assert!(active.is_empty());
        assert!(counts.values().all(|&count| count == 0));
        assert_eq!(isolated, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn self_loop_counts_twice() {
        let (counts, isolated) = derive_counts(&[link(5, 5, 1)], [5, 6]);
        assert_eq!(counts[&5], 2);
        assert_eq!(counts[&6], 0);
        assert_eq!(isolated, BTreeSet::from([6]));
    }

    #[test]
    fn view_reflects_selection() {
        let users = (1..=4)
            .map(|id| User {
                id,
                name: format!("user {id}"),
                group: 1,
            })
            .collect();
        let graph =
            SocialGraph::new(users, vec![link(1, 2, 1), link(2, 3, 2)], vec![]).unwrap();

        let view = DerivedView::derive(&graph, &selection(&[2]));
        assert_eq!(view.active_edges(), &[link(2, 3, 2)]);
        assert_eq!(view.interaction_count(1), 0);
        assert_eq!(view.interaction_count(2), 1);
        assert!(view.is_isolated(1));
        assert!(view.is_isolated(4));
        assert!(!view.is_isolated(3));
    }

    fn arb_edges() -> impl Strategy<Value = Vec<Interaction>> {
        proptest::collection::vec((1u32..10, 1u32..10, 1u32..5), 0..30).prop_map(|raw| {
            raw.into_iter()
                .map(|(source, target, assignment)| link(source, target, assignment))
                .collect()
        })
    }

    fn arb_selection() -> impl Strategy<Value = FilterSelection> {
        prop_oneof![
            Just(FilterSelection::All),
            proptest::collection::btree_set(1u32..5, 0..4).prop_map(FilterSelection::Only),
        ]
    }

    proptest! {
        #[test]
        fn all_is_identity(edges in arb_edges()) {
            prop_assert_eq!(apply_filter(&FilterSelection::All, &edges), edges);
        }

        #[test]
        fn filtering_is_idempotent(edges in arb_edges(), selection in arb_selection()) {
            let once = apply_filter(&selection, &edges);
            let twice = apply_filter(&selection, &once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn counts_and_isolation_are_consistent(
            edges in arb_edges(),
            selection in arb_selection(),
        ) {
            let active = apply_filter(&selection, &edges);
            let (counts, isolated) = derive_counts(&active, 1u32..10);
            let total = counts.values().sum::<usize>();
            prop_assert_eq!(total, 2 * active.len());
            let zeroes = counts
                .iter()
                .filter(|&(_, &count)| count == 0)
                .map(|(&id, _)| id)
                .collect::<BTreeSet<_>>();
            prop_assert_eq!(isolated, zeroes);
        }
    }
}
