use std::collections::BTreeSet;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::error::UnknownAssignmentWarning;
use crate::graph::AssignmentId;

/// Which assignments contribute edges. `All` and an explicit set never overlap:
/// an explicit set equal to the whole universe is always stored as `All`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSelection {
    #[default]
    All,
    Only(BTreeSet<AssignmentId>),
}

impl FilterSelection {
    /// Explicit selection over `universe`. Ids outside the universe are dropped.
    pub fn only(
        ids: impl IntoIterator<Item = AssignmentId>,
        universe: &BTreeSet<AssignmentId>,
    ) -> Self {
        let mut selected = BTreeSet::new();
        for id in ids {
            if universe.contains(&id) {
                selected.insert(id);
            } else {
                warn!(assignment_id = id, "dropping unknown assignment from selection");
            }
        }
        Self::Only(selected).normalized(universe)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains(&self, id: AssignmentId) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&id),
        }
    }

    /// Collapses an explicit set covering the whole universe into `All`.
    pub fn normalized(self, universe: &BTreeSet<AssignmentId>) -> Self {
        match self {
            Self::Only(ids) if ids == *universe => Self::All,
            other => other,
        }
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(ids) => {
                f.write_str("{")?;
                for (position, id) in ids.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Entry a user can check or uncheck in the assignment filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleTarget {
    All,
    Assignment(AssignmentId),
}

impl FromStr for ToggleTarget {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            value.parse().map(Self::Assignment)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toggled {
    pub selection: FilterSelection,
    pub warning: Option<UnknownAssignmentWarning>,
}

/// Applies one checkbox toggle to `current`. The result is always normalized.
pub fn toggle(
    current: &FilterSelection,
    target: ToggleTarget,
    universe: &BTreeSet<AssignmentId>,
) -> Toggled {
    let selection = match (current, target) {
        (FilterSelection::All, ToggleTarget::All) => FilterSelection::Only(BTreeSet::new()),
        (FilterSelection::Only(_), ToggleTarget::All) => FilterSelection::All,
        (_, ToggleTarget::Assignment(id)) if !universe.contains(&id) => {
            return Toggled {
                selection: current.clone(),
                warning: Some(UnknownAssignmentWarning(id)),
            };
        }
        (FilterSelection::All, ToggleTarget::Assignment(id)) => {
            let mut ids = universe.clone();
            ids.remove(&id);
            FilterSelection::Only(ids)
        }
        (FilterSelection::Only(ids), ToggleTarget::Assignment(id)) => {
            let mut ids = ids.clone();
            if !ids.remove(&id) {
                ids.insert(id);
            }
            FilterSelection::Only(ids)
        }
    };

    Toggled {
        selection: selection.normalized(universe),
        warning: None,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn universe(ids: &[AssignmentId]) -> BTreeSet<AssignmentId> {
        ids.iter().copied().collect()
    }

    fn only(ids: &[AssignmentId]) -> FilterSelection {
        FilterSelection::Only(ids.iter().copied().collect())
    }

    #[test]
    fn narrowing_from_all_to_nothing() {
        let universe = universe(&[1, 2, 3]);
        let step = toggle(&FilterSelection::All, ToggleTarget::Assignment(2), &universe);
        assert_eq!(step.selection, only(&[1, 3]));
        let step = toggle(&step.selection, ToggleTarget::Assignment(1), &universe);
        assert_eq!(step.selection, only(&[3]));
        let step = toggle(&step.selection, ToggleTarget::Assignment(3), &universe);
        assert_eq!(step.selection, only(&[]));
        assert!(step.warning.is_none());
    }

    #[test]
    fn adding_the_last_missing_id_collapses_to_all() {
        let universe = universe(&[1, 2]);
        let step = toggle(&only(&[1]), ToggleTarget::Assignment(2), &universe);
        assert_eq!(step.selection, FilterSelection::All);
    }

    #[test]
    fn toggling_all_flips_between_all_and_empty() {
        let universe = universe(&[1, 2]);
        let cleared = toggle(&FilterSelection::All, ToggleTarget::All, &universe);
        assert_eq!(cleared.selection, only(&[]));
        let restored = toggle(&only(&[2]), ToggleTarget::All, &universe);
        assert_eq!(restored.selection, FilterSelection::All);
    }

    #[test]
    fn empty_universe_only_reaches_all() {
        let universe = BTreeSet::new();
        let step = toggle(&FilterSelection::All, ToggleTarget::All, &universe);
        assert_eq!(step.selection, FilterSelection::All);
        let step = toggle(&step.selection, ToggleTarget::Assignment(1), &universe);
        assert_eq!(step.selection, FilterSelection::All);
        assert_eq!(step.warning, Some(UnknownAssignmentWarning(1)));
    }

    #[test]
    fn unknown_assignment_is_a_no_op_with_warning() {
        let universe = universe(&[1, 2, 3]);
        let step = toggle(&only(&[1]), ToggleTarget::Assignment(9), &universe);
        assert_eq!(step.selection, only(&[1]));
        assert_eq!(step.warning, Some(UnknownAssignmentWarning(9)));
    }

    #[test]
    fn only_drops_unknown_ids_and_normalizes() {
        let universe = universe(&[1, 2]);
        assert_eq!(FilterSelection::only([2, 7], &universe), only(&[2]));
        assert_eq!(FilterSelection::only([1, 2], &universe), FilterSelection::All);
    }

    #[test]
    fn parses_toggle_targets() {
        assert_eq!("ALL".parse::<ToggleTarget>(), Ok(ToggleTarget::All));
        assert_eq!("4".parse::<ToggleTarget>(), Ok(ToggleTarget::Assignment(4)));
        assert!("four".parse::<ToggleTarget>().is_err());
    }

    #[test]
    fn displays_selection() {
        assert_eq!(FilterSelection::All.to_string(), "all");
        assert_eq!(only(&[3, 1]).to_string(), "{1, 3}");
    }

    fn arb_target() -> impl Strategy<Value = ToggleTarget> {
        prop_oneof![
            1 => Just(ToggleTarget::All),
            6 => (0u32..8).prop_map(ToggleTarget::Assignment),
        ]
    }

    proptest! {
        #[test]
        fn never_stores_the_full_universe_explicitly(
            size in 0u32..6,
            targets in proptest::collection::vec(arb_target(), 0..40),
        ) {
            let universe = (1..=size).collect::<BTreeSet<_>>();
            let mut selection = FilterSelection::All;
            for target in targets {
                selection = toggle(&selection, target, &universe).selection;
                if let FilterSelection::Only(ids) = &selection {
                    prop_assert!(ids != &universe);
                    prop_assert!(ids.is_subset(&universe));
                }
            }
        }
    }
}
