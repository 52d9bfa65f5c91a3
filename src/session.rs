use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::{SimulationError, UnknownAssignmentWarning};
use crate::filter::{DerivedView, FilterSelection, ToggleTarget, toggle};
use crate::graph::{AssignmentId, NodeId, SocialGraph};
use crate::simulation::{Simulation, SimulationConfig, SimulationListener};

/// A loaded graph, its current filter, and the layout run for that filter.
///
/// Every user stays in the layout; only the active edge set follows the
/// selection. Whenever the active edges change the engine is re-seeded.
pub struct Session {
    graph: SocialGraph,
    universe: BTreeSet<AssignmentId>,
    node_ids: Vec<NodeId>,
    view: DerivedView,
    simulation: Simulation,
}

impl Session {
    pub fn new(graph: SocialGraph, config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::from_parts(graph, Simulation::new(config)?)
    }

    pub fn with_listener(
        graph: SocialGraph,
        config: SimulationConfig,
        listener: SimulationListener,
    ) -> Result<Self, SimulationError> {
        Self::from_parts(graph, Simulation::with_listener(config, listener)?)
    }

    fn from_parts(graph: SocialGraph, simulation: Simulation) -> Result<Self, SimulationError> {
        let universe = graph.assignment_universe();
        let node_ids = graph.node_ids().collect::<Vec<_>>();
        let view = DerivedView::derive(&graph, &FilterSelection::All);
        let mut session = Self {
            graph,
            universe,
            node_ids,
            view,
            simulation,
        };
        session.reseed()?;
        Ok(session)
    }

    fn reseed(&mut self) -> Result<(), SimulationError> {
        if self.node_ids.is_empty() {
            self.simulation.stop();
            return Ok(());
        }
        self.simulation.start(&self.node_ids, self.view.active_edges())
    }

    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    pub fn universe(&self) -> &BTreeSet<AssignmentId> {
        &self.universe
    }

    pub fn selection(&self) -> &FilterSelection {
        self.view.selection()
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    /// Replaces the selection and re-derives the view. Returns whether the
    /// active edge set changed and the layout was re-seeded.
    pub fn set_filter_selection(
        &mut self,
        selection: FilterSelection,
    ) -> Result<bool, SimulationError> {
        let selection = match selection {
            FilterSelection::Only(ids) => FilterSelection::only(ids, &self.universe),
            all => all,
        };

        let view = DerivedView::derive(&self.graph, &selection);
        let edges_changed = view.active_edges() != self.view.active_edges();
        debug!(
            %selection,
            active_edges = view.active_edges().len(),
            isolated = view.isolated_nodes().len(),
            edges_changed,
            "filter selection applied"
        );
        self.view = view;

        if edges_changed {
            self.reseed()?;
        }
        Ok(edges_changed)
    }

    /// Toggles one filter entry. Unknown assignments leave everything as is
    /// and come back as a warning.
    pub fn toggle(
        &mut self,
        target: ToggleTarget,
    ) -> Result<Option<UnknownAssignmentWarning>, SimulationError> {
        let toggled = toggle(self.view.selection(), target, &self.universe);
        if let Some(warning) = toggled.warning {
            warn!(%warning, "ignoring filter toggle");
            return Ok(Some(warning));
        }
        self.set_filter_selection(toggled.selection)?;
        Ok(None)
    }
}
