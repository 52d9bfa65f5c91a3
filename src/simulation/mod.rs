//! Force-directed layout engine.
//!
//! A run owns private copies of its nodes and links. Each [`Simulation::tick`]
//! applies charge, link and centering forces scaled by `alpha`, integrates
//! velocities with decay, and cools `alpha` toward `alpha_target`. The run is
//! `Cooled` once `alpha` drops below `alpha_min` with a zero target, and a drag
//! reheats it.

mod config;
mod forces;
mod quadtree;
mod seed;

use std::collections::{HashMap, HashSet};

use emath::{Vec2, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{DataIntegrityError, PreconditionViolation, SimulationError};
use crate::graph::{Interaction, NodeId};

pub use config::SimulationConfig;
use forces::{
    ActiveLink, ChargeParams, accumulate_center_forces, accumulate_charge_exact,
    accumulate_charge_for_node, accumulate_link_forces,
};
use quadtree::QuadCell;
use seed::seed_positions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Cooled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationState {
    pub alpha: f32,
    pub alpha_target: f32,
    pub tick_count: u64,
}

impl SimulationState {
    fn fresh() -> Self {
        Self {
            alpha: 1.0,
            alpha_target: 0.0,
            tick_count: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimulationEvent {
    Started { nodes: usize, links: usize },
    Ticked(SimulationState),
    Cooled(SimulationState),
    Stopped(SimulationState),
}

pub type SimulationListener = Box<dyn FnMut(&SimulationEvent) + Send>;

/// Read-only view of one node at the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub cooled: bool,
}

#[derive(Clone, Debug)]
struct SimNode {
    id: NodeId,
    position: Vec2,
    velocity: Vec2,
    pinned: Option<Vec2>,
    dragging: bool,
}

struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

struct Run {
    state: SimulationState,
    phase: Phase,
    nodes: Vec<SimNode>,
    links: Vec<ActiveLink>,
    index_by_id: HashMap<NodeId, usize>,
    scratch: PhysicsScratch,
}

impl Run {
    fn step(&mut self, config: &SimulationConfig) {
        let Self {
            state,
            phase,
            nodes,
            links,
            scratch,
            ..
        } = self;

        let node_count = nodes.len();
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.positions.extend(nodes.iter().map(|node| node.position));

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;
        let charge = ChargeParams {
            strength: config.charge_strength,
            distance_min_sq: config.charge_distance_min * config.charge_distance_min,
            theta: config.theta,
        };

        if node_count > config.barnes_hut_threshold {
            if let Some(tree) = QuadCell::build(positions) {
                for (index, force) in forces.iter_mut().enumerate() {
                    accumulate_charge_for_node(&tree, index, positions, charge, force);
                }
            }
        } else {
            accumulate_charge_exact(positions, charge, forces);
        }
        accumulate_link_forces(links, positions, config.link_distance, forces);
        accumulate_center_forces(positions, config.center, config.center_strength, forces);

        let retained = 1.0 - config.velocity_decay;
        for (node, force) in nodes.iter_mut().zip(forces.iter()) {
            if let Some(pin) = node.pinned {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }
            node.velocity = (node.velocity + *force * state.alpha) * retained;
            node.position += node.velocity;
        }

        state.alpha += (state.alpha_target - state.alpha) * config.alpha_decay;
        state.tick_count += 1;
        if state.alpha < config.alpha_min && state.alpha_target == 0.0 {
            *phase = Phase::Cooled;
        }
    }

    fn node_index(&self, id: NodeId) -> Result<usize, PreconditionViolation> {
        self.index_by_id
            .get(&id)
            .copied()
            .ok_or(PreconditionViolation::UnknownNode(id))
    }

    fn any_dragging(&self) -> bool {
        self.nodes.iter().any(|node| node.dragging)
    }
}

/// Force simulation over one active node and link set at a time.
pub struct Simulation {
    config: SimulationConfig,
    run: Option<Run>,
    listener: Option<SimulationListener>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            config,
            run: None,
            listener: None,
        })
    }

    /// Engine that reports lifecycle events to `listener`.
    pub fn with_listener(
        config: SimulationConfig,
        listener: SimulationListener,
    ) -> Result<Self, SimulationError> {
        let mut simulation = Self::new(config)?;
        simulation.listener = Some(listener);
        Ok(simulation)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.run.as_ref().map_or(Phase::Idle, |run| run.phase)
    }

    pub fn state(&self) -> Option<SimulationState> {
        self.run.as_ref().map(|run| run.state)
    }

    fn emit(&mut self, event: SimulationEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
    }

    /// Starts a new run over `node_ids` and `edges`, replacing any current run.
    ///
    /// Nodes that were part of the previous run keep their last position;
    /// every other node is placed on a seeded spiral. Velocities, pins and
    /// the cooling state always start fresh.
    pub fn start(
        &mut self,
        node_ids: &[NodeId],
        edges: &[Interaction],
    ) -> Result<(), SimulationError> {
        if node_ids.is_empty() {
            return Err(PreconditionViolation::EmptyNodeSet.into());
        }

        let mut index_by_id = HashMap::with_capacity(node_ids.len());
        for (index, &id) in node_ids.iter().enumerate() {
            if index_by_id.insert(id, index).is_some() {
                return Err(DataIntegrityError::DuplicateNode { index, id }.into());
            }
        }

        let mut degrees = vec![0usize; node_ids.len()];
        let mut endpoints = Vec::with_capacity(edges.len());
        for (index, edge) in edges.iter().enumerate() {
            let source = *index_by_id
                .get(&edge.source)
                .ok_or(DataIntegrityError::UnknownEndpoint {
                    index,
                    id: edge.source,
                })?;
            let target = *index_by_id
                .get(&edge.target)
                .ok_or(DataIntegrityError::UnknownEndpoint {
                    index,
                    id: edge.target,
                })?;
            if edge.is_self_loop() {
                continue;
            }
            degrees[source] += 1;
            degrees[target] += 1;
            endpoints.push((source, target));
        }

        let links = endpoints
            .into_iter()
            .map(|(source, target)| {
                ActiveLink::from_degrees(source, target, &degrees, self.config.link_strength)
            })
            .collect::<Vec<_>>();

        let prior = self
            .run
            .as_ref()
            .map(|run| {
                run.nodes
                    .iter()
                    .map(|node| (node.id, node.position))
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let positions = seed_positions(node_ids, &prior, &mut rng);

        let nodes = node_ids
            .iter()
            .zip(positions)
            .map(|(&id, position)| SimNode {
                id,
                position,
                velocity: Vec2::ZERO,
                pinned: None,
                dragging: false,
            })
            .collect::<Vec<_>>();

        self.stop();

        let node_count = nodes.len();
        let link_count = links.len();
        self.run = Some(Run {
            state: SimulationState::fresh(),
            phase: Phase::Running,
            nodes,
            links,
            index_by_id,
            scratch: PhysicsScratch {
                forces: Vec::with_capacity(node_count),
                positions: Vec::with_capacity(node_count),
            },
        });

        debug!(
            nodes = node_count,
            links = link_count,
            warm = prior.len(),
            "simulation run started"
        );
        self.emit(SimulationEvent::Started {
            nodes: node_count,
            links: link_count,
        });
        Ok(())
    }

    /// Advances the run by one tick. A cooled run is left untouched.
    pub fn tick(&mut self) -> Result<Phase, PreconditionViolation> {
        let config = self.config;
        let run = self.run.as_mut().ok_or(PreconditionViolation::NotRunning)?;
        if run.phase == Phase::Cooled {
            return Ok(Phase::Cooled);
        }

        run.step(&config);
        let state = run.state;
        let phase = run.phase;
        trace!(tick = state.tick_count, alpha = state.alpha, "simulation tick");

        self.emit(SimulationEvent::Ticked(state));
        if phase == Phase::Cooled {
            debug!(ticks = state.tick_count, "simulation cooled");
            self.emit(SimulationEvent::Cooled(state));
        }
        Ok(phase)
    }

    /// Ticks until the run cools, or until `max_ticks` more ticks have run.
    pub fn run_to_convergence(
        &mut self,
        max_ticks: Option<u64>,
    ) -> Result<RunSummary, PreconditionViolation> {
        let mut ticks = 0u64;
        loop {
            if self.phase() == Phase::Cooled {
                break;
            }
            if max_ticks.is_some_and(|limit| ticks >= limit) {
                break;
            }
            self.tick()?;
            ticks += 1;
        }

        Ok(RunSummary {
            ticks,
            cooled: self.phase() == Phase::Cooled,
        })
    }

    /// Discards the current run. Returns `false` when there was none.
    pub fn stop(&mut self) -> bool {
        let Some(run) = self.run.take() else {
            return false;
        };
        debug!(ticks = run.state.tick_count, "simulation run stopped");
        self.emit(SimulationEvent::Stopped(run.state));
        true
    }

    /// Sets the value `alpha` cools toward. A positive target wakes a cooled run.
    pub fn set_alpha_target(&mut self, target: f32) -> Result<(), PreconditionViolation> {
        if !target.is_finite() {
            return Err(PreconditionViolation::NonFiniteAlphaTarget(target));
        }
        let run = self.run.as_mut().ok_or(PreconditionViolation::NotRunning)?;
        run.state.alpha_target = target.clamp(0.0, 1.0);
        if run.state.alpha_target > 0.0 && run.phase == Phase::Cooled {
            run.phase = Phase::Running;
            debug!(alpha_target = run.state.alpha_target, "simulation reheated");
        }
        Ok(())
    }

    /// Pins `id` at its current position and reheats the run if no other drag is active.
    pub fn drag_start(&mut self, id: NodeId) -> Result<(), PreconditionViolation> {
        let reheat = self.config.alpha_reheat;
        let run = self.run.as_mut().ok_or(PreconditionViolation::NotRunning)?;
        let index = run.node_index(id)?;

        if !run.any_dragging() {
            run.state.alpha_target = reheat;
            if run.phase == Phase::Cooled {
                run.phase = Phase::Running;
                debug!(node = id, "simulation reheated by drag");
            }
        }

        let node = &mut run.nodes[index];
        node.dragging = true;
        node.pinned = Some(node.position);
        Ok(())
    }

    pub fn drag_move(&mut self, id: NodeId, x: f32, y: f32) -> Result<(), PreconditionViolation> {
        if !x.is_finite() || !y.is_finite() {
            return Err(PreconditionViolation::NonFinitePosition { id, x, y });
        }

        let run = self.run.as_mut().ok_or(PreconditionViolation::NotRunning)?;
        let index = run.node_index(id)?;
        let node = &mut run.nodes[index];
        if !node.dragging {
            return Err(PreconditionViolation::NotDragging(id));
        }
        node.pinned = Some(vec2(x, y));
        Ok(())
    }

    /// Releases `id`; cooling resumes once no drag remains.
    pub fn drag_end(&mut self, id: NodeId) -> Result<(), PreconditionViolation> {
        let run = self.run.as_mut().ok_or(PreconditionViolation::NotRunning)?;
        let index = run.node_index(id)?;
        let node = &mut run.nodes[index];
        if !node.dragging {
            return Err(PreconditionViolation::NotDragging(id));
        }
        node.dragging = false;
        node.pinned = None;

        if !run.any_dragging() {
            run.state.alpha_target = 0.0;
        }
        Ok(())
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        let run = self.run.as_ref()?;
        let index = *run.index_by_id.get(&id)?;
        Some(run.nodes[index].position)
    }

    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.run
            .as_ref()
            .map(|run| {
                run.nodes
                    .iter()
                    .map(|node| NodeSnapshot {
                        id: node.id,
                        position: node.position,
                        velocity: node.velocity,
                        pinned: node.pinned.is_some(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sum of squared node speeds in the current run.
    pub fn kinetic_energy(&self) -> Option<f32> {
        self.run.as_ref().map(|run| {
            run.nodes
                .iter()
                .map(|node| node.velocity.length_sq())
                .sum()
        })
    }

    pub fn dragged_nodes(&self) -> HashSet<NodeId> {
        self.run
            .as_ref()
            .map(|run| {
                run.nodes
                    .iter()
                    .filter(|node| node.dragging)
                    .map(|node| node.id)
                    .collect()
            })
            .unwrap_or_default()
    }
}
