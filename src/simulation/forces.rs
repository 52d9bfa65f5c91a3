use emath::{Vec2, vec2};

use super::quadtree::{CellKind, QuadCell};

const COINCIDENT_EPSILON_SQ: f32 = 1e-12;
const COINCIDENT_OFFSET: f32 = 1e-3;

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) theta: f32,
}

/// Spring between two node slots, with degree-derived strength and bias.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ActiveLink {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    /// Share of the correction applied to `target`.
    pub(super) bias: f32,
}

impl ActiveLink {
    pub(super) fn from_degrees(
        source: usize,
        target: usize,
        degrees: &[usize],
        link_strength: f32,
    ) -> Self {
        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        Self {
            source,
            target,
            strength: link_strength / source_degree.min(target_degree),
            bias: source_degree / (source_degree + target_degree),
        }
    }
}

/// Unit direction used when two points coincide. Antisymmetric in `(from, to)`.
fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let (low, high) = if from < to { (from, to) } else { (to, from) };
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214) * std::f32::consts::TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if from < to { direction } else { -direction }
}

/// Offset from `from` to `to`, never zero.
fn separation(positions: &[Vec2], from: usize, to: usize) -> Vec2 {
    let delta = positions[to] - positions[from];
    if delta.length_sq() > COINCIDENT_EPSILON_SQ {
        delta
    } else {
        fallback_direction(from, to) * COINCIDENT_OFFSET
    }
}

/// Charge felt at a point from `mass` located `delta` away.
fn charge_contribution(delta: Vec2, mass: f32, params: ChargeParams) -> Vec2 {
    let mut distance_sq = delta.length_sq();
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (params.strength * mass / distance_sq)
}

pub(super) fn accumulate_charge_exact(
    positions: &[Vec2],
    params: ChargeParams,
    forces: &mut [Vec2],
) {
    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            let force = charge_contribution(separation(positions, from, to), 1.0, params);
            forces[from] += force;
            forces[to] -= force;
        }
    }
}

/// Barnes-Hut charge on `index`. A cell that does not hold the point is
/// treated as a single body once `width² / theta²` falls below its squared
/// distance from the point.
pub(super) fn accumulate_charge_for_node(
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    force: &mut Vec2,
) {
    let point = positions[index];
    let delta = cell.center_of_mass - point;
    let far_enough = cell.width * cell.width / (params.theta * params.theta) < delta.length_sq();
    if far_enough && !cell.covers(point) {
        *force += charge_contribution(delta, cell.mass, params);
        return;
    }

    match &cell.kind {
        CellKind::Leaf(indices) => {
            for &other_index in indices {
                if other_index != index {
                    *force +=
                        charge_contribution(separation(positions, index, other_index), 1.0, params);
                }
            }
        }
        CellKind::Branch(children) => {
            for child in children.iter().flatten() {
                accumulate_charge_for_node(child, index, positions, params, force);
            }
        }
    }
}

/// Pulls each link's endpoints toward `distance`, moving the lower-degree end more.
pub(super) fn accumulate_link_forces(
    links: &[ActiveLink],
    positions: &[Vec2],
    distance: f32,
    forces: &mut [Vec2],
) {
    for link in links {
        if link.source == link.target {
            continue;
        }

        let delta = separation(positions, link.source, link.target);
        let length = delta.length();
        let correction = delta * ((length - distance) / length * link.strength);

        forces[link.target] -= correction * link.bias;
        forces[link.source] += correction * (1.0 - link.bias);
    }
}

pub(super) fn accumulate_center_forces(
    positions: &[Vec2],
    center: Vec2,
    strength: f32,
    forces: &mut [Vec2],
) {
    for (force, position) in forces.iter_mut().zip(positions) {
        *force += (center - *position) * strength;
    }
}
