use std::collections::{HashMap, HashSet};

use emath::{Vec2, vec2};
use rand::Rng;
use rand::rngs::StdRng;

use crate::graph::NodeId;

const INITIAL_RADIUS: f32 = 10.0;
/// π·(3 − √5), the golden angle.
const INITIAL_ANGLE: f32 = 2.399_963_3;
const JITTER: f32 = 1e-3;

/// Phyllotaxis spiral slot `index`, rotated by `rotation` radians.
pub(super) fn spiral_position(index: usize, rotation: f32) -> Vec2 {
    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * INITIAL_ANGLE + rotation;
    vec2(radius * angle.cos(), radius * angle.sin())
}

/// Starting positions for `ids`: the last known position when there is one,
/// otherwise a spiral slot. The returned positions are pairwise distinct.
pub(super) fn seed_positions(
    ids: &[NodeId],
    prior: &HashMap<NodeId, Vec2>,
    rng: &mut StdRng,
) -> Vec<Vec2> {
    let rotation = rng.gen_range(0.0..std::f32::consts::TAU);
    let mut positions = ids
        .iter()
        .enumerate()
        .map(|(index, id)| match prior.get(id) {
            Some(position) if position.is_finite() => *position,
            _ => spiral_position(index, rotation),
        })
        .collect::<Vec<_>>();
    separate_coincident(&mut positions, rng);
    positions
}

/// Nudges repeated positions by a small seeded jitter until every point is unique.
///
/// The jitter starts at a few ulps of the coordinate and doubles after each
/// collision, so large coordinates still move.
pub(super) fn separate_coincident(positions: &mut [Vec2], rng: &mut StdRng) -> usize {
    let mut seen = HashSet::with_capacity(positions.len());
    let mut nudged = 0;
    for position in positions.iter_mut() {
        let magnitude = position.x.abs().max(position.y.abs());
        let mut spread = JITTER.max(magnitude * f32::EPSILON * 4.0);
        while !seen.insert((position.x.to_bits(), position.y.to_bits())) {
            *position += vec2(
                rng.gen_range(-spread..spread),
                rng.gen_range(-spread..spread),
            );
            spread *= 2.0;
            nudged += 1;
        }
    }
    nudged
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn spiral_slots_are_distinct_and_spread() {
        let positions = (0..50)
            .map(|index| spiral_position(index, 0.0))
            .collect::<Vec<_>>();
        for (a, first) in positions.iter().enumerate() {
            for second in &positions[a + 1..] {
                assert!((*first - *second).length() > 1.0);
            }
        }
        assert!((positions[0].length() - INITIAL_RADIUS * 0.5_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn prior_positions_are_kept() {
        let mut rng = StdRng::seed_from_u64(7);
        let prior = HashMap::from([(2, vec2(40.0, -8.0))]);
        let positions = seed_positions(&[1, 2, 3], &prior, &mut rng);
        assert_eq!(positions[1], vec2(40.0, -8.0));
        assert_ne!(positions[0], positions[2]);
    }

    #[test]
    fn same_seed_same_layout() {
        let ids = [1, 2, 3, 4];
        let first = seed_positions(&ids, &HashMap::new(), &mut StdRng::seed_from_u64(3));
        let again = seed_positions(&ids, &HashMap::new(), &mut StdRng::seed_from_u64(3));
        let other = seed_positions(&ids, &HashMap::new(), &mut StdRng::seed_from_u64(4));
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn far_coincident_priors_are_separated() {
        let mut rng = StdRng::seed_from_u64(5);
        let prior = HashMap::from([(1, vec2(1.0e6, 1.0e6)), (2, vec2(1.0e6, 1.0e6))]);
        let positions = seed_positions(&[1, 2], &prior, &mut rng);
        assert_ne!(positions[0], positions[1]);
        assert!((positions[0] - positions[1]).length() < 10.0);
    }

    #[test]
    fn coincident_positions_are_jittered_apart() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut positions = vec![vec2(1.0, 1.0); 4];
        let nudged = separate_coincident(&mut positions, &mut rng);
        assert!(nudged >= 3);
        for (a, first) in positions.iter().enumerate() {
            for second in &positions[a + 1..] {
                assert_ne!(first, second);
                assert!((*first - *second).length() < 0.01);
            }
        }
    }
}
