//! Square quadtree over node positions for many-body charge.
//!
//! Every cell carries the unit mass and centroid of the points below it.
//! Leaves hold one point, every point that shares its coordinates, or
//! whatever is left once the depth cap is reached.

use emath::{Vec2, vec2};

const MAX_DEPTH: u32 = 32;

pub(super) enum CellKind {
    Leaf(Vec<usize>),
    Branch(Box<[Option<QuadCell>; 4]>),
}

pub(super) struct QuadCell {
    /// Corner with the smallest coordinates.
    pub(super) origin: Vec2,
    pub(super) width: f32,
    pub(super) mass: f32,
    pub(super) center_of_mass: Vec2,
    pub(super) kind: CellKind,
}

impl QuadCell {
    /// Root cell covering `positions`, or `None` when there is nothing finite to cover.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let (min, max) = extent(positions)?;
        let width = (max.x - min.x).max(max.y - min.y).max(1.0);
        let indices = (0..positions.len()).collect();
        Some(Self::build_cell(min, width, indices, positions, 0))
    }

    fn build_cell(
        origin: Vec2,
        width: f32,
        indices: Vec<usize>,
        positions: &[Vec2],
        depth: u32,
    ) -> Self {
        let mass = indices.len() as f32;
        let center_of_mass = indices
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
            / mass;

        let first = positions[indices[0]];
        let coincident = indices.iter().all(|&index| positions[index] == first);
        if coincident || depth >= MAX_DEPTH {
            return Self {
                origin,
                width,
                mass,
                center_of_mass,
                kind: CellKind::Leaf(indices),
            };
        }

        let half = width * 0.5;
        let middle = origin + vec2(half, half);
        let mut buckets: [Vec<usize>; 4] = Default::default();
        for index in indices {
            let point = positions[index];
            let quadrant =
                usize::from(point.x >= middle.x) | (usize::from(point.y >= middle.y) << 1);
            buckets[quadrant].push(index);
        }

        let children = std::array::from_fn(|quadrant| {
            let bucket = std::mem::take(&mut buckets[quadrant]);
            (!bucket.is_empty()).then(|| {
                let corner = vec2(
                    if quadrant & 1 == 0 { origin.x } else { middle.x },
                    if quadrant & 2 == 0 { origin.y } else { middle.y },
                );
                Self::build_cell(corner, half, bucket, positions, depth + 1)
            })
        });

        Self {
            origin,
            width,
            mass,
            center_of_mass,
            kind: CellKind::Branch(Box::new(children)),
        }
    }

    pub(super) fn covers(&self, point: Vec2) -> bool {
        let corner = self.origin + vec2(self.width, self.width);
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x <= corner.x
            && point.y <= corner.y
    }
}

fn extent(positions: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let (first, rest) = positions.split_first()?;
    if positions.iter().any(|point| !point.is_finite()) {
        return None;
    }
    Some(rest.iter().fold((*first, *first), |(min, max), point| {
        (min.min(*point), max.max(*point))
    }))
}
