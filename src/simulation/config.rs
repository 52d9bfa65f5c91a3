use emath::Vec2;

use crate::error::SimulationError;

const DEFAULT_COOLING_TICKS: u32 = 300;
const DEFAULT_ALPHA_MIN: f32 = 0.001;

/// Tuning for one simulation instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Many-body strength; negative values repel.
    pub charge_strength: f32,
    /// Distances below this are clamped when computing charge.
    pub charge_distance_min: f32,
    /// Barnes-Hut opening angle.
    pub theta: f32,
    /// Node count above which charge switches from exact pairs to the quadtree.
    pub barnes_hut_threshold: usize,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center: Vec2,
    pub center_strength: f32,
    /// Fraction of velocity removed each tick.
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    /// Alpha target while a drag is in progress.
    pub alpha_reheat: f32,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge_strength: -30.0,
            charge_distance_min: 1.0,
            theta: 0.9,
            barnes_hut_threshold: 256,
            link_distance: 30.0,
            link_strength: 1.0,
            center: Vec2::ZERO,
            center_strength: 0.1,
            velocity_decay: 0.4,
            alpha_decay: alpha_decay_for(DEFAULT_COOLING_TICKS, DEFAULT_ALPHA_MIN),
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_reheat: 0.3,
            seed: 0,
        }
    }
}

/// Decay that brings alpha from 1 to `alpha_min` in `ticks` steps.
fn alpha_decay_for(ticks: u32, alpha_min: f32) -> f32 {
    1.0 - alpha_min.powf(1.0 / ticks.max(1) as f32)
}

impl SimulationConfig {
    pub fn with_cooling_ticks(mut self, ticks: u32) -> Self {
        self.alpha_decay = alpha_decay_for(ticks, self.alpha_min);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let checks: [(&'static str, f32, bool); 10] = [
            ("charge_strength", self.charge_strength, true),
            (
                "charge_distance_min",
                self.charge_distance_min,
                self.charge_distance_min >= 0.0,
            ),
            ("theta", self.theta, self.theta >= 0.0),
            ("link_distance", self.link_distance, self.link_distance >= 0.0),
            ("link_strength", self.link_strength, self.link_strength >= 0.0),
            ("center_strength", self.center_strength, self.center_strength >= 0.0),
            (
                "velocity_decay",
                self.velocity_decay,
                (0.0..=1.0).contains(&self.velocity_decay),
            ),
            (
                "alpha_decay",
                self.alpha_decay,
                self.alpha_decay > 0.0 && self.alpha_decay <= 1.0,
            ),
            (
                "alpha_min",
                self.alpha_min,
                self.alpha_min > 0.0 && self.alpha_min < 1.0,
            ),
            (
                "alpha_reheat",
                self.alpha_reheat,
                (0.0..=1.0).contains(&self.alpha_reheat),
            ),
        ];

        for (field, value, in_range) in checks {
            if !value.is_finite() || !in_range {
                return Err(SimulationError::InvalidConfig { field, value });
            }
        }

        if !self.center.is_finite() {
            return Err(SimulationError::InvalidConfig {
                field: "center",
                value: if self.center.x.is_finite() {
                    self.center.y
                } else {
                    self.center.x
                },
            });
        }

        Ok(())
    }
}
