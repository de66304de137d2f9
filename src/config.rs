//! Default constants and the runtime configuration for the disc sandbox.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default gravity vector (screen coordinates, Y grows downward).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, 45.0];

/// Default restitution scalar applied to collision impulses and wall rebounds.
pub const DEFAULT_ELASTICITY: f32 = 0.6;

/// Default disc radius for spawned bodies.
pub const DEFAULT_BODY_RADIUS: f32 = 4.0;

/// Density constant; mass is derived as `density * radius^2`.
pub const DEFAULT_DENSITY: f32 = 2.0;

/// Number of full discrete resolution passes per frame.
///
/// One pass does not settle stacks of three or more discs; repetition
/// relaxes the system toward a non-overlapping state. Raising this trades
/// throughput for settling quality.
pub const DEFAULT_COLLISION_ITERATIONS: u32 = 5;

/// Upper clamp applied to `dt` to keep frame-rate spikes from destabilizing
/// the integration.
pub const DEFAULT_MAX_TIME_STEP: f32 = 1.0 / 60.0;

/// Border margin kept between bodies and the simulation extents.
pub const DEFAULT_FRAME_MARGIN: f32 = 4.0;

/// Bounded per-cell membership capacity.
pub const DEFAULT_MAX_CELL_OCCUPANCY: usize = 16;

/// Population cap; emitters are stopped once this many bodies exist.
pub const DEFAULT_MAX_BODIES: usize = 2048;

/// Seconds between consecutive spawns of one emitter.
pub const DEFAULT_REFRACTORY_PERIOD: f32 = 0.085;

/// Speed assigned to freshly spawned bodies.
pub const DEFAULT_EXIT_SPEED: f32 = 160.0;

/// Speeds below this snap to zero during integration.
pub const DEFAULT_REST_EPSILON: f32 = 0.01;

/// Number of column partitions used by the parallel dispatcher.
pub const DEFAULT_PARTITIONS: usize = 4;

/// Default number of emitters installed at construction.
pub const DEFAULT_EMITTER_COUNT: usize = 5;

/// Collision resolution strategy for a [`crate::world::Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionMode {
    /// Per-frame iterative position projection and impulse passes.
    #[default]
    Discrete,
    /// Time-of-impact events processed in order from a priority queue.
    Continuous,
}

/// Tunable parameters validated once at simulation construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub gravity: [f32; 2],
    pub elasticity: f32,
    pub body_radius: f32,
    pub density: f32,
    /// Grid cell edge length; must be at least twice the body diameter so a
    /// 3x3 neighborhood covers every possible contact.
    pub cell_size: f32,
    pub collision_iterations: u32,
    pub max_time_step: f32,
    pub frame_margin: f32,
    pub max_cell_occupancy: usize,
    pub max_bodies: usize,
    pub refractory_period: f32,
    pub exit_speed: f32,
    /// Speed cap applied during integration, expressed as a multiple of
    /// `exit_speed`.
    pub max_speed_factor: f32,
    pub rest_epsilon: f32,
    pub partitions: usize,
    pub emitter_count: usize,
    pub emitter_position: [f32; 2],
    pub emitter_direction: [f32; 2],
    /// Per-emitter placement offset, scaled by the emitter's index.
    pub emitter_offset: [f32; 2],
    pub mode: ResolutionMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            elasticity: DEFAULT_ELASTICITY,
            body_radius: DEFAULT_BODY_RADIUS,
            density: DEFAULT_DENSITY,
            cell_size: 4.0 * DEFAULT_BODY_RADIUS,
            collision_iterations: DEFAULT_COLLISION_ITERATIONS,
            max_time_step: DEFAULT_MAX_TIME_STEP,
            frame_margin: DEFAULT_FRAME_MARGIN,
            max_cell_occupancy: DEFAULT_MAX_CELL_OCCUPANCY,
            max_bodies: DEFAULT_MAX_BODIES,
            refractory_period: DEFAULT_REFRACTORY_PERIOD,
            exit_speed: DEFAULT_EXIT_SPEED,
            max_speed_factor: 3.5,
            rest_epsilon: DEFAULT_REST_EPSILON,
            partitions: DEFAULT_PARTITIONS,
            emitter_count: DEFAULT_EMITTER_COUNT,
            emitter_position: [75.0, 75.0],
            emitter_direction: [1.0, 0.0],
            emitter_offset: [-2.0 * DEFAULT_BODY_RADIUS, 2.0 * DEFAULT_BODY_RADIUS + 2.0],
            mode: ResolutionMode::Discrete,
        }
    }
}

impl SimConfig {
    /// Derived mass for a disc of the configured density.
    pub fn mass_for_radius(&self, radius: f32) -> f32 {
        self.density * radius * radius
    }

    /// Speed cap in world units per second.
    pub fn max_speed(&self) -> f32 {
        self.max_speed_factor * self.exit_speed
    }

    /// Fails fast on capacity or size misconfiguration before the first frame.
    pub fn validate(&self, width: u16, height: u16) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(
                "simulation extents must be non-zero".into(),
            ));
        }
        if !(self.body_radius.is_finite() && self.body_radius > 0.0) {
            return Err(Error::InvalidConfig(
                "body_radius must be finite and > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.elasticity) {
            return Err(Error::InvalidConfig("elasticity must lie in [0, 1]".into()));
        }
        let diameter = 2.0 * self.body_radius;
        if self.cell_size < 2.0 * diameter {
            return Err(Error::InvalidConfig(format!(
                "cell_size {} is below twice the body diameter {}",
                self.cell_size, diameter
            )));
        }
        // Worst-case packing of one cell plus its partial overlap ring; the
        // cap must accommodate it or a legal frame could overflow a cell.
        let per_axis = (self.cell_size / diameter).ceil() + 1.0;
        let packing_bound = (per_axis * per_axis) as usize;
        if self.max_cell_occupancy < packing_bound {
            return Err(Error::InvalidConfig(format!(
                "max_cell_occupancy {} cannot hold the packing bound {} for cell_size {}",
                self.max_cell_occupancy, packing_bound, self.cell_size
            )));
        }
        if self.collision_iterations == 0 {
            return Err(Error::InvalidConfig(
                "collision_iterations must be >= 1".into(),
            ));
        }
        if self.max_time_step <= 0.0 {
            return Err(Error::InvalidConfig("max_time_step must be > 0".into()));
        }
        if self.refractory_period <= 0.0 {
            return Err(Error::InvalidConfig("refractory_period must be > 0".into()));
        }
        if self.partitions == 0 {
            return Err(Error::InvalidConfig("partitions must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = SimConfig::default();
        assert!(config.validate(800, 700).is_ok());
    }

    #[test]
    fn undersized_cells_are_rejected() {
        let config = SimConfig {
            cell_size: DEFAULT_BODY_RADIUS * 3.0,
            ..SimConfig::default()
        };
        let err = config.validate(800, 700).unwrap_err();
        assert!(format!("{err}").contains("cell_size"));
    }

    #[test]
    fn occupancy_cap_must_cover_packing() {
        let config = SimConfig {
            max_cell_occupancy: 2,
            ..SimConfig::default()
        };
        assert!(config.validate(800, 700).is_err());
    }

    #[test]
    fn zero_extents_fail_fast() {
        assert!(SimConfig::default().validate(0, 700).is_err());
    }

    #[test]
    fn mass_tracks_density_and_radius() {
        let config = SimConfig::default();
        assert_eq!(config.mass_for_radius(4.0), 2.0 * 16.0);
    }
}
