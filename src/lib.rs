//! disc_sandbox – a grid-partitioned 2D disc physics simulator.
//!
//! The crate advances a population of colliding circular bodies under
//! gravity. Collisions resolve through one of two interchangeable
//! strategies: an iterative discrete mode (repeated position projection and
//! impulse passes over a uniform grid) and a continuous mode (time-of-impact
//! events processed in order from a priority queue). The discrete sweep can
//! fan out across a rayon pool, one grid-column partition per worker.
//!
//! Rendering, input, and frame timing live outside this crate; the
//! simulation exposes a read-only body snapshot and debug counters for
//! those layers.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod emitter;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use collision::{ContinuousSolver, DiscreteSolver, SpatialGrid};
pub use config::{ResolutionMode, SimConfig};
pub use crate::core::{Body, BodyId, Bounds, Rgba};
pub use dynamics::Integrator;
pub use emitter::Emitter;
pub use error::{Error, Result};
pub use utils::allocator::{Arena, ArenaIndex};
pub use world::{SimStats, Simulation};

/// High-level convenience wrapper that owns a [`Simulation`].
pub struct SandboxEngine {
    simulation: Simulation,
}

impl SandboxEngine {
    /// Creates an engine over a `width x height` simulation area.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        Ok(Self {
            simulation: Simulation::new(width, height)?,
        })
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_config(width: u16, height: u16, config: SimConfig) -> Result<Self> {
        Ok(Self {
            simulation: Simulation::with_config(width, height, config)?,
        })
    }

    /// Advances the simulation by the provided delta time.
    pub fn step(&mut self, dt: f32) {
        self.simulation.update(dt);
    }

    /// Enables or disables parallel execution of the collision sweep.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.simulation.set_parallel_enabled(enabled);
    }

    /// Starts or stops every emitter.
    pub fn set_emitters_active(&mut self, active: bool) {
        self.simulation.set_emitters_active(active);
    }

    pub fn body_count(&self) -> usize {
        self.simulation.body_count()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }
}
