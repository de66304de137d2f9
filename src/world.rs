use glam::Vec2;
use log::{error, warn};

use crate::collision::{ContinuousSolver, DiscreteSolver, SpatialGrid};
use crate::config::{ResolutionMode, SimConfig};
use crate::core::{Body, BodyId, Bounds, Rgba};
use crate::dynamics::Integrator;
#[cfg(feature = "parallel")]
use crate::dynamics::ParallelDispatcher;
use crate::emitter::Emitter;
use crate::error::Result;
use crate::utils::{Arena, ScopedTimer};

/// Per-frame debug counters surfaced to the external stats overlay.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimStats {
    pub bodies: usize,
    pub pairs_checked: u64,
    pub overlaps_resolved: u64,
    pub events_processed: u64,
    pub stale_events_discarded: u64,
}

/// Central simulation container orchestrating all subsystems.
///
/// Owns the body population, the collision grid, both resolvers, the
/// emitters, and the per-frame update order: spawn, integrate, partition,
/// resolve, settle. The external renderer reads the resolved body states
/// through [`Simulation::bodies`].
pub struct Simulation {
    config: SimConfig,
    bounds: Bounds,
    bodies: Arena<Body>,
    grid: SpatialGrid,
    integrator: Integrator,
    discrete: DiscreteSolver,
    continuous: ContinuousSolver,
    #[cfg(feature = "parallel")]
    dispatcher: ParallelDispatcher,
    parallel_enabled: bool,
    emitters: Vec<Emitter>,
    /// Monotonic spawn counter; doubles as the hue seed so every spawned
    /// body gets a distinct wheel color.
    spawned: u32,
    stats: SimStats,
}

impl Simulation {
    /// Builds a simulation over a `width x height` area with default
    /// configuration.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        Self::with_config(width, height, SimConfig::default())
    }

    /// Builds a simulation with an explicit configuration, failing fast on
    /// capacity or size misconfiguration.
    pub fn with_config(width: u16, height: u16, config: SimConfig) -> Result<Self> {
        config.validate(width, height)?;

        let bounds = Bounds::new(width, height, config.frame_margin);
        let grid = SpatialGrid::new(
            bounds.width,
            bounds.height,
            config.cell_size,
            config.max_cell_occupancy,
        );
        let mut integrator = Integrator::new(
            Vec2::from_array(config.gravity),
            config.rest_epsilon,
            config.max_speed(),
        );
        let parallel_enabled = cfg!(feature = "parallel");
        integrator.set_parallel(parallel_enabled);

        let emitters = (0..config.emitter_count)
            .map(|i| {
                Emitter::new(
                    Vec2::from_array(config.emitter_position)
                        + Vec2::from_array(config.emitter_offset) * i as f32,
                    Vec2::from_array(config.emitter_direction),
                    config.exit_speed,
                    config.refractory_period,
                )
            })
            .collect();

        Ok(Self {
            bounds,
            grid,
            integrator,
            discrete: DiscreteSolver::new(config.collision_iterations, config.elasticity),
            continuous: ContinuousSolver::new(config.elasticity),
            #[cfg(feature = "parallel")]
            dispatcher: ParallelDispatcher::new(config.partitions),
            parallel_enabled,
            emitters,
            spawned: 0,
            stats: SimStats::default(),
            bodies: Arena::new(),
            config,
        })
    }

    /// Advances the simulation by one frame.
    ///
    /// `dt` is clamped to the configured maximum step so frame-rate spikes
    /// cannot destabilize the integration. Resolution faults inside the
    /// frame are logged and recovered by clamping; they never escape here.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.min(self.config.max_time_step);
        let _frame = ScopedTimer::new("sim::update");

        self.stats = SimStats::default();

        if self.bodies.len() >= self.config.max_bodies {
            for emitter in &mut self.emitters {
                emitter.stop();
            }
        }

        let spawns: Vec<_> = self
            .emitters
            .iter_mut()
            .filter_map(|emitter| emitter.update(dt))
            .collect();
        for (position, velocity) in spawns {
            self.spawn(position, velocity);
        }

        match self.config.mode {
            ResolutionMode::Discrete => self.update_discrete(dt),
            ResolutionMode::Continuous => self.update_continuous(dt),
        }

        self.stats.bodies = self.bodies.len();
    }

    fn update_discrete(&mut self, dt: f32) {
        {
            let _timer = ScopedTimer::new("integrate");
            self.integrator
                .step(&mut self.bodies, dt, &self.bounds, self.config.elasticity);
        }

        let _timer = ScopedTimer::new(if self.parallel_enabled {
            "resolve::parallel"
        } else {
            "resolve::sequential"
        });
        for _ in 0..self.config.collision_iterations {
            self.discrete
                .rebuild(&mut self.grid, &mut self.bodies, &self.bounds);
            let pass = self.run_sweep();
            self.stats.pairs_checked += pass.pairs_checked;
            self.stats.overlaps_resolved += pass.overlaps_resolved;
        }
    }

    #[cfg(feature = "parallel")]
    fn run_sweep(&mut self) -> crate::collision::PassStats {
        if self.parallel_enabled {
            self.dispatcher
                .dispatch(&self.discrete, &self.grid, &mut self.bodies, &self.bounds)
        } else {
            self.discrete.sweep_columns(
                &self.grid,
                &mut self.bodies,
                &self.bounds,
                self.grid.interior_cols(),
            )
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_sweep(&mut self) -> crate::collision::PassStats {
        self.discrete.sweep_columns(
            &self.grid,
            &mut self.bodies,
            &self.bounds,
            self.grid.interior_cols(),
        )
    }

    fn update_continuous(&mut self, dt: f32) {
        {
            let _timer = ScopedTimer::new("integrate::velocities");
            self.integrator.step_velocities(&mut self.bodies, dt);
        }
        let _timer = ScopedTimer::new("resolve::events");
        let events =
            self.continuous
                .resolve(&mut self.grid, &mut self.bodies, &self.bounds, dt);
        self.stats.events_processed += events.processed;
        self.stats.stale_events_discarded += events.stale_discarded;
    }

    fn spawn(&mut self, position: Vec2, velocity: Vec2) {
        let color = Rgba::from_hue(self.spawned);
        self.spawned = self.spawned.wrapping_add(1);
        let body = Body::new(
            position,
            self.config.body_radius,
            velocity,
            self.config.density,
            color,
        );
        self.register(body);
    }

    /// Adds an externally constructed body to the population.
    pub fn add_body(&mut self, position: Vec2, radius: f32, velocity: Vec2) -> BodyId {
        let color = Rgba::from_hue(self.spawned);
        self.spawned = self.spawned.wrapping_add(1);
        self.register(Body::new(
            position,
            radius,
            velocity,
            self.config.density,
            color,
        ))
    }

    fn register(&mut self, body: Body) -> BodyId {
        let position = body.position;
        let id = self.bodies.insert(body);
        // The discrete mode rebuilds memberships every pass; the continuous
        // mode maintains them incrementally, so new bodies register now.
        if self.config.mode == ResolutionMode::Continuous {
            if let Err(e) = self.grid.insert(id, position) {
                warn!("spawn insert failed ({e}); clamping into bounds");
                if let Some(body) = self.bodies.get_mut(id) {
                    body.enforce_bounds(&self.bounds, self.config.elasticity);
                    let clamped = body.position;
                    if let Err(e) = self.grid.insert(id, clamped) {
                        error!("spawn insert failed after clamp for {id:?}: {e}");
                    }
                }
            }
        }
        id
    }

    /// Switches the collision resolution strategy. The two modes are
    /// mutually exclusive; switching mid-run re-seats the grid memberships
    /// the incoming mode expects.
    pub fn set_resolution_mode(&mut self, mode: ResolutionMode) {
        if self.config.mode == mode {
            return;
        }
        self.config.mode = mode;
        if mode == ResolutionMode::Continuous {
            self.discrete
                .rebuild(&mut self.grid, &mut self.bodies, &self.bounds);
        }
    }

    pub fn resolution_mode(&self) -> ResolutionMode {
        self.config.mode
    }

    /// Enables or disables the parallel sweep and integration paths.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled && cfg!(feature = "parallel");
        self.integrator.set_parallel(self.parallel_enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    /// Starts or stops every emitter.
    pub fn set_emitters_active(&mut self, active: bool) {
        for emitter in &mut self.emitters {
            if active {
                emitter.start();
            } else {
                emitter.stop();
            }
        }
    }

    pub fn add_emitter(&mut self, emitter: Emitter) {
        self.emitters.push(emitter);
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    /// Read-only snapshot of the population for rendering.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Total kinetic energy of the population (diagnostic).
    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}
