use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::body::Body;
use crate::core::types::Bounds;
use crate::utils::allocator::Arena;

/// Steps bodies forward in time with semi-implicit Euler.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub gravity: Vec2,
    pub rest_epsilon: f32,
    pub max_speed: f32,
    parallel: bool,
}

impl Integrator {
    pub fn new(gravity: Vec2, rest_epsilon: f32, max_speed: f32) -> Self {
        Self {
            gravity,
            rest_epsilon,
            max_speed,
            parallel: false,
        }
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    /// Full discrete-mode step: gravity, velocity, position, boundary.
    pub fn step(&self, bodies: &mut Arena<Body>, dt: f32, bounds: &Bounds, elasticity: f32) {
        self.for_each(bodies, |body| {
            body.accelerate(self.gravity);
            body.integrate_velocity(dt, self.rest_epsilon, self.max_speed);
            body.advance(dt);
            body.enforce_bounds(bounds, elasticity);
        });
    }

    /// Continuous-mode step: gravity and velocity only. Positions advance
    /// through the event loop, never here.
    pub fn step_velocities(&self, bodies: &mut Arena<Body>, dt: f32) {
        self.for_each(bodies, |body| {
            body.accelerate(self.gravity);
            body.integrate_velocity(dt, self.rest_epsilon, self.max_speed);
        });
    }

    #[cfg(feature = "parallel")]
    fn for_each<F>(&self, bodies: &mut Arena<Body>, f: F)
    where
        F: Fn(&mut Body) + Send + Sync,
    {
        if self.parallel {
            bodies.as_mut_slice().par_iter_mut().for_each(f);
        } else {
            bodies.iter_mut().for_each(f);
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn for_each<F>(&self, bodies: &mut Arena<Body>, f: F)
    where
        F: Fn(&mut Body),
    {
        bodies.iter_mut().for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rgba;

    #[test]
    fn gravity_accumulates_into_velocity_then_position() {
        let mut bodies = Arena::new();
        bodies.insert(Body::new(
            Vec2::new(100.0, 100.0),
            4.0,
            Vec2::ZERO,
            2.0,
            Rgba::WHITE,
        ));
        let integrator = Integrator::new(Vec2::new(0.0, 45.0), 0.0, 1000.0);
        let bounds = Bounds::new(800, 700, 4.0);

        integrator.step(&mut bodies, 1.0 / 60.0, &bounds, 0.6);

        let body = bodies.iter().next().unwrap();
        assert!((body.velocity.y - 0.75).abs() < 1e-5);
        assert!((body.position.y - (100.0 + 0.75 / 60.0)).abs() < 1e-5);
        assert_eq!(body.acceleration, Vec2::ZERO);
    }

    #[test]
    fn velocity_step_leaves_position_alone() {
        let mut bodies = Arena::new();
        bodies.insert(Body::new(
            Vec2::new(50.0, 50.0),
            4.0,
            Vec2::new(3.0, 0.0),
            2.0,
            Rgba::WHITE,
        ));
        let integrator = Integrator::new(Vec2::new(0.0, 45.0), 0.0, 1000.0);

        integrator.step_velocities(&mut bodies, 1.0 / 60.0);

        let body = bodies.iter().next().unwrap();
        assert_eq!(body.position, Vec2::new(50.0, 50.0));
        assert!(body.velocity.y > 0.0);
    }
}
