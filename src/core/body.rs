use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::types::{Bounds, Rgba};
use crate::utils::allocator::ArenaIndex;

/// Stable handle for a body in the simulation's arena.
pub type BodyId = ArenaIndex;

/// A circular rigid body with kinematic state.
///
/// Mass is derived from the radius at construction (`density * radius^2`)
/// and both are invariant for the body's lifetime. Bodies are created by
/// emitters or [`crate::world::Simulation::add_body`] and live until
/// simulation teardown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Per-frame force accumulator, reset by velocity integration.
    pub acceleration: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub color: Rgba,
    /// Seconds of the current frame already consumed by event processing.
    ///
    /// Only the continuous resolver advances this; it is reset to zero at
    /// the end of every frame. Crate-visible so the grid and event machinery
    /// can coordinate without exposing it to API consumers.
    #[serde(skip)]
    pub(crate) local_time: f32,
}

impl Body {
    pub fn new(position: Vec2, radius: f32, velocity: Vec2, density: f32, color: Rgba) -> Self {
        debug_assert!(radius > 0.0);
        Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            radius,
            mass: density * radius * radius,
            color,
            local_time: 0.0,
        }
    }

    /// Accumulates an acceleration for the coming integration step.
    pub fn accelerate(&mut self, acc: Vec2) {
        self.acceleration += acc;
    }

    /// Semi-implicit Euler velocity update: fold the accumulated
    /// acceleration into the velocity, then snap near-rest speeds to zero
    /// and cap runaway ones.
    pub fn integrate_velocity(&mut self, dt: f32, rest_epsilon: f32, max_speed: f32) {
        self.velocity += self.acceleration * dt;
        self.acceleration = Vec2::ZERO;

        let speed = self.velocity.length();
        if speed < rest_epsilon {
            self.velocity = Vec2::ZERO;
        } else if speed > max_speed {
            self.velocity *= max_speed / speed;
        }
    }

    /// Free flight for `dt` seconds at the current velocity.
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Clamps the center into the legal band and reflects the normal
    /// velocity component, damped by `elasticity`. Returns whether any axis
    /// was clamped.
    pub fn enforce_bounds(&mut self, bounds: &Bounds, elasticity: f32) -> bool {
        let min = bounds.min_for(self.radius);
        let max = bounds.max_for(self.radius);
        let mut clamped = false;

        if self.position.x < min.x {
            self.position.x = min.x;
            self.velocity.x *= -elasticity;
            clamped = true;
        } else if self.position.x > max.x {
            self.position.x = max.x;
            self.velocity.x *= -elasticity;
            clamped = true;
        }
        if self.position.y < min.y {
            self.position.y = min.y;
            self.velocity.y *= -elasticity;
            clamped = true;
        } else if self.position.y > max.y {
            self.position.y = max.y;
            self.velocity.y *= -elasticity;
            clamped = true;
        }
        clamped
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }
}
