use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Periodic body spawner.
///
/// Accumulates frame time and fires once the accumulator reaches the
/// refractory period, subtracting exactly one period so fractional time
/// carries over — at high frame rates the spawn cadence stays even instead
/// of quantizing to frame boundaries. `start`/`stop` gate firing without
/// touching the accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emitter {
    pub position: Vec2,
    pub exit_velocity: Vec2,
    pub refractory_period: f32,
    time_since_last_shot: f32,
    active: bool,
}

impl Emitter {
    pub fn new(position: Vec2, direction: Vec2, speed: f32, refractory_period: f32) -> Self {
        Self {
            position,
            exit_velocity: direction.normalize_or_zero() * speed,
            refractory_period,
            time_since_last_shot: 0.0,
            active: true,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advances the accumulator; returns the spawn position and velocity
    /// when one body should be emitted this frame.
    pub fn update(&mut self, dt: f32) -> Option<(Vec2, Vec2)> {
        self.time_since_last_shot += dt;
        if !self.active {
            return None;
        }
        if self.time_since_last_shot >= self.refractory_period {
            self.time_since_last_shot -= self.refractory_period;
            return Some((self.position, self.exit_velocity));
        }
        None
    }
}
