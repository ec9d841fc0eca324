//! Movement integrator: turns accumulated steering forces into motion.
//!
//! Semi-implicit Euler. Forces accumulate into acceleration during a tick,
//! `step` integrates once and clears them.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Below this speed the heading is left alone.
const HEADING_SPEED_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementController {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Unit facing direction.
    pub heading: Vec2,
    pub max_speed: f32,
    pub mass: f32,
}

impl MovementController {
    pub fn new(position: Vec2, max_speed: f32, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            heading: Vec2::new(0.0, 1.0),
            max_speed,
            mass: if mass > 0.0 { mass } else { 1.0 },
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force / self.mass;
    }

    /// Integrate one tick and clear accumulated acceleration.
    pub fn step(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.velocity = self.velocity.clamp_length(self.max_speed);
        self.position += self.velocity * dt;

        if self.speed() > HEADING_SPEED_THRESHOLD {
            self.heading = self.velocity.normalize();
        }
        self.acceleration = Vec2::ZERO;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn is_moving(&self, threshold: f32) -> bool {
        self.speed() > threshold
    }
}
