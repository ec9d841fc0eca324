//! Steering forces for squad movement.
//!
//! Every function here is pure: it reads the agent's position and velocity
//! and returns a force already clamped to `max_force`. Combining and
//! weighting forces is left to the caller (the soldier's current state).

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Below this distance a target counts as reached and no force is produced.
const TARGET_EPSILON: f32 = 0.01;

/// Per-agent steering limits and neighbourhood radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    pub max_speed: f32,
    pub max_force: f32,
    pub slowing_radius: f32,
    pub arrival_radius: f32,
    pub stop_radius: f32,
    pub separation_radius: f32,
    pub cohesion_radius: f32,
    pub alignment_radius: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            max_force: 10.0,
            slowing_radius: 3.0,
            arrival_radius: 0.5,
            stop_radius: 0.3,
            separation_radius: 1.5,
            cohesion_radius: 5.0,
            alignment_radius: 5.0,
        }
    }
}

/// Read-only view of one agent, captured at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub squad: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Fallen or rescued agents stay in the snapshot but are never neighbours.
    pub active: bool,
}

/// Steering calculator bound to one agent's kinematic state.
#[derive(Debug, Clone, Copy)]
pub struct Steering {
    pub params: SteeringParams,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Steering {
    pub fn new(params: SteeringParams, position: Vec2, velocity: Vec2) -> Self {
        Self {
            params,
            position,
            velocity,
        }
    }

    fn steer_towards(&self, desired: Vec2) -> Vec2 {
        (desired - self.velocity).clamp_length(self.params.max_force)
    }

    /// Steer toward `target`, slowing linearly inside `slowing_radius`.
    pub fn arrive(&self, target: Vec2) -> Vec2 {
        let offset = target - self.position;
        let distance = offset.length();
        if distance < TARGET_EPSILON {
            return Vec2::ZERO;
        }

        let p = &self.params;
        let speed = if distance < p.slowing_radius {
            p.max_speed * (distance / p.slowing_radius)
        } else {
            p.max_speed
        };
        self.steer_towards(offset.normalize() * speed)
    }

    /// Steer toward `target` at full speed, no slowdown.
    pub fn seek(&self, target: Vec2) -> Vec2 {
        let offset = target - self.position;
        if offset.length() < TARGET_EPSILON {
            return Vec2::ZERO;
        }
        self.steer_towards(offset.normalize() * self.params.max_speed)
    }

    /// Push away from neighbours inside `separation_radius`, stronger when
    /// closer. Zero when none are in range.
    pub fn separation(&self, neighbors: &[AgentSnapshot]) -> Vec2 {
        let mut push = Vec2::ZERO;
        let mut count = 0usize;

        for other in neighbors {
            let distance = self.position.distance(&other.position);
            if distance > 0.0 && distance < self.params.separation_radius {
                push += (self.position - other.position).normalize() / distance;
                count += 1;
            }
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        push = push / count as f32;
        self.steer_towards(push.normalize() * self.params.max_speed)
    }

    /// Steer toward the centroid of `neighbors`.
    pub fn cohesion(&self, neighbors: &[AgentSnapshot]) -> Vec2 {
        let Some(center) = Vec2::centroid(neighbors.iter().map(|n| n.position)) else {
            return Vec2::ZERO;
        };
        let desired = (center - self.position).normalize() * self.params.max_speed;
        self.steer_towards(desired)
    }

    /// Steer to match the average heading of `neighbors`.
    pub fn alignment(&self, neighbors: &[AgentSnapshot]) -> Vec2 {
        let Some(avg) = Vec2::centroid(neighbors.iter().map(|n| n.velocity)) else {
            return Vec2::ZERO;
        };
        self.steer_towards(avg.normalize() * self.params.max_speed)
    }
}

/// Active agents within `radius` of `agents[self_index]`, excluding itself.
pub fn find_neighbors(
    agents: &[AgentSnapshot],
    self_index: usize,
    radius: f32,
    same_squad_only: bool,
) -> Vec<AgentSnapshot> {
    let Some(me) = agents.get(self_index) else {
        return Vec::new();
    };
    let r2 = radius * radius;

    agents
        .iter()
        .enumerate()
        .filter(|&(i, other)| {
            i != self_index
                && other.active
                && (!same_squad_only || other.squad == me.squad)
                && other.position.distance_squared(&me.position) <= r2
        })
        .map(|(_, other)| *other)
        .collect()
}
