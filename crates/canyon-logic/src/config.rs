//! Squad tuning parameters and value validation.
//!
//! Defaults match the values the squads were balanced with. Every struct is
//! `#[serde(default)]`, so a scenario file only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::steering::SteeringParams;

/// Invalid tuning value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TuningError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("max_covers_per_cluster ({max}) is below min_covers_per_cluster ({min})")]
    ClusterBounds { min: usize, max: usize },
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Negative { field, value })
    }
}

/// Movement, steering and behaviour weights shared by every soldier in a squad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadTuning {
    pub max_speed: f32,
    pub max_force: f32,
    pub mass: f32,

    pub slowing_radius: f32,
    pub arrival_radius: f32,
    pub stop_radius: f32,
    /// Arrival also requires speed below this.
    pub arrival_speed_threshold: f32,

    pub separation_radius: f32,
    pub cohesion_radius: f32,
    pub alignment_radius: f32,

    pub arrive_weight: f32,
    pub separation_weight: f32,
    pub cohesion_weight: f32,
    pub alignment_weight: f32,

    /// Flocking only kicks in when farther than this from the waypoint.
    pub flocking_distance_threshold: f32,
    /// Regrouping ends once a soldier is this close to the squad centre.
    pub regroup_tolerance: f32,

    /// Route follower: squad centre distance that counts as reaching a waypoint.
    pub waypoint_reached_distance: f32,
    /// Route follower: seconds between replans.
    pub path_update_interval: f32,
}

impl Default for SquadTuning {
    fn default() -> Self {
        Self {
            max_speed: 6.0,
            max_force: 10.0,
            mass: 1.0,
            slowing_radius: 7.0,
            arrival_radius: 1.0,
            stop_radius: 0.3,
            arrival_speed_threshold: 0.5,
            separation_radius: 2.0,
            cohesion_radius: 10.0,
            alignment_radius: 10.0,
            arrive_weight: 2.0,
            separation_weight: 3.0,
            cohesion_weight: 1.5,
            alignment_weight: 1.0,
            flocking_distance_threshold: 10.0,
            regroup_tolerance: 2.5,
            waypoint_reached_distance: 2.0,
            path_update_interval: 1.0,
        }
    }
}

impl SquadTuning {
    /// Steering limits derived from the squad tuning.
    pub fn steering(&self) -> SteeringParams {
        SteeringParams {
            max_speed: self.max_speed,
            max_force: self.max_force,
            slowing_radius: self.slowing_radius,
            arrival_radius: self.arrival_radius,
            stop_radius: self.stop_radius,
            separation_radius: self.separation_radius,
            cohesion_radius: self.cohesion_radius,
            alignment_radius: self.alignment_radius,
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        positive("max_speed", self.max_speed)?;
        positive("max_force", self.max_force)?;
        positive("mass", self.mass)?;
        positive("slowing_radius", self.slowing_radius)?;
        positive("arrival_radius", self.arrival_radius)?;
        non_negative("stop_radius", self.stop_radius)?;
        positive("arrival_speed_threshold", self.arrival_speed_threshold)?;
        non_negative("separation_radius", self.separation_radius)?;
        non_negative("cohesion_radius", self.cohesion_radius)?;
        non_negative("alignment_radius", self.alignment_radius)?;
        non_negative("arrive_weight", self.arrive_weight)?;
        non_negative("separation_weight", self.separation_weight)?;
        non_negative("cohesion_weight", self.cohesion_weight)?;
        non_negative("alignment_weight", self.alignment_weight)?;
        non_negative("flocking_distance_threshold", self.flocking_distance_threshold)?;
        positive("regroup_tolerance", self.regroup_tolerance)?;
        positive("waypoint_reached_distance", self.waypoint_reached_distance)?;
        positive("path_update_interval", self.path_update_interval)?;
        Ok(())
    }
}
