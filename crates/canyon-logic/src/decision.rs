//! Whether a squad sitting in cover may move on.
//!
//! Three checks, all required: the next cluster has a free cover for every
//! living member, the squad can reach it with exposure time to spare, and
//! the squad is bunched up tightly enough to move as one.

use serde::{Deserialize, Serialize};

use crate::config::{non_negative, positive, TuningError};
use crate::cover::CoverCluster;
use crate::geometry::Vec2;

/// Used when the squad has no members to average speeds over.
const FALLBACK_SPEED: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveDecision {
    pub max_exposure_time: f32,
    /// Seconds of exposure that must remain on arrival.
    pub safety_margin: f32,
    /// Max distance of any member from the squad centre.
    pub max_squad_spread: f32,
}

impl Default for LeaveDecision {
    fn default() -> Self {
        Self {
            max_exposure_time: 15.0,
            safety_margin: 3.0,
            max_squad_spread: 8.0,
        }
    }
}

/// Result of each individual check, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveReport {
    pub enough_covers: bool,
    pub exposure_ok: bool,
    pub cohesive: bool,
}

impl LeaveReport {
    pub fn can_leave(&self) -> bool {
        self.enough_covers && self.exposure_ok && self.cohesive
    }
}

impl LeaveDecision {
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("max_exposure_time", self.max_exposure_time)?;
        non_negative("safety_margin", self.safety_margin)?;
        positive("max_squad_spread", self.max_squad_spread)?;
        Ok(())
    }

    /// Evaluate every check.
    ///
    /// `max_speeds` are the members' top speeds; their mean estimates the
    /// travel time to the next cluster.
    pub fn evaluate(
        &self,
        squad_center: Vec2,
        member_positions: &[Vec2],
        max_speeds: &[f32],
        next_cluster: Option<&CoverCluster>,
    ) -> LeaveReport {
        let Some(next) = next_cluster else {
            return LeaveReport {
                enough_covers: false,
                exposure_ok: false,
                cohesive: self.is_cohesive(squad_center, member_positions),
            };
        };

        let speed = if max_speeds.is_empty() {
            FALLBACK_SPEED
        } else {
            max_speeds.iter().sum::<f32>() / max_speeds.len() as f32
        };
        let travel_time = squad_center.distance(&next.center) / speed.max(f32::EPSILON);

        LeaveReport {
            enough_covers: next.available_count >= member_positions.len(),
            exposure_ok: travel_time <= self.max_exposure_time - self.safety_margin,
            cohesive: self.is_cohesive(squad_center, member_positions),
        }
    }

    pub fn can_leave(
        &self,
        squad_center: Vec2,
        member_positions: &[Vec2],
        max_speeds: &[f32],
        next_cluster: Option<&CoverCluster>,
    ) -> bool {
        self.evaluate(squad_center, member_positions, max_speeds, next_cluster)
            .can_leave()
    }

    fn is_cohesive(&self, center: Vec2, members: &[Vec2]) -> bool {
        if members.len() <= 1 {
            return true;
        }
        members
            .iter()
            .all(|p| p.distance(&center) <= self.max_squad_spread)
    }
}
