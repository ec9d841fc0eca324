//! Finish zone and crossing outcome.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Circular goal region at the far end of the canyon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishZone {
    pub center: Vec2,
    pub radius: f32,
}

impl FinishZone {
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_squared(&self.center) <= self.radius * self.radius
    }
}

/// Tally of where every soldier ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingOutcome {
    pub rescued: usize,
    pub fallen: usize,
    /// Still in the field.
    pub active: usize,
}

impl CrossingOutcome {
    pub fn total(&self) -> usize {
        self.rescued + self.fallen + self.active
    }

    /// Nobody left to move.
    pub fn is_finished(&self) -> bool {
        self.active == 0
    }

    /// Fraction of soldiers rescued, 0 when there were none.
    pub fn survival_rate(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            n => self.rescued as f32 / n as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_contains() {
        let zone = FinishZone {
            center: Vec2::new(0.0, 90.0),
            radius: 5.0,
        };
        assert!(zone.contains(Vec2::new(3.0, 94.0)));
        assert!(!zone.contains(Vec2::new(0.0, 80.0)));
    }

    #[test]
    fn test_outcome() {
        let o = CrossingOutcome {
            rescued: 3,
            fallen: 1,
            active: 0,
        };
        assert!(o.is_finished());
        assert_eq!(o.total(), 4);
        assert!((o.survival_rate() - 0.75).abs() < 1e-6);
        assert_eq!(CrossingOutcome::default().survival_rate(), 0.0);
    }
}
