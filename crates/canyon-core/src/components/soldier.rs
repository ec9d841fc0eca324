//! Soldier components.
//!
//! A soldier entity carries: [`Soldier`], [`SquadMember`], [`AssignedCover`],
//! a `MovementController`, a `StateMachine` and an `ExposureTimer`. Once it
//! falls or is rescued it also gets a [`Fallen`] or [`Rescued`] marker and
//! drops out of every squad query.

use hecs::Entity;
use serde::{Deserialize, Serialize};

pub use canyon_logic::exposure::ExposureTimer;
pub use canyon_logic::fsm::{SoldierState, StateMachine};
pub use canyon_logic::movement::MovementController;

/// Marker plus callsign for a soldier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Soldier {
    pub callsign: String,
}

impl Soldier {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
        }
    }
}

/// Squad membership. `squad_id` mirrors `Squad::id` for cheap comparisons.
#[derive(Debug, Clone, Copy)]
pub struct SquadMember {
    pub squad: Entity,
    pub squad_id: u32,
}

/// The cover a soldier has been told to use. Assigning does not claim it;
/// the claim happens when the soldier enters a cover-holding state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignedCover {
    pub cover: Option<Entity>,
}

/// Soldier died of exposure at `at` (simulation seconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fallen {
    pub at: f64,
}

/// Soldier reached the finish zone at `at` (simulation seconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rescued {
    pub at: f64,
}
