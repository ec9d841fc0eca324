//! Squad components.
//!
//! A squad entity carries a [`Squad`], a `SquadRoute` and a `Coordinator`.

use hecs::Entity;

use canyon_logic::geometry::Vec2;

pub use canyon_logic::config::SquadTuning;
pub use canyon_logic::coordinator::{CoverPhase, Coordinator};
pub use canyon_logic::route::SquadRoute;

/// Squad roster and shared tuning. Members are listed in spawn order and
/// never removed; fallen or rescued soldiers are filtered out at query time.
#[derive(Debug, Clone)]
pub struct Squad {
    pub id: u32,
    pub name: String,
    pub members: Vec<Entity>,
    pub tuning: SquadTuning,
    /// Where the squad was last ordered to go. Cover detours return here.
    pub objective: Option<Vec2>,
}

impl Squad {
    pub fn new(id: u32, name: impl Into<String>, tuning: SquadTuning) -> Self {
        Self {
            id,
            name: name.into(),
            members: Vec::new(),
            tuning,
            objective: None,
        }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}
