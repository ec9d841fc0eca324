//! Generation - seeded creation of covers and squads from a scenario

mod covers;
mod names;
mod squads;

pub use covers::*;
pub use names::*;
pub use squads::*;

use hecs::{Entity, World};
use rand::Rng;

use crate::config::SimConfig;

/// Everything a scenario spawned, in spawn order.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub squads: Vec<Entity>,
    pub covers: Vec<Entity>,
}

/// Spawn a scenario's covers, then its squads.
pub fn populate(world: &mut World, config: &SimConfig, rng: &mut impl Rng) -> Population {
    let covers = spawn_covers(world, &config.covers, rng);
    let squads = config
        .squads
        .iter()
        .enumerate()
        .map(|(id, spec)| {
            spawn_squad(
                world,
                id as u32,
                spec,
                &config.coordinator,
                &config.exposure,
                rng,
            )
        })
        .collect();
    Population { squads, covers }
}
