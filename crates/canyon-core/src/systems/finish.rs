//! Finish zone - soldiers who make it across are rescued.

use hecs::{Entity, World};

use canyon_logic::finish::{CrossingOutcome, FinishZone};

use super::soldier::retire_soldier;
use crate::components::*;

/// Mark living soldiers inside `zone` as rescued; returns who made it.
pub fn finish_system(world: &mut World, zone: &FinishZone, now: f64) -> Vec<Entity> {
    let mut arrived: Vec<Entity> = world
        .query::<&MovementController>()
        .with::<&Soldier>()
        .without::<&Fallen>()
        .without::<&Rescued>()
        .iter()
        .filter(|(_, body)| zone.contains(body.position))
        .map(|(e, _)| e)
        .collect();

    arrived.retain(|&soldier| retire_soldier(world, soldier, Rescued { at: now }));
    for &soldier in &arrived {
        if let Ok(s) = world.get::<&Soldier>(soldier) {
            tracing::info!("{} rescued at t={:.1}s", s.callsign, now);
        }
    }
    arrived
}

/// Count soldiers by how their crossing ended.
pub fn crossing_outcome(world: &World) -> CrossingOutcome {
    let mut outcome = CrossingOutcome::default();
    for (_, (fallen, rescued)) in world
        .query::<(Option<&Fallen>, Option<&Rescued>)>()
        .with::<&Soldier>()
        .iter()
    {
        match (fallen, rescued) {
            (Some(_), _) => outcome.fallen += 1,
            (None, Some(_)) => outcome.rescued += 1,
            (None, None) => outcome.active += 1,
        }
    }
    outcome
}
