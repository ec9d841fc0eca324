//! Squad and soldier generation

use hecs::{Entity, World};
use rand::Rng;

use canyon_logic::coordinator::CoordinatorConfig;
use canyon_logic::exposure::ExposureConfig;
use canyon_logic::geometry::Vec2;

use super::names::generate_callsign;
use crate::components::*;
use crate::config::SquadSpec;

/// Spawn a squad entity and its soldiers, jittered around `spec.spawn`.
pub fn spawn_squad(
    world: &mut World,
    id: u32,
    spec: &SquadSpec,
    coordinator: &CoordinatorConfig,
    exposure: &ExposureConfig,
    rng: &mut impl Rng,
) -> Entity {
    let squad = world.spawn((
        Squad::new(id, spec.name.clone(), spec.tuning),
        SquadRoute::new(),
        Coordinator::new(*coordinator),
    ));

    let spread = spec.spread.max(0.0);
    let mut members = Vec::with_capacity(spec.size);
    for i in 0..spec.size {
        let offset = if spread > 0.0 {
            Vec2::new(
                rng.gen_range(-spread..=spread),
                rng.gen_range(-spread..=spread),
            )
        } else {
            Vec2::ZERO
        };
        let callsign = format!("{}-{} {}", spec.name, i + 1, generate_callsign(rng));

        let soldier = world.spawn((
            Soldier::new(callsign),
            SquadMember { squad, squad_id: id },
            AssignedCover::default(),
            MovementController::new(spec.spawn + offset, spec.tuning.max_speed, spec.tuning.mass),
            StateMachine::new(),
            ExposureTimer::new(exposure.max_exposure_time),
        ));
        members.push(soldier);
    }

    if let Ok(mut s) = world.get::<&mut Squad>(squad) {
        s.members = members;
    }
    tracing::debug!("spawned squad {} with {} soldiers", spec.name, spec.size);
    squad
}
