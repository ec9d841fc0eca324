//! Exposure tracking - soldiers caught outside cover too long fall.

use hecs::{Entity, World};

use canyon_logic::exposure::{ExposureConfig, ExposureEvent};

use super::soldier::retire_soldier;
use crate::components::*;

/// Accumulate exposure for soldiers outside cover; returns the soldiers that
/// fell this tick.
pub fn exposure_system(
    world: &mut World,
    config: &ExposureConfig,
    delta_seconds: f32,
    now: f64,
) -> Vec<Entity> {
    if !config.enabled {
        return Vec::new();
    }

    let mut fallen = Vec::new();
    for (entity, (timer, fsm)) in world
        .query_mut::<(&mut ExposureTimer, &StateMachine)>()
        .with::<&Soldier>()
        .without::<&Fallen>()
        .without::<&Rescued>()
    {
        let in_cover = fsm.is_in(SoldierState::InCover);
        if timer.tick(delta_seconds, in_cover) == ExposureEvent::Died {
            fallen.push(entity);
        }
    }

    fallen.retain(|&soldier| retire_soldier(world, soldier, Fallen { at: now }));
    for &soldier in &fallen {
        let callsign = world
            .get::<&Soldier>(soldier)
            .map(|s| s.callsign.clone())
            .unwrap_or_default();
        tracing::warn!("{} fell after {:.1}s exposed", callsign, config.max_exposure_time);
    }
    fallen
}

#[cfg(test)]
mod tests {
    use super::*;
    use canyon_logic::geometry::Vec2;

    fn spawn(world: &mut World, max: f32) -> Entity {
        world.spawn((
            Soldier::new("Ash"),
            AssignedCover::default(),
            MovementController::new(Vec2::ZERO, 6.0, 1.0),
            StateMachine::new(),
            ExposureTimer::new(max),
        ))
    }

    #[test]
    fn test_exposed_soldier_falls_once() {
        let mut world = World::new();
        let s = spawn(&mut world, 1.0);
        let config = ExposureConfig {
            enabled: true,
            max_exposure_time: 1.0,
        };

        assert!(exposure_system(&mut world, &config, 0.6, 0.6).is_empty());
        assert_eq!(exposure_system(&mut world, &config, 0.6, 1.2), vec![s]);
        assert!(world.get::<&Fallen>(s).is_ok());
        // fallen soldiers are no longer ticked
        assert!(exposure_system(&mut world, &config, 5.0, 6.2).is_empty());
    }

    #[test]
    fn test_disabled_exposure_never_kills() {
        let mut world = World::new();
        let s = spawn(&mut world, 0.1);
        let config = ExposureConfig {
            enabled: false,
            max_exposure_time: 0.1,
        };
        assert!(exposure_system(&mut world, &config, 10.0, 10.0).is_empty());
        assert!(world.get::<&Fallen>(s).is_err());
    }
}
