//! Movement system - integrates accumulated steering forces

use hecs::World;

use crate::components::{Fallen, MovementController, Rescued};

/// Step every body still in play. Runs once per tick, after all forces.
pub fn movement_system(world: &mut World, delta_seconds: f32) {
    for (_, body) in world
        .query_mut::<&mut MovementController>()
        .without::<&Fallen>()
        .without::<&Rescued>()
    {
        body.step(delta_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canyon_logic::geometry::Vec2;

    #[test]
    fn test_movement_system_skips_fallen() {
        let mut world = World::new();
        let mut body = MovementController::new(Vec2::ZERO, 5.0, 1.0);
        body.velocity = Vec2::new(1.0, 0.0);
        let alive = world.spawn((body,));
        let dead = world.spawn((body, Fallen { at: 0.0 }));

        movement_system(&mut world, 1.0);

        assert!(world.get::<&MovementController>(alive).unwrap().position.x > 0.5);
        assert_eq!(
            world.get::<&MovementController>(dead).unwrap().position,
            Vec2::ZERO
        );
    }
}
