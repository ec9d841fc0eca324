//! Squad queries shared by several systems.

use hecs::{Entity, World};

use canyon_logic::geometry::Vec2;

use crate::components::{Fallen, MovementController, Rescued, Squad};

/// Still in play: neither fallen nor rescued.
pub fn is_active(world: &World, entity: Entity) -> bool {
    world
        .entity(entity)
        .map(|e| !e.has::<Fallen>() && !e.has::<Rescued>())
        .unwrap_or(false)
}

/// Active members of `squad`, in roster order.
pub fn living_members(world: &World, squad: &Squad) -> Vec<Entity> {
    squad
        .members
        .iter()
        .copied()
        .filter(|&m| is_active(world, m))
        .collect()
}

/// Centroid of the given soldiers' positions.
pub fn center_of(world: &World, members: &[Entity]) -> Option<Vec2> {
    Vec2::centroid(
        members
            .iter()
            .filter_map(|&m| world.get::<&MovementController>(m).ok().map(|b| b.position)),
    )
}

/// Centroid of a squad's active members.
pub fn squad_center(world: &World, squad_entity: Entity) -> Option<Vec2> {
    let squad = world.get::<&Squad>(squad_entity).ok()?;
    let members = living_members(world, &squad);
    center_of(world, &members)
}
