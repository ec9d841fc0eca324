//! Squad cover coordination.
//!
//! Each squad's `Coordinator` sees a read-only view of its living members
//! and every cover in the world, and answers with commands that are applied
//! here in squad order. Squad-level commands re-plan the squad route.

use hecs::{Entity, World};

use canyon_logic::coordinator::{CoordinatorCommand, CoverSlot, MemberView, SquadView};
use canyon_logic::cover::ClusterDetector;
use canyon_logic::grid::Grid;

use super::route::start_squad_route;
use super::soldier::{release_cover, transition_soldier};
use super::squad::{center_of, living_members};
use crate::components::*;

/// Cover slots in `covers` order, tagged with the holder's squad.
pub fn cover_slots(world: &World, covers: &[Entity]) -> Vec<CoverSlot> {
    covers
        .iter()
        .filter_map(|&c| {
            let cover = world.get::<&Cover>(c).ok()?;
            let occupant_squad = cover
                .occupant()
                .and_then(|s| world.get::<&SquadMember>(s).ok().map(|m| m.squad_id));
            Some(CoverSlot {
                position: cover.position,
                occupant_squad,
            })
        })
        .collect()
}

fn member_views(world: &World, members: &[Entity]) -> Vec<MemberView<Entity>> {
    members
        .iter()
        .filter_map(|&m| {
            let body = world.get::<&MovementController>(m).ok()?;
            let fsm = world.get::<&StateMachine>(m).ok()?;
            Some(MemberView {
                id: m,
                position: body.position,
                state: fsm.current(),
                max_speed: body.max_speed,
            })
        })
        .collect()
}

/// Run every squad's coordinator and apply its commands immediately.
///
/// `covers` must list cover entities in a fixed order; commands refer to
/// covers by index into it.
pub fn coordinator_system(
    world: &World,
    grid: &Grid,
    detector: &ClusterDetector,
    covers: &[Entity],
    now: f64,
) {
    for (entity, (squad, coordinator)) in world.query::<(&Squad, &mut Coordinator)>().iter() {
        let members = living_members(world, squad);
        let Some(center) = center_of(world, &members) else {
            continue;
        };
        // Rebuilt per squad so claims made by earlier squads are visible
        let slots = cover_slots(world, covers);
        let views = member_views(world, &members);
        let view = SquadView {
            squad_id: squad.id,
            center,
            members: &views,
            covers: &slots,
        };
        for command in coordinator.tick(now, &view, detector) {
            apply_command(world, grid, covers, entity, command, now);
        }
    }
}

fn apply_command(
    world: &World,
    grid: &Grid,
    covers: &[Entity],
    squad: Entity,
    command: CoordinatorCommand<Entity>,
    now: f64,
) {
    match command {
        CoordinatorCommand::TakeCover { member, cover } => {
            let Some(&cover_entity) = covers.get(cover) else {
                tracing::warn!("cover index {} out of range", cover);
                return;
            };
            if let Ok(mut assigned) = world.get::<&mut AssignedCover>(member) {
                assigned.cover = Some(cover_entity);
            }
            transition_soldier(world, member, SoldierState::GoToAssignedCover);
        }
        CoordinatorCommand::Resume { member } => {
            release_cover(world, member);
            transition_soldier(world, member, SoldierState::SquadMovement);
        }
        CoordinatorCommand::Approach { destination } => {
            start_squad_route(world, grid, squad, destination, now);
        }
        CoordinatorCommand::ResumeObjective => {
            let objective = world.get::<&Squad>(squad).ok().and_then(|s| s.objective);
            match objective {
                Some(destination) => {
                    start_squad_route(world, grid, squad, destination, now);
                }
                None => {
                    if let Ok(mut route) = world.get::<&mut SquadRoute>(squad) {
                        route.stop();
                    }
                }
            }
        }
    }
}
