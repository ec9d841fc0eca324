//! Squad route following.

use hecs::{Entity, World};

use canyon_logic::geometry::Vec2;
use canyon_logic::grid::Grid;
use canyon_logic::pathfinding::find_path;
use canyon_logic::route::RouteEvent;

use super::soldier::transition_soldier;
use super::squad::{center_of, living_members};
use crate::components::*;

/// Plan a route for `squad` to `destination` and put its living members into
/// squad movement. Returns `false` when no path was found; the route retries
/// on its own after one replan interval.
pub fn start_squad_route(
    world: &World,
    grid: &Grid,
    squad: Entity,
    destination: Vec2,
    now: f64,
) -> bool {
    let Ok(roster) = world.get::<&Squad>(squad) else {
        return false;
    };
    let members = living_members(world, &roster);
    let Some(center) = center_of(world, &members) else {
        return false;
    };
    let Ok(mut route) = world.get::<&mut SquadRoute>(squad) else {
        return false;
    };

    let found = route.start(
        now,
        center,
        destination,
        roster.tuning.path_update_interval,
        |from, to| find_path(grid, from, to),
    );
    if found {
        tracing::info!(
            "squad {} moving to ({:.1}, {:.1}) via {} waypoints",
            roster.name,
            destination.x,
            destination.y,
            route.waypoints().len()
        );
    } else {
        tracing::warn!(
            "squad {}: no path to ({:.1}, {:.1}), retrying",
            roster.name,
            destination.x,
            destination.y
        );
    }
    drop(route);

    for m in members {
        transition_soldier(world, m, SoldierState::SquadMovement);
    }
    found
}

/// Advance and replan every squad's route.
pub fn route_system(world: &mut World, grid: &Grid, now: f64) {
    let mut completed: Vec<Entity> = Vec::new();

    for (entity, (squad, route)) in world.query::<(&Squad, &mut SquadRoute)>().iter() {
        let members = living_members(world, squad);
        let Some(center) = center_of(world, &members) else {
            continue;
        };
        let event = route.update(
            now,
            center,
            squad.tuning.waypoint_reached_distance,
            squad.tuning.path_update_interval,
            |from, to| find_path(grid, from, to),
        );
        match event {
            RouteEvent::WaypointReached(i) => {
                tracing::debug!("squad {} reached waypoint {}", squad.name, i);
            }
            RouteEvent::Completed => {
                tracing::info!("squad {} reached its destination", squad.name);
                completed.push(entity);
            }
            RouteEvent::Idle | RouteEvent::Following | RouteEvent::NoPath => {}
        }
    }

    // Soldiers still marching stop where they are
    for squad in completed {
        let members = match world.get::<&Squad>(squad) {
            Ok(s) => living_members(world, &s),
            Err(_) => continue,
        };
        for m in members {
            let marching = world
                .get::<&StateMachine>(m)
                .is_ok_and(|f| f.is_in(SoldierState::SquadMovement));
            if marching {
                transition_soldier(world, m, SoldierState::Idle);
            }
        }
    }
}
