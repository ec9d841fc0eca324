//! Soldier state machine execution.
//!
//! Each tick every active soldier runs its current state's behaviour against
//! a snapshot of all soldiers taken at the start of the tick, so the result
//! does not depend on iteration order. Forces and transitions are collected
//! first and applied afterwards.

use std::collections::HashMap;

use hecs::{Entity, World};

use canyon_logic::behavior::{self, BehaviorContext};
use canyon_logic::config::SquadTuning;
use canyon_logic::fsm::StateHooks;
use canyon_logic::geometry::Vec2;
use canyon_logic::steering::{find_neighbors, AgentSnapshot};

use super::squad::{center_of, is_active, living_members};
use crate::components::*;

/// Enter/exit side effects for one soldier entity.
///
/// Works through `&World`: the state machine itself is borrowed separately
/// and the hooks never touch it.
pub struct SoldierHooks<'w> {
    world: &'w World,
    soldier: Entity,
}

impl<'w> SoldierHooks<'w> {
    pub fn new(world: &'w World, soldier: Entity) -> Self {
        Self { world, soldier }
    }

    fn stop(&self) {
        if let Ok(mut body) = self.world.get::<&mut MovementController>(self.soldier) {
            body.stop();
        }
    }

    fn assigned(&self) -> Option<Entity> {
        self.world
            .get::<&AssignedCover>(self.soldier)
            .ok()
            .and_then(|a| a.cover)
    }

    /// Claim the assigned cover. `false` when there is none or someone else holds it.
    fn claim(&self) -> bool {
        let Some(cover_entity) = self.assigned() else {
            tracing::warn!("soldier {:?} has no assigned cover", self.soldier);
            return false;
        };
        let Ok(mut cover) = self.world.get::<&mut Cover>(cover_entity) else {
            tracing::warn!(
                "soldier {:?} assigned to missing cover {:?}",
                self.soldier,
                cover_entity
            );
            return false;
        };
        match cover.set_occupied(self.soldier) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("soldier {:?} cannot claim cover: {}", self.soldier, e);
                false
            }
        }
    }
}

impl StateHooks for SoldierHooks<'_> {
    fn on_exit(&mut self, from: SoldierState, to: SoldierState) {
        if from.holds_cover() && to != SoldierState::InCover {
            free_held_cover(self.world, self.soldier);
        }
    }

    fn on_enter(&mut self, state: SoldierState) -> Option<SoldierState> {
        match state {
            SoldierState::Idle => {
                self.stop();
                None
            }
            SoldierState::GoToAssignedCover => (!self.claim()).then_some(SoldierState::Idle),
            SoldierState::InCover => {
                self.stop();
                (!self.claim()).then_some(SoldierState::Idle)
            }
            SoldierState::IndividualMovement => {
                if self.assigned().is_none() {
                    tracing::warn!("soldier {:?} has no cover to move to", self.soldier);
                    return Some(SoldierState::Idle);
                }
                None
            }
            SoldierState::SquadMovement | SoldierState::Regrouping => None,
        }
    }
}

/// Free the soldier's assigned cover if the soldier is the one holding it.
/// The assignment itself is kept.
pub fn free_held_cover(world: &World, soldier: Entity) {
    let Some(cover_entity) = world
        .get::<&AssignedCover>(soldier)
        .ok()
        .and_then(|a| a.cover)
    else {
        return;
    };
    if let Ok(mut cover) = world.get::<&mut Cover>(cover_entity) {
        cover.release_by(soldier);
    }
}

/// Free any held cover and forget the assignment.
pub fn release_cover(world: &World, soldier: Entity) {
    free_held_cover(world, soldier);
    if let Ok(mut assigned) = world.get::<&mut AssignedCover>(soldier) {
        assigned.cover = None;
    }
}

/// Drive a soldier's state machine to `target`, running its hooks.
///
/// Returns whether the state changed.
pub fn transition_soldier(world: &World, soldier: Entity, target: SoldierState) -> bool {
    let Ok(mut fsm) = world.get::<&mut StateMachine>(soldier) else {
        return false;
    };
    let from = fsm.current();
    let mut hooks = SoldierHooks::new(world, soldier);
    let changed = fsm.transition_to(target, &mut hooks);
    if changed {
        tracing::debug!("soldier {:?}: {} -> {}", soldier, from, fsm.current());
    }
    changed
}

/// Send a soldier back to the state it was in before its last transition,
/// running the same hooks as a forward transition.
pub fn revert_soldier(world: &World, soldier: Entity) -> bool {
    let Ok(mut fsm) = world.get::<&mut StateMachine>(soldier) else {
        return false;
    };
    let mut hooks = SoldierHooks::new(world, soldier);
    fsm.revert_to_previous(&mut hooks)
}

/// Take a soldier out of play: free its cover, halt it and tag it with
/// `marker`. Returns `false` when the soldier no longer exists.
pub fn retire_soldier<T: hecs::Component>(world: &mut World, soldier: Entity, marker: T) -> bool {
    release_cover(world, soldier);
    transition_soldier(world, soldier, SoldierState::Idle);
    if let Err(e) = world.insert_one(soldier, marker) {
        tracing::warn!("soldier {:?} not retired: {}", soldier, e);
        return false;
    }
    true
}

/// Per-squad data every member needs this tick.
struct SquadFrame {
    tuning: SquadTuning,
    waypoint: Option<Vec2>,
    center: Option<Vec2>,
}

/// Run every active soldier's state for one tick.
pub fn soldier_system(world: &mut World, delta_seconds: f32) {
    let mut frames: HashMap<Entity, SquadFrame> = HashMap::new();
    for (entity, (squad, route)) in world.query::<(&Squad, &SquadRoute)>().iter() {
        let members = living_members(world, squad);
        frames.insert(
            entity,
            SquadFrame {
                tuning: squad.tuning,
                waypoint: route.current_waypoint(),
                center: center_of(world, &members),
            },
        );
    }

    // Snapshot (inactive soldiers included but never neighbours)
    let mut ids: Vec<Entity> = Vec::new();
    let mut snapshot: Vec<AgentSnapshot> = Vec::new();
    for (entity, (member, body)) in world
        .query::<(&SquadMember, &MovementController)>()
        .with::<&Soldier>()
        .iter()
    {
        ids.push(entity);
        snapshot.push(AgentSnapshot {
            squad: member.squad_id,
            position: body.position,
            velocity: body.velocity,
            active: true,
        });
    }
    for (i, &id) in ids.iter().enumerate() {
        snapshot[i].active = is_active(world, id);
    }

    let mut forces: Vec<(Entity, Vec2)> = Vec::with_capacity(ids.len());
    let mut transitions: Vec<(Entity, SoldierState)> = Vec::new();

    for (i, &soldier) in ids.iter().enumerate() {
        if !snapshot[i].active {
            continue;
        }
        let Ok(member) = world.get::<&SquadMember>(soldier).map(|m| *m) else {
            continue;
        };
        let Some(frame) = frames.get(&member.squad) else {
            continue;
        };
        let Ok(state) = world.get::<&StateMachine>(soldier).map(|f| f.current()) else {
            continue;
        };

        let cover_target = world
            .get::<&AssignedCover>(soldier)
            .ok()
            .and_then(|a| a.cover)
            .and_then(|c| world.get::<&Cover>(c).ok().map(|c| c.position));

        let t = &frame.tuning;
        let separation = find_neighbors(&snapshot, i, t.separation_radius, false);
        let flock = find_neighbors(&snapshot, i, t.cohesion_radius, true);
        let ctx = BehaviorContext {
            tuning: t,
            position: snapshot[i].position,
            velocity: snapshot[i].velocity,
            separation_neighbors: &separation,
            squad_neighbors: &flock,
            waypoint: frame.waypoint,
            cover_target,
            squad_center: frame.center,
        };

        let out = behavior::execute(state, &ctx);
        if out.force != Vec2::ZERO {
            forces.push((soldier, out.force));
        }
        if let Some(next) = out.next {
            transitions.push((soldier, next));
        }
    }

    // Apply forces
    for (soldier, force) in forces {
        if let Ok(mut body) = world.get::<&mut MovementController>(soldier) {
            body.apply_force(force);
        }
    }

    // Apply transitions
    for (soldier, next) in transitions {
        transition_soldier(world, soldier, next);
    }

    for (_, fsm) in world.query_mut::<&mut StateMachine>() {
        fsm.tick(delta_seconds);
    }
}
