//! What each soldier state does during a tick.
//!
//! `execute` combines weighted steering forces for the active state and
//! reports a follow-up state when the behaviour is finished (arrived at
//! cover, regrouped). It never mutates anything; the caller applies the
//! force and performs the transition.

use crate::config::SquadTuning;
use crate::fsm::SoldierState;
use crate::geometry::Vec2;
use crate::steering::{AgentSnapshot, Steering};

/// Everything a state needs to decide on a force.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext<'a> {
    pub tuning: &'a SquadTuning,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Active agents of any squad inside `separation_radius`.
    pub separation_neighbors: &'a [AgentSnapshot],
    /// Active same-squad agents inside `cohesion_radius`.
    pub squad_neighbors: &'a [AgentSnapshot],
    /// Current route waypoint, if the squad is following a route.
    pub waypoint: Option<Vec2>,
    /// Position of the assigned cover.
    pub cover_target: Option<Vec2>,
    /// Centroid of the squad's active members.
    pub squad_center: Option<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BehaviorOutput {
    pub force: Vec2,
    pub next: Option<SoldierState>,
}

impl BehaviorOutput {
    fn force(force: Vec2) -> Self {
        Self { force, next: None }
    }

    fn transition(next: SoldierState) -> Self {
        Self {
            force: Vec2::ZERO,
            next: Some(next),
        }
    }
}

/// Close enough and slow enough to count as arrived.
pub fn has_arrived(position: Vec2, target: Vec2, speed: f32, tuning: &SquadTuning) -> bool {
    position.distance(&target) < tuning.arrival_radius && speed < tuning.arrival_speed_threshold
}

pub fn execute(state: SoldierState, ctx: &BehaviorContext<'_>) -> BehaviorOutput {
    match state {
        SoldierState::Idle | SoldierState::InCover => BehaviorOutput::default(),
        SoldierState::SquadMovement => squad_movement(ctx),
        SoldierState::GoToAssignedCover | SoldierState::IndividualMovement => go_to_cover(ctx),
        SoldierState::Regrouping => regroup(ctx),
    }
}

fn steering(ctx: &BehaviorContext<'_>) -> Steering {
    Steering::new(ctx.tuning.steering(), ctx.position, ctx.velocity)
}

fn separation(ctx: &BehaviorContext<'_>, steer: &Steering) -> Vec2 {
    if ctx.separation_neighbors.is_empty() {
        return Vec2::ZERO;
    }
    steer.separation(ctx.separation_neighbors) * ctx.tuning.separation_weight
}

fn squad_movement(ctx: &BehaviorContext<'_>) -> BehaviorOutput {
    let Some(waypoint) = ctx.waypoint else {
        return BehaviorOutput::default();
    };
    let t = ctx.tuning;
    let steer = steering(ctx);

    let mut force = steer.seek(waypoint) * t.arrive_weight + separation(ctx, &steer);

    if ctx.position.distance(&waypoint) > t.flocking_distance_threshold
        && !ctx.squad_neighbors.is_empty()
    {
        force += steer.cohesion(ctx.squad_neighbors) * t.cohesion_weight;
        force += steer.alignment(ctx.squad_neighbors) * t.alignment_weight;
    }
    BehaviorOutput::force(force)
}

fn go_to_cover(ctx: &BehaviorContext<'_>) -> BehaviorOutput {
    let Some(cover) = ctx.cover_target else {
        return BehaviorOutput::transition(SoldierState::Idle);
    };
    let t = ctx.tuning;
    if has_arrived(ctx.position, cover, ctx.velocity.length(), t) {
        return BehaviorOutput::transition(SoldierState::InCover);
    }

    let steer = steering(ctx);
    BehaviorOutput::force(steer.arrive(cover) * t.arrive_weight + separation(ctx, &steer))
}

fn regroup(ctx: &BehaviorContext<'_>) -> BehaviorOutput {
    let Some(center) = ctx.squad_center else {
        return BehaviorOutput::default();
    };
    let t = ctx.tuning;
    if ctx.position.distance(&center) <= t.regroup_tolerance {
        return BehaviorOutput::transition(SoldierState::SquadMovement);
    }

    let steer = steering(ctx);
    BehaviorOutput::force(steer.seek(center) * (t.cohesion_weight * 2.0) + separation(ctx, &steer))
}
