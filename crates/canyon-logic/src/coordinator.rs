//! Squad-level cover coordination.
//!
//! A squad cycles through three phases:
//!
//! - `Moving`: scan for a cover cluster every `cluster_scan_interval`.
//! - `GoingToCover`: route the squad toward the chosen cluster when it is
//!   beyond the approach distance, then hand every living member its own
//!   free cover there.
//! - `InCover`: wait `time_in_cover` seconds (optionally until the leave
//!   decision approves), then send everyone back to squad movement.
//!
//! The coordinator never touches soldiers directly. [`Coordinator::tick`]
//! returns [`CoordinatorCommand`]s that the engine applies. A squad that was
//! detoured toward a cluster is sent back to its own destination once it
//! gives the cluster up or leaves it.

use serde::{Deserialize, Serialize};

use crate::config::{non_negative, positive, TuningError};
use crate::cover::{ClusterDetector, CoverPoint};
use crate::decision::LeaveDecision;
use crate::fsm::SoldierState;
use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub cluster_scan_interval: f32,
    /// Clusters closer than this to the squad, or to the cluster it just
    /// left, are ignored.
    pub min_cluster_distance: f32,
    /// Covers are handed out once the squad centre is this close to the
    /// cluster; farther out the squad is first routed to the cluster centre.
    /// `None` uses the detector's detection radius, which assigns on the
    /// first tick after selection.
    pub cluster_approach_distance: Option<f32>,
    pub time_in_cover: f32,
    /// When set, leaving cover also needs the decision's approval.
    pub leave_decision: Option<LeaveDecision>,
    /// Hard cap on waiting for the leave decision.
    pub max_time_in_cover: f32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cluster_scan_interval: 1.0,
            min_cluster_distance: 8.0,
            cluster_approach_distance: None,
            time_in_cover: 5.0,
            leave_decision: None,
            max_time_in_cover: 12.0,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("cluster_scan_interval", self.cluster_scan_interval)?;
        non_negative("min_cluster_distance", self.min_cluster_distance)?;
        if let Some(d) = self.cluster_approach_distance {
            positive("cluster_approach_distance", d)?;
        }
        non_negative("time_in_cover", self.time_in_cover)?;
        non_negative("max_time_in_cover", self.max_time_in_cover)?;
        if let Some(leave) = &self.leave_decision {
            leave.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoverPhase {
    #[default]
    Moving,
    GoingToCover,
    InCover,
}

/// Cover as seen by a squad: where it is and which squad, if any, holds it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverSlot {
    pub position: Vec2,
    pub occupant_squad: Option<u32>,
}

impl CoverPoint for CoverSlot {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_occupied(&self) -> bool {
        self.occupant_squad.is_some()
    }
}

/// A living squad member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberView<M> {
    pub id: M,
    pub position: Vec2,
    pub state: SoldierState,
    pub max_speed: f32,
}

/// Everything the coordinator reads in one tick.
#[derive(Debug, Clone, Copy)]
pub struct SquadView<'a, M> {
    pub squad_id: u32,
    pub center: Vec2,
    /// Living members only, in squad order.
    pub members: &'a [MemberView<M>],
    /// Every cover in the world; commands refer to covers by index here.
    pub covers: &'a [CoverSlot],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinatorCommand<M> {
    /// Assign `cover` and send the member to it.
    TakeCover { member: M, cover: usize },
    /// Release any cover and rejoin squad movement.
    Resume { member: M },
    /// Route the whole squad to `destination`.
    Approach { destination: Vec2 },
    /// Route the squad back to its own destination, or halt the route if
    /// it has none.
    ResumeObjective,
}

#[derive(Debug, Clone, PartialEq)]
struct TargetCluster {
    center: Vec2,
    members: Vec<usize>,
    assigned: bool,
    /// An `Approach` was issued for this cluster.
    approaching: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coordinator {
    pub config: CoordinatorConfig,
    phase: CoverPhase,
    last_scan: f64,
    entered_cover_at: f64,
    target: Option<TargetCluster>,
    last_used_center: Option<Vec2>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            phase: CoverPhase::Moving,
            last_scan: f64::NEG_INFINITY,
            entered_cover_at: 0.0,
            target: None,
            last_used_center: None,
        }
    }

    pub fn phase(&self) -> CoverPhase {
        self.phase
    }

    /// Centre of the cluster being approached or occupied.
    pub fn target_center(&self) -> Option<Vec2> {
        self.target.as_ref().map(|t| t.center)
    }

    pub fn last_used_center(&self) -> Option<Vec2> {
        self.last_used_center
    }

    /// Forget the current target and go back to scanning.
    pub fn reset(&mut self) {
        self.phase = CoverPhase::Moving;
        self.target = None;
    }

    pub fn tick<M: Copy + PartialEq>(
        &mut self,
        now: f64,
        view: &SquadView<'_, M>,
        detector: &ClusterDetector,
    ) -> Vec<CoordinatorCommand<M>> {
        if view.members.is_empty() {
            return Vec::new();
        }
        match self.phase {
            CoverPhase::Moving => {
                self.scan(now, view, detector);
                Vec::new()
            }
            CoverPhase::GoingToCover => self.going_to_cover(now, view, detector),
            CoverPhase::InCover => self.in_cover(now, view, detector),
        }
    }

    fn scan<M>(&mut self, now: f64, view: &SquadView<'_, M>, detector: &ClusterDetector) {
        if now - self.last_scan < self.config.cluster_scan_interval as f64 {
            return;
        }
        self.last_scan = now;

        let Some(cluster) =
            detector.find_best_cluster_for_squad(view.center, view.members.len(), view.covers)
        else {
            return;
        };

        let min = self.config.min_cluster_distance;
        if view.center.distance(&cluster.center) <= min {
            return;
        }
        if self
            .last_used_center
            .is_some_and(|last| last.distance(&cluster.center) <= min)
        {
            return;
        }

        tracing::info!(
            "squad {} heading for cluster of {} covers ({} free) at {:.1}m",
            view.squad_id,
            cluster.len(),
            cluster.available_count,
            view.center.distance(&cluster.center)
        );
        self.target = Some(TargetCluster {
            center: cluster.center,
            members: cluster.members,
            assigned: false,
            approaching: false,
        });
        self.phase = CoverPhase::GoingToCover;
    }

    fn abandon<M>(&mut self, squad_id: u32, reason: &str) -> Vec<CoordinatorCommand<M>> {
        tracing::info!("squad {} abandons cover cluster: {}", squad_id, reason);
        self.release_target()
    }

    /// Back to scanning. A squad that was detoured gets its route back.
    fn release_target<M>(&mut self) -> Vec<CoordinatorCommand<M>> {
        let detoured = self.target.as_ref().is_some_and(|t| t.approaching);
        self.reset();
        if detoured {
            vec![CoordinatorCommand::ResumeObjective]
        } else {
            Vec::new()
        }
    }

    fn going_to_cover<M: Copy + PartialEq>(
        &mut self,
        now: f64,
        view: &SquadView<'_, M>,
        detector: &ClusterDetector,
    ) -> Vec<CoordinatorCommand<M>> {
        let Some(target) = self.target.as_mut() else {
            self.reset();
            return Vec::new();
        };

        if target.assigned {
            let all_in_cover = view.members.iter().all(|m| m.state == SoldierState::InCover);
            if all_in_cover {
                tracing::info!("squad {} in cover", view.squad_id);
                self.phase = CoverPhase::InCover;
                self.entered_cover_at = now;
                return Vec::new();
            }

            let dropped_out = view.members.iter().any(|m| !m.state.holds_cover());
            if dropped_out {
                let mut commands = resume_all(view);
                commands.extend(self.abandon(view.squad_id, "a member lost its cover"));
                return commands;
            }
            return Vec::new();
        }

        let distance = view.center.distance(&target.center);
        if distance > detector.detection_radius {
            return self.abandon(view.squad_id, "cluster out of range");
        }
        let approach = self
            .config
            .cluster_approach_distance
            .unwrap_or(detector.detection_radius);
        // a route that ran out short of the approach distance stops everyone
        let halted = target.approaching
            && view.members.iter().all(|m| m.state == SoldierState::Idle);
        if distance > approach && !halted {
            if target.approaching {
                return Vec::new();
            }
            target.approaching = true;
            tracing::debug!(
                "squad {} approaching cluster, {:.1}m out",
                view.squad_id,
                distance
            );
            return vec![CoordinatorCommand::Approach {
                destination: target.center,
            }];
        }

        let mut free: Vec<usize> = target
            .members
            .iter()
            .copied()
            .filter(|&i| view.covers.get(i).is_some_and(|c| c.occupant_squad.is_none()))
            .collect();
        if free.len() < view.members.len() {
            return self.abandon(view.squad_id, "not enough free covers");
        }

        // each member, in squad order, takes the nearest cover still free
        let mut commands = Vec::with_capacity(view.members.len());
        for member in view.members {
            let Some(slot) = nearest(&free, view.covers, member.position) else {
                break;
            };
            let cover = free.swap_remove(slot);
            commands.push(CoordinatorCommand::TakeCover {
                member: member.id,
                cover,
            });
        }
        target.assigned = true;
        tracing::debug!(
            "squad {} assigned {} covers",
            view.squad_id,
            commands.len()
        );
        commands
    }

    fn in_cover<M: Copy + PartialEq>(
        &mut self,
        now: f64,
        view: &SquadView<'_, M>,
        detector: &ClusterDetector,
    ) -> Vec<CoordinatorCommand<M>> {
        let elapsed = (now - self.entered_cover_at) as f32;
        if elapsed < self.config.time_in_cover {
            return Vec::new();
        }

        if let Some(leave) = &self.config.leave_decision {
            if elapsed < self.config.max_time_in_cover && !self.may_leave(leave, view, detector) {
                return Vec::new();
            }
        }

        tracing::info!(
            "squad {} leaving cover after {:.1}s",
            view.squad_id,
            elapsed
        );
        self.last_used_center = self.target_center();
        let mut commands = resume_all(view);
        commands.extend(self.release_target());
        commands
    }

    fn may_leave<M>(
        &self,
        leave: &LeaveDecision,
        view: &SquadView<'_, M>,
        detector: &ClusterDetector,
    ) -> bool {
        let current: &[usize] = self.target.as_ref().map_or(&[], |t| t.members.as_slice());
        let candidates: Vec<CoverSlot> = view
            .covers
            .iter()
            .enumerate()
            .filter(|(i, c)| {
                !current.contains(i)
                    && c.occupant_squad.map_or(true, |squad| squad == view.squad_id)
            })
            .map(|(_, c)| *c)
            .collect();
        let next =
            detector.find_best_cluster_for_squad(view.center, view.members.len(), &candidates);

        let positions: Vec<Vec2> = view.members.iter().map(|m| m.position).collect();
        let speeds: Vec<f32> = view.members.iter().map(|m| m.max_speed).collect();
        let report = leave.evaluate(view.center, &positions, &speeds, next.as_ref());
        tracing::debug!(
            "squad {} leave check: covers={} exposure={} cohesive={}",
            view.squad_id,
            report.enough_covers,
            report.exposure_ok,
            report.cohesive
        );
        report.can_leave()
    }
}

fn resume_all<M: Copy>(view: &SquadView<'_, M>) -> Vec<CoordinatorCommand<M>> {
    view.members
        .iter()
        .map(|m| CoordinatorCommand::Resume { member: m.id })
        .collect()
}

/// Position in `free` of the cover closest to `point`.
fn nearest(free: &[usize], covers: &[CoverSlot], point: Vec2) -> Option<usize> {
    let distance = |cover: usize| covers[cover].position.distance_squared(&point);
    (0..free.len()).min_by(|&a, &b| distance(free[a]).total_cmp(&distance(free[b])))
}
