//! Squad route following.
//!
//! The squad moves as a whole along an A* route planned from its centroid.
//! A waypoint is reached when the centroid (not any single soldier) comes
//! within `waypoint_reached_distance`. The route is replanned from the
//! current centroid every `path_update_interval` seconds; an empty replan
//! keeps the old route. An empty initial plan backs off for one interval
//! before trying again.

use crate::geometry::Vec2;

/// What happened to the route this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEvent {
    /// Not following anything.
    Idle,
    Following,
    WaypointReached(usize),
    Completed,
    /// Initial plan came back empty; retry scheduled.
    NoPath,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SquadRoute {
    destination: Option<Vec2>,
    waypoints: Vec<Vec2>,
    index: usize,
    following: bool,
    last_replan: f64,
    next_attempt: Option<f64>,
}

impl SquadRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan toward `destination` from `center` and start following.
    ///
    /// Returns `false` when no path exists; a retry is then scheduled
    /// `retry_after` seconds later.
    pub fn start<P>(
        &mut self,
        now: f64,
        center: Vec2,
        destination: Vec2,
        retry_after: f32,
        mut plan: P,
    ) -> bool
    where
        P: FnMut(Vec2, Vec2) -> Vec<Vec2>,
    {
        self.destination = Some(destination);
        self.last_replan = now;
        let path = plan(center, destination);
        self.accept_initial(now, path, retry_after)
    }

    fn accept_initial(&mut self, now: f64, path: Vec<Vec2>, retry_after: f32) -> bool {
        if path.is_empty() {
            self.waypoints.clear();
            self.index = 0;
            self.following = false;
            self.next_attempt = Some(now + retry_after as f64);
            false
        } else {
            self.waypoints = path;
            self.index = 0;
            self.following = true;
            self.next_attempt = None;
            true
        }
    }

    /// Advance along the route and replan when due.
    pub fn update<P>(
        &mut self,
        now: f64,
        center: Vec2,
        waypoint_reached_distance: f32,
        path_update_interval: f32,
        mut plan: P,
    ) -> RouteEvent
    where
        P: FnMut(Vec2, Vec2) -> Vec<Vec2>,
    {
        let Some(destination) = self.destination else {
            return RouteEvent::Idle;
        };

        if !self.following {
            return match self.next_attempt {
                Some(at) if now >= at => {
                    self.last_replan = now;
                    let path = plan(center, destination);
                    if self.accept_initial(now, path, path_update_interval) {
                        RouteEvent::Following
                    } else {
                        RouteEvent::NoPath
                    }
                }
                Some(_) => RouteEvent::NoPath,
                None => RouteEvent::Idle,
            };
        }

        let mut event = RouteEvent::Following;
        if let Some(&waypoint) = self.waypoints.get(self.index) {
            if center.distance(&waypoint) < waypoint_reached_distance {
                self.index += 1;
                event = RouteEvent::WaypointReached(self.index);
            }
        }
        if self.index >= self.waypoints.len() {
            self.finish();
            return RouteEvent::Completed;
        }

        if now - self.last_replan >= path_update_interval as f64 {
            self.last_replan = now;
            let path = plan(center, destination);
            if !path.is_empty() {
                self.waypoints = path;
                self.index = 0;
            }
        }
        event
    }

    fn finish(&mut self) {
        self.following = false;
        self.destination = None;
        self.next_attempt = None;
        self.index = 0;
    }

    /// Drop the route entirely.
    pub fn stop(&mut self) {
        self.finish();
        self.waypoints.clear();
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn destination(&self) -> Option<Vec2> {
        self.destination
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        if self.following {
            self.waypoints.get(self.index).copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(_from: Vec2, to: Vec2) -> Vec<Vec2> {
        vec![Vec2::new(0.0, to.y / 2.0), to]
    }

    fn nothing(_from: Vec2, _to: Vec2) -> Vec<Vec2> {
        Vec::new()
    }

    #[test]
    fn test_start_and_follow() {
        let mut route = SquadRoute::new();
        assert!(route.start(0.0, Vec2::ZERO, Vec2::new(0.0, 20.0), 1.0, straight));
        assert!(route.is_following());
        assert_eq!(route.current_waypoint(), Some(Vec2::new(0.0, 10.0)));

        let e = route.update(0.1, Vec2::new(0.0, 5.0), 2.0, 1.0, straight);
        assert_eq!(e, RouteEvent::Following);

        let e = route.update(0.2, Vec2::new(0.0, 9.0), 2.0, 1.0, straight);
        assert_eq!(e, RouteEvent::WaypointReached(1));
        assert_eq!(route.current_waypoint(), Some(Vec2::new(0.0, 20.0)));

        let e = route.update(0.3, Vec2::new(0.0, 19.5), 2.0, 1.0, straight);
        assert_eq!(e, RouteEvent::Completed);
        assert!(!route.is_following());
        assert_eq!(route.current_waypoint(), None);
        assert_eq!(route.update(0.4, Vec2::ZERO, 2.0, 1.0, straight), RouteEvent::Idle);
    }

    #[test]
    fn test_empty_replan_keeps_route() {
        let mut route = SquadRoute::new();
        route.start(0.0, Vec2::ZERO, Vec2::new(0.0, 20.0), 1.0, straight);
        let before = route.waypoints().to_vec();

        route.update(1.5, Vec2::new(0.0, 1.0), 2.0, 1.0, nothing);
        assert!(route.is_following());
        assert_eq!(route.waypoints(), before.as_slice());
    }

    #[test]
    fn test_replan_resets_index() {
        let mut route = SquadRoute::new();
        route.start(0.0, Vec2::ZERO, Vec2::new(0.0, 20.0), 1.0, straight);
        route.update(0.5, Vec2::new(0.0, 9.5), 2.0, 1.0, straight);
        assert_eq!(route.index(), 1);

        let mut calls = 0;
        route.update(1.2, Vec2::new(0.0, 12.0), 2.0, 1.0, |_, to| {
            calls += 1;
            vec![Vec2::new(0.0, 16.0), to]
        });
        assert_eq!(calls, 1);
        assert_eq!(route.index(), 0);
        assert_eq!(route.current_waypoint(), Some(Vec2::new(0.0, 16.0)));
    }

    #[test]
    fn test_no_path_backs_off() {
        let mut route = SquadRoute::new();
        assert!(!route.start(0.0, Vec2::ZERO, Vec2::new(0.0, 20.0), 1.0, nothing));
        assert!(!route.is_following());

        let mut calls = 0;
        let e = route.update(0.5, Vec2::ZERO, 2.0, 1.0, |_, _| {
            calls += 1;
            Vec::new()
        });
        assert_eq!(e, RouteEvent::NoPath);
        assert_eq!(calls, 0);

        let e = route.update(1.0, Vec2::ZERO, 2.0, 1.0, straight);
        assert_eq!(e, RouteEvent::Following);
        assert!(route.is_following());
    }

    #[test]
    fn test_stop() {
        let mut route = SquadRoute::new();
        route.start(0.0, Vec2::ZERO, Vec2::new(0.0, 20.0), 1.0, straight);
        route.stop();
        assert!(!route.is_following());
        assert!(route.destination().is_none());
        assert!(route.waypoints().is_empty());
    }
}
