//! Integration tests across the logic modules.
//!
//! Exercises: Grid → A* → SquadRoute, Steering → MovementController,
//! ClusterDetector → Coordinator, plus property tests on the force and
//! speed limits and on cluster partitioning.

use canyon_logic::config::SquadTuning;
use canyon_logic::coordinator::{
    Coordinator, CoordinatorCommand, CoordinatorConfig, CoverPhase, CoverSlot, MemberView,
    SquadView,
};
use canyon_logic::cover::{ClusterDetector, CoverObject};
use canyon_logic::fsm::SoldierState;
use canyon_logic::geometry::Vec2;
use canyon_logic::grid::{Grid, GridConfig, GridCoord, Obstacle};
use canyon_logic::movement::MovementController;
use canyon_logic::pathfinding::{find_cell_path, find_path, path_steps, simplify_path};
use canyon_logic::route::{RouteEvent, SquadRoute};
use canyon_logic::steering::Steering;
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn canyon_grid() -> Grid {
    let obstacles = [
        Obstacle::Rect {
            min: Vec2::new(-25.0, 20.0),
            max: Vec2::new(5.0, 24.0),
        },
        Obstacle::Rect {
            min: Vec2::new(-5.0, 30.0),
            max: Vec2::new(25.0, 34.0),
        },
        Obstacle::Circle {
            center: Vec2::new(0.0, 40.0),
            radius: 3.0,
        },
    ];
    Grid::from_obstacles(GridConfig::default(), &obstacles).unwrap()
}

// ── Pathfinding ────────────────────────────────────────────────────────

#[test]
fn route_through_canyon_avoids_rock() {
    let grid = canyon_grid();
    let start = Vec2::new(0.0, -45.0);
    let goal = Vec2::new(0.0, 45.0);

    let raw = find_cell_path(&grid, grid.cell_at(start).coord, grid.cell_at(goal).coord).unwrap();
    assert_eq!(raw.first().copied(), Some(grid.cell_at(start).coord));
    assert_eq!(raw.last().copied(), Some(grid.cell_at(goal).coord));
    assert!(raw.iter().all(|&c| grid.is_walkable(c)));
    for pair in raw.windows(2) {
        assert_eq!(pair[0].manhattan(&pair[1]), 1);
    }

    let waypoints = find_path(&grid, start, goal);
    assert!(!waypoints.is_empty());
    assert_eq!(waypoints.last().copied(), Some(grid.cell_at(goal).world_position));
}

#[test]
fn detour_costs_at_least_two_steps() {
    let config = GridConfig {
        center: Vec2::new(5.0, 5.0),
        world_size: Vec2::new(10.0, 10.0),
        cell_radius: 0.5,
    };
    let open = Grid::open(config).unwrap();
    let blocked = Grid::build(config, |p, _| p == Vec2::new(4.5, 4.5)).unwrap();

    let from = GridCoord::new(0, 4);
    let to = GridCoord::new(9, 4);
    let base = path_steps(&find_cell_path(&open, from, to).unwrap());
    let detour = path_steps(&find_cell_path(&blocked, from, to).unwrap());
    assert_eq!(base, 9);
    assert!(detour >= base + 2);
}

#[test]
fn route_follower_walks_a_planned_path() {
    let grid = canyon_grid();
    let tuning = SquadTuning::default();
    let mut route = SquadRoute::new();
    let mut center = Vec2::new(0.0, -45.0);
    let plan = |from: Vec2, to: Vec2| find_path(&grid, from, to);

    assert!(route.start(0.0, center, Vec2::new(0.0, 45.0), 1.0, plan));

    // teleport the centre onto each waypoint in turn
    let mut now = 0.0;
    let mut completed = false;
    for _ in 0..200 {
        now += 0.1;
        if let Some(w) = route.current_waypoint() {
            center = w;
        }
        match route.update(
            now,
            center,
            tuning.waypoint_reached_distance,
            tuning.path_update_interval,
            plan,
        ) {
            RouteEvent::Completed => {
                completed = true;
                break;
            }
            RouteEvent::NoPath => panic!("route lost"),
            _ => {}
        }
    }
    assert!(completed);
    assert!(center.distance(&Vec2::new(0.0, 45.0)) < 1.0);
}

// ── Steering + movement ────────────────────────────────────────────────

#[test]
fn arrive_brings_agent_to_rest_near_target() {
    let tuning = SquadTuning::default();
    let mut body = MovementController::new(Vec2::ZERO, tuning.max_speed, tuning.mass);
    let target = Vec2::new(12.0, 5.0);

    for _ in 0..600 {
        let steer = Steering::new(tuning.steering(), body.position, body.velocity);
        body.apply_force(steer.arrive(target) * tuning.arrive_weight);
        body.step(1.0 / 60.0);
    }
    assert!(body.position.distance(&target) < tuning.arrival_radius);
    assert!(body.speed() < tuning.arrival_speed_threshold);
}

// ── Covers + coordinator ───────────────────────────────────────────────

#[test]
fn four_soldiers_six_covers_cluster() {
    let detector = ClusterDetector::default();
    let covers: Vec<CoverObject<u32>> = [
        (2.0, 12.0),
        (4.0, 12.5),
        (6.0, 12.0),
        (3.0, 15.0),
        (5.0, 15.5),
        (7.0, 14.0),
    ]
    .iter()
    .map(|&(x, y)| CoverObject::new(Vec2::new(x, y)))
    .collect();

    let cluster = detector
        .find_best_cluster_for_squad(Vec2::new(4.0, 0.0), 4, &covers)
        .unwrap();
    assert!(cluster.len() >= 4);
    assert_eq!(cluster.available_count, 6);
}

#[test]
fn coordinator_assigns_distinct_covers() {
    let detector = ClusterDetector::default();
    let mut coordinator = Coordinator::new(CoordinatorConfig::default());
    let covers: Vec<CoverSlot> = (0..6)
        .map(|i| CoverSlot {
            position: Vec2::new(i as f32 * 1.5, 14.0),
            occupant_squad: None,
        })
        .collect();
    let members: Vec<MemberView<u32>> = (0..4)
        .map(|i| MemberView {
            id: i,
            position: Vec2::new(i as f32, 0.0),
            state: SoldierState::SquadMovement,
            max_speed: 6.0,
        })
        .collect();
    let view = SquadView {
        squad_id: 1,
        center: Vec2::new(1.5, 0.0),
        members: &members,
        covers: &covers,
    };

    coordinator.tick(0.0, &view, &detector);
    assert_eq!(coordinator.phase(), CoverPhase::GoingToCover);
    let commands = coordinator.tick(0.1, &view, &detector);

    let mut taken: Vec<usize> = commands
        .iter()
        .filter_map(|c| match c {
            CoordinatorCommand::TakeCover { cover, .. } => Some(*cover),
            _ => None,
        })
        .collect();
    assert_eq!(taken.len(), 4);
    taken.sort_unstable();
    taken.dedup();
    assert_eq!(taken.len(), 4);
}

// ── Properties ─────────────────────────────────────────────────────────

fn vec2() -> impl Strategy<Value = Vec2> {
    (-100.0f32..100.0, -100.0f32..100.0).prop_map(|(x, y)| Vec2::new(x, y))
}

proptest! {
    #[test]
    fn arrive_and_seek_never_exceed_max_force(pos in vec2(), vel in vec2(), target in vec2()) {
        let tuning = SquadTuning::default();
        let steer = Steering::new(tuning.steering(), pos, vel);
        prop_assert!(steer.arrive(target).length() <= tuning.max_force + 1e-3);
        prop_assert!(steer.seek(target).length() <= tuning.max_force + 1e-3);
    }

    #[test]
    fn integrator_respects_max_speed(
        forces in prop::collection::vec(vec2(), 1..50),
        dt in 0.001f32..0.5,
    ) {
        let mut body = MovementController::new(Vec2::ZERO, 6.0, 1.0);
        for f in forces {
            body.apply_force(f * 10.0);
            body.step(dt);
            prop_assert!(body.speed() <= 6.0 + 1e-3);
        }
    }

    #[test]
    fn clusters_partition_covers(points in prop::collection::vec(vec2(), 0..40)) {
        let detector = ClusterDetector::default();
        let covers: Vec<CoverObject<u32>> = points.iter().map(|&p| CoverObject::new(p)).collect();
        let clusters = detector.create_clusters(&covers);

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.iter().copied()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..covers.len()).collect::<Vec<_>>());
        prop_assert!(clusters.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn waypoints_start_and_end_near_the_endpoints(
        sx in -24.9f32..24.9, sy in -49.9f32..49.9,
        gx in -24.9f32..24.9, gy in -49.9f32..49.9,
    ) {
        let grid = canyon_grid();
        let start = grid.cell_at(Vec2::new(sx, sy));
        let goal = grid.cell_at(Vec2::new(gx, gy));
        prop_assume!(start.walkable);
        prop_assume!(find_cell_path(&grid, start.coord, goal.coord).is_some());

        let waypoints = find_path(&grid, start.world_position, goal.world_position);
        let (first, last) = (waypoints[0], waypoints[waypoints.len() - 1]);
        prop_assert!(first.distance(&start.world_position) <= grid.cell_diameter() + 1e-4);
        prop_assert!(last.distance(&goal.world_position) <= grid.cell_diameter() + 1e-4);
    }

    #[test]
    fn simplification_is_idempotent(gx in 0usize..20, gy in 0usize..20) {
        let grid = Grid::open(GridConfig {
            center: Vec2::new(10.0, 10.0),
            world_size: Vec2::new(20.0, 20.0),
            cell_radius: 0.5,
        })
        .unwrap();
        let path = find_cell_path(&grid, GridCoord::new(0, 0), GridCoord::new(gx, gy)).unwrap();
        let once = simplify_path(&path);
        prop_assert_eq!(simplify_path(&once), once.clone());
        prop_assert_eq!(path_steps(&path) as usize, gx + gy);
    }
}
