//! Canyon Headless Simulation Harness
//!
//! Checks the pathfinding, clustering and cover logic, then marches the
//! bundled canyon scenario (or one given on the command line) to the end
//! and debriefs the crossing. Runs entirely in-process, no rendering.
//!
//! Usage:
//!   cargo run -p canyon-simtest
//!   cargo run -p canyon-simtest -- --verbose
//!   cargo run -p canyon-simtest -- --scenario path/to/scenario.json
//!
//! Log output follows `RUST_LOG` (default `info`).

use canyon_core::prelude::*;
use canyon_logic::cover::{ClusterDetector, CoverObject};
use canyon_logic::grid::{Grid, GridConfig, GridCoord, Obstacle};
use canyon_logic::pathfinding::{find_cell_path, find_path, path_steps};
use tracing_subscriber::EnvFilter;

const SCENARIO_JSON: &str = include_str!("../../../data/canyon_scenario.json");

const STEP: f32 = 1.0 / 30.0;
const MAX_SECONDS: f64 = 300.0;

// ── Debrief ─────────────────────────────────────────────────────────────

/// One expectation about the canyon and whether it held.
struct Check {
    name: &'static str,
    held: bool,
    note: String,
}

/// Checks grouped under the phase of the run that produced them.
#[derive(Default)]
struct Debrief {
    phases: Vec<(&'static str, Vec<Check>)>,
    verbose: bool,
}

impl Debrief {
    fn phase(&mut self, title: &'static str) {
        println!("--- {} ---", title);
        self.phases.push((title, Vec::new()));
    }

    fn check(&mut self, name: &'static str, held: bool, note: impl Into<String>) {
        let check = Check {
            name,
            held,
            note: note.into(),
        };
        if self.verbose || !check.held {
            let mark = if check.held { "held" } else { "BROKEN" };
            println!("  [{:>6}] {}: {}", mark, check.name, check.note);
        }
        if let Some((_, checks)) = self.phases.last_mut() {
            checks.push(check);
        }
    }

    fn broken(&self) -> usize {
        self.phases
            .iter()
            .flat_map(|(_, checks)| checks)
            .filter(|c| !c.held)
            .count()
    }

    fn print(&self) {
        println!("\n=== Crossing debrief ===");
        for (title, checks) in &self.phases {
            let held = checks.iter().filter(|c| c.held).count();
            println!("  {:<18} {}/{} expectations held", title, held, checks.len());
        }
        match self.broken() {
            0 => println!("\nAll clear: the canyon behaved as briefed."),
            n => println!("\n{} expectation(s) broken, see above.", n),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut debrief = Debrief {
        verbose: args.iter().any(|a| a == "--verbose"),
        ..Debrief::default()
    };
    let scenario_path = args
        .iter()
        .position(|a| a == "--scenario")
        .and_then(|i| args.get(i + 1));

    println!("=== Canyon Simulation Harness ===\n");

    check_pathfinding(&mut debrief);
    check_clustering(&mut debrief);
    check_cover_claims(&mut debrief);

    debrief.phase("Canyon crossing");
    let config = match scenario_path {
        Some(path) => SimConfig::from_json_file(path),
        None => SimConfig::from_json_str(SCENARIO_JSON),
    };
    match config {
        Ok(config) => {
            tracing::info!(
                "scenario: {} squads, seed {}",
                config.squads.len(),
                config.seed
            );
            check_crossing(&mut debrief, &config);
        }
        Err(e) => debrief.check("scenario loads", false, e.to_string()),
    }

    debrief.print();
    if debrief.broken() > 0 {
        std::process::exit(1);
    }
}

// ── Pathfinding ─────────────────────────────────────────────────────────

fn ten_by_ten() -> GridConfig {
    GridConfig {
        center: Vec2::new(5.0, 5.0),
        world_size: Vec2::new(10.0, 10.0),
        cell_radius: 0.5,
    }
}

fn check_pathfinding(debrief: &mut Debrief) {
    debrief.phase("Pathfinding");

    let open = match Grid::open(ten_by_ten()) {
        Ok(g) => g,
        Err(e) => {
            debrief.check("open grid builds", false, e.to_string());
            return;
        }
    };

    // L-shaped route across an open 10x10 grid
    let start = GridCoord::new(0, 0);
    let goal = GridCoord::new(9, 9);
    let raw = find_cell_path(&open, start, goal);
    let steps = raw.as_deref().map(path_steps).unwrap_or(0);
    debrief.check(
        "corner to corner takes 18 steps",
        steps == 18,
        format!("(0,0)→(9,9) in {} steps", steps),
    );

    let ends_ok = raw
        .as_ref()
        .is_some_and(|p| p.first() == Some(&start) && p.last() == Some(&goal));
    debrief.check(
        "cell path spans start to goal",
        ends_ok,
        "first cell is the start, last is the goal",
    );

    let start_pos = open.cell_by_index(open.index_of(start)).world_position;
    let waypoints = find_path(
        &open,
        start_pos,
        open.cell_by_index(open.index_of(goal)).world_position,
    );
    let first_step = waypoints
        .first()
        .map_or(f32::INFINITY, |w| w.distance(&start_pos));
    debrief.check(
        "waypoints leave from the start",
        waypoints.len() == 3 && first_step <= open.cell_diameter() + 1e-4,
        format!(
            "{} waypoints (first step, turn, goal), first {:.1} m out",
            waypoints.len(),
            first_step
        ),
    );

    // one rock on the straight line forces a detour
    let rock = open.cell_by_index(open.index_of(GridCoord::new(5, 0))).world_position;
    let rocky = Grid::from_obstacles(
        ten_by_ten(),
        &[Obstacle::Circle {
            center: rock,
            radius: 0.1,
        }],
    );
    let straight = find_cell_path(&open, GridCoord::new(0, 0), GridCoord::new(9, 0))
        .as_deref()
        .map(path_steps);
    let detour = rocky
        .as_ref()
        .ok()
        .and_then(|g| find_cell_path(g, GridCoord::new(0, 0), GridCoord::new(9, 0)))
        .as_deref()
        .map(path_steps);
    debrief.check(
        "a rock costs at least two steps",
        matches!((straight, detour), (Some(s), Some(d)) if d >= s + 2),
        format!("straight={:?} around the rock={:?}", straight, detour),
    );

    let walled = Grid::build(ten_by_ten(), |p, _| {
        let ring = (p.x - 7.5).abs().max((p.y - 7.5).abs());
        (0.9..1.1).contains(&ring)
    });
    let enclosed = walled
        .as_ref()
        .map(|g| find_cell_path(g, GridCoord::new(0, 0), GridCoord::new(7, 7)).is_none())
        .unwrap_or(false);
    debrief.check(
        "walled-in goal has no route",
        enclosed,
        "goal inside a closed ring of rock",
    );

    if debrief.verbose {
        println!("  waypoints: {:?}", waypoints);
    }
}

// ── Clustering ──────────────────────────────────────────────────────────

fn check_clustering(debrief: &mut Debrief) {
    debrief.phase("Cover clustering");
    let detector = ClusterDetector::default();

    let covers: Vec<CoverObject<u32>> = [
        (0.0, 10.0),
        (2.0, 10.0),
        (4.0, 11.0),
        (1.0, 13.0),
        (3.0, 13.0),
        (5.0, 9.0),
        // boulders across the canyon
        (40.0, 10.0),
        (42.0, 10.0),
    ]
    .iter()
    .map(|&(x, y)| CoverObject::new(Vec2::new(x, y)))
    .collect();

    let clusters = detector.create_clusters(&covers);
    let mut seen = vec![0usize; covers.len()];
    for c in &clusters {
        for &m in &c.members {
            seen[m] += 1;
        }
    }
    debrief.check(
        "every cover in one cluster",
        seen.iter().all(|&n| n == 1),
        format!("{} covers in {} clusters", covers.len(), clusters.len()),
    );

    let best = detector.find_best_cluster_for_squad(Vec2::new(2.0, 0.0), 4, &covers);
    let size = best.as_ref().map(|c| c.len()).unwrap_or(0);
    debrief.check(
        "fire team of 4 finds shelter",
        size >= 4,
        format!("nearest usable cluster has {} covers", size),
    );

    let none = detector.find_best_cluster_for_squad(Vec2::new(2.0, 0.0), 10, &covers);
    debrief.check(
        "platoon of 10 finds none",
        none.is_none(),
        "no cluster holds ten",
    );

    if debrief.verbose {
        for c in &clusters {
            println!(
                "  cluster at ({:.1}, {:.1}): {} covers",
                c.center.x,
                c.center.y,
                c.len()
            );
        }
    }
}

// ── Cover claims ────────────────────────────────────────────────────────

fn check_cover_claims(debrief: &mut Debrief) {
    debrief.phase("Cover occupancy");

    let mut cover: CoverObject<u32> = CoverObject::new(Vec2::ZERO);
    let first = cover.set_occupied(1).is_ok();
    let second = cover.set_occupied(2).is_err();
    debrief.check(
        "one soldier per cover",
        first && second && cover.occupant() == Some(1),
        "second soldier is turned away",
    );

    cover.set_free();
    debrief.check(
        "vacated cover is reusable",
        !cover.is_occupied() && cover.set_occupied(2).is_ok(),
        "freed cover taken by the next soldier",
    );
}

// ── Crossing ────────────────────────────────────────────────────────────

fn check_crossing(debrief: &mut Debrief, config: &SimConfig) {
    let mut engine = match SimulationEngine::new(config) {
        Ok(e) => e,
        Err(e) => {
            debrief.check("engine builds", false, e.to_string());
            return;
        }
    };
    let soldiers = engine.outcome().total();

    // Step manually so occupancy can be checked every tick
    let mut violations = 0usize;
    let mut max_occupied = 0usize;
    let mut last_report = 0.0;
    while engine.sim_time() < MAX_SECONDS {
        engine.update(STEP);
        violations += occupancy_violations(&engine);
        max_occupied = max_occupied.max(engine.occupied_cover_count());

        if debrief.verbose && engine.sim_time() - last_report >= 10.0 {
            last_report = engine.sim_time();
            let o = engine.outcome();
            println!(
                "  t={:>5.1}s in the field={} rescued={} fallen={} covers held={}",
                engine.sim_time(),
                o.active,
                o.rescued,
                o.fallen,
                engine.occupied_cover_count()
            );
        }
        if engine.outcome().is_finished() {
            break;
        }
    }
    let outcome = engine.outcome();

    debrief.check(
        "every soldier accounted for",
        outcome.total() == soldiers,
        format!(
            "{} rescued + {} fallen + {} in the field = {} of {}",
            outcome.rescued,
            outcome.fallen,
            outcome.active,
            outcome.total(),
            soldiers
        ),
    );
    debrief.check(
        "covers only held by their soldier",
        violations == 0,
        format!(
            "{} bad holds over the run, at most {} covers held at once",
            violations, max_occupied
        ),
    );
    debrief.check(
        "squads sheltered on the way",
        max_occupied > 0,
        format!("up to {} covers held", max_occupied),
    );
    debrief.check(
        "nobody left in the canyon",
        outcome.is_finished(),
        format!(
            "ended at t={:.1}s with {:.0}% survival",
            engine.sim_time(),
            outcome.survival_rate() * 100.0
        ),
    );

    // Same seed, same crossing
    let replay = SimulationEngine::new(config)
        .map(|mut e| e.run_until_finished(STEP, MAX_SECONDS))
        .ok();
    debrief.check(
        "replay ends the same way",
        replay == Some(outcome),
        format!("replay {:?}", replay),
    );
}

/// Covers held by anyone other than a living soldier assigned to them and
/// in a cover-holding state.
fn occupancy_violations(engine: &SimulationEngine) -> usize {
    let world = &engine.world;
    engine
        .covers()
        .iter()
        .filter_map(|&cover| {
            let occupant = world.get::<&Cover>(cover).ok()?.occupant()?;
            Some((cover, occupant))
        })
        .filter(|&(cover, soldier)| {
            let assigned = world
                .get::<&AssignedCover>(soldier)
                .is_ok_and(|a| a.cover == Some(cover));
            let holding = world
                .get::<&StateMachine>(soldier)
                .is_ok_and(|f| f.current().holds_cover());
            let alive =
                world.get::<&Fallen>(soldier).is_err() && world.get::<&Rescued>(soldier).is_err();
            !(assigned && holding && alive)
        })
        .count()
}
