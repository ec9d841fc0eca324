//! A* throughput on the default 50x100 canyon grid.
//!
//! ```bash
//! cargo bench --package canyon-logic --bench pathfinding
//! ```

use canyon_logic::geometry::Vec2;
use canyon_logic::grid::{Grid, GridConfig, Obstacle};
use canyon_logic::pathfinding::find_path;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn rocky_canyon() -> Grid {
    let mut obstacles = Vec::new();
    for row in 0..8 {
        let y = -40.0 + row as f32 * 10.0;
        let (min_x, max_x) = if row % 2 == 0 {
            (-25.0, 15.0)
        } else {
            (-15.0, 25.0)
        };
        obstacles.push(Obstacle::Rect {
            min: Vec2::new(min_x, y),
            max: Vec2::new(max_x, y + 1.5),
        });
    }
    Grid::from_obstacles(GridConfig::default(), &obstacles).expect("valid grid")
}

fn bench_pathfinding(c: &mut Criterion) {
    let open = Grid::open(GridConfig::default()).expect("valid grid");
    let rocky = rocky_canyon();
    let start = Vec2::new(0.0, -48.0);
    let goal = Vec2::new(0.0, 48.0);

    c.bench_function("astar_open_canyon", |b| {
        b.iter(|| find_path(black_box(&open), black_box(start), black_box(goal)))
    });

    c.bench_function("astar_switchback_canyon", |b| {
        b.iter(|| find_path(black_box(&rocky), black_box(start), black_box(goal)))
    });
}

criterion_group!(benches, bench_pathfinding);
criterion_main!(benches);
