//! A* pathfinding over the spatial grid.
//!
//! 4-directional movement with unit edge cost and a Manhattan heuristic,
//! integer costs throughout. The open set is a binary heap ordered by
//! `f = g + h`, ties broken by lower `h`, then by the most recently
//! discovered cell. Closed cells are never reopened, which is only correct
//! because every edge costs exactly 1.
//!
//! An unreachable goal is not an error: [`find_path`] returns an empty
//! waypoint list and the caller decides when to try again.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::geometry::Vec2;
use crate::grid::{Grid, GridCoord};

/// Open-set entry. `Ord` is reversed so `BinaryHeap` pops the best entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    h: u32,
    g: u32,
    seq: u32,
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-search scratch state for one cell.
#[derive(Debug, Clone, Copy)]
struct NodeScratch {
    g: u32,
    parent: Option<usize>,
    closed: bool,
}

impl Default for NodeScratch {
    fn default() -> Self {
        Self {
            g: u32::MAX,
            parent: None,
            closed: false,
        }
    }
}

/// Find a route between two world positions.
///
/// Returns cell centres: the first step out of the start cell, then every
/// turn of the simplified route, ending at the goal cell. The first waypoint
/// is therefore always a neighbour of the start cell. Empty when no route
/// exists. When start and goal share a cell the goal centre is the only
/// waypoint.
pub fn find_path(grid: &Grid, start: Vec2, goal: Vec2) -> Vec<Vec2> {
    let start_cell = grid.cell_at(start).coord;
    let goal_cell = grid.cell_at(goal).coord;

    let Some(cells) = find_cell_path(grid, start_cell, goal_cell) else {
        tracing::debug!("no path from {:?} to {:?}", start_cell, goal_cell);
        return Vec::new();
    };

    route_waypoints(&cells)
        .into_iter()
        .filter_map(|c| grid.cell(c).map(|cell| cell.world_position))
        .collect()
}

/// Waypoint cells for a raw path: first step, turns, goal. No repeats.
fn route_waypoints(cells: &[GridCoord]) -> Vec<GridCoord> {
    let Some(&first_step) = cells.get(1) else {
        return cells.to_vec();
    };
    let mut out = vec![first_step];
    for cell in simplify_path(cells).into_iter().skip(1) {
        if out.last() != Some(&cell) {
            out.push(cell);
        }
    }
    out
}

/// Raw A* cell sequence from `start` to `goal`, both included.
///
/// `None` when the goal is blocked, out of bounds, or unreachable. The start
/// cell itself is allowed to be blocked so an agent brushing an obstacle can
/// still route away from it.
pub fn find_cell_path(grid: &Grid, start: GridCoord, goal: GridCoord) -> Option<Vec<GridCoord>> {
    grid.cell(start)?;
    if !grid.is_walkable(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let start_index = grid.index_of(start);
    let goal_index = grid.index_of(goal);
    let mut scratch = vec![NodeScratch::default(); grid.cell_count()];
    let mut open = BinaryHeap::new();
    let mut seq = 0u32;

    scratch[start_index].g = 0;
    let h0 = start.manhattan(&goal);
    open.push(OpenEntry {
        f: h0,
        h: h0,
        g: 0,
        seq,
        index: start_index,
    });

    while let Some(current) = open.pop() {
        let node = scratch[current.index];
        // stale entry superseded by a cheaper one
        if node.closed || current.g != node.g {
            continue;
        }
        scratch[current.index].closed = true;

        if current.index == goal_index {
            return Some(retrace(grid, &scratch, start_index, goal_index));
        }

        let coord = grid.cell_by_index(current.index).coord;
        for neighbor in grid.neighbors_of(coord, false) {
            let n_index = grid.index_of(neighbor);
            if !grid.cell_by_index(n_index).walkable || scratch[n_index].closed {
                continue;
            }

            let tentative = current.g + coord.manhattan(&neighbor);
            if tentative < scratch[n_index].g {
                scratch[n_index].g = tentative;
                scratch[n_index].parent = Some(current.index);
                let h = neighbor.manhattan(&goal);
                seq += 1;
                open.push(OpenEntry {
                    f: tentative + h,
                    h,
                    g: tentative,
                    seq,
                    index: n_index,
                });
            }
        }
    }

    None
}

fn retrace(grid: &Grid, scratch: &[NodeScratch], start: usize, goal: usize) -> Vec<GridCoord> {
    let mut path = vec![grid.cell_by_index(goal).coord];
    let mut current = goal;
    while current != start {
        match scratch[current].parent {
            Some(parent) => {
                path.push(grid.cell_by_index(parent).coord);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Collapse runs with the same direction of travel.
///
/// Keeps the first point, every point where the direction changes, and the
/// last point. Applying it twice gives the same result as applying it once.
pub fn simplify_path(path: &[GridCoord]) -> Vec<GridCoord> {
    let Some((&first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut out = vec![first];
    let Some(&last) = rest.last() else {
        return out;
    };

    for window in path.windows(3) {
        let incoming = window[0].direction_to(&window[1]);
        let outgoing = window[1].direction_to(&window[2]);
        if incoming != outgoing {
            out.push(window[1]);
        }
    }
    out.push(last);
    out
}

/// Total number of unit steps along a cell path.
pub fn path_steps(path: &[GridCoord]) -> u32 {
    path.windows(2).map(|w| w[0].manhattan(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridConfig, Obstacle};

    fn open_grid(w: usize, h: usize) -> Grid {
        Grid::open(GridConfig {
            center: Vec2::new(w as f32 / 2.0, h as f32 / 2.0),
            world_size: Vec2::new(w as f32, h as f32),
            cell_radius: 0.5,
        })
        .unwrap()
    }

    fn c(x: usize, y: usize) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn test_open_grid_corner_to_corner() {
        let grid = open_grid(10, 10);
        let path = find_cell_path(&grid, c(0, 0), c(9, 9)).unwrap();
        assert_eq!(path.first(), Some(&c(0, 0)));
        assert_eq!(path.last(), Some(&c(9, 9)));
        assert_eq!(path_steps(&path), 18);
        assert_eq!(path.len(), 19);

        // L-shaped: one turn between the first step and the goal
        assert_eq!(simplify_path(&path).len(), 3);

        let start = Vec2::new(0.5, 0.5);
        let waypoints = find_path(&grid, start, Vec2::new(9.5, 9.5));
        assert_eq!(waypoints.len(), 3);
        assert!(waypoints[0].distance(&start) <= grid.cell_diameter() + 1e-4);
        assert_eq!(waypoints.last(), Some(&Vec2::new(9.5, 9.5)));
    }

    #[test]
    fn test_straight_line_first_step_and_goal() {
        let grid = open_grid(10, 3);
        let waypoints = find_path(&grid, Vec2::new(0.5, 1.5), Vec2::new(9.5, 1.5));
        assert_eq!(waypoints, vec![Vec2::new(1.5, 1.5), Vec2::new(9.5, 1.5)]);
    }

    #[test]
    fn test_adjacent_goal_single_waypoint() {
        let grid = open_grid(5, 5);
        let waypoints = find_path(&grid, Vec2::new(1.5, 1.5), Vec2::new(2.5, 1.5));
        assert_eq!(waypoints, vec![Vec2::new(2.5, 1.5)]);
    }

    #[test]
    fn test_turn_right_after_first_step_not_repeated() {
        let path = vec![c(0, 0), c(1, 0), c(1, 1), c(1, 2)];
        assert_eq!(route_waypoints(&path), vec![c(1, 0), c(1, 2)]);
    }

    #[test]
    fn test_same_cell() {
        let grid = open_grid(5, 5);
        let waypoints = find_path(&grid, Vec2::new(2.2, 2.2), Vec2::new(2.8, 2.7));
        assert_eq!(waypoints, vec![Vec2::new(2.5, 2.5)]);
    }

    #[test]
    fn test_single_blocked_cell_forces_detour() {
        let grid = Grid::build(
            GridConfig {
                center: Vec2::new(2.5, 2.5),
                world_size: Vec2::new(5.0, 5.0),
                cell_radius: 0.5,
            },
            |p, _| p == Vec2::new(2.5, 2.5),
        )
        .unwrap();
        assert!(!grid.is_walkable(c(2, 2)));

        let path = find_cell_path(&grid, c(0, 2), c(4, 2)).unwrap();
        assert!(!path.contains(&c(2, 2)));
        assert!(path_steps(&path) >= 4 + 2);
    }

    #[test]
    fn test_enclosed_goal_unreachable() {
        // ring of rock around (5, 5)
        let grid = Grid::from_obstacles(
            GridConfig {
                center: Vec2::new(5.0, 5.0),
                world_size: Vec2::new(10.0, 10.0),
                cell_radius: 0.5,
            },
            &[
                Obstacle::Rect {
                    min: Vec2::new(3.6, 3.6),
                    max: Vec2::new(7.4, 4.4),
                },
                Obstacle::Rect {
                    min: Vec2::new(3.6, 6.6),
                    max: Vec2::new(7.4, 7.4),
                },
                Obstacle::Rect {
                    min: Vec2::new(3.6, 3.6),
                    max: Vec2::new(4.4, 7.4),
                },
                Obstacle::Rect {
                    min: Vec2::new(6.6, 3.6),
                    max: Vec2::new(7.4, 7.4),
                },
            ],
        )
        .unwrap();
        assert!(grid.is_walkable(c(5, 5)));
        assert!(find_cell_path(&grid, c(0, 0), c(5, 5)).is_none());
        assert!(find_path(&grid, Vec2::new(0.5, 0.5), Vec2::new(5.5, 5.5)).is_empty());
    }

    #[test]
    fn test_blocked_goal_is_empty() {
        let grid = Grid::build(
            GridConfig {
                center: Vec2::new(2.5, 2.5),
                world_size: Vec2::new(5.0, 5.0),
                cell_radius: 0.5,
            },
            |p, _| p.x > 4.0,
        )
        .unwrap();
        assert!(find_cell_path(&grid, c(0, 0), c(4, 4)).is_none());
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let path = vec![c(0, 0), c(1, 0), c(2, 0), c(2, 1), c(2, 2), c(3, 2)];
        let simplified = simplify_path(&path);
        assert_eq!(simplified, vec![c(0, 0), c(2, 0), c(2, 2), c(3, 2)]);
    }

    #[test]
    fn test_simplify_idempotent() {
        let grid = open_grid(12, 12);
        let blocked = Grid::build(
            GridConfig {
                center: Vec2::new(6.0, 6.0),
                world_size: Vec2::new(12.0, 12.0),
                cell_radius: 0.5,
            },
            |p, _| p.x > 3.0 && p.x < 4.0 && p.y < 9.0,
        )
        .unwrap();
        for g in [&grid, &blocked] {
            let path = find_cell_path(g, c(0, 0), c(11, 4)).unwrap();
            let once = simplify_path(&path);
            let twice = simplify_path(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_simplify_trivial_inputs() {
        assert!(simplify_path(&[]).is_empty());
        assert_eq!(simplify_path(&[c(1, 1)]), vec![c(1, 1)]);
        assert_eq!(simplify_path(&[c(1, 1), c(1, 2)]), vec![c(1, 1), c(1, 2)]);
    }

    #[test]
    fn test_deterministic() {
        let grid = open_grid(20, 20);
        let a = find_cell_path(&grid, c(3, 1), c(17, 15));
        let b = find_cell_path(&grid, c(3, 1), c(17, 15));
        assert_eq!(a, b);
    }
}
