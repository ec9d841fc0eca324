//! Spatial grid: discretizes the canyon floor into walkable/blocked cells.
//!
//! The grid is built once from a static obstacle test and is read-only
//! afterwards. Pathfinding scratch data never lives on the cells; each
//! search owns its own buffers so a single `Grid` can be shared freely.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Grid placement and resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World position of the grid's centre.
    pub center: Vec2,
    /// World extent covered by the grid (x = width, y = length).
    pub world_size: Vec2,
    /// Half the edge length of a cell.
    pub cell_radius: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            world_size: Vec2::new(50.0, 100.0),
            cell_radius: 0.5,
        }
    }
}

/// Errors raised while building a grid. Both are setup errors: a grid that
/// fails to build must never reach the pathfinder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("cell radius must be positive and finite, got {0}")]
    InvalidCellRadius(f32),
    #[error("grid of world size {width}x{length} with cell diameter {diameter} has no cells")]
    Degenerate {
        width: f32,
        length: f32,
        diameter: f32,
    },
}

/// Integer cell coordinates, always within `[0, size_x) x [0, size_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: usize,
    pub y: usize,
}

impl GridCoord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance in cells.
    pub fn manhattan(&self, other: &Self) -> u32 {
        (self.x.abs_diff(other.x) + self.y.abs_diff(other.y)) as u32
    }

    /// Sign of the step from `self` to `other` on each axis.
    pub fn direction_to(&self, other: &Self) -> (i8, i8) {
        (sign(self.x, other.x), sign(self.y, other.y))
    }
}

fn sign(from: usize, to: usize) -> i8 {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridCell {
    pub coord: GridCoord,
    /// World position of the cell centre.
    pub world_position: Vec2,
    pub walkable: bool,
}

/// Static obstacle shapes used to classify cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    Circle { center: Vec2, radius: f32 },
    Rect { min: Vec2, max: Vec2 },
}

impl Obstacle {
    /// Whether a disc of `radius` around `point` overlaps this obstacle.
    pub fn overlaps_disc(&self, point: Vec2, radius: f32) -> bool {
        match *self {
            Obstacle::Circle { center, radius: r } => {
                point.distance_squared(&center) < (r + radius) * (r + radius)
            }
            Obstacle::Rect { min, max } => {
                let closest = Vec2::new(point.x.clamp(min.x, max.x), point.y.clamp(min.y, max.y));
                point.distance_squared(&closest) < radius * radius
            }
        }
    }
}

/// Fixed-size 2D array of cells.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<GridCell>,
    size_x: usize,
    size_y: usize,
    cell_radius: f32,
    bottom_left: Vec2,
}

impl Grid {
    /// Build a grid, classifying each cell with `is_blocked(centre, cell_radius)`.
    pub fn build<F>(config: GridConfig, is_blocked: F) -> Result<Self, GridError>
    where
        F: Fn(Vec2, f32) -> bool,
    {
        let r = config.cell_radius;
        if !(r.is_finite() && r > 0.0) {
            return Err(GridError::InvalidCellRadius(r));
        }
        let diameter = r * 2.0;
        let size_x = (config.world_size.x / diameter).round().max(0.0) as usize;
        let size_y = (config.world_size.y / diameter).round().max(0.0) as usize;
        if size_x == 0 || size_y == 0 {
            return Err(GridError::Degenerate {
                width: config.world_size.x,
                length: config.world_size.y,
                diameter,
            });
        }

        let bottom_left = config.center - config.world_size * 0.5;
        let mut cells = Vec::with_capacity(size_x * size_y);
        let mut blocked = 0usize;
        for y in 0..size_y {
            for x in 0..size_x {
                let world_position = bottom_left
                    + Vec2::new(x as f32 * diameter + r, y as f32 * diameter + r);
                let walkable = !is_blocked(world_position, r);
                if !walkable {
                    blocked += 1;
                }
                cells.push(GridCell {
                    coord: GridCoord::new(x, y),
                    world_position,
                    walkable,
                });
            }
        }

        tracing::debug!(
            "grid built: {}x{} = {} cells ({} blocked)",
            size_x,
            size_y,
            size_x * size_y,
            blocked
        );

        Ok(Self {
            cells,
            size_x,
            size_y,
            cell_radius: r,
            bottom_left,
        })
    }

    /// Build a grid against a list of static obstacles.
    pub fn from_obstacles(config: GridConfig, obstacles: &[Obstacle]) -> Result<Self, GridError> {
        Self::build(config, |p, r| obstacles.iter().any(|o| o.overlaps_disc(p, r)))
    }

    /// Build a grid with every cell walkable.
    pub fn open(config: GridConfig) -> Result<Self, GridError> {
        Self::build(config, |_, _| false)
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_y(&self) -> usize {
        self.size_y
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_diameter(&self) -> f32 {
        self.cell_radius * 2.0
    }

    pub fn cell_radius(&self) -> f32 {
        self.cell_radius
    }

    /// Row-major index of an in-bounds coordinate.
    pub fn index_of(&self, coord: GridCoord) -> usize {
        coord.y * self.size_x + coord.x
    }

    pub fn cell(&self, coord: GridCoord) -> Option<&GridCell> {
        if coord.x < self.size_x && coord.y < self.size_y {
            self.cells.get(self.index_of(coord))
        } else {
            None
        }
    }

    pub fn cell_by_index(&self, index: usize) -> &GridCell {
        &self.cells[index]
    }

    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.cell(coord).is_some_and(|c| c.walkable)
    }

    /// Cell whose centre is nearest to `world`, clamped to the grid bounds.
    pub fn cell_at(&self, world: Vec2) -> &GridCell {
        let local = world - self.bottom_left;
        let d = self.cell_diameter();
        let x = clamp_axis(local.x / d, self.size_x);
        let y = clamp_axis(local.y / d, self.size_y);
        &self.cells[y * self.size_x + x]
    }

    /// In-bounds neighbours in the order left, right, up, down, then the
    /// four diagonals when requested. No wraparound.
    pub fn neighbors_of(&self, coord: GridCoord, include_diagonals: bool) -> Vec<GridCoord> {
        const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, 1), (0, -1)];
        const DIAGONAL: [(isize, isize); 4] = [(-1, 1), (1, 1), (-1, -1), (1, -1)];

        let mut out = Vec::with_capacity(if include_diagonals { 8 } else { 4 });
        let offsets = ORTHOGONAL
            .iter()
            .chain(DIAGONAL.iter().take(if include_diagonals { 4 } else { 0 }));
        for &(dx, dy) in offsets {
            let (Some(x), Some(y)) = (
                coord.x.checked_add_signed(dx),
                coord.y.checked_add_signed(dy),
            ) else {
                continue;
            };
            if x < self.size_x && y < self.size_y {
                out.push(GridCoord::new(x, y));
            }
        }
        out
    }
}

fn clamp_axis(scaled: f32, size: usize) -> usize {
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else {
        (scaled.floor() as usize).min(size - 1)
    }
}
