//! Tile grid - cell types, cell coordinates, and the pre-parsed map input.
//!
//! The grid is a fixed-size, row-major array of typed cells. SOLID and BRICK
//! cells block traversal; BRICK cells can be destroyed and reopened. Cells do
//! not track occupants - that is the job of the [`PositionIndex`].
//!
//! [`PositionIndex`]: crate::spatial::PositionIndex

use crate::error::SimError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Integer grid coordinate (x = column, y = row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Self {
        self.offset(direction, 1)
    }

    /// The cell `distance` steps away in `direction`.
    #[inline]
    pub fn offset(self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx * distance, self.y + dy * distance)
    }

    /// The four orthogonal neighbours in [`Direction::ALL`] order.
    pub fn neighbours(self) -> [Cell; 4] {
        Direction::ALL.map(|d| self.step(d))
    }

    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn chebyshev(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Direction of an orthogonally adjacent cell, if `other` is one.
    pub fn direction_to(self, other: Cell) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| self.step(d) == other)
    }
}

/// Cardinal direction on the grid. `Up` is toward row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The `(dx, dy)` offset for one step in this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Stable index into per-direction arrays.
    pub const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

/// Type of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Walkable floor.
    #[default]
    Open,
    /// Walkable floor marked as a starting position in the map.
    Spawn,
    /// Indestructible wall.
    Solid,
    /// Destructible wall.
    Brick,
}

impl CellType {
    /// Whether this cell type blocks movement.
    pub fn is_blocking(&self) -> bool {
        matches!(self, CellType::Solid | CellType::Brick)
    }
}

/// A single cell in the grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridCell {
    pub id: u32,
    pub cell_type: CellType,
}

/// Pre-parsed map: cell types in row-major order plus candidate spawn cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapLayout {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellType>,
    pub spawns: Vec<Cell>,
}

impl MapLayout {
    pub fn new(width: usize, height: usize, cells: Vec<CellType>, spawns: Vec<Cell>) -> Self {
        Self {
            width,
            height,
            cells,
            spawns,
        }
    }

    /// Classic arena: solid border, solid pillars on every even (x, y), and a
    /// spawn in each corner.
    ///
    /// Sizes below 3x3 are raised to 3, the smallest arena with an inner
    /// cell. Corners that coincide on narrow maps share one spawn.
    pub fn classic(width: usize, height: usize) -> Self {
        let (width, height) = (width.max(3), height.max(3));
        let mut cells = vec![CellType::Open; width * height];
        for y in 0..height {
            for x in 0..width {
                let border = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
                let pillar = x % 2 == 0 && y % 2 == 0;
                if border || pillar {
                    cells[y * width + x] = CellType::Solid;
                }
            }
        }

        let (w, h) = (width as i32, height as i32);
        let mut spawns = Vec::with_capacity(4);
        for corner in [
            Cell::new(1, 1),
            Cell::new(w - 2, h - 2),
            Cell::new(w - 2, 1),
            Cell::new(1, h - 2),
        ] {
            if !spawns.contains(&corner) {
                spawns.push(corner);
            }
        }
        for spawn in &spawns {
            cells[spawn.y as usize * width + spawn.x as usize] = CellType::Spawn;
        }

        Self::new(width, height, cells, spawns)
    }

    /// Check the layout is self-consistent.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidMap("map has no cells".to_string()));
        }
        if self.cells.len() != self.width * self.height {
            return Err(SimError::InvalidMap(format!(
                "expected {} cells for a {}x{} map, found {}",
                self.width * self.height,
                self.width,
                self.height,
                self.cells.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.spawns.len());
        for spawn in &self.spawns {
            if !seen.insert(*spawn) {
                return Err(SimError::InvalidMap(format!("spawn {spawn:?} is listed twice")));
            }
            let in_bounds = spawn.x >= 0
                && spawn.y >= 0
                && (spawn.x as usize) < self.width
                && (spawn.y as usize) < self.height;
            if !in_bounds {
                return Err(SimError::InvalidMap(format!("spawn {spawn:?} is out of bounds")));
            }
            if self.cells[spawn.y as usize * self.width + spawn.x as usize].is_blocking() {
                return Err(SimError::InvalidMap(format!("spawn {spawn:?} is inside a wall")));
            }
        }
        Ok(())
    }
}

impl Default for MapLayout {
    fn default() -> Self {
        Self::classic(13, 11)
    }
}

/// The live grid for one match.
#[derive(Resource, Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    /// Grid cells (row-major order).
    cells: Vec<GridCell>,
}

impl Grid {
    /// Instantiate one cell per map position.
    pub fn from_layout(layout: &MapLayout) -> Self {
        let cells = layout
            .cells
            .iter()
            .enumerate()
            .map(|(i, &cell_type)| GridCell {
                id: i as u32,
                cell_type,
            })
            .collect();

        Self {
            width: layout.width,
            height: layout.height,
            cells,
        }
    }

    fn cell_index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    pub fn get(&self, cell: Cell) -> Option<&GridCell> {
        self.cell_index(cell).map(|i| &self.cells[i])
    }

    pub fn cell_type(&self, cell: Cell) -> Option<CellType> {
        self.get(cell).map(|c| c.cell_type)
    }

    /// Change a cell's type. Returns false when `cell` is out of bounds.
    pub fn set_cell_type(&mut self, cell: Cell, cell_type: CellType) -> bool {
        match self.cell_index(cell) {
            Some(i) => {
                self.cells[i].cell_type = cell_type;
                true
            }
            None => false,
        }
    }

    /// SOLID or BRICK. Out-of-bounds cells are not "blocked"; check bounds separately.
    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.cell_type(cell).is_some_and(|t| t.is_blocking())
    }

    pub fn is_solid(&self, cell: Cell) -> bool {
        self.cell_type(cell) == Some(CellType::Solid)
    }

    /// Iterate over `(cell, grid cell)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &GridCell)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (Cell::new((i % width) as i32, (i / width) as i32), c))
    }
}

/// Snapshot of the grid for the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    /// Cell ids, row-major.
    pub ids: Vec<u32>,
    /// Cell types, row-major.
    pub types: Vec<CellType>,
}

impl GridSnapshot {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            ids: grid.cells.iter().map(|c| c.id).collect(),
            types: grid.cells.iter().map(|c| c.cell_type).collect(),
        }
    }
}
