//! Spatial grid model.
//!
//! The arena is an integer lattice. Cell `(0, 0)` is the top-left corner,
//! `x` grows to the right and `y` grows downwards. Distances reported to the
//! reward shaper are Euclidean and scaled by the configured cell size, so a
//! one-cell step changes a distance by at most `cell_size`.

use serde::{Deserialize, Serialize};

/// Number of cells along each border that count as "near the wall".
///
/// Heads inside this band pay the wall penalty, and respawns never place a
/// head inside it.
pub const WALL_MARGIN: i32 = 2;

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Whether `other` is one orthogonal step away.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

/// Absolute heading of a snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards `y = 0`.
    Up,
    /// Towards `y = height - 1`.
    Down,
    /// Towards `x = 0`.
    Left,
    /// Towards `x = width - 1`.
    Right,
}

impl Direction {
    /// All directions, in clockwise order starting from `Up`.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit displacement `(dx, dy)`.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The 180° reversal of this direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Whether `other` is the reversal of `self`.
    #[must_use]
    pub fn is_opposite(self, other: Self) -> bool {
        self.opposite() == other
    }

    /// Rotate by a relative turn.
    #[must_use]
    pub fn turned(self, turn: RelativeTurn) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        match turn {
            RelativeTurn::Straight => self,
            RelativeTurn::Right => Self::ALL[(idx + 1) % 4],
            RelativeTurn::Left => Self::ALL[(idx + 3) % 4],
        }
    }
}

/// Turn relative to the current heading.
///
/// Learners usually emit a three-way action (`0` keep going, `1` turn
/// clockwise, `2` turn counter-clockwise); this maps that onto absolute
/// directions without ever producing a reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeTurn {
    /// Keep the current heading.
    Straight,
    /// Turn clockwise.
    Right,
    /// Turn counter-clockwise.
    Left,
}

impl RelativeTurn {
    /// Decode a learner's action index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Straight),
            1 => Some(Self::Right),
            2 => Some(Self::Left),
            _ => None,
        }
    }

    /// Inverse of [`from_index`](Self::from_index).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Straight => 0,
            Self::Right => 1,
            Self::Left => 2,
        }
    }
}

/// Bounds and metric of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cell_size: f32,
}

impl Grid {
    /// Create a grid of `width` x `height` cells.
    #[must_use]
    pub const fn new(width: i32, height: i32, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
        }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// World units per cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Whether `p` lies inside the grid.
    #[must_use]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    /// Whether `p` is at least [`WALL_MARGIN`] cells away from every border.
    #[must_use]
    pub const fn is_interior(&self, p: Point) -> bool {
        p.x >= WALL_MARGIN
            && p.y >= WALL_MARGIN
            && p.x < self.width - WALL_MARGIN
            && p.y < self.height - WALL_MARGIN
    }

    /// Whether `p` is inside the grid but within [`WALL_MARGIN`] cells of a border.
    #[must_use]
    pub const fn near_wall(&self, p: Point) -> bool {
        self.contains(p) && !self.is_interior(p)
    }

    /// Euclidean distance between two cells in world units.
    #[must_use]
    pub fn distance(&self, a: Point, b: Point) -> f32 {
        let dx = (a.x - b.x) as f32;
        let dy = (a.y - b.y) as f32;
        (dx * dx + dy * dy).sqrt() * self.cell_size
    }

    /// Interior column range (for spawn sampling).
    #[must_use]
    pub const fn interior_x(&self) -> std::ops::Range<i32> {
        WALL_MARGIN..self.width - WALL_MARGIN
    }

    /// Interior row range (for spawn sampling).
    #[must_use]
    pub const fn interior_y(&self) -> std::ops::Range<i32> {
        WALL_MARGIN..self.height - WALL_MARGIN
    }
}
