//! Spawn and respawn placement.
//!
//! A spawn picks a random interior head (never within [`WALL_MARGIN`] cells
//! of a border) and a random heading, then lays the body out straight behind
//! the head. Every body cell must be inside the grid and free of live bodies
//! and food.
//!
//! After the random budget is spent the manager falls back to scanning every
//! interior cell and heading in a fixed order, so a spawn only fails when no
//! legal straight body exists anywhere.
//!
//! [`WALL_MARGIN`]: crate::grid::WALL_MARGIN

use std::collections::VecDeque;

use crate::grid::{Direction, Grid, Point};
use crate::registry::EntityRegistry;
use crate::rng::ArenaRng;

/// A legal spawn location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Body cells, head first.
    pub body: VecDeque<Point>,
    /// Initial heading.
    pub direction: Direction,
}

/// Finds spawn locations for new and dead snakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnManager {
    initial_length: usize,
    attempts: u32,
}

impl RespawnManager {
    /// Create a manager laying out bodies of `initial_length` cells with up
    /// to `attempts` random tries.
    #[must_use]
    pub const fn new(initial_length: usize, attempts: u32) -> Self {
        Self {
            initial_length,
            attempts,
        }
    }

    /// Find a placement, or `None` if the grid has no room.
    pub fn find_placement(
        &self,
        grid: &Grid,
        registry: &EntityRegistry,
        rng: &mut ArenaRng,
    ) -> Option<Placement> {
        let xs = grid.interior_x();
        let ys = grid.interior_y();
        if xs.is_empty() || ys.is_empty() {
            return None;
        }

        for attempt in 0..self.attempts {
            let head = Point::new(rng.random_range(xs.clone()), rng.random_range(ys.clone()));
            let direction = rng.direction();
            if let Some(body) = self.layout(grid, registry, head, direction) {
                return Some(Placement { body, direction });
            }
            tracing::trace!(attempt, x = head.x, y = head.y, "Spawn location rejected");
        }

        tracing::warn!(
            attempts = self.attempts,
            "Random spawn budget exhausted, scanning interior"
        );
        for y in ys {
            for x in xs.clone() {
                let head = Point::new(x, y);
                for direction in Direction::ALL {
                    if let Some(body) = self.layout(grid, registry, head, direction) {
                        return Some(Placement { body, direction });
                    }
                }
            }
        }
        None
    }

    /// Straight body extending away from `direction`, if every cell is legal.
    fn layout(
        &self,
        grid: &Grid,
        registry: &EntityRegistry,
        head: Point,
        direction: Direction,
    ) -> Option<VecDeque<Point>> {
        let (dx, dy) = direction.delta();
        let mut body = VecDeque::with_capacity(self.initial_length);
        for i in 0..self.initial_length {
            let offset = i32::try_from(i).ok()?;
            let p = Point::new(head.x - dx * offset, head.y - dy * offset);
            if !grid.contains(p) || !registry.is_free(p) {
                return None;
            }
            body.push_back(p);
        }
        Some(body)
    }
}
