//! Food placement.

use crate::grid::{Grid, Point};
use crate::registry::EntityRegistry;
use crate::rng::ArenaRng;

/// Keeps the food set at its target size.
///
/// Placement samples cells uniformly over the whole grid and rejects any
/// cell holding a live body or food. When every attempt fails the item is
/// deferred to a later call; a crowded grid is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoodManager {
    target: usize,
    attempts: u32,
}

impl FoodManager {
    /// Create a manager aiming for `target` items, trying `attempts` random
    /// cells per item.
    #[must_use]
    pub const fn new(target: usize, attempts: u32) -> Self {
        Self { target, attempts }
    }

    /// Target number of items.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Place a single item. Returns where it went, or `None` if no free cell
    /// was found within the attempt budget.
    pub fn place_one(
        &self,
        grid: &Grid,
        registry: &mut EntityRegistry,
        rng: &mut ArenaRng,
    ) -> Option<Point> {
        for attempt in 0..self.attempts {
            let p = Point::new(
                rng.random_range(0..grid.width()),
                rng.random_range(0..grid.height()),
            );
            if registry.is_free(p) {
                registry.insert_food(p);
                return Some(p);
            }
            tracing::trace!(attempt, x = p.x, y = p.y, "Food placement rejected");
        }
        None
    }

    /// Top the food set up to the target. Returns how many items were added.
    pub fn replenish(
        &self,
        grid: &Grid,
        registry: &mut EntityRegistry,
        rng: &mut ArenaRng,
    ) -> usize {
        let mut placed = 0;
        while registry.foods().len() < self.target {
            if self.place_one(grid, registry, rng).is_none() {
                tracing::debug!(
                    have = registry.foods().len(),
                    target = self.target,
                    "Food placement deferred, grid too crowded"
                );
                break;
            }
            placed += 1;
        }
        placed
    }
}
