//! Entity registry: the slot-indexed arena of snakes plus the food set.
//!
//! Snakes live in a `Vec` indexed by [`SlotId`]. Every scan over snakes runs
//! in ascending slot order, and food is kept in a `BTreeSet`, so iteration
//! order never depends on hashing.

use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

use crate::grid::{Grid, Point};
use crate::reward::Distances;
use crate::snake::{SlotId, Snake};

/// A live snake's body segment found at some cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    /// Owner of the segment.
    pub slot: SlotId,
    /// Segment index (0 = head).
    pub segment: usize,
}

/// Owns every snake and food item.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    snakes: Vec<Snake>,
    foods: BTreeSet<Point>,
}

impl EntityRegistry {
    /// Create a registry from snakes already ordered by slot.
    #[must_use]
    pub fn new(snakes: Vec<Snake>) -> Self {
        Self {
            snakes,
            foods: BTreeSet::new(),
        }
    }

    /// Number of agent slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snakes.len()
    }

    /// Whether there are no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snakes.is_empty()
    }

    /// All snakes in slot order.
    #[must_use]
    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    /// Snake in `slot`.
    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&Snake> {
        self.snakes.get(slot)
    }

    /// Mutable snake in `slot`.
    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut Snake> {
        self.snakes.get_mut(slot)
    }

    /// Two distinct snakes borrowed mutably at once.
    ///
    /// Returns `None` if `a == b` or either slot is out of range.
    pub fn pair_mut(&mut self, a: SlotId, b: SlotId) -> Option<(&mut Snake, &mut Snake)> {
        if a == b || a >= self.snakes.len() || b >= self.snakes.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.snakes.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.snakes.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    /// Number of live snakes.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.snakes.iter().filter(|s| s.is_alive).count()
    }

    /// Food positions in sorted order.
    #[must_use]
    pub fn foods(&self) -> &BTreeSet<Point> {
        &self.foods
    }

    /// Whether there is food at `p`.
    #[must_use]
    pub fn has_food(&self, p: Point) -> bool {
        self.foods.contains(&p)
    }

    /// Add food at `p`. Returns `false` if already present.
    pub fn insert_food(&mut self, p: Point) -> bool {
        self.foods.insert(p)
    }

    /// Remove food at `p`. Returns `false` if there was none.
    pub fn remove_food(&mut self, p: Point) -> bool {
        self.foods.remove(&p)
    }

    /// Remove all food.
    pub fn clear_food(&mut self) {
        self.foods.clear();
    }

    /// First live snake segment at `p`, scanning in slot order.
    #[must_use]
    pub fn occupant_at(&self, p: Point) -> Option<Occupant> {
        self.snakes
            .iter()
            .filter(|s| s.is_alive)
            .find_map(|s| {
                s.segment_at(p).map(|segment| Occupant {
                    slot: s.slot,
                    segment,
                })
            })
    }

    /// Whether any live body covers `p`, ignoring `except`.
    #[must_use]
    pub fn is_body_cell_except(&self, p: Point, except: Option<SlotId>) -> bool {
        self.snakes
            .iter()
            .filter(|s| s.is_alive && Some(s.slot) != except)
            .any(|s| s.segment_at(p).is_some())
    }

    /// Whether `p` holds neither a live body nor food.
    #[must_use]
    pub fn is_free(&self, p: Point) -> bool {
        !self.has_food(p) && !self.is_body_cell_except(p, None)
    }

    /// Distances from `slot`'s head to the nearest food, enemy head and
    /// ally head. Missing targets (or a headless snake) yield `None`.
    #[must_use]
    pub fn distances(&self, grid: &Grid, slot: SlotId) -> Distances {
        let Some(me) = self.snakes.get(slot) else {
            return Distances::default();
        };
        let Some(head) = me.head().filter(|_| me.is_alive) else {
            return Distances::default();
        };

        let food = self
            .foods
            .iter()
            .map(|&f| grid.distance(head, f))
            .reduce(f32::min);

        let mut enemy: Option<f32> = None;
        let mut ally: Option<f32> = None;
        for other in self.snakes.iter().filter(|s| s.is_alive && s.slot != slot) {
            let Some(other_head) = other.head() else {
                continue;
            };
            let d = grid.distance(head, other_head);
            let nearest = if other.team == me.team {
                &mut ally
            } else {
                &mut enemy
            };
            *nearest = Some(nearest.map_or(d, |n| n.min(d)));
        }

        Distances { food, enemy, ally }
    }
}

impl Index<SlotId> for EntityRegistry {
    type Output = Snake;

    fn index(&self, slot: SlotId) -> &Snake {
        &self.snakes[slot]
    }
}

impl IndexMut<SlotId> for EntityRegistry {
    fn index_mut(&mut self, slot: SlotId) -> &mut Snake {
        &mut self.snakes[slot]
    }
}
