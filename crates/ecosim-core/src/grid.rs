use crate::entity::EntityId;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Largest share of the grid an outbreak region may target, in percent.
const MAX_REGION_PERCENT: usize = 50;

/// A cell coordinate that is known to lie inside the grid that produced it.
///
/// Locations are only handed out by [`Grid::location`] and the neighbor
/// queries, so indexing with one never goes out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    row: usize,
    col: usize,
}

impl Location {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Chebyshev distance between two cells.
    pub fn distance(&self, other: &Location) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

/// Dense 2D store of cell occupants. Each cell holds at most one entity id.
#[derive(Clone, Debug)]
pub struct Grid {
    depth: usize,
    width: usize,
    cells: Vec<Option<EntityId>>,
}

impl Grid {
    pub fn new(depth: usize, width: usize) -> Self {
        assert!(depth > 0 && width > 0, "grid dimensions must be positive");
        Self {
            depth,
            width,
            cells: vec![None; depth * width],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Bounds-checked location constructor.
    pub fn location(&self, row: usize, col: usize) -> Option<Location> {
        (row < self.depth && col < self.width).then_some(Location { row, col })
    }

    fn index(&self, loc: Location) -> usize {
        debug_assert!(loc.row < self.depth && loc.col < self.width);
        loc.row * self.width + loc.col
    }

    pub fn at(&self, loc: Location) -> Option<EntityId> {
        self.cells[self.index(loc)]
    }

    pub fn is_free(&self, loc: Location) -> bool {
        self.at(loc).is_none()
    }

    /// Place `id` at `loc`, dropping whatever occupied the cell before.
    pub fn place(&mut self, id: EntityId, loc: Location) {
        let idx = self.index(loc);
        self.cells[idx] = Some(id);
    }

    pub fn clear(&mut self, loc: Location) {
        let idx = self.index(loc);
        self.cells[idx] = None;
    }

    pub fn clear_all(&mut self) {
        self.cells.fill(None);
    }

    /// Every location in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.depth).flat_map(move |row| (0..self.width).map(move |col| Location { row, col }))
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Location, EntityId)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.map(|id| {
                (
                    Location {
                        row: idx / self.width,
                        col: idx % self.width,
                    },
                    id,
                )
            })
        })
    }

    /// All in-bounds cells within Chebyshev distance `radius` of `center`,
    /// excluding `center`, shuffled.
    ///
    /// Callers take the first matching cell, so the shuffle is what keeps
    /// hunting, movement and birth placement free of directional bias.
    pub fn neighbors<R: Rng + ?Sized>(
        &self,
        center: Location,
        radius: usize,
        rng: &mut R,
    ) -> Vec<Location> {
        let mut out = self.neighbors_ordered(center, radius);
        out.shuffle(rng);
        out
    }

    fn neighbors_ordered(&self, center: Location, radius: usize) -> Vec<Location> {
        let row_lo = center.row.saturating_sub(radius);
        let row_hi = (center.row + radius).min(self.depth - 1);
        let col_lo = center.col.saturating_sub(radius);
        let col_hi = (center.col + radius).min(self.width - 1);
        let mut out = Vec::with_capacity((row_hi - row_lo + 1) * (col_hi - col_lo + 1));
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                if row != center.row || col != center.col {
                    out.push(Location { row, col });
                }
            }
        }
        out
    }

    /// Empty cells adjacent to `center`, shuffled.
    pub fn free_neighbors<R: Rng + ?Sized>(&self, center: Location, rng: &mut R) -> Vec<Location> {
        let mut free = self.neighbors(center, 1, rng);
        free.retain(|loc| self.is_free(*loc));
        free
    }

    pub fn random_location<R: Rng + ?Sized>(&self, rng: &mut R) -> Location {
        Location {
            row: rng.random_range(0..self.depth),
            col: rng.random_range(0..self.width),
        }
    }

    /// Pick a random anchor and a random coverage target of 1..=50 percent of
    /// the grid, then widen the neighbor radius from 1 until the target is met.
    pub fn random_region<R: Rng + ?Sized>(&self, rng: &mut R) -> Region {
        let percent = rng.random_range(1..=MAX_REGION_PERCENT);
        let target = percent * self.cell_count() / 100;
        let anchor = self.random_location(rng);
        // A radius this large covers every cell from any anchor.
        let max_radius = self.depth.max(self.width);

        let mut radius = 1;
        let mut cells = self.neighbors(anchor, radius, rng);
        while cells.len() < target && radius < max_radius {
            radius += 1;
            cells = self.neighbors(anchor, radius, rng);
        }
        Region {
            anchor,
            radius,
            target,
            cells,
        }
    }
}

/// Cells selected by [`Grid::random_region`].
#[derive(Clone, Debug)]
pub struct Region {
    pub anchor: Location,
    pub radius: usize,
    /// Minimum number of cells this region had to cover.
    pub target: usize,
    pub cells: Vec<Location>,
}
