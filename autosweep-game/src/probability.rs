//! Per-cell mine probability grid produced by an inference engine.
//!
//! Entries are explicit optionals rather than NaN sentinels: `None` marks a
//! cell with no assigned probability (already revealed), `Some(p)` with
//! `p` strictly between 0 and 1 marks an uncertain cell, and the exact
//! values `0.0` / `1.0` mark certain-safe and certain-mine cells. Flagged
//! cells are echoed as `1.0` so their mass stays visible to the sum checks.

use crate::grid::{Coord, Grid};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityGrid {
    cells: Grid<Option<f64>>,
}

impl ProbabilityGrid {
    /// A grid with every entry unknown.
    #[must_use]
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            cells: Grid::filled(width, height, None),
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.cells.width()
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.cells.height()
    }

    #[must_use]
    pub fn get(&self, at: Coord) -> Option<f64> {
        *self.cells.get(at)
    }

    pub fn set(&mut self, at: Coord, p: f64) {
        *self.cells.get_mut(at) = Some(p);
    }

    /// All known entries, row-major.
    pub fn known(&self) -> impl Iterator<Item = (Coord, f64)> {
        self.cells.iter().filter_map(|(at, p)| p.map(|p| (at, p)))
    }

    /// Minimum over the known entries; `None` when nothing is known.
    #[must_use]
    pub fn best_prob(&self) -> Option<f64> {
        self.known().map(|(_, p)| p).fold(None, |best, p| match best {
            Some(b) if b <= p => Some(b),
            _ => Some(p),
        })
    }

    /// Cells whose value compares exactly equal to `p`. Meant for the
    /// certain values `0.0` and `1.0`, which the engine produces exactly.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn cells_at(&self, p: f64) -> Vec<Coord> {
        self.known()
            .filter(|&(_, value)| value == p)
            .map(|(at, _)| at)
            .collect()
    }

    /// Sum of the known entries; missing entries contribute nothing.
    #[must_use]
    pub fn known_mass(&self) -> f64 {
        self.known().map(|(_, p)| p).sum()
    }

    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn certain_mine_count(&self) -> usize {
        self.known().filter(|&(_, p)| p == 1.0).count()
    }

    #[must_use]
    pub const fn is_corner(&self, at: Coord) -> bool {
        self.cells.is_corner(at)
    }

    #[must_use]
    pub const fn is_edge(&self, at: Coord) -> bool {
        self.cells.is_edge(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_prob_ignores_unknown_entries() {
        let mut grid = ProbabilityGrid::empty(3, 1);
        assert_eq!(grid.best_prob(), None);
        grid.set(Coord::new(0, 0), 0.4);
        grid.set(Coord::new(2, 0), 0.1);
        assert_eq!(grid.best_prob(), Some(0.1));
    }

    #[test]
    fn cells_at_matches_exact_values() {
        let mut grid = ProbabilityGrid::empty(2, 2);
        grid.set(Coord::new(0, 0), 1.0);
        grid.set(Coord::new(1, 0), 0.0);
        grid.set(Coord::new(0, 1), 0.5);
        assert_eq!(grid.cells_at(1.0), vec![Coord::new(0, 0)]);
        assert_eq!(grid.cells_at(0.0), vec![Coord::new(1, 0)]);
        assert_eq!(grid.certain_mine_count(), 1);
    }

    #[test]
    fn known_mass_sums_known_entries_only() {
        let mut grid = ProbabilityGrid::empty(2, 1);
        grid.set(Coord::new(0, 0), 0.25);
        assert!((grid.known_mass() - 0.25).abs() < 1e-12);
    }
}
