//! Grid primitives shared by the board, the mine map, and the probability grid.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Cell coordinate. `x` runs along the width, `y` along the height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Row-major 2-D storage with neighbor queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(Coord) -> T) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(Coord::new(x, y)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    fn index(&self, at: Coord) -> usize {
        debug_assert!(at.x < self.width && at.y < self.height);
        at.y * self.width + at.x
    }

    #[must_use]
    pub fn get(&self, at: Coord) -> &T {
        &self.cells[self.index(at)]
    }

    pub fn get_mut(&mut self, at: Coord) -> &mut T {
        let idx = self.index(at);
        &mut self.cells[idx]
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<T> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &T)> {
        self.coords().map(|at| (at, self.get(at)))
    }

    /// The up-to-8 surrounding coordinates, clipped at the borders.
    #[must_use]
    pub fn neighbors(&self, at: Coord) -> SmallVec<[Coord; 8]> {
        let mut out = SmallVec::new();
        for ny in at.y.saturating_sub(1)..=(at.y + 1).min(self.height - 1) {
            for nx in at.x.saturating_sub(1)..=(at.x + 1).min(self.width - 1) {
                if nx == at.x && ny == at.y {
                    continue;
                }
                out.push(Coord::new(nx, ny));
            }
        }
        out
    }

    #[must_use]
    pub const fn is_corner(&self, at: Coord) -> bool {
        (at.x == 0 || at.x == self.width - 1) && (at.y == 0 || at.y == self.height - 1)
    }

    /// On the border but not a corner.
    #[must_use]
    pub const fn is_edge(&self, at: Coord) -> bool {
        !self.is_corner(at)
            && (at.x == 0 || at.x == self.width - 1 || at.y == 0 || at.y == self.height - 1)
    }
}

/// 3x3 sliding-window sums over a weight grid, window clipped at the
/// borders and the center cell included.
#[must_use]
pub fn window_sums(weights: &Grid<f64>) -> Grid<f64> {
    Grid::from_fn(weights.width(), weights.height(), |at| {
        let mut sum = *weights.get(at);
        for nb in weights.neighbors(at) {
            sum += *weights.get(nb);
        }
        sum
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_counts_respect_borders() {
        let grid: Grid<u8> = Grid::filled(4, 3, 0);
        assert_eq!(grid.neighbors(Coord::new(0, 0)).len(), 3);
        assert_eq!(grid.neighbors(Coord::new(1, 0)).len(), 5);
        assert_eq!(grid.neighbors(Coord::new(1, 1)).len(), 8);
        assert_eq!(grid.neighbors(Coord::new(3, 2)).len(), 3);
    }

    #[test]
    fn corner_and_edge_classification() {
        let grid: Grid<u8> = Grid::filled(4, 4, 0);
        assert!(grid.is_corner(Coord::new(0, 0)));
        assert!(grid.is_corner(Coord::new(3, 3)));
        assert!(!grid.is_corner(Coord::new(2, 0)));
        assert!(grid.is_edge(Coord::new(2, 0)));
        assert!(grid.is_edge(Coord::new(0, 2)));
        assert!(!grid.is_edge(Coord::new(1, 2)));
        assert!(!grid.is_edge(Coord::new(0, 0)));
    }

    #[test]
    fn window_sums_clip_at_borders() {
        let weights = Grid::filled(3, 3, 1.0);
        let sums = window_sums(&weights);
        assert!((sums.get(Coord::new(1, 1)) - 9.0).abs() < 1e-12);
        assert!((sums.get(Coord::new(0, 0)) - 4.0).abs() < 1e-12);
        assert!((sums.get(Coord::new(1, 0)) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn from_fn_is_row_major() {
        let grid = Grid::from_fn(3, 2, |at| at.y * 10 + at.x);
        assert_eq!(*grid.get(Coord::new(2, 1)), 12);
        let coords: Vec<Coord> = grid.coords().collect();
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[1], Coord::new(1, 0));
        assert_eq!(coords[3], Coord::new(0, 1));
    }
}
