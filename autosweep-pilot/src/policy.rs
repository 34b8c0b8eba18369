//! Guess selection among the minimum-probability cells.

use std::fmt;

use autosweep_game::{Coord, ProbabilityGrid};
use clap::ValueEnum;

/// Known values within this distance of the minimum count as tied.
const TIE_EPS: f64 = 1e-9;

/// Policy interface for picking the cell to reveal when no certain-safe
/// cell exists.
pub trait GuessPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick one uncertain cell to reveal. `None` means the grid holds no
    /// uncertain cell at all; callers treat that as a sequencing bug, not
    /// a data problem.
    fn select_guess(&mut self, grid: &ProbabilityGrid) -> Option<Coord>;
}

/// Built-in guess strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum GuessStrategy {
    CornerThenEdge,
    Lexicographic,
}

impl GuessStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            GuessStrategy::CornerThenEdge => "corner-then-edge",
            GuessStrategy::Lexicographic => "lexicographic",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn GuessPolicy + Send> {
        match self {
            GuessStrategy::CornerThenEdge => Box::new(CornerThenEdgePolicy),
            GuessStrategy::Lexicographic => Box::new(LexicographicPolicy),
        }
    }
}

impl fmt::Display for GuessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default policy: among the tied minimum-probability cells, prefer a
/// corner, then an edge, then the lexicographically smallest coordinate.
/// Corner and edge cells have fewer hidden neighbors, which keeps the
/// inference engine's future constraints smaller; the probability itself
/// is identical across the tie set.
pub struct CornerThenEdgePolicy;

/// Smallest tied coordinate in reading order; mostly useful to make
/// alternate-policy plumbing testable.
pub struct LexicographicPolicy;

/// All uncertain cells within [`TIE_EPS`] of the minimum uncertain value.
fn tie_set(grid: &ProbabilityGrid) -> Vec<Coord> {
    let mut best = f64::INFINITY;
    for (_, p) in grid.known() {
        if p > 0.0 && p < 1.0 && p < best {
            best = p;
        }
    }
    if !best.is_finite() {
        return Vec::new();
    }
    grid.known()
        .filter(|&(_, p)| p > 0.0 && p < 1.0 && p <= best + TIE_EPS)
        .map(|(at, _)| at)
        .collect()
}

fn reading_order(at: &Coord) -> (usize, usize) {
    (at.y, at.x)
}

impl GuessPolicy for CornerThenEdgePolicy {
    fn name(&self) -> &'static str {
        "corner-then-edge"
    }

    fn select_guess(&mut self, grid: &ProbabilityGrid) -> Option<Coord> {
        let ties = tie_set(grid);
        ties.iter()
            .copied()
            .filter(|&at| grid.is_corner(at))
            .min_by_key(reading_order)
            .or_else(|| {
                ties.iter()
                    .copied()
                    .filter(|&at| grid.is_edge(at))
                    .min_by_key(reading_order)
            })
            .or_else(|| ties.into_iter().min_by_key(|at| reading_order(at)))
    }
}

impl GuessPolicy for LexicographicPolicy {
    fn name(&self) -> &'static str {
        "lexicographic"
    }

    fn select_guess(&mut self, grid: &ProbabilityGrid) -> Option<Coord> {
        tie_set(grid).into_iter().min_by_key(|at| reading_order(at))
    }
}
