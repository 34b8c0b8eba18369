//! Consistency checks over a probability grid and the board it describes.
//!
//! Four invariants, checked in order with the first violation reported:
//! known values in (0, 1], a usable best probability, the global mass
//! matching the remaining mines, and each revealed count matching the
//! probability mass around it.

use autosweep_game::{BoardState, CellState, Coord, Grid, ProbabilityGrid, window_sums};
use thiserror::Error;

/// Tolerances for the floating-point sum checks (numpy `isclose` shape:
/// `|a - b| <= ABS_TOL + REL_TOL * |b|`).
const ABS_TOL: f64 = 1e-8;
const REL_TOL: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Inconsistency {
    /// A known probability sits outside (0, 1]. An exact 0 with no
    /// certain-safe handling upstream lands here too.
    #[error("probability {value} at {coord} lies outside (0, 1]")]
    OutOfRange { coord: Coord, value: f64 },
    /// The smallest known probability is not strictly between 0 and 1:
    /// the solver produced no legitimate uncertain cell to guess.
    #[error("best probability {value} lies outside (0, 1)")]
    NoValidGuessBound { value: f64 },
    /// Total probability mass disagrees with the mines left on the board.
    #[error("total probability mass {computed} does not match {expected} (mines left plus certain mines)")]
    GlobalSumMismatch { expected: f64, computed: f64 },
    /// The 3x3 probability mass around a revealed count disagrees with it.
    #[error("probability mass {computed} around {coord} does not match its count {expected}")]
    LocalSumMismatch {
        coord: Coord,
        expected: f64,
        computed: f64,
    },
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ABS_TOL + REL_TOL * b.abs()
}

/// Check the probabilistic invariants a solver's grid must satisfy for
/// the step that consumes it. Pure; fails fast on the first violation.
///
/// `mines_remaining` is the board's count after any auto-flagging for the
/// step, matching the grid the step decided on.
///
/// # Errors
///
/// Returns the first violated invariant, with the offending cell and the
/// expected/computed values where applicable.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn verify(
    board: &BoardState,
    grid: &ProbabilityGrid,
    mines_remaining: u32,
) -> Result<(), Inconsistency> {
    for (coord, value) in grid.known() {
        if !(value > 0.0 && value <= 1.0) {
            return Err(Inconsistency::OutOfRange { coord, value });
        }
    }

    match grid.best_prob() {
        Some(best) if best > 0.0 && best < 1.0 => {}
        Some(best) => return Err(Inconsistency::NoValidGuessBound { value: best }),
        None => {
            return Err(Inconsistency::NoValidGuessBound { value: f64::NAN });
        }
    }

    let expected = f64::from(mines_remaining) + grid.certain_mine_count() as f64;
    let computed = grid.known_mass();
    if !close(computed, expected) {
        return Err(Inconsistency::GlobalSumMismatch { expected, computed });
    }

    // flags weigh 1, known cells their probability, everything else 0;
    // revealed cells weigh 0 so the window center never contributes
    let weights = Grid::from_fn(board.width(), board.height(), |at| match *board.get(at) {
        CellState::Flagged => 1.0,
        _ => grid.get(at).unwrap_or(0.0),
    });
    let sums = window_sums(&weights);
    for (at, cell) in board.iter() {
        if let CellState::Revealed(count) = *cell {
            let expected = f64::from(count);
            let computed = *sums.get(at);
            if !close(computed, expected) {
                return Err(Inconsistency::LocalSumMismatch {
                    coord: at,
                    expected,
                    computed,
                });
            }
        }
    }

    Ok(())
}
