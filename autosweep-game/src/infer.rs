//! Probability inference over a board snapshot.
//!
//! The bundled [`EnumerationEngine`] computes exact per-cell mine
//! probabilities: it gathers one constraint per revealed count, splits the
//! constrained cells into independent components, enumerates each
//! component's consistent mine placements, and combines the components
//! with binomial weights over the unconstrained remainder. Certain cells
//! come out at exactly `0.0` or `1.0`.

use std::collections::HashMap;

use smallvec::SmallVec;
use thiserror::Error;

use crate::board::{BoardState, CellState};
use crate::grid::Coord;
use crate::probability::ProbabilityGrid;

/// Cells a single constraint component may span before enumeration is
/// refused as too expensive.
const DEFAULT_COMPONENT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The board admits no mine placement consistent with its counts,
    /// flags, and remaining-mine budget.
    #[error("board constraints admit no consistent mine placement")]
    Unsatisfiable,
    #[error("constraint component spans {cells} cells, enumeration limit is {limit}")]
    BoundaryTooLarge { cells: usize, limit: usize },
}

/// A probability-inference oracle: board snapshot in, per-cell mine
/// probabilities out. Implementations may be expensive; they are called
/// once per step and failures propagate without retry.
pub trait InferenceEngine {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns an error when the board state is inconsistent or too
    /// expensive to analyze.
    fn solve(
        &mut self,
        board: &BoardState,
        mines_remaining: u32,
    ) -> Result<ProbabilityGrid, EngineError>;
}

/// Exact inference by per-component enumeration.
#[derive(Debug, Clone)]
pub struct EnumerationEngine {
    component_limit: usize,
}

impl Default for EnumerationEngine {
    fn default() -> Self {
        Self {
            component_limit: DEFAULT_COMPONENT_LIMIT,
        }
    }
}

impl EnumerationEngine {
    #[must_use]
    pub const fn with_component_limit(component_limit: usize) -> Self {
        Self { component_limit }
    }
}

impl InferenceEngine for EnumerationEngine {
    fn name(&self) -> &'static str {
        "enumeration"
    }

    #[allow(clippy::cast_precision_loss)]
    fn solve(
        &mut self,
        board: &BoardState,
        mines_remaining: u32,
    ) -> Result<ProbabilityGrid, EngineError> {
        let mut grid = ProbabilityGrid::empty(board.width(), board.height());
        let mut hidden: Vec<Coord> = Vec::new();
        for (at, cell) in board.iter() {
            match *cell {
                CellState::Flagged => grid.set(at, 1.0),
                CellState::Hidden => hidden.push(at),
                CellState::Revealed(_) => {}
            }
        }

        let constraints = gather_constraints(board)?;

        // index constrained cells in discovery order, then group them into
        // connected components (cells sharing a constraint)
        let mut cell_index: HashMap<Coord, usize> = HashMap::new();
        let mut cell_list: Vec<Coord> = Vec::new();
        for constraint in &constraints {
            for &at in &constraint.cells {
                if !cell_index.contains_key(&at) {
                    cell_index.insert(at, cell_list.len());
                    cell_list.push(at);
                }
            }
        }

        let mut dsu = Dsu::new(cell_list.len());
        for constraint in &constraints {
            let first = cell_index[&constraint.cells[0]];
            for at in &constraint.cells[1..] {
                dsu.union(first, cell_index[at]);
            }
        }

        let mut comp_of_root: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Component> = Vec::new();
        for (id, &at) in cell_list.iter().enumerate() {
            let root = dsu.find(id);
            let comp = *comp_of_root
                .entry(root)
                .or_insert_with(|| {
                    components.push(Component::default());
                    components.len() - 1
                });
            let component = &mut components[comp];
            let local = component.cells.len();
            component.local.insert(at, local);
            component.cells.push(at);
        }
        for constraint in constraints {
            let root = dsu.find(cell_index[&constraint.cells[0]]);
            let component = &mut components[comp_of_root[&root]];
            let locals: SmallVec<[usize; 8]> = constraint
                .cells
                .iter()
                .map(|at| component.local[at])
                .collect();
            component.constraints.push((constraint.target, locals));
        }

        for component in &components {
            if component.cells.len() > self.component_limit {
                return Err(EngineError::BoundaryTooLarge {
                    cells: component.cells.len(),
                    limit: self.component_limit,
                });
            }
        }

        let tallies: Vec<Tally> = components.iter().map(enumerate_component).collect();

        let m = mines_remaining as usize;
        let unconstrained = hidden.len() - cell_list.len();

        // weighted total over all component mine splits
        let full = tallies
            .iter()
            .fold(vec![1.0_f64], |acc, tally| convolve(&acc, &tally.solutions));
        let total: f64 = full
            .iter()
            .enumerate()
            .map(|(j, &w)| {
                m.checked_sub(j)
                    .map_or(0.0, |rest| w * binomial(unconstrained, rest))
            })
            .sum();
        if total <= 0.0 {
            return Err(EngineError::Unsatisfiable);
        }

        for (ci, (component, tally)) in components.iter().zip(&tallies).enumerate() {
            let others = tallies
                .iter()
                .enumerate()
                .filter(|&(oi, _)| oi != ci)
                .fold(vec![1.0_f64], |acc, (_, t)| convolve(&acc, &t.solutions));
            // rest[k]: weight of completing a placement that spends k mines
            // inside this component
            let rest: Vec<f64> = (0..tally.solutions.len())
                .map(|k| {
                    others
                        .iter()
                        .enumerate()
                        .map(|(j, &w)| {
                            m.checked_sub(k + j)
                                .map_or(0.0, |r| w * binomial(unconstrained, r))
                        })
                        .sum()
                })
                .collect();
            let denom: f64 = tally
                .solutions
                .iter()
                .zip(&rest)
                .map(|(&count, &w)| count * w)
                .sum();
            if denom <= 0.0 {
                return Err(EngineError::Unsatisfiable);
            }
            for (local, &at) in component.cells.iter().enumerate() {
                let numer: f64 = tally.mines[local]
                    .iter()
                    .zip(&rest)
                    .map(|(&count, &w)| count * w)
                    .sum();
                grid.set(at, numer / denom);
            }
        }

        if unconstrained > 0 {
            let numer: f64 = full
                .iter()
                .enumerate()
                .map(|(j, &w)| {
                    m.checked_sub(j + 1)
                        .map_or(0.0, |rest| w * binomial(unconstrained - 1, rest))
                })
                .sum();
            let p = numer / total;
            for &at in &hidden {
                if !cell_index.contains_key(&at) {
                    grid.set(at, p);
                }
            }
        }

        Ok(grid)
    }
}

struct RawConstraint {
    /// Mines still owed among `cells`.
    target: u32,
    cells: Vec<Coord>,
}

/// One constraint per revealed count that still borders hidden cells.
fn gather_constraints(board: &BoardState) -> Result<Vec<RawConstraint>, EngineError> {
    let mut constraints = Vec::new();
    for (at, cell) in board.iter() {
        let CellState::Revealed(count) = *cell else {
            continue;
        };
        let mut cells = Vec::new();
        let mut flagged = 0u32;
        for nb in board.neighbors(at) {
            match *board.get(nb) {
                CellState::Hidden => cells.push(nb),
                CellState::Flagged => flagged += 1,
                CellState::Revealed(_) => {}
            }
        }
        let target = u32::from(count)
            .checked_sub(flagged)
            .ok_or(EngineError::Unsatisfiable)?;
        if cells.is_empty() {
            if target != 0 {
                return Err(EngineError::Unsatisfiable);
            }
            continue;
        }
        if target as usize > cells.len() {
            return Err(EngineError::Unsatisfiable);
        }
        constraints.push(RawConstraint { target, cells });
    }
    Ok(constraints)
}

#[derive(Default)]
struct Component {
    cells: Vec<Coord>,
    local: HashMap<Coord, usize>,
    constraints: Vec<(u32, SmallVec<[usize; 8]>)>,
}

/// Enumeration result for one component: solution counts and per-cell
/// mine counts, both bucketed by the total mines the assignment uses.
struct Tally {
    solutions: Vec<f64>,
    mines: Vec<Vec<f64>>,
}

fn enumerate_component(component: &Component) -> Tally {
    let n = component.cells.len();
    let mut member: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
    let mut needed = Vec::with_capacity(component.constraints.len());
    let mut remaining = Vec::with_capacity(component.constraints.len());
    for (ci, (target, cells)) in component.constraints.iter().enumerate() {
        needed.push(*target as usize);
        remaining.push(cells.len());
        for &cell in cells {
            member[cell].push(ci);
        }
    }
    let mut walker = Enumerator {
        member,
        needed,
        remaining,
        assignment: vec![false; n],
        tally: Tally {
            solutions: vec![0.0; n + 1],
            mines: vec![vec![0.0; n + 1]; n],
        },
    };
    walker.walk(0, 0);
    walker.tally
}

struct Enumerator {
    member: Vec<SmallVec<[usize; 4]>>,
    needed: Vec<usize>,
    remaining: Vec<usize>,
    assignment: Vec<bool>,
    tally: Tally,
}

impl Enumerator {
    fn walk(&mut self, idx: usize, mines_used: usize) {
        if idx == self.assignment.len() {
            self.tally.solutions[mines_used] += 1.0;
            for (cell, &has_mine) in self.assignment.iter().enumerate() {
                if has_mine {
                    self.tally.mines[cell][mines_used] += 1.0;
                }
            }
            return;
        }
        for value in [false, true] {
            if !self.feasible(idx, value) {
                continue;
            }
            self.apply(idx, value);
            self.walk(idx + 1, mines_used + usize::from(value));
            self.undo(idx, value);
        }
    }

    /// A constraint stays satisfiable iff its owed mines fit in its
    /// still-unassigned cells and never drop below zero.
    fn feasible(&self, idx: usize, value: bool) -> bool {
        self.member[idx].iter().all(|&ci| {
            if value {
                self.needed[ci] >= 1
            } else {
                self.needed[ci] <= self.remaining[ci] - 1
            }
        })
    }

    fn apply(&mut self, idx: usize, value: bool) {
        self.assignment[idx] = value;
        for &ci in &self.member[idx] {
            self.remaining[ci] -= 1;
            if value {
                self.needed[ci] -= 1;
            }
        }
    }

    fn undo(&mut self, idx: usize, value: bool) {
        self.assignment[idx] = false;
        for &ci in &self.member[idx] {
            self.remaining[ci] += 1;
            if value {
                self.needed[ci] += 1;
            }
        }
    }
}

fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

#[allow(clippy::cast_precision_loss)]
fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0_f64;
    for i in 0..k {
        result = result * ((n - i) as f64) / ((i + 1) as f64);
    }
    result
}

/// Tiny union-find for component grouping.
struct Dsu {
    parent: Vec<usize>,
}

impl Dsu {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut id: usize) -> usize {
        while self.parent[id] != id {
            self.parent[id] = self.parent[self.parent[id]];
            id = self.parent[id];
        }
        id
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardState;
    use crate::grid::Grid;

    fn hidden_board(width: usize, height: usize) -> BoardState {
        Grid::filled(width, height, CellState::Hidden)
    }

    #[test]
    fn fresh_board_gets_the_uniform_prior() {
        let board = hidden_board(3, 3);
        let grid = EnumerationEngine::default().solve(&board, 1).unwrap();
        for at in [Coord::new(0, 0), Coord::new(1, 1), Coord::new(2, 2)] {
            let p = grid.get(at).unwrap();
            assert!((p - 1.0 / 9.0).abs() < 1e-12);
        }
        assert!((grid.known_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lone_count_spreads_mass_over_its_ring() {
        let mut board = hidden_board(3, 3);
        *board.get_mut(Coord::new(1, 1)) = CellState::Revealed(1);
        let grid = EnumerationEngine::default().solve(&board, 1).unwrap();
        assert_eq!(grid.get(Coord::new(1, 1)), None);
        for (at, p) in grid.known() {
            assert_ne!(at, Coord::new(1, 1));
            assert!((p - 0.125).abs() < 1e-12);
        }
        assert!((grid.known_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_two_two_one_pattern_is_fully_determined() {
        // bottom row revealed 1 2 2 1, top row hidden; mines must sit at
        // x = 1 and x = 2
        let mut board = hidden_board(4, 2);
        for (x, count) in [(0, 1), (1, 2), (2, 2), (3, 1)] {
            *board.get_mut(Coord::new(x, 1)) = CellState::Revealed(count);
        }
        let grid = EnumerationEngine::default().solve(&board, 2).unwrap();
        assert_eq!(grid.get(Coord::new(0, 0)), Some(0.0));
        assert_eq!(grid.get(Coord::new(1, 0)), Some(1.0));
        assert_eq!(grid.get(Coord::new(2, 0)), Some(1.0));
        assert_eq!(grid.get(Coord::new(3, 0)), Some(0.0));
    }

    #[test]
    fn flags_are_echoed_and_discount_their_constraints() {
        // a revealed 1 whose only owed mine is already flagged: the other
        // hidden neighbor must be safe
        let mut board = hidden_board(3, 1);
        *board.get_mut(Coord::new(1, 0)) = CellState::Revealed(1);
        *board.get_mut(Coord::new(0, 0)) = CellState::Flagged;
        let grid = EnumerationEngine::default().solve(&board, 0).unwrap();
        assert_eq!(grid.get(Coord::new(0, 0)), Some(1.0));
        assert_eq!(grid.get(Coord::new(2, 0)), Some(0.0));
    }

    #[test]
    fn shared_cells_split_mass_between_counts() {
        // two 1s over a pair of shared hidden cells: each cell is a coin flip
        let mut board = hidden_board(2, 2);
        *board.get_mut(Coord::new(0, 1)) = CellState::Revealed(1);
        *board.get_mut(Coord::new(1, 1)) = CellState::Revealed(1);
        let grid = EnumerationEngine::default().solve(&board, 1).unwrap();
        assert!((grid.get(Coord::new(0, 0)).unwrap() - 0.5).abs() < 1e-12);
        assert!((grid.get(Coord::new(1, 0)).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn boundary_mass_balances_against_the_unconstrained_rest() {
        // a 1 in the corner of a 4x1 strip: two constrained cells plus one
        // unconstrained cell share two mines
        let mut board = hidden_board(4, 1);
        *board.get_mut(Coord::new(0, 0)) = CellState::Revealed(1);
        let grid = EnumerationEngine::default().solve(&board, 2).unwrap();
        // constraint forces exactly one mine in {x1}; x1 is the only
        // constrained cell so it is certain
        assert_eq!(grid.get(Coord::new(1, 0)), Some(1.0));
        let mass = grid.known_mass();
        assert!((mass - 2.0).abs() < 1e-9, "mass {mass}");
    }

    #[test]
    fn impossible_counts_are_rejected() {
        let mut board = hidden_board(2, 1);
        *board.get_mut(Coord::new(0, 0)) = CellState::Revealed(1);
        *board.get_mut(Coord::new(1, 0)) = CellState::Revealed(0);
        let err = EnumerationEngine::default().solve(&board, 1).unwrap_err();
        assert_eq!(err, EngineError::Unsatisfiable);
    }

    #[test]
    fn mine_budget_too_small_is_rejected() {
        let mut board = hidden_board(3, 1);
        *board.get_mut(Coord::new(1, 0)) = CellState::Revealed(2);
        let err = EnumerationEngine::default().solve(&board, 1).unwrap_err();
        assert_eq!(err, EngineError::Unsatisfiable);
    }

    #[test]
    fn oversized_components_are_refused() {
        let mut board = hidden_board(4, 2);
        *board.get_mut(Coord::new(1, 1)) = CellState::Revealed(1);
        let err = EnumerationEngine::with_component_limit(2)
            .solve(&board, 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::BoundaryTooLarge { cells: 5, .. }));
    }
}
