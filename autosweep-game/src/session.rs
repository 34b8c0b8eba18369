//! A playable Minesweeper game: the mutable session the automated player
//! drives through `reveal_action` / `flag_action`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::board::{BoardState, CellState};
use crate::grid::{Coord, Grid};
use crate::mine_map::{self, MineMap};

/// Board shape and game rules for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    pub num_mines: u32,
    /// Relocate a mine hit by the very first reveal. Off by default so the
    /// solver's probabilities match the board exactly.
    pub first_never_mine: bool,
}

impl SessionConfig {
    #[must_use]
    pub const fn new(width: usize, height: usize, num_mines: u32) -> Self {
        Self {
            width,
            height,
            num_mines,
            first_never_mine: false,
        }
    }

    #[must_use]
    pub const fn beginner() -> Self {
        Self::new(9, 9, 10)
    }

    #[must_use]
    pub const fn intermediate() -> Self {
        Self::new(16, 16, 40)
    }

    #[must_use]
    pub const fn expert() -> Self {
        Self::new(30, 16, 99)
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    mines: MineMap,
    board: BoardState,
    seed: u64,
    flags: u32,
    revealed: usize,
    exploded: bool,
    done: bool,
    any_revealed: bool,
    rng: ChaCha20Rng,
}

impl GameSession {
    /// A fresh board with mines placed from `seed`.
    #[must_use]
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mines = mine_map::generate(config.width, config.height, config.num_mines, &mut rng);
        Self {
            config,
            mines,
            board: Grid::filled(config.width, config.height, CellState::Hidden),
            seed,
            flags: 0,
            revealed: 0,
            exploded: false,
            done: false,
            any_revealed: false,
            rng,
        }
    }

    /// Fixture constructor with a hand-placed mine map.
    ///
    /// # Panics
    ///
    /// Panics if the map dimensions or mine count disagree with `config`.
    #[must_use]
    pub fn with_mines(config: SessionConfig, mines: MineMap) -> Self {
        assert_eq!(mines.width(), config.width);
        assert_eq!(mines.height(), config.height);
        let placed = mines.iter().filter(|(_, mine)| **mine).count();
        assert_eq!(placed, config.num_mines as usize, "mine count mismatch");
        Self {
            config,
            mines,
            board: Grid::filled(config.width, config.height, CellState::Hidden),
            seed: 0,
            flags: 0,
            revealed: 0,
            exploded: false,
            done: false,
            any_revealed: false,
            rng: ChaCha20Rng::seed_from_u64(0),
        }
    }

    /// Discard the current game and start over on a new random board.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(self.config, seed);
    }

    #[must_use]
    pub const fn config(&self) -> SessionConfig {
        self.config
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.config.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.config.height
    }

    #[must_use]
    pub const fn num_mines(&self) -> u32 {
        self.config.num_mines
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Mines not yet accounted for by a flag.
    #[must_use]
    pub const fn mines_remaining(&self) -> u32 {
        self.config.num_mines.saturating_sub(self.flags)
    }

    #[must_use]
    pub const fn board(&self) -> &BoardState {
        &self.board
    }

    #[must_use]
    pub const fn done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn is_won(&self) -> bool {
        self.done && !self.exploded && self.revealed == self.safe_cells()
    }

    const fn safe_cells(&self) -> usize {
        self.config.cell_count() - self.config.num_mines as usize
    }

    /// Toggle a flag on a hidden cell. No effect on revealed cells or after
    /// the game has ended.
    pub fn flag_action(&mut self, at: Coord) {
        if self.done {
            return;
        }
        match *self.board.get(at) {
            CellState::Hidden => {
                *self.board.get_mut(at) = CellState::Flagged;
                self.flags += 1;
            }
            CellState::Flagged => {
                *self.board.get_mut(at) = CellState::Hidden;
                self.flags -= 1;
            }
            CellState::Revealed(_) => {}
        }
    }

    /// Open a hidden cell. Opening a mine ends the game as a loss; opening
    /// a zero-count cell flood-opens its neighborhood. Flagged and already
    /// revealed cells are ignored.
    pub fn reveal_action(&mut self, at: Coord) {
        if self.done || !self.board.get(at).is_hidden() {
            return;
        }
        if *self.mines.get(at) {
            let relocated =
                self.config.first_never_mine && !self.any_revealed && self.relocate_mine(at);
            if !relocated {
                self.exploded = true;
                self.done = true;
                return;
            }
        }
        self.any_revealed = true;
        self.open(at);
        if self.revealed == self.safe_cells() {
            self.done = true;
        }
    }

    fn open(&mut self, at: Coord) {
        let mut stack = vec![at];
        while let Some(cur) = stack.pop() {
            if !self.board.get(cur).is_hidden() {
                continue;
            }
            let count = mine_map::neighbor_mine_count(&self.mines, cur);
            *self.board.get_mut(cur) = CellState::Revealed(count);
            self.revealed += 1;
            if count == 0 {
                // zero cells have no mined neighbors, so every neighbor opens
                for nb in self.board.neighbors(cur) {
                    if self.board.get(nb).is_hidden() {
                        stack.push(nb);
                    }
                }
            }
        }
    }

    /// Move the mine at `at` to a random free cell. Returns false when the
    /// board has no free cell to move it to.
    fn relocate_mine(&mut self, at: Coord) -> bool {
        if self.config.num_mines as usize >= self.config.cell_count() {
            return false;
        }
        loop {
            let to = Coord::new(
                self.rng.random_range(0..self.config.width),
                self.rng.random_range(0..self.config.height),
            );
            if to != at && !*self.mines.get(to) {
                *self.mines.get_mut(to) = true;
                *self.mines.get_mut(at) = false;
                return true;
            }
        }
    }
}
