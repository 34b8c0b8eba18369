//! Player-visible board state, kept separate from the ground-truth mine map.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// What the player (or an automated one) can see of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Flagged,
    /// Opened, showing the adjacent-mine count.
    Revealed(u8),
}

impl CellState {
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    #[must_use]
    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }

    #[must_use]
    pub const fn revealed_count(self) -> Option<u8> {
        match self {
            Self::Revealed(count) => Some(count),
            _ => None,
        }
    }
}

/// The board as the controller reads it: one [`CellState`] per cell.
pub type BoardState = Grid<CellState>;

/// Plain-text rendering used by debug logging.
#[must_use]
pub fn render_board(board: &BoardState) -> String {
    let mut out = String::with_capacity(board.len() * 2 + board.height());
    for (at, cell) in board.iter() {
        match cell {
            CellState::Hidden => out.push('-'),
            CellState::Flagged => out.push('F'),
            CellState::Revealed(count) => out.push(char::from(b'0' + count)),
        }
        if at.x == board.width() - 1 {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;

    #[test]
    fn renders_cell_kinds() {
        let mut board: BoardState = Grid::filled(3, 1, CellState::Hidden);
        *board.get_mut(Coord::new(1, 0)) = CellState::Flagged;
        *board.get_mut(Coord::new(2, 0)) = CellState::Revealed(3);
        assert_eq!(render_board(&board), "- F 3\n");
    }
}
