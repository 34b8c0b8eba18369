//! Autosweep Game Engine
//!
//! Platform-agnostic Minesweeper core: grid primitives, mine placement,
//! the playable game session, and probability inference over a board
//! snapshot. The automated player lives in the `autosweep-pilot` crate.

pub mod board;
pub mod grid;
pub mod infer;
pub mod mine_map;
pub mod probability;
pub mod session;

// Re-export commonly used types
pub use board::{BoardState, CellState, render_board};
pub use grid::{Coord, Grid, window_sums};
pub use infer::{EngineError, EnumerationEngine, InferenceEngine};
pub use mine_map::MineMap;
pub use probability::ProbabilityGrid;
pub use session::{GameSession, SessionConfig};
