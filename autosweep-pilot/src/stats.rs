//! Session-level win statistics.

use serde::{Deserialize, Serialize};

/// Running outcome counters across the games of one run.
///
/// `expected_wins` accumulates each game's expected-win value: the product
/// of `1 - p` over every guess probability `p` the game consumed, i.e. the
/// chance the run had of surviving the uncertainty it actually faced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub games: u32,
    pub wins: u32,
    pub expected_wins: f64,
}

impl SessionStats {
    /// Fold one finished game into the aggregate. Pure update.
    #[must_use]
    pub fn record_game_end(self, won: bool, expected_win: f64) -> Self {
        Self {
            games: self.games + 1,
            wins: self.wins + u32::from(won),
            expected_wins: self.expected_wins + expected_win,
        }
    }

    #[must_use]
    pub fn realized_win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games)
        }
    }

    #[must_use]
    pub fn expected_win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.expected_wins / f64::from(self.games)
        }
    }
}
