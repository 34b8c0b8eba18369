//! The play loop: solve, flag, verify, reveal, repeat.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use autosweep_game::{EngineError, GameSession, InferenceEngine, render_board};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::GuessPolicy;
use crate::stats::SessionStats;
use crate::verify::{Inconsistency, verify};

/// Cooperative cancellation handle shared between the play loop and the
/// signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Pause points the loop hits between steps and between games.
pub trait Pacer {
    fn step_pause(&self);
    fn game_pause(&self);
}

/// Real-time pacing for watching a run in the terminal.
pub struct SleepPacer {
    pub step: Duration,
    pub between_games: Duration,
}

impl Default for SleepPacer {
    fn default() -> Self {
        Self {
            step: Duration::from_secs(1),
            between_games: Duration::from_secs(5),
        }
    }
}

impl Pacer for SleepPacer {
    fn step_pause(&self) {
        thread::sleep(self.step);
    }

    fn game_pause(&self) {
        thread::sleep(self.between_games);
    }
}

/// No pauses at all, for tests and batch runs.
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn step_pause(&self) {}
    fn game_pause(&self) {}
}

#[derive(Debug, Error)]
pub enum PilotError {
    /// The solver's grid failed a consistency check.
    #[error("inconsistent probability grid: {0}")]
    Inconsistent(#[from] Inconsistency),
    /// The grid offered nothing to guess even though the game is not over.
    #[error("no guessable cell while the game is still in progress")]
    NoGuessAvailable,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Won,
    Lost,
    Cancelled,
}

/// One finished (or interrupted) game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub seed: u64,
    pub outcome: GameOutcome,
    /// Product of `1 - p` over the guesses this game consumed.
    pub expected_win: f64,
    pub steps: u32,
    pub guesses: u32,
}

/// Aggregate result of a run, per-game records included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub stats: SessionStats,
    pub records: Vec<GameRecord>,
}

/// Drives games end to end: the inference engine proposes probabilities,
/// the verifier vets them, the policy picks the guess.
pub struct Pilot<E: InferenceEngine> {
    engine: E,
    policy: Box<dyn GuessPolicy + Send>,
    pacer: Box<dyn Pacer + Send>,
    cancel: CancelToken,
}

impl<E: InferenceEngine> Pilot<E> {
    pub fn new(
        engine: E,
        policy: Box<dyn GuessPolicy + Send>,
        pacer: Box<dyn Pacer + Send>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            engine,
            policy,
            pacer,
            cancel,
        }
    }

    /// Play one game on `session` until it ends or cancellation hits.
    ///
    /// Each step: solve the board, flag every certain mine, then either
    /// batch-reveal the certain-safe cells or verify the grid and reveal
    /// the policy's guess. Only guesses discount `expected_win`; certain
    /// reveals are free.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Inconsistent`] when the verifier rejects the
    /// solver's grid, [`PilotError::NoGuessAvailable`] when the grid holds
    /// no cell to act on, and [`PilotError::Engine`] when the solver
    /// itself fails.
    #[allow(clippy::float_cmp)]
    pub fn run_game(&mut self, session: &mut GameSession) -> Result<GameRecord, PilotError> {
        let mut expected_win = 1.0;
        let mut steps = 0u32;
        let mut guesses = 0u32;

        while !session.done() && !self.cancel.is_cancelled() {
            let grid = self
                .engine
                .solve(session.board(), session.mines_remaining())?;

            for at in grid.cells_at(1.0) {
                if session.board().get(at).is_hidden() {
                    session.flag_action(at);
                }
            }

            let best = grid.best_prob().ok_or(PilotError::NoGuessAvailable)?;
            if best == 0.0 {
                for at in grid.cells_at(0.0) {
                    if session.board().get(at).is_hidden() {
                        session.reveal_action(at);
                    }
                }
            } else {
                verify(session.board(), &grid, session.mines_remaining())?;
                expected_win *= 1.0 - best;
                let at = self
                    .policy
                    .select_guess(&grid)
                    .ok_or(PilotError::NoGuessAvailable)?;
                debug!(
                    "guessing {at} at p={best:.4} ({}), expected win now {expected_win:.4}",
                    self.policy.name()
                );
                guesses += 1;
                session.reveal_action(at);
            }

            steps += 1;
            debug!("board after step {steps}:\n{}", render_board(session.board()));
            self.pacer.step_pause();
        }

        let outcome = if session.done() {
            if session.is_won() {
                GameOutcome::Won
            } else {
                GameOutcome::Lost
            }
        } else {
            GameOutcome::Cancelled
        };

        Ok(GameRecord {
            seed: session.seed(),
            outcome,
            expected_win,
            steps,
            guesses,
        })
    }

    /// Play games on `session` until the limit or cancellation. Game seeds
    /// derive from `master_seed`, so a run replays exactly. A cancelled
    /// partial game is kept in the records but left out of the statistics.
    ///
    /// # Errors
    ///
    /// Propagates the first [`PilotError`] a game raises.
    pub fn run(
        &mut self,
        session: &mut GameSession,
        master_seed: u64,
        max_games: Option<u32>,
    ) -> Result<SessionReport, PilotError> {
        let mut seeds = ChaCha20Rng::seed_from_u64(master_seed);
        let mut stats = SessionStats::default();
        let mut records = Vec::new();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Some(limit) = max_games
                && stats.games >= limit
            {
                break;
            }

            let seed = seeds.random::<u64>();
            info!("starting game {} with seed {seed}", stats.games + 1);
            session.reset(seed);
            let record = self.run_game(session)?;

            if record.outcome == GameOutcome::Cancelled {
                records.push(record);
                break;
            }

            let won = record.outcome == GameOutcome::Won;
            stats = stats.record_game_end(won, record.expected_win);
            info!(
                "{} | E[win] {:.2}% | {} wins, {} games, {:.2} expected wins, {:.2}% win rate",
                if won { "W" } else { "L" },
                record.expected_win * 100.0,
                stats.wins,
                stats.games,
                stats.expected_wins,
                stats.realized_win_rate() * 100.0
            );
            records.push(record);
            self.pacer.game_pause();
        }

        Ok(SessionReport { stats, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CornerThenEdgePolicy;
    use autosweep_game::{Coord, EnumerationEngine, MineMap, SessionConfig};

    fn pilot(cancel: CancelToken) -> Pilot<EnumerationEngine> {
        Pilot::new(
            EnumerationEngine::default(),
            Box::new(CornerThenEdgePolicy),
            Box::new(NoopPacer),
            cancel,
        )
    }

    fn mine_map(width: usize, height: usize, mines: &[(usize, usize)]) -> MineMap {
        MineMap::from_fn(width, height, |at| mines.contains(&(at.x, at.y)))
    }

    #[test]
    fn wins_a_coin_flip_board_by_guessing_the_corner() {
        // 2x1, mine on the right: uniform 1/2, the corner policy opens
        // (0, 0), which is safe, and the game ends won
        let config = SessionConfig::new(2, 1, 1);
        let mut session = GameSession::with_mines(config, mine_map(2, 1, &[(1, 0)]));
        let record = pilot(CancelToken::new()).run_game(&mut session).unwrap();
        assert_eq!(record.outcome, GameOutcome::Won);
        assert_eq!(record.guesses, 1);
        assert_eq!(record.steps, 1);
        assert!((record.expected_win - 0.5).abs() < 1e-12);
    }

    #[test]
    fn certain_safe_cells_are_revealed_without_a_guess() {
        // 4x2, mines at (1, 0) and (2, 0), bottom row pre-revealed as
        // 1-2-2-1: the top row is fully determined, so the game finishes
        // with flags and free reveals only
        let config = SessionConfig::new(4, 2, 2);
        let mut session = GameSession::with_mines(config, mine_map(4, 2, &[(1, 0), (2, 0)]));
        for x in 0..4 {
            session.reveal_action(Coord::new(x, 1));
        }
        let record = pilot(CancelToken::new()).run_game(&mut session).unwrap();
        assert_eq!(record.outcome, GameOutcome::Won);
        assert_eq!(record.guesses, 0);
        assert_eq!(record.steps, 1);
        assert_eq!(record.expected_win, 1.0);
    }

    #[test]
    fn a_cancelled_run_plays_no_games() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let config = SessionConfig::new(3, 3, 1);
        let mut session = GameSession::new(config, 1);
        let report = pilot(cancel).run(&mut session, 42, Some(5)).unwrap();
        assert_eq!(report.stats.games, 0);
        assert!(report.records.is_empty());
    }

    #[test]
    fn a_bounded_run_records_exactly_the_requested_games() {
        let config = SessionConfig::new(3, 3, 1);
        let mut session = GameSession::new(config, 1);
        let report = pilot(CancelToken::new())
            .run(&mut session, 42, Some(3))
            .unwrap();
        assert_eq!(report.stats.games, 3);
        assert_eq!(report.records.len(), 3);
        for record in &report.records {
            assert_ne!(record.outcome, GameOutcome::Cancelled);
            assert!(record.expected_win > 0.0 && record.expected_win <= 1.0);
        }
    }

    #[test]
    fn runs_with_the_same_master_seed_replay_identically() {
        let config = SessionConfig::new(4, 4, 3);
        let mut first_session = GameSession::new(config, 1);
        let first = pilot(CancelToken::new())
            .run(&mut first_session, 99, Some(2))
            .unwrap();
        let mut second_session = GameSession::new(config, 2);
        let second = pilot(CancelToken::new())
            .run(&mut second_session, 99, Some(2))
            .unwrap();
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.records, second.records);
    }
}
