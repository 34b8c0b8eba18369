//! Autosweep: an automated Minesweeper player.
//!
//! Drives games end to end with the enumeration engine, checks every
//! probability grid it acts on, and reports realized versus expected win
//! rates at the end of the run.

mod controller;
mod policy;
mod reports;
mod stats;
mod verify;

use std::time::Duration;

use autosweep_game::{EnumerationEngine, GameSession, SessionConfig};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::info;

use crate::controller::{CancelToken, NoopPacer, Pacer, Pilot, SleepPacer};
use crate::policy::GuessStrategy;
use crate::reports::{print_console_report, print_json_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    const fn config(self) -> SessionConfig {
        match self {
            Difficulty::Beginner => SessionConfig::beginner(),
            Difficulty::Intermediate => SessionConfig::intermediate(),
            Difficulty::Expert => SessionConfig::expert(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Console,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "autosweep", about = "Automated Minesweeper player", version)]
struct Args {
    /// Preset board size, ignored when explicit dimensions are given
    #[arg(short, long, value_enum, default_value_t = Difficulty::Expert)]
    difficulty: Difficulty,

    /// Board width (requires --height and --mines)
    #[arg(long, requires = "height", requires = "mines")]
    width: Option<usize>,

    /// Board height (requires --width and --mines)
    #[arg(long, requires = "width", requires = "mines")]
    height: Option<usize>,

    /// Mine count (requires --width and --height)
    #[arg(long, requires = "width", requires = "height")]
    mines: Option<u32>,

    /// Number of games to play; 0 plays until Ctrl-C
    #[arg(short, long, default_value_t = 10)]
    games: u32,

    /// Master seed for the run; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Guess selection strategy
    #[arg(long, value_enum, default_value_t = GuessStrategy::CornerThenEdge)]
    strategy: GuessStrategy,

    /// Relocate a mine hit by the first reveal of each game
    #[arg(long)]
    first_never_mine: bool,

    /// Pause between steps, for watching a run
    #[arg(long, default_value_t = 0)]
    step_delay_ms: u64,

    /// Pause between games
    #[arg(long, default_value_t = 0)]
    game_delay_ms: u64,

    /// Output format for the final report
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Log per-step decisions and board renders (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    println!("{}", "Autosweep".bright_cyan().bold());

    let mut config = match (args.width, args.height, args.mines) {
        (Some(width), Some(height), Some(mines)) => SessionConfig::new(width, height, mines),
        _ => args.difficulty.config(),
    };
    config.first_never_mine = args.first_never_mine;

    let master_seed = args.seed.unwrap_or_else(rand::random);
    let limit = (args.games > 0).then_some(args.games);
    let pacer: Box<dyn Pacer + Send> = if args.step_delay_ms == 0 && args.game_delay_ms == 0 {
        Box::new(NoopPacer)
    } else {
        Box::new(SleepPacer {
            step: Duration::from_millis(args.step_delay_ms),
            between_games: Duration::from_millis(args.game_delay_ms),
        })
    };

    info!(
        "{}x{} board, {} mines, master seed {master_seed}, strategy {}",
        config.width, config.height, config.num_mines, args.strategy
    );

    let cancel = CancelToken::new();
    let mut pilot = Pilot::new(
        EnumerationEngine::default(),
        args.strategy.create_policy(),
        pacer,
        cancel.clone(),
    );

    let mut worker = tokio::task::spawn_blocking(move || {
        let mut session = GameSession::new(config, master_seed);
        pilot.run(&mut session, master_seed, limit)
    });

    let report = tokio::select! {
        res = &mut worker => res??,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, finishing up");
            cancel.cancel();
            worker.await??
        }
    };

    match args.report {
        ReportFormat::Console => print_console_report(&report),
        ReportFormat::Json => print_json_report(&report)?,
    }

    Ok(())
}
