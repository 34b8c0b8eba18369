//! Run result output, console and JSON.

use colored::Colorize;

use crate::controller::{GameOutcome, SessionReport};

/// Pretty per-game summary plus totals, for interactive runs.
pub fn print_console_report(report: &SessionReport) {
    println!();
    println!("{}", "=== Run Report ===".bold());
    for (i, record) in report.records.iter().enumerate() {
        let marker = match record.outcome {
            GameOutcome::Won => "W".green().bold(),
            GameOutcome::Lost => "L".red(),
            GameOutcome::Cancelled => "C".yellow(),
        };
        println!(
            "  {marker} game {:>3}  seed {:>20}  E[win] {:>7.2}%  {} steps, {} guesses",
            i + 1,
            record.seed,
            record.expected_win * 100.0,
            record.steps,
            record.guesses
        );
    }
    let stats = &report.stats;
    println!();
    println!(
        "  {} wins / {} games ({:.2}% realized, {:.2}% expected)",
        stats.wins.to_string().green().bold(),
        stats.games,
        stats.realized_win_rate() * 100.0,
        stats.expected_win_rate() * 100.0
    );
    println!("  {:.2} expected wins accumulated", stats.expected_wins);
}

/// Machine-readable output for piping into other tools.
///
/// # Errors
///
/// Returns an error if the report fails to serialize.
pub fn print_json_report(report: &SessionReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::GameRecord;
    use crate::stats::SessionStats;

    #[test]
    fn reports_round_trip_through_json() {
        let report = SessionReport {
            stats: SessionStats::default().record_game_end(true, 0.75),
            records: vec![GameRecord {
                seed: 12345,
                outcome: GameOutcome::Won,
                expected_win: 0.75,
                steps: 9,
                guesses: 2,
            }],
        };
        let text = serde_json::to_string(&report).unwrap();
        let back: SessionReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.stats, report.stats);
        assert_eq!(back.records, report.records);
    }
}
