//! Result file writers
//!
//! Comparative runs group engines by identical verdicts; competition runs
//! rank strategies by score. Both writers emit the plain-text formats the
//! original tooling consumed, into timestamped files next to the modules
//! they describe. When the file cannot be created the report goes to stdout
//! instead of being lost.

use std::io::Write;

use chrono::Local;

use tankwar_core::{GameResult, WinReason};

use crate::tournament::{ComparativeReport, CompetitionReport};

/// Timestamp fragment used in output file names
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Human verdict line for one result.
///
/// `zero_shell_steps` is the countdown threshold the match ran with, quoted
/// in the zero-shell tie message.
pub fn result_message(result: &GameResult, zero_shell_steps: usize) -> String {
    if result.winner != 0 {
        let survivors = surviving_tanks(&result.final_state, result.winner);
        return format!(
            "Player {} won with {} tanks still alive",
            result.winner, survivors
        );
    }
    match result.reason {
        WinReason::MaxSteps => format!("Tie, reached max steps = {}", result.rounds),
        WinReason::ZeroShells => format!(
            "Tie, both players have zero shells for {} steps",
            zero_shell_steps
        ),
        WinReason::AllTanksDead => "Tie, both players have zero tanks".to_string(),
    }
}

/// Count a player's tank glyphs in a final snapshot
fn surviving_tanks(final_state: &str, player: u8) -> usize {
    let glyph = (b'0' + player) as char;
    final_state.chars().filter(|&c| c == glyph).count()
}

/// Write a comparative report: header, then one block per result group
pub fn write_comparative(
    out: &mut dyn Write,
    report: &ComparativeReport,
    zero_shell_steps: usize,
) -> std::io::Result<()> {
    writeln!(out, "game_map={}", report.game_map)?;
    writeln!(out, "algorithm1={}", report.algorithm1)?;
    writeln!(out, "algorithm2={}", report.algorithm2)?;
    writeln!(out)?;

    if report.groups.is_empty() {
        writeln!(out, "No games were run")?;
        return Ok(());
    }

    for group in &report.groups {
        writeln!(out, "{}", group.engines.join(", "))?;
        writeln!(out, "{}", result_message(&group.result, zero_shell_steps))?;
        writeln!(out, "{}", group.result.rounds)?;
        writeln!(out, "{}", group.result.final_state)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write a competition report: header, then `<name> <score>` descending
pub fn write_competition(out: &mut dyn Write, report: &CompetitionReport) -> std::io::Result<()> {
    writeln!(out, "game_maps_folder={}", report.game_maps_folder)?;
    writeln!(out, "game_manager={}", report.game_manager)?;
    writeln!(out)?;

    if report.scores.is_empty() {
        writeln!(out, "No games were run")?;
        return Ok(());
    }

    for score in &report.scores {
        writeln!(out, "{} {}", score.name, score.score)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{ResultGroup, StrategyScore};

    fn sample_result(winner: u8, reason: WinReason, rounds: usize, board: &str) -> GameResult {
        GameResult {
            winner,
            reason,
            rounds,
            final_state: board.to_string(),
        }
    }

    #[test]
    fn test_result_messages() {
        let win = sample_result(1, WinReason::AllTanksDead, 12, "1 1\n   ");
        assert_eq!(result_message(&win, 40), "Player 1 won with 2 tanks still alive");

        let max = sample_result(0, WinReason::MaxSteps, 200, "1 2");
        assert_eq!(result_message(&max, 40), "Tie, reached max steps = 200");

        let dry = sample_result(0, WinReason::ZeroShells, 55, "1 2");
        assert_eq!(
            result_message(&dry, 40),
            "Tie, both players have zero shells for 40 steps"
        );

        let dead = sample_result(0, WinReason::AllTanksDead, 3, "   ");
        assert_eq!(result_message(&dead, 40), "Tie, both players have zero tanks");
    }

    #[test]
    fn test_comparative_format() {
        let report = ComparativeReport {
            game_map: "maps/arena.txt".into(),
            algorithm1: "alpha.so".into(),
            algorithm2: "beta.so".into(),
            groups: vec![ResultGroup {
                engines: vec!["gm_a".into(), "gm_b".into()],
                result: sample_result(2, WinReason::AllTanksDead, 9, "  2"),
            }],
            output_path: None,
        };
        let mut buffer = Vec::new();
        write_comparative(&mut buffer, &report, 40).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "game_map=maps/arena.txt\n\
             algorithm1=alpha.so\n\
             algorithm2=beta.so\n\
             \n\
             gm_a, gm_b\n\
             Player 2 won with 1 tanks still alive\n\
             9\n\
             \x20 2\n\
             \n"
        );
    }

    #[test]
    fn test_comparative_no_games() {
        let report = ComparativeReport {
            game_map: "m".into(),
            algorithm1: "a".into(),
            algorithm2: "b".into(),
            groups: vec![],
            output_path: None,
        };
        let mut buffer = Vec::new();
        write_comparative(&mut buffer, &report, 40).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("No games were run\n"));
    }

    #[test]
    fn test_competition_format() {
        let report = CompetitionReport {
            game_maps_folder: "maps".into(),
            game_manager: "gm.so".into(),
            scores: vec![
                StrategyScore { name: "alpha".into(), score: 7, wins: 2, ties: 1, losses: 0 },
                StrategyScore { name: "beta".into(), score: 1, wins: 0, ties: 1, losses: 2 },
            ],
            output_path: None,
        };
        let mut buffer = Vec::new();
        write_competition(&mut buffer, &report).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "game_maps_folder=maps\ngame_manager=gm.so\n\nalpha 7\nbeta 1\n");
    }
}
