//! Output formatting utilities for CLI.

#![allow(clippy::format_push_string, clippy::cast_precision_loss)]

use mars_miners::Game;
use mars_miners::game::{Outcome, SeatId};
use mars_miners::tournament::TournamentStats;
use serde::Serialize;

/// Final result line for a finished or abandoned game.
pub(super) fn format_result(game: &Game) -> String {
    match game.outcome() {
        Some(Outcome::Winner { seat, score }) => format!("Winner: seat {seat} with {score} mines\n"),
        Some(Outcome::Draw { seats, score }) => {
            let names: Vec<String> = seats.iter().map(ToString::to_string).collect();
            format!("Draw between seats {} at {score} mines\n", names.join(", "))
        }
        None => "Game not finished\n".to_string(),
    }
}

/// JSON-serializable per-seat tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentSeat {
    /// Seat number (1-4).
    seat: u8,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average score.
    avg_score: f64,
    /// Score standard deviation.
    score_std_dev: f64,
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Per-seat statistics.
    seats: Vec<JsonTournamentSeat>,
    /// Number of draws.
    draws: u64,
    /// Games abandoned at the move cap.
    unfinished: u64,
    /// Average game length in moves.
    avg_moves: f64,
}

impl JsonTournamentResult {
    /// Create from stats for the playing seats.
    pub(super) fn from_stats(stats: &TournamentStats, seats: &[SeatId]) -> Self {
        Self {
            games_played: stats.games_played,
            seats: seats
                .iter()
                .map(|&seat| JsonTournamentSeat {
                    seat: seat.get(),
                    wins: stats.wins[seat.index()],
                    win_rate: stats.win_rate(seat),
                    avg_score: stats.avg_score(seat),
                    score_std_dev: stats.score_std_dev(seat),
                })
                .collect(),
            draws: stats.draws,
            unfinished: stats.unfinished,
            avg_moves: stats.avg_moves(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats, seats: &[SeatId]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for &seat in seats {
        output.push_str(&format!(
            "  Seat {seat}: {:.1}% ({} wins)\n",
            stats.win_rate(seat) * 100.0,
            stats.wins[seat.index()]
        ));
    }
    let games = stats.games_played.max(1) as f64;
    output.push_str(&format!(
        "  Draws: {} ({:.1}%)\n",
        stats.draws,
        stats.draws as f64 / games * 100.0
    ));
    if stats.unfinished > 0 {
        output.push_str(&format!("  Unfinished: {}\n", stats.unfinished));
    }
    output.push('\n');

    output.push_str("Average Scores:\n");
    for &seat in seats {
        output.push_str(&format!(
            "  Seat {seat}: {:.1} (+/- {:.1})\n",
            stats.avg_score(seat),
            stats.score_std_dev(seat)
        ));
    }

    output.push_str(&format!("\nAverage Game Length: {:.0} moves\n", stats.avg_moves()));
    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats, seats: &[SeatId]) -> String {
    let mut output = String::from("seat,wins,win_rate,avg_score,score_std_dev\n");
    for &seat in seats {
        output.push_str(&format!(
            "{seat},{},{:.4},{:.2},{:.2}\n",
            stats.wins[seat.index()],
            stats.win_rate(seat),
            stats.avg_score(seat),
            stats.score_std_dev(seat)
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use mars_miners::tournament::run_game;
    use mars_miners::{GameConfig, Role};

    use super::*;

    fn stats() -> TournamentStats {
        let mut stats = TournamentStats::new();
        for seed in 0..3 {
            let roles = [Role::Ai, Role::Ai, Role::None, Role::None];
            stats.add_result(&run_game(seed, roles, GameConfig::default()).unwrap());
        }
        stats
    }

    #[test]
    fn test_tournament_text_and_csv() {
        let stats = stats();
        let seats = [SeatId::P1, SeatId::P2];

        let text = format_tournament_text(&stats, &seats);
        assert!(text.contains("Tournament Results (3 games)"));
        assert!(text.contains("Seat 1:"));
        assert!(text.contains("Seat 2:"));

        let csv = format_tournament_csv(&stats, &seats);
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("seat,wins"));
    }

    #[test]
    fn test_tournament_json() {
        let stats = stats();
        let json = serde_json::to_value(JsonTournamentResult::from_stats(&stats, &[SeatId::P1])).unwrap();
        assert_eq!(json["games_played"], 3);
        assert_eq!(json["seats"][0]["seat"], 1);
    }

    #[test]
    fn test_format_result_unfinished() {
        let game = Game::new([Role::Ai, Role::Ai, Role::None, Role::None], GameConfig::default()).unwrap();
        assert_eq!(format_result(&game), "Game not finished\n");
    }
}
