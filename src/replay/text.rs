//! Plain structured text output, for logs, pipes and tests.

#![allow(clippy::format_push_string)]

use crate::game::{Game, Outcome, Phase};

/// Render game state as plain text.
///
/// Output format:
/// ```text
/// === MOVE 3 OF 12 ===
/// PHASE: in progress  TURN: seat 2  WEAPON: 4
///
/// ..........
/// .↑↑.......
/// ...
///
/// SEAT 1 human alice: score 1, line power 2
/// SEAT 2 ai: score 0, line power 1, OUT
/// ```
#[must_use]
pub fn render_text(game: &Game, position: usize, total: usize) -> String {
    let mut output = format!("=== MOVE {position} OF {total} ===\n");

    let phase = match game.phase() {
        Phase::Setup => "setup",
        Phase::InProgress => "in progress",
        Phase::GameOver => "game over",
    };
    output.push_str(&format!(
        "PHASE: {phase}  TURN: seat {}  WEAPON: {}\n\n",
        game.turn(),
        game.weapon_req()
    ));
    output.push_str(&game.grid().to_string());
    output.push('\n');

    for seat in game.seats().joined() {
        output.push_str(&format!("SEAT {} {}", seat.id, seat.role));
        if !seat.identity.is_empty() {
            output.push_str(&format!(" {}", seat.identity));
        }
        output.push_str(&format!(
            ": score {}, line power {}",
            game.score(seat.id),
            game.line_power(seat.id)
        ));
        if seat.lost {
            output.push_str(", OUT");
        }
        output.push('\n');
    }

    match game.outcome() {
        Some(Outcome::Winner { seat, score }) => {
            output.push_str(&format!("RESULT: seat {seat} wins with {score}\n"));
        }
        Some(Outcome::Draw { seats, score }) => {
            let names: Vec<String> = seats.iter().map(ToString::to_string).collect();
            output.push_str(&format!("RESULT: draw between seats {} at {score}\n", names.join(", ")));
        }
        None => {}
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::Role;

    #[test]
    fn test_render_text() {
        let mut game = Game::new([Role::Human, Role::Ai, Role::None, Role::None], GameConfig::default()).unwrap();
        game.apply("M 2 1".parse().unwrap()).unwrap();
        let output = render_text(&game, 1, 1);

        assert!(output.starts_with("=== MOVE 1 OF 1 ===\n"));
        assert!(output.contains("TURN: seat 2"));
        assert!(output.contains(".↑○"));
        assert!(output.contains("SEAT 1 human: score 1, line power 1"));
        assert!(!output.contains("RESULT"));
    }
}
