//! ASCII renderer for terminal viewing with ANSI colors.

#![allow(clippy::format_push_string)]

use crate::game::{Cell, Game, SeatId};

/// ANSI color codes for seats.
const SEAT_COLORS: [&str; 4] = [
    "\x1b[91m", // Seat 1: Red
    "\x1b[92m", // Seat 2: Green
    "\x1b[94m", // Seat 3: Blue
    "\x1b[93m", // Seat 4: Yellow
];

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const GRAY: &str = "\x1b[90m";

/// Render the board with ANSI colors.
///
/// Output format:
/// ```text
/// Move 12/40                      [1: 3] [2: 1]
/// ┌─────────────────────┐
/// │ . . . . . . . . . . │
/// │ . ↑ ↑ ○ . . . . ← . │
/// └─────────────────────┘
///
/// Seat 1 (human): stations ↑ mines ○  Score: 3
/// ```
#[must_use]
pub fn render_ascii(game: &Game, position: usize, total: usize) -> String {
    let mut output = String::new();

    render_header(&mut output, game, position, total);
    render_board(&mut output, game);
    output.push('\n');
    render_seats(&mut output, game);

    output.push_str("\n[<] Back  [>] Forward  [g] Goto move  [q] Quit\n");
    output
}

fn render_header(output: &mut String, game: &Game, position: usize, total: usize) {
    let title = format!("Move {position}/{total}");
    output.push_str(&format!("{title:<32}"));
    for seat in game.seats().joined() {
        let color = seat_color(seat.id);
        output.push_str(&format!("{color}[{}: {}]{RESET} ", seat.id, game.score(seat.id)));
    }
    output.push('\n');
}

fn render_board(output: &mut String, game: &Game) {
    let width = usize::from(game.grid().width());
    let border = "─".repeat(width * 2 + 1);

    output.push_str(&format!("┌{border}┐\n"));
    for row in game.grid().rows() {
        output.push_str("│ ");
        for cell in row {
            render_cell(output, *cell);
            output.push(' ');
        }
        output.push_str("│\n");
    }
    output.push_str(&format!("└{border}┘\n"));
}

fn render_cell(output: &mut String, cell: Cell) {
    match cell.owner() {
        Some(seat) => output.push_str(&format!("{}{}{RESET}", seat_color(seat), cell.glyph())),
        None => output.push_str(&format!("{GRAY}{}{RESET}", cell.glyph())),
    }
}

fn render_seats(output: &mut String, game: &Game) {
    for seat in game.seats().joined() {
        if seat.lost {
            output.push_str(&format!("{DIM}Seat {} ({}): OUT  Score: {}{RESET}\n", seat.id, seat.role, game.score(seat.id)));
            continue;
        }
        let marker = if seat.id == game.turn() && !game.is_over() { "▶" } else { " " };
        output.push_str(&format!(
            "{marker}{}Seat {} ({}):{RESET} stations {} mines {}  Score: {}\n",
            seat_color(seat.id),
            seat.id,
            seat.role,
            seat.station_glyph(),
            seat.mine_glyph(),
            game.score(seat.id)
        ));
    }
}

fn seat_color(seat: SeatId) -> &'static str {
    SEAT_COLORS.get(seat.index()).copied().unwrap_or(RESET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::Role;

    #[test]
    fn test_render_ascii_basic() {
        let game = Game::new([Role::Human, Role::Ai, Role::None, Role::None], GameConfig::default()).unwrap();
        let output = render_ascii(&game, 0, 7);

        assert!(output.contains("Move 0/7"));
        assert!(output.contains('┌'));
        assert!(output.contains('┘'));
        assert!(output.contains("Seat 1 (human)"));
        assert!(output.contains("Seat 2 (ai)"));
        assert!(!output.contains("Seat 3"));
        // Ten rows between the borders.
        assert_eq!(output.lines().filter(|l| l.starts_with('│')).count(), 10);
    }

    #[test]
    fn test_seat_color() {
        for seat in SeatId::ALL {
            assert!(seat_color(seat).starts_with("\x1b["));
        }
    }
}
