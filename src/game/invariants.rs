//! Game invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger for a state reached through the apply path.
//! If they do, the rules engine has a bug.

use crate::game::{Cell, Game, Phase};
use crate::protocol::Command;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(violations: &mut Vec<InvariantViolation>, message: String) {
    violations.push(InvariantViolation { message });
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(game: &Game) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if game.weapon_req == 0 {
        violation(&mut violations, "weapon requirement is zero".to_string());
    }

    // Turn rotation safety
    if game.phase != Phase::GameOver && game.seats.joined().next().is_some() {
        let seat = game.seats.get(game.turn);
        if !seat.role.is_playing() {
            violation(&mut violations, format!("Turn is on unjoined seat {}", game.turn));
        } else if seat.lost && game.phase == Phase::InProgress {
            violation(&mut violations, format!("Turn is on lost seat {}", game.turn));
        }
    }

    for seat in game.seats.iter() {
        let spawn = game.grid.cell(seat.spawn);
        match game.phase {
            Phase::Setup => {
                if seat.lost {
                    violation(&mut violations, format!("Seat {} lost before play began", seat.id));
                }
            }
            Phase::InProgress | Phase::GameOver => {
                // Sealed: unjoined seats are lost and their spawn is blocked
                if !seat.role.is_playing() && (!seat.lost || spawn != Some(Cell::Dead)) {
                    violation(
                        &mut violations,
                        format!("Unjoined seat {} is not sealed (spawn {:?})", seat.id, spawn),
                    );
                }
            }
        }
        if seat.role.is_playing() && spawn == Some(Cell::Dead) {
            violation(&mut violations, format!("Joined seat {} has a dead spawn", seat.id));
        }
    }

    // Glyph ownership
    for (coord, cell) in game.grid.iter() {
        if let Some(owner) = cell.owner() {
            if !game.seats.get(owner).role.is_playing() {
                violation(
                    &mut violations,
                    format!("Cell {coord} holds a building of unjoined seat {owner}"),
                );
            }
        }
        if game.phase == Phase::Setup && matches!(cell, Cell::Dead | Cell::Rubble) {
            violation(&mut violations, format!("Cell {coord} is {cell} before play began"));
        }
    }

    // Each attack destroys at most two cells
    let attacks = game
        .log
        .iter()
        .filter(|cmd| matches!(cmd, Command::Laser { .. }))
        .count();
    let rubble = game.grid.count(Cell::Rubble);
    if rubble > attacks * 2 {
        violation(
            &mut violations,
            format!("{rubble} rubble cells from only {attacks} attacks"),
        );
    }

    let active = game.seats.active().count();
    if game.phase == Phase::GameOver && active > 1 {
        violation(&mut violations, format!("Game over with {active} seats still active"));
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(game: &Game) {
    let violations = check_invariants(game);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_game: &Game) {}
