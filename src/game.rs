//! Game layer for Mars Miners.
//!
//! - Grid of cells (empty, dead, rubble, stations and mines)
//! - Seat registry with fixed spawn corners
//! - Rules: build adjacency, line power, weapon cells, scoring
//! - Game state with the single command-apply path

mod grid;
mod invariants;
mod rules;
mod seat;
mod state;

pub use grid::{Cell, Coord, DEAD_GLYPH, EMPTY_GLYPH, Grid, RUBBLE_GLYPH};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use rules::{
    AttackRules, SacrificePolicy, TargetPolicy, build_cells, can_build, can_player_move, freedom,
    line_power, score, seat_weapon_cells, weapon_cells,
};
pub use seat::{Role, SEAT_COUNT, Seat, SeatId, Seats};
pub use state::{Game, Outcome, Phase, Snapshot};
