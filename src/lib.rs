// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Mars Miners: rules engine, command-log protocol and AI for a 2-4 seat
//! grid territory game.
//!
//! Seats build stations and mines outward from their spawn corners. A
//! straight run of stations long enough charges a laser that destroys enemy
//! buildings. Mines score. Every state change is a text command, so a game
//! is exactly its command log: saves store it, peers exchange it and replay
//! rebuilds from it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Session (writers, sync, poller)    │
//! ├──────────────────┬──────────────────┤
//! │  Transport       │  AI planner      │
//! ├──────────────────┴──────────────────┤
//! │  Protocol (commands, replay, saves) │
//! ├─────────────────────────────────────┤
//! │  Game (grid, seats, rules, state)   │
//! └─────────────────────────────────────┘
//! ```

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod replay;
pub mod session;
pub mod tournament;
pub mod transport;

pub use config::{GameConfig, SessionConfig};
pub use error::{CommandError, ConfigError, IllegalMove, MoveError, SessionError, TransportError};

// Re-export key game types at crate root for convenience
pub use game::{Cell, Coord, Game, Grid, Outcome, Phase, Role, SeatId};
pub use protocol::Command;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_game_log_replays() {
        let game = Game::new([Role::Human, Role::Ai, Role::Ai, Role::None], GameConfig::default()).unwrap();
        assert_eq!(
            game.log_lines(),
            vec!["WEAPON_REQ 4", "JOIN human", "JOIN ai", "JOIN ai"]
        );
        let replayed = protocol::replay(game.log_lines(), GameConfig::default()).unwrap();
        assert_eq!(replayed, game);
    }
}
