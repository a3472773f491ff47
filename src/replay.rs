//! Game replay and viewing.
//!
//! A game is fully determined by its command log, so no state deltas are
//! stored. To view move N, re-run the log from the start up to move N.
//!
//! # Time Travel
//!
//! - **Forward**: apply the commands of the next move
//! - **Backward**: re-run from move 0 to (`position` - 1)
//! - **Jump to move N**: re-run from move 0 to N
//!
//! Move 0 is the board after every command that precedes the first play.

mod render;
mod text;

pub use render::render_ascii;
pub use text::render_text;

use log::warn;
use thiserror::Error;

use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::game::Game;
use crate::protocol::{self, Command};

/// Error type for replay navigation.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Requested move is past the end of the log.
    #[error("move {requested} out of bounds (last move: {total})")]
    MoveOutOfBounds {
        /// Requested move.
        requested: usize,
        /// Number of moves in the log.
        total: usize,
    },
    /// Already at the last move.
    #[error("already at the last move")]
    AtEnd,
    /// Already at move 0.
    #[error("already at the first move")]
    AtStart,
    /// The game configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Steps through a recorded game.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    commands: Vec<Command>,
    /// `bounds[n]` is how many commands make up the game at move `n`.
    bounds: Vec<usize>,
    config: GameConfig,
    game: Game,
    position: usize,
}

impl ReplayEngine {
    /// Engine over `commands`, positioned at move 0.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(commands: Vec<Command>, config: GameConfig) -> Result<Self, ReplayError> {
        let mut bounds: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, command)| command.is_play())
            .map(|(idx, _)| idx)
            .collect();
        bounds.push(commands.len());

        let game = rebuild(&commands[..bounds[0]], config)?;
        Ok(Self {
            commands,
            bounds,
            config,
            game,
            position: 0,
        })
    }

    /// Engine over text log lines. Lines that do not parse are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn from_lines<I, S>(lines: I, config: GameConfig) -> Result<Self, ReplayError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut commands = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let text = line.as_ref().trim();
            if text.is_empty() {
                continue;
            }
            match text.parse::<Command>() {
                Ok(command) => commands.push(command),
                Err(err) => warn!("line {}: dropping `{text}`: {err}", idx + 1),
            }
        }
        Self::new(commands, config)
    }

    /// Current move number.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of play commands in the log.
    #[must_use]
    pub fn total_moves(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Game at the current move.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// The command that produced the current move, if past move 0.
    #[must_use]
    pub fn last_command(&self) -> Option<&Command> {
        let idx = self.position.checked_sub(1)?;
        self.commands.get(self.bounds[idx])
    }

    /// Apply the next move.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::AtEnd`] at the last move.
    pub fn step_forward(&mut self) -> Result<(), ReplayError> {
        if self.position >= self.total_moves() {
            return Err(ReplayError::AtEnd);
        }
        let from = self.bounds[self.position];
        let to = self.bounds[self.position + 1];
        for command in &self.commands[from..to] {
            // Rejected lines are part of the record; they simply change nothing.
            let _ = self.game.apply(command.clone());
        }
        self.position += 1;
        Ok(())
    }

    /// Go back one move by re-running from the start.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::AtStart`] at move 0.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        if self.position == 0 {
            return Err(ReplayError::AtStart);
        }
        self.jump_to(self.position - 1)
    }

    /// Jump to move `target` by re-running from the start.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::MoveOutOfBounds`] past the last move.
    pub fn jump_to(&mut self, target: usize) -> Result<(), ReplayError> {
        let total = self.total_moves();
        if target > total {
            return Err(ReplayError::MoveOutOfBounds {
                requested: target,
                total,
            });
        }
        self.game = rebuild(&self.commands[..self.bounds[target]], self.config)?;
        self.position = target;
        Ok(())
    }

    /// Render the current move for a terminal.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        render_ascii(&self.game, self.position, self.total_moves())
    }

    /// Render the current move as plain text.
    #[must_use]
    pub fn render_text(&self) -> String {
        render_text(&self.game, self.position, self.total_moves())
    }
}

fn rebuild(commands: &[Command], config: GameConfig) -> Result<Game, ConfigError> {
    protocol::replay(commands.iter().map(ToString::to_string), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, Coord, SeatId};

    const LOG: [&str; 7] = ["WEAPON_REQ 4", "JOIN human", "JOIN ai", "S 2 1", "S 7 8", "M 3 1", "S 8 7"];

    fn engine() -> ReplayEngine {
        ReplayEngine::from_lines(LOG, GameConfig::default()).unwrap()
    }

    #[test]
    fn test_starts_at_move_zero() {
        let engine = engine();
        assert_eq!(engine.position(), 0);
        assert_eq!(engine.total_moves(), 4);
        assert_eq!(engine.game().moves_played(), 0);
        assert_eq!(engine.game().seats().joined().count(), 2);
        assert!(engine.last_command().is_none());
    }

    #[test]
    fn test_step_forward_matches_full_replay() {
        let mut engine = engine();
        while engine.step_forward().is_ok() {}
        assert_eq!(engine.position(), 4);
        assert_eq!(engine.game(), &protocol::replay(LOG, GameConfig::default()).unwrap());
        assert_eq!(engine.last_command(), Some(&"S 8 7".parse().unwrap()));
        assert!(matches!(engine.step_forward(), Err(ReplayError::AtEnd)));
    }

    #[test]
    fn test_backward_and_jump() {
        let mut engine = engine();
        engine.jump_to(3).unwrap();
        assert_eq!(engine.game().grid().get(Coord::new(1, 3)).unwrap(), Cell::Mine(SeatId::P1));

        engine.step_backward().unwrap();
        assert_eq!(engine.position(), 2);
        assert_eq!(engine.game().grid().get(Coord::new(1, 3)).unwrap(), Cell::Empty);
        assert_eq!(engine.game().turn(), SeatId::P1);

        engine.jump_to(0).unwrap();
        assert!(matches!(engine.step_backward(), Err(ReplayError::AtStart)));
        assert!(matches!(
            engine.jump_to(9),
            Err(ReplayError::MoveOutOfBounds { requested: 9, total: 4 })
        ));
    }

    #[test]
    fn test_garbage_lines_are_dropped() {
        let engine = ReplayEngine::from_lines(["JOIN ai", "nonsense", "", "JOIN ai", "S 2 1"], GameConfig::default()).unwrap();
        assert_eq!(engine.total_moves(), 1);
    }

    #[test]
    fn test_render_methods() {
        let mut engine = engine();
        engine.step_forward().unwrap();
        assert!(engine.render_ascii().contains("Move 1/4"));
        assert!(engine.render_text().contains("=== MOVE 1 OF 4 ==="));
    }
}
