//! CLI command implementations for Mars Miners.

pub(crate) mod online;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;

mod output;

use std::io;
use std::path::Path;

use clap::ValueEnum;
use mars_miners::error::SaveError;
use mars_miners::game::SEAT_COUNT;
use mars_miners::replay::ReplayError;
use mars_miners::{ConfigError, GameConfig, Role, SessionError, TransportError};
use thiserror::Error;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Plain text board and scores.
    Text,
    /// Colored board for a terminal.
    Ascii,
    /// Snapshot JSON.
    Json,
}

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Step through moves from stdin.
    Interactive,
    /// Plain text output.
    Text,
    /// Colored board for a terminal.
    Ascii,
    /// Snapshot JSON.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Bad board or config file.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Save file could not be loaded or written.
    #[error(transparent)]
    Save(#[from] SaveError),
    /// Multiplayer session failure.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Battle server failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Replay navigation failure.
    #[error(transparent)]
    Replay(#[from] ReplayError),
    /// Terminal I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// JSON output failure.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// Anything else worth reporting.
    #[error("{0}")]
    Message(String),
}

/// Load the game config file, or the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub(crate) fn load_config(path: Option<&Path>) -> Result<GameConfig, CliError> {
    let config = match path {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Apply command-line board overrides on top of `config`.
///
/// # Errors
///
/// Returns an error if the result is not a valid board.
pub(crate) fn apply_board(
    mut config: GameConfig,
    width: Option<u16>,
    height: Option<u16>,
    weapon_req: Option<usize>,
) -> Result<GameConfig, CliError> {
    if let Some(width) = width {
        config.width = width;
    }
    if let Some(height) = height {
        config.height = height;
    }
    if let Some(weapon_req) = weapon_req {
        config.weapon_req = weapon_req;
    }
    config.validate()?;
    Ok(config)
}

/// Pad a seat list to four roles.
///
/// # Errors
///
/// Returns an error if no seat plays.
pub(crate) fn seat_roles(seats: &[Role]) -> Result<[Role; SEAT_COUNT], CliError> {
    let mut roles = [Role::None; SEAT_COUNT];
    for (slot, role) in roles.iter_mut().zip(seats) {
        *slot = *role;
    }
    if !roles.iter().any(|role| role.is_playing()) {
        return Err(CliError::Message("at least one seat must play".to_string()));
    }
    Ok(roles)
}

/// Seed from the clock, for runs without `--seed`.
pub(crate) fn clock_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(42, |d| d.as_secs() ^ u64::from(d.subsec_nanos()))
}
