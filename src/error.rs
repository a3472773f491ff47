//! Error types for the engine, the command protocol and the multiplayer layer.
//!
//! Nothing here is fatal to a game: rejected commands leave state untouched,
//! and malformed log lines are skipped by replay.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::game::Coord;

/// Why a well-formed command was refused by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum IllegalMove {
    /// The game has ended.
    #[error("the game is over")]
    GameOver,
    /// Nobody has joined, so there is no seat to act.
    #[error("no seat has joined the game")]
    NoPlayers,
    /// The seat to act has already lost.
    #[error("the acting seat has lost")]
    SeatLost,
    /// The target cell is not empty.
    #[error("cell is not empty")]
    CellOccupied,
    /// The target cell does not touch one of the seat's stations.
    #[error("cell does not touch an own station")]
    NotAdjacent,
    /// Line power is below the weapon requirement.
    #[error("weapon is not charged")]
    NoWeaponCharge,
    /// The attacked cell is not a legal target.
    #[error("not a valid attack target")]
    InvalidTarget,
    /// The rules require a sacrifice and none was named.
    #[error("attack requires a sacrifice")]
    MissingSacrifice,
    /// The named sacrifice is not one of the attacker's weapon cells.
    #[error("sacrifice is not an own weapon cell")]
    InvalidSacrifice,
    /// The rules forbid sacrifices and one was named.
    #[error("sacrifices are disabled")]
    SacrificeNotAllowed,
    /// `JOIN` found no free seat and no unbound seat of the same role.
    #[error("no seat available to join")]
    NoSeatAvailable,
    /// Configuration arrived after play began.
    #[error("game already started")]
    AlreadyStarted,
    /// `WEAPON_REQ` asked for a zero-length line.
    #[error("weapon requirement must be at least 1")]
    ZeroWeaponReq,
}

/// A command that could not be applied to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MoveError {
    /// Coordinate outside `[0,height)×[0,width)`.
    #[error("coordinate {coord} is off the board")]
    OutOfBounds {
        /// The offending coordinate.
        coord: Coord,
    },
    /// Rejected by the rules.
    #[error("illegal move: {0}")]
    Illegal(#[from] IllegalMove),
}

/// A log line that does not follow the command grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// Leading token is not a known verb.
    #[error("unknown command `{0}`")]
    UnknownVerb(String),
    /// Wrong number of arguments for the verb.
    #[error("`{verb}` takes {expected} arguments, got {found}")]
    Arity {
        /// Command verb.
        verb: &'static str,
        /// Accepted argument counts, human readable.
        expected: &'static str,
        /// Arguments present.
        found: usize,
    },
    /// Argument is not a non-negative integer.
    #[error("`{0}` is not a valid number")]
    BadNumber(String),
    /// Role is not `human`, `ai` or `none`.
    #[error("unknown role `{0}`")]
    UnknownRole(String),
    /// `JOIN none`: a seat cannot join as nobody.
    #[error("cannot join with role `none`")]
    JoinAsNone,
    /// `WEAPON_REQ 0`.
    #[error("weapon requirement must be at least 1")]
    ZeroWeaponReq,
}

/// Game configuration that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Grid dimensions outside the supported range.
    #[error("grid {width}x{height} is outside {min}..={max}")]
    GridSize {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
        /// Smallest allowed side.
        min: u16,
        /// Largest allowed side.
        max: u16,
    },
    /// Weapon requirement of zero.
    #[error("weapon requirement must be at least 1")]
    ZeroWeaponReq,
    /// Config file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Config file is not valid JSON for the expected shape.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure talking to the battle server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failure that persisted through every retry.
    #[error("request failed after {attempts} attempts: {source}")]
    Network {
        /// Attempts made.
        attempts: u32,
        /// Last error seen.
        source: reqwest::Error,
    },
    /// Server answered with a non-success status or body.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the status text.
        message: String,
    },
    /// Response body did not have the expected shape.
    #[error("cannot decode response: {0}")]
    Decode(String),
    /// No battle with this id.
    #[error("unknown battle `{0}`")]
    UnknownBattle(String),
    /// Session has not joined this battle.
    #[error("session `{session}` is not part of battle `{battle}`")]
    NotJoined {
        /// Session id.
        session: String,
        /// Battle id.
        battle: String,
    },
}

/// A save file that could not be loaded.
#[derive(Debug, Error)]
pub enum SaveError {
    /// File could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// Neither a command log nor a JSON save.
    #[error("unrecognised save format: {0}")]
    Format(#[from] serde_json::Error),
    /// The save describes an unusable game.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error raised by the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The move was refused locally.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// The battle server could not be reached or refused the request.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Writing to the push socket failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    /// A fetched log could not be rebuilt into a game.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The push socket sent an `ERROR:` frame.
    #[error("server rejected request: {0}")]
    Rejected(String),
    /// It is not this client's turn.
    #[error("not your turn")]
    NotYourTurn,
    /// The session has no battle yet.
    #[error("no battle joined")]
    NoBattle,
}
