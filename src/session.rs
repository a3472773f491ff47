//! A game bound to a command writer.
//!
//! [`GameSession`] is what a front end drives: it gates input by turn,
//! routes commands through the chosen [`BattlelogWriter`], runs AI seats and
//! rebuilds the game from the authoritative log when one is available.
//! [`Poller`] repeats that rebuild on a background thread.

mod poller;
mod writer;

use std::fmt::Write as _;

use log::{debug, info};
use rand::Rng;

pub use poller::Poller;
pub use writer::{BattlelogWriter, LocalWriter, LogSource, RemoteWriter, SocketWriter};

use crate::ai;
use crate::config::GameConfig;
use crate::error::{ConfigError, SessionError};
use crate::game::{Game, Role, SEAT_COUNT, SeatId};
use crate::protocol::{Command, resync};
use crate::transport::Transport;

/// A random id in UUID v4 shape, for clients without a stored session id.
pub fn generate_session_id<R: Rng>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let mut hex = String::with_capacity(32);
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// One player's view of a game.
#[derive(Debug)]
pub struct GameSession {
    game: Game,
    writer: Box<dyn BattlelogWriter>,
    identity: Option<String>,
    last_log: Option<String>,
}

impl GameSession {
    /// Session over an existing game.
    ///
    /// With an `identity`, only moves on the seat bound to it are accepted.
    #[must_use]
    pub fn new(game: Game, writer: Box<dyn BattlelogWriter>, identity: Option<String>) -> Self {
        Self {
            game,
            writer,
            identity,
            last_log: None,
        }
    }

    /// Hot-seat game with the given roles.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` is invalid.
    pub fn local(roles: [Role; SEAT_COUNT], config: GameConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Game::new(roles, config)?, Box::new(LocalWriter), None))
    }

    /// Multiplayer session on `battle_id`, starting from an empty game that
    /// the first [`GameSession::sync`] fills in.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` is invalid.
    pub fn remote<T>(
        transport: T,
        session_id: &str,
        battle_id: &str,
        config: GameConfig,
    ) -> Result<Self, ConfigError>
    where
        T: Transport + std::fmt::Debug + 'static,
    {
        let writer = RemoteWriter::new(transport, session_id, battle_id);
        Ok(Self::new(
            Game::empty(config)?,
            Box::new(writer),
            Some(session_id.to_string()),
        ))
    }

    /// The current game.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Identity this session plays as, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Seat bound to this session's identity.
    #[must_use]
    pub fn my_seat(&self) -> Option<SeatId> {
        self.identity
            .as_deref()
            .and_then(|id| self.game.seat_of_identity(id))
    }

    /// Whether input from this session is accepted now.
    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        match &self.identity {
            Some(id) => self.game.is_turn_of(id),
            None => !self.game.is_over(),
        }
    }

    /// Play a build or attack command for this session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotYourTurn`] if input is gated, otherwise
    /// whatever the writer reports.
    pub fn play(&mut self, command: Command) -> Result<(), SessionError> {
        if command.is_play() && !self.is_my_turn() {
            return Err(SessionError::NotYourTurn);
        }
        let result = match command {
            Command::Station(at) => self.writer.build_station(&mut self.game, at),
            Command::Mine(at) => self.writer.build_mine(&mut self.game, at),
            Command::Laser { target, sacrifice } => self.writer.attack(&mut self.game, target, sacrifice),
            Command::Join { role, identity } => self.writer.join(&mut self.game, role, identity),
            Command::WeaponReq(n) => self.writer.configure(&mut self.game, n),
        };
        if matches!(result, Err(SessionError::Transport(_) | SessionError::Io(_))) {
            // The local copy may now be ahead of the server.
            self.last_log = None;
        }
        result
    }

    /// Join with `role` under this session's identity.
    ///
    /// # Errors
    ///
    /// Whatever the writer reports.
    pub fn join(&mut self, role: Role) -> Result<(), SessionError> {
        let identity = self.identity.clone();
        self.play(Command::Join { role, identity })
    }

    /// Set the weapon requirement.
    ///
    /// # Errors
    ///
    /// Whatever the writer reports.
    pub fn configure(&mut self, weapon_req: usize) -> Result<(), SessionError> {
        self.play(Command::WeaponReq(weapon_req))
    }

    /// Rebuild from the writer's log if it changed.
    ///
    /// Returns whether the game was rebuilt. A log identical to the last one
    /// applied is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the log could not be fetched.
    pub fn sync(&mut self) -> Result<bool, SessionError> {
        let Some(source) = self.writer.as_replayable() else {
            return Ok(false);
        };
        let Some(log) = source.fetch_log()? else {
            return Ok(false);
        };
        if self.last_log.as_deref() == Some(log.as_str()) {
            return Ok(false);
        }

        let (game, report) = resync(&log, *self.game.config())?;
        debug!(
            "resynced {} entries ({} applied), turn {}",
            report.lines.len(),
            report.applied(),
            game.turn()
        );
        if game.is_over() && !self.game.is_over() {
            info!("game over: {:?}", game.outcome());
        }
        self.game = game;
        self.last_log = Some(log);
        Ok(true)
    }

    /// Whether the seat to move is an AI this session drives.
    #[must_use]
    pub fn is_ai_turn(&self) -> bool {
        let seat = self.game.seats().get(self.game.turn());
        seat.role == Role::Ai && seat.is_active() && !self.game.is_over() && self.is_my_turn()
    }

    /// Plan and play one AI move.
    ///
    /// Returns the command played, or `None` if it is not an AI turn or the
    /// AI has no move.
    ///
    /// # Errors
    ///
    /// Whatever the writer reports.
    pub fn ai_turn<R: Rng>(&mut self, rng: &mut R) -> Result<Option<Command>, SessionError> {
        if !self.is_ai_turn() {
            return Ok(None);
        }
        let Some(command) = ai::plan_move(&self.game, rng) else {
            debug!("{} has no move", self.game.turn());
            return Ok(None);
        };
        self.play(command.clone())?;
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::game::Coord;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_session_id_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let id = generate_session_id(&mut rng);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(parts[2].starts_with('4'));
        assert!(matches!(parts[3].as_bytes()[0], b'8' | b'9' | b'a' | b'b'));
        assert_ne!(id, generate_session_id(&mut rng));
    }

    #[test]
    fn test_local_session_plays_ai() {
        let mut session =
            GameSession::local([Role::Human, Role::Ai, Role::None, Role::None], GameConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(session.ai_turn(&mut rng).unwrap(), None);

        session.play(Command::Station(Coord::new(2, 1))).unwrap();
        assert!(session.is_ai_turn());
        assert!(session.ai_turn(&mut rng).unwrap().is_some());
        assert_eq!(session.game().turn(), SeatId::P1);
        assert!(!session.sync().unwrap());
    }

    #[test]
    fn test_remote_sessions_converge() {
        let server = Arc::new(MemoryTransport::new());
        let battle = server.create_and_join("alice").unwrap();
        server.join_battle("bob", &battle.battle_id).unwrap();

        let config = GameConfig::default();
        let mut alice = GameSession::remote(Arc::clone(&server), "alice", &battle.battle_id, config).unwrap();
        let mut bob = GameSession::remote(Arc::clone(&server), "bob", &battle.battle_id, config).unwrap();

        alice.join(Role::Human).unwrap();
        bob.sync().unwrap();
        bob.join(Role::Human).unwrap();
        alice.sync().unwrap();
        assert_eq!(alice.my_seat(), Some(SeatId::P1));
        assert_eq!(bob.my_seat(), Some(SeatId::P2));

        assert!(matches!(
            bob.play(Command::Station(Coord::new(7, 8))),
            Err(SessionError::NotYourTurn)
        ));
        alice.play(Command::Station(Coord::new(2, 1))).unwrap();
        assert!(bob.sync().unwrap());
        assert!(!bob.sync().unwrap());
        bob.play(Command::Station(Coord::new(7, 8))).unwrap();
        alice.sync().unwrap();

        assert_eq!(alice.game().grid(), bob.game().grid());
        assert_eq!(alice.game().turn(), SeatId::P1);
        assert_eq!(alice.game().log_lines(), bob.game().log_lines());
    }
}
