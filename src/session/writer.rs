//! Command emission strategies.

use std::fmt;
use std::io::Write;

use log::{debug, warn};

use crate::error::SessionError;
use crate::game::{Coord, Game, Role};
use crate::protocol::{Command, Frame, SocketVerb, encode_message, join_battle_log};
use crate::transport::Transport;

/// A writer that can hand back the authoritative log for a full rebuild.
pub trait LogSource {
    /// The latest semicolon-joined log, or `None` if nothing arrived since
    /// the last call.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the log cannot be fetched.
    fn fetch_log(&mut self) -> Result<Option<String>, SessionError>;
}

/// Where a session's commands go.
///
/// Every command is applied to the local game first; a writer that fails
/// after that leaves the optimistic move in place until the next sync.
pub trait BattlelogWriter: Send + fmt::Debug {
    /// Apply `command` locally and emit it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Move`] if the rules refuse the command, or a
    /// transport error if it could not be sent.
    fn write(&mut self, game: &mut Game, command: Command) -> Result<(), SessionError>;

    /// Build a station at `at`.
    ///
    /// # Errors
    ///
    /// See [`BattlelogWriter::write`].
    fn build_station(&mut self, game: &mut Game, at: Coord) -> Result<(), SessionError> {
        self.write(game, Command::Station(at))
    }

    /// Build a mine at `at`.
    ///
    /// # Errors
    ///
    /// See [`BattlelogWriter::write`].
    fn build_mine(&mut self, game: &mut Game, at: Coord) -> Result<(), SessionError> {
        self.write(game, Command::Mine(at))
    }

    /// Fire at `target`, optionally sacrificing a weapon cell.
    ///
    /// # Errors
    ///
    /// See [`BattlelogWriter::write`].
    fn attack(&mut self, game: &mut Game, target: Coord, sacrifice: Option<Coord>) -> Result<(), SessionError> {
        self.write(game, Command::Laser { target, sacrifice })
    }

    /// Take a seat.
    ///
    /// # Errors
    ///
    /// See [`BattlelogWriter::write`].
    fn join(&mut self, game: &mut Game, role: Role, identity: Option<String>) -> Result<(), SessionError> {
        self.write(game, Command::Join { role, identity })
    }

    /// Set the weapon requirement.
    ///
    /// # Errors
    ///
    /// See [`BattlelogWriter::write`].
    fn configure(&mut self, game: &mut Game, weapon_req: usize) -> Result<(), SessionError> {
        self.write(game, Command::WeaponReq(weapon_req))
    }

    /// The log source behind this writer, if it has one.
    fn as_replayable(&mut self) -> Option<&mut dyn LogSource> {
        None
    }
}

/// Hot-seat play: commands only touch the local game.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWriter;

impl BattlelogWriter for LocalWriter {
    fn write(&mut self, game: &mut Game, command: Command) -> Result<(), SessionError> {
        game.apply(command).map_err(SessionError::from)
    }
}

/// Request/response multiplayer over a [`Transport`].
#[derive(Debug)]
pub struct RemoteWriter<T> {
    transport: T,
    session_id: String,
    battle_id: String,
}

impl<T: Transport> RemoteWriter<T> {
    /// Writer for `session_id` in `battle_id`.
    #[must_use]
    pub fn new(transport: T, session_id: impl Into<String>, battle_id: impl Into<String>) -> Self {
        Self {
            transport,
            session_id: session_id.into(),
            battle_id: battle_id.into(),
        }
    }

    /// The battle this writer appends to.
    #[must_use]
    pub fn battle_id(&self) -> &str {
        &self.battle_id
    }
}

impl<T: Transport + fmt::Debug> BattlelogWriter for RemoteWriter<T> {
    fn write(&mut self, game: &mut Game, command: Command) -> Result<(), SessionError> {
        let text = command.to_string();
        game.apply(command)?;
        self.transport
            .send_command(&self.session_id, &self.battle_id, &text)?;
        Ok(())
    }

    fn as_replayable(&mut self) -> Option<&mut dyn LogSource> {
        Some(self)
    }
}

impl<T: Transport> LogSource for RemoteWriter<T> {
    fn fetch_log(&mut self) -> Result<Option<String>, SessionError> {
        Ok(Some(self.transport.read_battle_log(&self.battle_id)?))
    }
}

/// Push-socket multiplayer.
///
/// Outgoing lines go to `out`; the caller feeds incoming frames to
/// [`SocketWriter::receive`] from its reader loop.
#[derive(Debug)]
pub struct SocketWriter<W> {
    out: W,
    session_id: String,
    battle_id: String,
    pending: Option<String>,
}

impl<W: Write> SocketWriter<W> {
    /// Writer for `session_id` in `battle_id`.
    #[must_use]
    pub fn new(out: W, session_id: impl Into<String>, battle_id: impl Into<String>) -> Self {
        Self {
            out,
            session_id: session_id.into(),
            battle_id: battle_id.into(),
            pending: None,
        }
    }

    fn send(&mut self, verb: SocketVerb, args: &str) -> Result<(), SessionError> {
        let line = encode_message(&self.session_id, verb, &self.battle_id, args);
        debug!("socket > {line}");
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Ask the server for a `FULLLOG` frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the socket write fails.
    pub fn request_full_log(&mut self) -> Result<(), SessionError> {
        self.send(SocketVerb::ReadFull, "")
    }

    /// Handle one incoming frame. Log frames are kept for the next sync.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] for an `ERROR:` frame.
    pub fn receive(&mut self, text: &str) -> Result<(), SessionError> {
        match Frame::parse(text) {
            Ok(Frame::FullLog(commands) | Frame::Update(commands)) => {
                self.pending = Some(join_battle_log(&commands));
                Ok(())
            }
            Ok(Frame::Error(message)) => Err(SessionError::Rejected(message)),
            Ok(Frame::Other(_)) => Ok(()),
            Err(err) => {
                warn!("ignoring undecodable frame: {err}");
                Ok(())
            }
        }
    }

    /// The underlying sink.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write + Send + fmt::Debug> BattlelogWriter for SocketWriter<W> {
    fn write(&mut self, game: &mut Game, command: Command) -> Result<(), SessionError> {
        let text = command.to_string();
        game.apply(command)?;
        self.send(SocketVerb::Write, &text)
    }

    fn join(&mut self, game: &mut Game, role: Role, identity: Option<String>) -> Result<(), SessionError> {
        self.send(SocketVerb::Join, "")?;
        self.write(game, Command::Join { role, identity })
    }

    fn as_replayable(&mut self) -> Option<&mut dyn LogSource> {
        Some(self)
    }
}

impl<W> LogSource for SocketWriter<W> {
    fn fetch_log(&mut self) -> Result<Option<String>, SessionError> {
        Ok(self.pending.take())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::GameConfig;
    use crate::game::SeatId;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_local_writer_applies() {
        let mut game = Game::new([Role::Human, Role::Human, Role::None, Role::None], GameConfig::default()).unwrap();
        let mut writer = LocalWriter;
        writer.build_station(&mut game, Coord::new(2, 1)).unwrap();
        assert_eq!(game.turn(), SeatId::P2);
        assert!(writer.as_replayable().is_none());

        let err = writer.build_mine(&mut game, Coord::new(0, 0)).unwrap_err();
        assert!(matches!(err, SessionError::Move(_)));
    }

    #[test]
    fn test_remote_writer_sends_canonical_text() {
        let server = Arc::new(MemoryTransport::new());
        let battle = server.create_and_join("alice").unwrap();
        let mut writer = RemoteWriter::new(Arc::clone(&server), "alice", battle.battle_id.clone());
        let mut game = Game::empty(GameConfig::default()).unwrap();

        writer.configure(&mut game, 3).unwrap();
        writer.join(&mut game, Role::Human, Some("alice".into())).unwrap();
        assert_eq!(
            server.read_battle_log(&battle.battle_id).unwrap(),
            "START;WEAPON_REQ 3;JOIN human alice"
        );
        let log = writer.as_replayable().unwrap().fetch_log().unwrap();
        assert_eq!(log.as_deref(), Some("START;WEAPON_REQ 3;JOIN human alice"));
    }

    #[test]
    fn test_rejected_move_is_not_sent() {
        let server = Arc::new(MemoryTransport::new());
        let battle = server.create_and_join("alice").unwrap();
        let mut writer = RemoteWriter::new(Arc::clone(&server), "alice", battle.battle_id.clone());
        let mut game = Game::empty(GameConfig::default()).unwrap();

        assert!(writer.build_station(&mut game, Coord::new(5, 5)).is_err());
        assert_eq!(server.read_battle_log(&battle.battle_id).unwrap(), "START");
    }

    #[test]
    fn test_socket_writer_lines_and_frames() {
        let mut writer = SocketWriter::new(Vec::new(), "s1", "b1");
        let mut game = Game::empty(GameConfig::default()).unwrap();
        writer.join(&mut game, Role::Ai, None).unwrap();
        writer.request_full_log().unwrap();
        let sent = String::from_utf8(writer.get_ref().clone()).unwrap();
        assert_eq!(sent, "s1 JOIN b1\ns1 WRITE b1 JOIN ai\ns1 READFULL b1\n");

        assert_eq!(writer.fetch_log().unwrap(), None);
        writer.receive(r#"FULLLOG: ["JOIN ai", "JOIN human"]"#).unwrap();
        assert_eq!(writer.fetch_log().unwrap().as_deref(), Some("START;JOIN ai;JOIN human"));
        assert_eq!(writer.fetch_log().unwrap(), None);

        assert!(matches!(
            writer.receive("ERROR: battle not found"),
            Err(SessionError::Rejected(message)) if message == "battle not found"
        ));
        writer.receive("FULLLOG: not json").unwrap();
    }
}
