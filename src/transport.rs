//! Battle-server transport.
//!
//! The server stores one command log per battle. Clients create or join a
//! battle, append their own commands, and poll the whole log back.
//! [`HttpTransport`] talks to a real server; [`MemoryTransport`] is an
//! in-process server with the same behaviour.

mod http;
mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use http::HttpTransport;
pub use memory::MemoryTransport;

use crate::error::TransportError;

/// A battle as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BattleSession {
    /// Battle id.
    #[serde(rename = "battleID")]
    pub battle_id: String,
    /// Session that created the battle.
    #[serde(rename = "sessionID", default)]
    pub session_id: String,
    /// Sessions that have joined, in join order.
    #[serde(default)]
    pub players: Vec<String>,
    /// Server-side status text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Request/response calls to a battle server.
///
/// Calls may fail transiently; implementations retry where that makes sense
/// and report what is left as a [`TransportError`].
pub trait Transport: Send + Sync {
    /// Open a new battle owned by `session`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the server cannot be reached or
    /// refuses.
    fn create_battle(&self, session: &str) -> Result<BattleSession, TransportError>;

    /// Add `session` to `battle`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the battle is unknown or full.
    fn join_battle(&self, session: &str, battle: &str) -> Result<BattleSession, TransportError>;

    /// Append `command` to the battle log.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the server refuses the command.
    fn send_command(&self, session: &str, battle: &str, command: &str) -> Result<(), TransportError>;

    /// The battle log in semicolon-joined form.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the battle is unknown.
    fn read_battle_log(&self, battle: &str) -> Result<String, TransportError>;

    /// Create a battle and join it as its first player.
    ///
    /// # Errors
    ///
    /// Returns the first [`TransportError`] from either call.
    fn create_and_join(&self, session: &str) -> Result<BattleSession, TransportError> {
        let created = self.create_battle(session)?;
        self.join_battle(session, &created.battle_id)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn create_battle(&self, session: &str) -> Result<BattleSession, TransportError> {
        (**self).create_battle(session)
    }

    fn join_battle(&self, session: &str, battle: &str) -> Result<BattleSession, TransportError> {
        (**self).join_battle(session, battle)
    }

    fn send_command(&self, session: &str, battle: &str, command: &str) -> Result<(), TransportError> {
        (**self).send_command(session, battle, command)
    }

    fn read_battle_log(&self, battle: &str) -> Result<String, TransportError> {
        (**self).read_battle_log(battle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_session_wire_names() {
        let json = r#"{"battleID": "b1", "sessionID": "s1", "players": ["s1", "s2"]}"#;
        let session: BattleSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.battle_id, "b1");
        assert_eq!(session.players.len(), 2);
        assert!(session.status.is_none());

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back["battleID"], "b1");
        assert!(back.get("status").is_none());
    }

    #[test]
    fn test_arc_transport_shares_state() {
        let server = Arc::new(MemoryTransport::new());
        let alice = Arc::clone(&server);
        let bob = Arc::clone(&server);

        let battle = alice.create_and_join("alice").unwrap();
        bob.join_battle("bob", &battle.battle_id).unwrap();
        bob.send_command("bob", &battle.battle_id, "JOIN human bob").unwrap();
        assert_eq!(
            alice.read_battle_log(&battle.battle_id).unwrap(),
            "START;JOIN human bob"
        );
    }
}
