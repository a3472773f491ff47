//! In-process battle server.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::TransportError;
use crate::game::SEAT_COUNT;
use crate::protocol::join_battle_log;
use crate::transport::{BattleSession, Transport};

#[derive(Debug, Default)]
struct Battle {
    owner: String,
    players: Vec<String>,
    log: Vec<String>,
}

impl Battle {
    fn session(&self, id: &str) -> BattleSession {
        BattleSession {
            battle_id: id.to_string(),
            session_id: self.owner.clone(),
            players: self.players.clone(),
            status: None,
        }
    }
}

#[derive(Debug, Default)]
struct Battles {
    next_id: u64,
    by_id: BTreeMap<String, Battle>,
}

/// Battle server held in memory.
///
/// Behaves like the HTTP server: logs read back as `START;cmd;cmd`, a battle
/// takes at most four sessions, and only joined sessions may write. Share it
/// between clients through an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    battles: Mutex<Battles>,
}

impl MemoryTransport {
    /// An empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Battles> {
        self.battles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of battles created so far.
    #[must_use]
    pub fn battle_count(&self) -> usize {
        self.lock().by_id.len()
    }
}

impl Transport for MemoryTransport {
    fn create_battle(&self, session: &str) -> Result<BattleSession, TransportError> {
        let mut battles = self.lock();
        battles.next_id += 1;
        let id = format!("battle-{}", battles.next_id);
        let battle = Battle {
            owner: session.to_string(),
            ..Battle::default()
        };
        let reply = battle.session(&id);
        battles.by_id.insert(id.clone(), battle);
        debug!("{session} created {id}");
        Ok(reply)
    }

    fn join_battle(&self, session: &str, battle: &str) -> Result<BattleSession, TransportError> {
        let mut battles = self.lock();
        let entry = battles
            .by_id
            .get_mut(battle)
            .ok_or_else(|| TransportError::UnknownBattle(battle.to_string()))?;
        if !entry.players.iter().any(|p| p == session) {
            if entry.players.len() >= SEAT_COUNT {
                return Err(TransportError::Server {
                    status: 400,
                    message: "battle is full".to_string(),
                });
            }
            entry.players.push(session.to_string());
        }
        Ok(entry.session(battle))
    }

    fn send_command(&self, session: &str, battle: &str, command: &str) -> Result<(), TransportError> {
        let mut battles = self.lock();
        let entry = battles
            .by_id
            .get_mut(battle)
            .ok_or_else(|| TransportError::UnknownBattle(battle.to_string()))?;
        if !entry.players.iter().any(|p| p == session) {
            return Err(TransportError::NotJoined {
                session: session.to_string(),
                battle: battle.to_string(),
            });
        }
        entry.log.push(command.to_string());
        Ok(())
    }

    fn read_battle_log(&self, battle: &str) -> Result<String, TransportError> {
        let battles = self.lock();
        let entry = battles
            .by_id
            .get(battle)
            .ok_or_else(|| TransportError::UnknownBattle(battle.to_string()))?;
        Ok(join_battle_log(&entry.log))
    }
}
