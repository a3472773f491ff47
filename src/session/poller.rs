//! Background log polling.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::session::GameSession;

/// Calls [`GameSession::sync`] every `interval` on a named worker thread.
///
/// Dropping the poller stops the thread and waits for it, so no sync can
/// land on a session after its owner has let go of the poller.
#[derive(Debug)]
pub struct Poller {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start polling `session`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn spawn(session: Arc<Mutex<GameSession>>, interval: Duration) -> io::Result<Self> {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("battle-poller".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
                    match session.sync() {
                        Ok(true) => debug!("poll: game rebuilt"),
                        Ok(false) => {}
                        Err(err) => warn!("poll failed: {err}"),
                    }
                }
                debug!("poller stopped");
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop polling and wait for the worker to exit.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::config::GameConfig;
    use crate::game::Role;
    use crate::transport::{MemoryTransport, Transport};

    #[test]
    fn test_poller_picks_up_remote_moves() {
        let server = Arc::new(MemoryTransport::new());
        let battle = server.create_and_join("alice").unwrap();
        let session = GameSession::remote(Arc::clone(&server), "alice", &battle.battle_id, GameConfig::default()).unwrap();
        let session = Arc::new(Mutex::new(session));
        let poller = Poller::spawn(Arc::clone(&session), Duration::from_millis(5)).unwrap();

        server.send_command("alice", &battle.battle_id, "JOIN ai alice").unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.lock().unwrap().my_seat().is_none() {
            assert!(Instant::now() < deadline, "poller never synced");
            thread::sleep(Duration::from_millis(5));
        }
        poller.stop();

        let session = session.lock().unwrap();
        assert_eq!(session.game().seats().get(crate::game::SeatId::P1).role, Role::Ai);
    }

    #[test]
    fn test_drop_stops_promptly() {
        let session = GameSession::local([Role::Ai, Role::Ai, Role::None, Role::None], GameConfig::default()).unwrap();
        let poller = Poller::spawn(Arc::new(Mutex::new(session)), Duration::from_secs(60)).unwrap();
        let started = Instant::now();
        drop(poller);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
