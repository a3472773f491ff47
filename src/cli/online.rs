//! Online command: play one seat of a battle on a battle server.

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use log::{info, warn};
use mars_miners::config::SessionConfig;
use mars_miners::protocol::Command;
use mars_miners::replay::render_text;
use mars_miners::session::{GameSession, Poller, generate_session_id};
use mars_miners::transport::{HttpTransport, Transport};
use mars_miners::{GameConfig, Role, SessionError};

use super::CliError;
use super::output::format_result;

/// Execute the online command.
///
/// # Errors
///
/// Returns an error if the session config is invalid or the server cannot
/// be reached.
pub(crate) fn execute(
    battle: Option<String>,
    role: Role,
    session: Option<String>,
    server: Option<String>,
    session_config: Option<&Path>,
    config: GameConfig,
) -> Result<(), CliError> {
    let mut session_config = match session_config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(server) = server {
        session_config.server_url = server;
    }
    let session_id = session.unwrap_or_else(|| generate_session_id(&mut rand::rng()));

    let transport = HttpTransport::new(&session_config);
    let joined = match battle {
        Some(battle) => transport.join_battle(&session_id, &battle)?,
        None => transport.create_and_join(&session_id)?,
    };
    println!("Session: {session_id}");
    println!("Battle:  {}", joined.battle_id);

    let session = Arc::new(Mutex::new(GameSession::remote(
        transport,
        &session_id,
        &joined.battle_id,
        config,
    )?));
    {
        let mut guard = lock(&session)?;
        guard.sync()?;
        guard.join(role)?;
    }
    let poller = Poller::spawn(Arc::clone(&session), session_config.poll_interval)?;

    let result = if role == Role::Ai {
        drive_ai(&session, &session_config)
    } else {
        drive_human(&session, &session_config)
    };
    poller.stop();

    let guard = lock(&session)?;
    print!("{}", format_result(guard.game()));
    result
}

fn lock(session: &Mutex<GameSession>) -> Result<MutexGuard<'_, GameSession>, CliError> {
    session
        .lock()
        .map_err(|_| CliError::Message("session lock poisoned".to_string()))
}

fn drive_ai(session: &Mutex<GameSession>, config: &SessionConfig) -> Result<(), CliError> {
    let mut rng = rand::rng();
    loop {
        thread::sleep(config.ai_delay);
        let mut guard = lock(session)?;
        if guard.game().is_over() {
            return Ok(());
        }
        match guard.ai_turn(&mut rng) {
            Ok(Some(command)) => info!("played {command}"),
            Ok(None) => {}
            Err(SessionError::Transport(err)) => warn!("move not sent: {err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

fn drive_human(session: &Mutex<GameSession>, config: &SessionConfig) -> Result<(), CliError> {
    // stdin blocks, so lines arrive through a channel while the board keeps
    // refreshing from the poller.
    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines().map_while(Result::ok) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let mut shown = None;
    loop {
        {
            let guard = lock(session)?;
            let game = guard.game();
            let version = (game.log().len(), game.is_over());
            if shown != Some(version) {
                shown = Some(version);
                let position = game.moves_played();
                print!("{}", render_text(game, position, position));
                if guard.is_my_turn() {
                    println!("your move:");
                }
            }
            if game.is_over() {
                return Ok(());
            }
        }

        let line = match rx.recv_timeout(config.poll_interval) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "q" {
            return Ok(());
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match lock(session)?.play(command) {
            Ok(()) => {}
            Err(SessionError::Move(err)) => println!("refused: {err}"),
            Err(SessionError::NotYourTurn) => println!("not your turn"),
            Err(SessionError::Transport(err)) => println!("not sent: {err}"),
            Err(err) => return Err(err.into()),
        }
    }
}
