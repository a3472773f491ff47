//! Run command implementation.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use log::info;
use mars_miners::game::Role;
use mars_miners::protocol::{Command, save_file};
use mars_miners::replay::{render_ascii, render_text};
use mars_miners::session::GameSession;
use mars_miners::{Game, GameConfig, SessionError};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::output::format_result;
use super::{CliError, OutputFormat, clock_seed, seat_roles};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game cannot be set up, stdin fails, or the save
/// cannot be written.
pub(crate) fn execute(
    seats: &[Role],
    seed: Option<u64>,
    config: GameConfig,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let roles = seat_roles(seats)?;
    let seed = seed.unwrap_or_else(clock_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = GameSession::local(roles, config)?;
    info!("running game with seed {seed}");

    let stdin = io::stdin();
    let mut input = stdin.lock().lines();

    while !session.game().is_over() {
        if !quiet {
            print_board(session.game(), format)?;
        }
        if session.is_ai_turn() {
            match session.ai_turn(&mut rng)? {
                Some(command) if !quiet => println!("seat {} plays {command}", session.game().turn()),
                Some(_) => {}
                None => break,
            }
            continue;
        }

        print!("seat {}> ", session.game().turn());
        io::stdout().flush()?;
        let Some(line) = input.next().transpose()? else {
            // stdin closed: stop where we are
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "q" {
            break;
        }
        match line.parse::<Command>() {
            Ok(command) => match session.play(command) {
                Ok(()) => {}
                Err(SessionError::Move(err)) => println!("refused: {err}"),
                Err(err) => return Err(err.into()),
            },
            Err(err) => println!("{err}"),
        }
    }

    print_board(session.game(), format)?;
    print!("{}", format_result(session.game()));

    if let Some(path) = save {
        save_file(session.game(), &path)?;
        if !quiet {
            println!("Log saved to: {}", path.display());
        }
    }
    Ok(())
}

fn print_board(game: &Game, format: OutputFormat) -> Result<(), CliError> {
    let position = game.moves_played();
    match format {
        OutputFormat::Text => print!("{}", render_text(game, position, position)),
        OutputFormat::Ascii => print!("{}", render_ascii(game, position, position)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&game.snapshot())?),
    }
    Ok(())
}
