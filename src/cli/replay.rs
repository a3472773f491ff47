//! Replay command implementation.

use std::io::{self, BufRead, Write};
use std::path::Path;

use mars_miners::GameConfig;
use mars_miners::protocol::load_save_file;
use mars_miners::replay::ReplayEngine;

use super::{CliError, ReplayFormat};

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the save cannot be loaded or the move is out of
/// range.
pub(crate) fn execute(
    save: &Path,
    config: GameConfig,
    format: ReplayFormat,
    at_move: Option<usize>,
) -> Result<(), CliError> {
    let loaded = load_save_file(save, config)?;
    let mut engine = ReplayEngine::new(loaded.game.log().to_vec(), *loaded.game.config())?;
    if let Some(target) = at_move {
        engine.jump_to(target)?;
    }

    match format {
        ReplayFormat::Interactive => run_interactive(engine),
        ReplayFormat::Text => {
            print!("{}", engine.render_text());
            Ok(())
        }
        ReplayFormat::Ascii => {
            print!("{}", engine.render_ascii());
            Ok(())
        }
        ReplayFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&engine.game().snapshot())?);
            Ok(())
        }
    }
}

/// Line-driven viewer: `<` back, `>` forward, `g N` goto, `q` quit.
fn run_interactive(mut engine: ReplayEngine) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", engine.render_ascii());
        if let Some(command) = engine.last_command() {
            println!("last: {command}");
        }
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(());
        };
        let line = line.trim();
        let result = match line {
            "q" | "quit" => return Ok(()),
            "<" | "b" => engine.step_backward(),
            ">" | "f" | "" => engine.step_forward(),
            _ => match line.strip_prefix('g').map(|n| n.trim().parse::<usize>()) {
                Some(Ok(target)) => engine.jump_to(target),
                _ => {
                    println!("unknown input `{line}`");
                    continue;
                }
            },
        };
        if let Err(err) = result {
            println!("{err}");
        }
    }
}
