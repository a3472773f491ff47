//! Save-file validation command implementation.

use std::path::Path;

use mars_miners::GameConfig;
use mars_miners::game::check_invariants;
use mars_miners::protocol::{LineStatus, load_save_file};

use super::CliError;
use super::output::format_result;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded, has bad lines, or
/// rebuilds into a game that breaks an invariant.
pub(crate) fn execute(save: &Path, config: GameConfig) -> Result<(), CliError> {
    println!("Validating: {}", save.display());
    println!();

    let loaded = load_save_file(save, config)?;
    println!("Format: {:?}", loaded.format);

    let mut problems = 0usize;
    for line in &loaded.report.lines {
        match &line.status {
            LineStatus::Malformed(err) => {
                println!("  line {:>4}: unparsable `{}`: {err}", line.line_no, line.text);
                problems += 1;
            }
            LineStatus::Rejected(err) => {
                println!("  line {:>4}: refused `{}`: {err}", line.line_no, line.text);
                problems += 1;
            }
            LineStatus::Applied | LineStatus::Skipped => {}
        }
    }
    print_check("All lines apply", problems == 0);

    let violations = check_invariants(&loaded.game);
    for violation in &violations {
        println!("  {violation}");
    }
    print_check("Invariants hold", violations.is_empty());

    println!();
    println!("Summary:");
    println!("  Commands applied: {}", loaded.report.applied());
    println!("  Moves played:     {}", loaded.game.moves_played());
    print!("  {}", format_result(&loaded.game));

    problems += violations.len();
    if problems > 0 {
        return Err(CliError::Message(format!("{problems} problem(s) found")));
    }
    println!();
    println!("Validation successful!");
    Ok(())
}

fn print_check(label: &str, ok: bool) {
    println!("{label:.<30} {}", if ok { "OK" } else { "FAILED" });
}
