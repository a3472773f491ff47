//! Tournament command implementation.

#![allow(clippy::cast_precision_loss)]

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use mars_miners::GameConfig;
use mars_miners::game::{Role, SeatId};
use mars_miners::tournament::run_tournament_with;

use super::output::{JsonTournamentResult, format_tournament_csv, format_tournament_text};
use super::{CliError, TournamentFormat, clock_seed, seat_roles};

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the seats or output are invalid.
pub(crate) fn execute(
    seats: &[Role],
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    config: GameConfig,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    let roles = seat_roles(seats)?;
    let playing: Vec<SeatId> = SeatId::ALL
        .into_iter()
        .take(roles.iter().filter(|role| role.is_playing()).count())
        .collect();

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or_else(clock_seed);

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::Message(e.to_string()))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    let stats = run_tournament_with(games, base_seed, roles, config, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats, &playing));
            println!();
            println!("Duration: {:.2}s ({games_per_sec:.0} games/sec)", duration.as_secs_f64());
        }
        TournamentFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonTournamentResult::from_stats(&stats, &playing))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats, &playing));
        }
    }

    Ok(())
}
