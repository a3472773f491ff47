//! Mars Miners CLI - play, replay, validate and benchmark games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use mars_miners::Role;

/// Mars Miners - grid territory strategy game engine
#[derive(Parser, Debug)]
#[command(name = "mars-miners")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    /// Game config JSON file (board size, weapon requirement, attack rules)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Board overrides shared by commands that start a game.
#[derive(clap::Args, Debug, Clone, Copy)]
struct BoardArgs {
    /// Board width
    #[arg(long)]
    width: Option<u16>,

    /// Board height
    #[arg(long)]
    height: Option<u16>,

    /// Station line length needed to fire
    #[arg(long)]
    weapon_req: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a local game; human seats read commands from stdin
    Run {
        /// Role per seat, comma separated (human, ai, none)
        #[arg(long, value_delimiter = ',', num_args = 1..=4, default_value = "human,ai")]
        seats: Vec<Role>,

        /// Random seed for the AI (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        board: BoardArgs,

        /// Output format: text, ascii, or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the command log to this file when the game ends
        #[arg(long)]
        save: Option<PathBuf>,

        /// Only print the final board
        #[arg(short, long)]
        quiet: bool,
    },

    /// Step through a saved game
    Replay {
        /// Save file (command log or JSON snapshot)
        #[arg(required = true)]
        save: PathBuf,

        /// Output format: interactive, text, ascii, or json
        #[arg(short, long, default_value = "interactive")]
        format: cli::ReplayFormat,

        /// Start at this move
        #[arg(short = 'm', long = "move")]
        at_move: Option<usize>,
    },

    /// Run many seeded AI games in parallel and aggregate statistics
    Tournament {
        /// Role per seat, comma separated; every playing seat is AI-driven
        #[arg(long, value_delimiter = ',', num_args = 1..=4, default_value = "ai,ai")]
        seats: Vec<Role>,

        /// Number of games to run
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        #[command(flatten)]
        board: BoardArgs,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Check a save file: unparsable and refused lines, invariants
    Validate {
        /// Save file to validate
        #[arg(required = true)]
        save: PathBuf,
    },

    /// Play on a battle server
    Online {
        /// Battle to join (default: create a new one)
        #[arg(short, long)]
        battle: Option<String>,

        /// Role to join as
        #[arg(long, default_value = "human")]
        role: Role,

        /// Session id (default: random)
        #[arg(long)]
        session: Option<String>,

        /// Server base URL, overriding the session config
        #[arg(long)]
        server: Option<String>,

        /// Session config JSON file (server, poll interval, AI delay, retries)
        #[arg(long)]
        session_config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp(None)
        .init();

    let config = match cli::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Commands::Run {
            seats,
            seed,
            board,
            format,
            save,
            quiet,
        } => cli::apply_board(config, board.width, board.height, board.weapon_req)
            .and_then(|config| cli::run::execute(&seats, seed, config, format, save, quiet)),

        Commands::Replay { save, format, at_move } => cli::replay::execute(&save, config, format, at_move),

        Commands::Tournament {
            seats,
            games,
            seed,
            threads,
            board,
            format,
            progress,
        } => cli::apply_board(config, board.width, board.height, board.weapon_req).and_then(|config| {
            cli::tournament::execute(&seats, games, seed, threads, config, format, progress)
        }),

        Commands::Validate { save } => cli::validate::execute(&save, config),

        Commands::Online {
            battle,
            role,
            session,
            server,
            session_config,
        } => cli::online::execute(battle, role, session, server, session_config.as_deref(), config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
