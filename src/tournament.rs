//! Tournament runner for AI-vs-AI games.
//!
//! Provides a pure function interface: `(seed, roles, config) -> GameResult`.
//! Every playing seat is driven by the planner from one `StdRng` seeded with
//! the game seed, so a seed always produces the same game. Batches run in
//! parallel with rayon and aggregate into [`TournamentStats`].

#![allow(clippy::cast_precision_loss)]

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::ai;
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::game::{Game, Outcome, Role, SEAT_COUNT, SeatId};

/// Final result of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// The seed used for this game.
    pub seed: u64,
    /// Winner or draw; `None` if the game hit the move cap.
    pub outcome: Option<Outcome>,
    /// Final score per seat, in seat order.
    pub scores: [usize; SEAT_COUNT],
    /// Play commands applied.
    pub moves_played: usize,
    /// Seats in the order they were eliminated.
    pub elimination_order: Vec<SeatId>,
    /// Complete command log.
    pub log: Vec<String>,
}

impl GameResult {
    /// The winning seat, if there is exactly one.
    #[must_use]
    pub fn winner(&self) -> Option<SeatId> {
        match self.outcome {
            Some(Outcome::Winner { seat, .. }) => Some(seat),
            _ => None,
        }
    }
}

/// Upper bound on moves for a board, after which a game is abandoned.
///
/// Each build fills a cell, but attacks do not, so two per cell is generous.
#[must_use]
pub fn move_cap(config: &GameConfig) -> usize {
    2 * usize::from(config.width) * usize::from(config.height)
}

/// Play one game with every playing seat driven by the planner.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` is invalid.
pub fn run_game(seed: u64, roles: [Role; SEAT_COUNT], config: GameConfig) -> Result<GameResult, ConfigError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(roles, config)?;
    let mut elimination_order = Vec::new();
    let cap = move_cap(&config);

    while !game.is_over() && game.moves_played() < cap {
        let Some(command) = ai::plan_move(&game, &mut rng) else {
            debug!("seed {seed}: seat {} has no move", game.turn());
            break;
        };
        let before: Vec<bool> = game.seats().iter().map(|seat| seat.lost).collect();
        if let Err(err) = game.apply(command) {
            debug!("seed {seed}: planned move rejected: {err}");
            break;
        }
        for (seat, was_lost) in game.seats().iter().zip(before) {
            if seat.lost && !was_lost && seat.role.is_playing() {
                elimination_order.push(seat.id);
            }
        }
    }

    let mut scores = [0; SEAT_COUNT];
    for seat in SeatId::ALL {
        scores[seat.index()] = game.score(seat);
    }
    Ok(GameResult {
        seed,
        outcome: game.outcome(),
        scores,
        moves_played: game.moves_played(),
        elimination_order,
        log: game.log_lines(),
    })
}

/// Aggregated statistics over many games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TournamentStats {
    /// Total games played.
    pub games_played: u64,
    /// Win count per seat.
    pub wins: [u64; SEAT_COUNT],
    /// Games that ended in a draw.
    pub draws: u64,
    /// Games abandoned at the move cap.
    pub unfinished: u64,
    total_scores: [u64; SEAT_COUNT],
    score_sq_sums: [f64; SEAT_COUNT],
    total_moves: u64,
}

impl TournamentStats {
    /// Empty stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a game result to the stats.
    pub fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_moves += result.moves_played as u64;
        match &result.outcome {
            Some(Outcome::Winner { seat, .. }) => self.wins[seat.index()] += 1,
            Some(Outcome::Draw { .. }) => self.draws += 1,
            None => self.unfinished += 1,
        }
        for (idx, &score) in result.scores.iter().enumerate() {
            self.total_scores[idx] += score as u64;
            self.score_sq_sums[idx] += (score * score) as f64;
        }
    }

    /// Fold another partial aggregate into this one.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.draws += other.draws;
        self.unfinished += other.unfinished;
        self.total_moves += other.total_moves;
        for idx in 0..SEAT_COUNT {
            self.wins[idx] += other.wins[idx];
            self.total_scores[idx] += other.total_scores[idx];
            self.score_sq_sums[idx] += other.score_sq_sums[idx];
        }
    }

    /// Win rate for a seat (0.0-1.0).
    #[must_use]
    pub fn win_rate(&self, seat: SeatId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins[seat.index()] as f64 / self.games_played as f64
    }

    /// Average final score for a seat.
    #[must_use]
    pub fn avg_score(&self, seat: SeatId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_scores[seat.index()] as f64 / self.games_played as f64
    }

    /// Standard deviation of a seat's final score.
    #[must_use]
    pub fn score_std_dev(&self, seat: SeatId) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let n = self.games_played as f64;
        let mean = self.avg_score(seat);
        let variance = self.score_sq_sums[seat.index()] / n - mean * mean;
        variance.max(0.0).sqrt()
    }

    /// Average game length in moves.
    #[must_use]
    pub fn avg_moves(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_moves as f64 / self.games_played as f64
    }
}

/// Play `games` games with seeds `base_seed`, `base_seed + 1`, ... in
/// parallel.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` is invalid.
pub fn run_tournament(
    games: u64,
    base_seed: u64,
    roles: [Role; SEAT_COUNT],
    config: GameConfig,
) -> Result<TournamentStats, ConfigError> {
    run_tournament_with(games, base_seed, roles, config, |_| {})
}

/// [`run_tournament`], calling `on_game` from the worker thread after each
/// game.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` is invalid.
pub fn run_tournament_with<F>(
    games: u64,
    base_seed: u64,
    roles: [Role; SEAT_COUNT],
    config: GameConfig,
    on_game: F,
) -> Result<TournamentStats, ConfigError>
where
    F: Fn(&GameResult) + Sync,
{
    config.validate()?;

    // Each rayon job accumulates its own stats; partials are merged at the end.
    let stats = (0..games)
        .into_par_iter()
        .fold(TournamentStats::new, |mut local, i| {
            if let Ok(result) = run_game(base_seed.wrapping_add(i), roles, config) {
                local.add_result(&result);
                on_game(&result);
            }
            local
        })
        .reduce(TournamentStats::new, |mut a, b| {
            a.merge(&b);
            a
        });
    Ok(stats)
}
