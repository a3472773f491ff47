//! Benchmarks for the game hot paths.
//!
//! Log replay runs on every resync and replay step; AI planning and the full
//! game loop dominate tournaments.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use mars_miners::ai::plan_move;
use mars_miners::game::{Game, Role};
use mars_miners::protocol::{join_battle_log, replay, resync};
use mars_miners::tournament::run_game;
use mars_miners::GameConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;

const FOUR_AI: [Role; 4] = [Role::Ai; 4];

/// A finished four-seat game on the default board.
fn sample_log() -> Vec<String> {
    run_game(42, FOUR_AI, GameConfig::default()).unwrap().log
}

fn bench_replay(c: &mut Criterion) {
    let log = sample_log();
    let network = join_battle_log(&log);
    let config = GameConfig::default();

    c.bench_function("replay_full_game", |b| {
        b.iter(|| black_box(replay(black_box(&log), config).unwrap()));
    });
    c.bench_function("resync_full_game", |b| {
        b.iter(|| black_box(resync(black_box(&network), config).unwrap()));
    });
}

fn bench_plan_move(c: &mut Criterion) {
    // Midgame position: half the log applied.
    let log = sample_log();
    let game = replay(&log[..log.len() / 2], GameConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("plan_move_midgame", |b| {
        b.iter(|| black_box(plan_move(black_box(&game), &mut rng)));
    });
}

fn bench_single_game(c: &mut Criterion) {
    let config = GameConfig::default();

    c.bench_function("single_game_2p", |b| {
        b.iter(|| {
            let roles = [Role::Ai, Role::Ai, Role::None, Role::None];
            black_box(run_game(black_box(42), roles, config))
        });
    });
    c.bench_function("single_game_4p", |b| {
        b.iter(|| black_box(run_game(black_box(42), FOUR_AI, config)));
    });
}

fn bench_large_board(c: &mut Criterion) {
    let config = GameConfig {
        width: 32,
        height: 32,
        ..GameConfig::default()
    };

    c.bench_function("single_game_4p_32x32", |b| {
        b.iter(|| black_box(run_game(black_box(42), FOUR_AI, config)));
    });
    c.bench_function("new_game_32x32", |b| {
        b.iter(|| black_box(Game::new(FOUR_AI, black_box(config)).unwrap()));
    });
}

criterion_group!(benches, bench_replay, bench_plan_move, bench_single_game, bench_large_board);
criterion_main!(benches);
