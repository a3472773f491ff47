#![no_main]

//! Structured game fuzzer.
//!
//! Builds a game from fuzzer-chosen seats and board, then applies a stream
//! of play commands. Every accepted command must keep the invariants, every
//! refused one must leave the game untouched, and the final log must replay
//! to the same board.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mars_miners::game::{Coord, Game, Role, check_invariants};
use mars_miners::protocol::replay;
use mars_miners::{Command, GameConfig};

/// A fuzzer-generated play.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzCommand {
    /// Build a station.
    Station { col: u8, row: u8 },
    /// Build a mine.
    Mine { col: u8, row: u8 },
    /// Fire, optionally naming a sacrifice.
    Laser {
        col: u8,
        row: u8,
        sacrifice: Option<(u8, u8)>,
    },
}

impl FuzzCommand {
    fn to_command(&self) -> Command {
        let at = |col: u8, row: u8| Coord::new(u16::from(row), u16::from(col));
        match *self {
            FuzzCommand::Station { col, row } => Command::Station(at(col, row)),
            FuzzCommand::Mine { col, row } => Command::Mine(at(col, row)),
            FuzzCommand::Laser { col, row, sacrifice } => Command::Laser {
                target: at(col, row),
                sacrifice: sacrifice.map(|(c, r)| at(c, r)),
            },
        }
    }
}

/// Structured input for game fuzzing.
#[derive(Arbitrary, Debug)]
struct GameInput {
    /// Seat roles: 0 human, 1 ai, anything else none.
    roles: [u8; 4],
    /// Board side, folded into the supported range.
    side: u8,
    /// Weapon requirement, folded into 1..=6.
    weapon_req: u8,
    /// Plays in order.
    commands: Vec<FuzzCommand>,
}

fuzz_target!(|input: GameInput| {
    let roles = input.roles.map(|r| match r {
        0 => Role::Human,
        1 => Role::Ai,
        _ => Role::None,
    });
    let side = 4 + u16::from(input.side % 13);
    let config = GameConfig {
        width: side,
        height: side,
        weapon_req: 1 + usize::from(input.weapon_req % 6),
        ..GameConfig::default()
    };
    let Ok(mut game) = Game::new(roles, config) else {
        return;
    };

    for fuzz in input.commands.iter().take(512) {
        let before = game.clone();
        if game.apply(fuzz.to_command()).is_err() {
            assert_eq!(game, before, "refused command changed the game");
            continue;
        }
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "invariants violated: {violations:?}");
    }

    let replayed = replay(game.log_lines(), config).expect("config is valid");
    assert_eq!(replayed.grid(), game.grid());
    assert_eq!(replayed.turn(), game.turn());
});
