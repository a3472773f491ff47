//! Heuristic move planner.
//!
//! The planner reads the game and returns a command; it never mutates
//! state. The caller applies the result through [`Game::apply`] like any
//! human move.
//!
//! 1. Charged: fire at a random enemy station, sacrificing a random own
//!    weapon cell when the rules require one.
//! 2. Otherwise rank buildable cells by open neighbours (descending) then
//!    distance from the board centre (ascending), and pick uniformly among
//!    the best few.
//! 3. Pocket cells with no open neighbours get a station while uncharged and
//!    a mine after. Elsewhere a station, with a small chance of a mine when
//!    there is plenty of room.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::game::{self, Cell, Coord, Game, SacrificePolicy, SeatId};
use crate::protocol::Command;

/// How many of the best-ranked cells the planner chooses among.
pub const TOP_CANDIDATES: usize = 3;
/// Probability of banking a mine instead of expanding.
pub const MINE_CHANCE: f64 = 0.2;
/// Minimum candidate count before a mine is considered on open ground.
pub const MINE_MIN_CANDIDATES: usize = 6;

/// A buildable cell with its ranking keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The cell.
    pub coord: Coord,
    /// Orthogonal neighbours that are still empty.
    pub freedom: usize,
    /// Euclidean distance from the board centre.
    pub distance: f64,
}

/// Every cell where `seat` may build, best first.
#[must_use]
pub fn ranked_candidates(game: &Game, seat: SeatId) -> Vec<Candidate> {
    let grid = game.grid();
    let center_row = f64::from(grid.height() - 1) / 2.0;
    let center_col = f64::from(grid.width() - 1) / 2.0;

    let mut candidates: Vec<Candidate> = game::build_cells(grid, seat)
        .map(|coord| Candidate {
            coord,
            freedom: game::freedom(grid, coord),
            distance: (f64::from(coord.row) - center_row).hypot(f64::from(coord.col) - center_col),
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.freedom
            .cmp(&a.freedom)
            .then_with(|| a.distance.total_cmp(&b.distance))
    });
    candidates
}

/// Attack for `seat` if it is charged and an enemy station exists.
fn plan_attack<R: Rng>(game: &Game, seat: SeatId, rng: &mut R) -> Option<Command> {
    if !game.can_attack(seat) {
        return None;
    }
    let own_weapons: Vec<Coord> =
        game::seat_weapon_cells(game.grid(), seat, game.weapon_req()).into_iter().collect();
    let targets: Vec<Coord> = game
        .grid()
        .iter()
        .filter(|(_, cell)| matches!(cell, Cell::Station(owner) if *owner != seat))
        .map(|(coord, _)| coord)
        .collect();

    let target = *targets.choose(rng)?;
    let sacrifice = match game.rules().sacrifice {
        SacrificePolicy::Required => Some(*own_weapons.choose(rng)?),
        SacrificePolicy::Optional | SacrificePolicy::Disabled => None,
    };
    Some(Command::Laser { target, sacrifice })
}

/// Decide the move for the seat to act.
///
/// Returns `None` when the game is over, the seat cannot act, or it has
/// neither an attack nor a legal build.
pub fn plan_move<R: Rng>(game: &Game, rng: &mut R) -> Option<Command> {
    let seat = game.turn();
    if game.is_over() || !game.seats().get(seat).is_active() {
        return None;
    }
    if let Some(attack) = plan_attack(game, seat, rng) {
        return Some(attack);
    }

    let candidates = ranked_candidates(game, seat);
    let top = &candidates[..candidates.len().min(TOP_CANDIDATES)];
    let choice = *top.choose(rng)?;

    let mine = if choice.freedom == 0 {
        game.can_attack(seat)
    } else {
        candidates.len() >= MINE_MIN_CANDIDATES && rng.random_bool(MINE_CHANCE)
    };
    Some(if mine {
        Command::Mine(choice.coord)
    } else {
        Command::Station(choice.coord)
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::GameConfig;
    use crate::game::Role;

    fn two_player() -> Game {
        Game::new(
            [Role::Ai, Role::Ai, Role::None, Role::None],
            GameConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_ranking_prefers_freedom_then_centre() {
        let game = two_player();
        let ranked = ranked_candidates(&game, SeatId::P1);
        // Spawn (1,1): neighbours (0,1),(2,1),(1,0),(1,2)
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].freedom, 3);
        assert!(ranked[0].coord == Coord::new(2, 1) || ranked[0].coord == Coord::new(1, 2));
        assert!(ranked.windows(2).all(|w| w[0].freedom >= w[1].freedom));
        assert_eq!(ranked[3].freedom, 2);
    }

    #[test]
    fn test_opening_move_is_top_candidate() {
        let game = two_player();
        let ranked = ranked_candidates(&game, SeatId::P1);
        let top: Vec<Coord> = ranked.iter().take(TOP_CANDIDATES).map(|c| c.coord).collect();

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let Some(cmd) = plan_move(&game, &mut rng) else {
                panic!("no move planned");
            };
            // Fewer than MINE_MIN_CANDIDATES cells, so always a station.
            let Command::Station(at) = cmd else {
                panic!("expected a station, got {cmd}");
            };
            assert!(top.contains(&at));
            assert!(game.clone().apply(cmd).is_ok());
        }
    }

    #[test]
    fn test_charged_seat_attacks_with_sacrifice() {
        let mut game = two_player();
        for (p1, p2) in [("S 2 1", "S 7 8"), ("S 3 1", "S 6 8"), ("S 4 1", "M 8 7")] {
            game.apply(p1.parse().unwrap()).unwrap();
            game.apply(p2.parse().unwrap()).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(7);
        let cmd = plan_move(&game, &mut rng).unwrap();
        let Command::Laser { target, sacrifice: Some(sacrifice) } = cmd else {
            panic!("expected an attack, got {cmd}");
        };
        assert_eq!(game.grid().get(target).unwrap().owner(), Some(SeatId::P2));
        assert_eq!(sacrifice.row, 1);
        assert!(game.clone().apply(cmd).is_ok());
    }

    #[test]
    fn test_no_sacrifice_when_disabled() {
        let config = GameConfig {
            rules: game::AttackRules {
                sacrifice: SacrificePolicy::Disabled,
                ..game::AttackRules::default()
            },
            weapon_req: 1,
            ..GameConfig::default()
        };
        let game = Game::new([Role::Ai, Role::Human, Role::None, Role::None], config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let cmd = plan_move(&game, &mut rng).unwrap();
        assert_eq!(
            cmd,
            Command::Laser { target: Coord::new(8, 8), sacrifice: None }
        );
    }

    #[test]
    fn test_no_move_when_boxed_in() {
        let mut game = two_player();
        for coord in [Coord::new(0, 1), Coord::new(1, 0), Coord::new(2, 1), Coord::new(1, 2)] {
            game.grid.set(coord, Cell::Rubble).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(plan_move(&game, &mut rng), None);
    }
}
