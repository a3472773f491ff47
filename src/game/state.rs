//! Game state and the single command-apply path.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{ConfigError, IllegalMove, MoveError};
use crate::game::rules::{self, AttackRules};
use crate::game::{Cell, Coord, Grid, Role, SEAT_COUNT, SeatId, Seats, assert_invariants};
use crate::protocol::Command;

/// Game-level lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Seats are still being joined and configured.
    #[default]
    Setup,
    /// Seating is closed and moves are being played.
    InProgress,
    /// No further moves are accepted.
    GameOver,
}

/// Final result of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// One seat holds the highest score.
    Winner {
        /// Winning seat.
        seat: SeatId,
        /// Its mine count.
        score: usize,
    },
    /// Two or more seats share the highest score.
    Draw {
        /// Tied seats in numeric order.
        seats: Vec<SeatId>,
        /// The shared mine count.
        score: usize,
    },
}

/// Game state in the JSON shape used by the mobile application's saves.
///
/// Seat maps are keyed by seat number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Grid width.
    pub width: u16,
    /// Grid height.
    pub height: u16,
    /// Role per seat.
    pub roles: BTreeMap<u8, Role>,
    /// Weapon requirement.
    pub weapon_req: usize,
    /// Seat to move.
    pub turn: u8,
    /// Lost flag per seat.
    pub player_lost: BTreeMap<u8, bool>,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Command log, one command per entry.
    #[serde(rename = "battleLog")]
    pub battle_log: Vec<String>,
    /// Bound identity per seat, empty when unbound.
    #[serde(rename = "playerIds")]
    pub player_ids: BTreeMap<u8, String>,
}

/// Complete game state.
///
/// Mutated only through [`Game::apply`] and [`Game::apply_as`]; every
/// accepted command is appended to the log, so replaying [`Game::log`] from
/// [`Game::empty`] reproduces this state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Game {
    pub(crate) config: GameConfig,
    pub(crate) grid: Grid,
    pub(crate) seats: Seats,
    pub(crate) weapon_req: usize,
    pub(crate) turn: SeatId,
    pub(crate) phase: Phase,
    pub(crate) log: Vec<Command>,
}

impl Game {
    /// An empty game: blank grid, all seats unjoined, seat 1 to move.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn empty(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height).ok_or(ConfigError::GridSize {
            width: config.width,
            height: config.height,
            min: crate::config::MIN_GRID_SIDE,
            max: crate::config::MAX_GRID_SIDE,
        })?;
        Ok(Self {
            config,
            grid,
            seats: Seats::new(config.width, config.height),
            weapon_req: config.weapon_req,
            turn: SeatId::P1,
            phase: Phase::Setup,
            log: Vec::new(),
        })
    }

    /// A fresh game from a role per seat.
    ///
    /// Emits `WEAPON_REQ` and one `JOIN` per playing role, then closes
    /// seating. `JOIN` carries no seat number, so playing roles land in
    /// consecutive seats from seat 1: `[none, ai, none, human]` seats the AI
    /// in seat 1 and the human in seat 2.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn new(roles: [Role; SEAT_COUNT], config: GameConfig) -> Result<Self, ConfigError> {
        let mut game = Self::empty(config)?;
        let setup = std::iter::once(Command::WeaponReq(config.weapon_req)).chain(
            roles
                .into_iter()
                .filter(|role| role.is_playing())
                .map(|role| Command::Join { role, identity: None }),
        );
        for command in setup {
            if let Err(err) = game.apply(command) {
                warn!("setup command rejected: {err}");
            }
        }
        game.seal();
        Ok(game)
    }

    /// Configuration the game was created with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The board.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// All four seats.
    #[must_use]
    pub const fn seats(&self) -> &Seats {
        &self.seats
    }

    /// Weapon line-length requirement in force.
    #[must_use]
    pub const fn weapon_req(&self) -> usize {
        self.weapon_req
    }

    /// Attack rules in force.
    #[must_use]
    pub const fn rules(&self) -> AttackRules {
        self.config.rules
    }

    /// Seat to move.
    #[must_use]
    pub const fn turn(&self) -> SeatId {
        self.turn
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Accepted commands, oldest first.
    #[must_use]
    pub fn log(&self) -> &[Command] {
        &self.log
    }

    /// Accepted commands in text form.
    #[must_use]
    pub fn log_lines(&self) -> Vec<String> {
        self.log.iter().map(ToString::to_string).collect()
    }

    /// Number of build and attack commands played.
    #[must_use]
    pub fn moves_played(&self) -> usize {
        self.log.iter().filter(|cmd| cmd.is_play()).count()
    }

    /// Whether `seat` may build on `coord`.
    #[must_use]
    pub fn can_build(&self, coord: Coord, seat: SeatId) -> bool {
        rules::can_build(&self.grid, coord, seat)
    }

    /// Whether `seat` is still in play and has a legal build.
    #[must_use]
    pub fn can_player_move(&self, seat: SeatId) -> bool {
        self.seats.get(seat).is_active() && rules::can_player_move(&self.grid, seat)
    }

    /// Weapon charge of `seat`.
    #[must_use]
    pub fn line_power(&self, seat: SeatId) -> usize {
        rules::line_power(&self.grid, seat)
    }

    /// Whether `seat` is charged to fire.
    #[must_use]
    pub fn can_attack(&self, seat: SeatId) -> bool {
        self.line_power(seat) >= self.weapon_req
    }

    /// Weapon cells of every joined seat.
    #[must_use]
    pub fn weapon_cells(&self) -> BTreeSet<Coord> {
        rules::weapon_cells(
            &self.grid,
            self.seats.joined().map(|seat| seat.id),
            self.weapon_req,
        )
    }

    /// Mine count of `seat`.
    #[must_use]
    pub fn score(&self, seat: SeatId) -> usize {
        rules::score(&self.grid, seat)
    }

    /// Scores of every joined seat, in seat order.
    #[must_use]
    pub fn scores(&self) -> Vec<(SeatId, usize)> {
        self.seats
            .joined()
            .map(|seat| (seat.id, self.score(seat.id)))
            .collect()
    }

    /// Winner or draw, once the game is over and someone joined.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_over() {
            return None;
        }
        let scores = self.scores();
        let best = scores.iter().map(|&(_, score)| score).max()?;
        let leaders: Vec<SeatId> = scores
            .iter()
            .filter(|&&(_, score)| score == best)
            .map(|&(seat, _)| seat)
            .collect();
        match leaders.as_slice() {
            [seat] => Some(Outcome::Winner { seat: *seat, score: best }),
            _ => Some(Outcome::Draw { seats: leaders, score: best }),
        }
    }

    /// Seat bound to `identity` by a `JOIN`.
    #[must_use]
    pub fn seat_of_identity(&self, identity: &str) -> Option<SeatId> {
        if identity.is_empty() {
            return None;
        }
        self.seats
            .iter()
            .find(|seat| seat.identity == identity)
            .map(|seat| seat.id)
    }

    /// Whether the seat bound to `identity` is the one to move.
    #[must_use]
    pub fn is_turn_of(&self, identity: &str) -> bool {
        !self.is_over() && self.seat_of_identity(identity) == Some(self.turn)
    }

    /// Apply a command as the seat to move.
    ///
    /// Play commands advance the turn as part of being applied. A rejected
    /// command changes nothing and is not logged, except that the first play
    /// attempt closes seating.
    ///
    /// # Errors
    ///
    /// Returns a [`MoveError`] if the command is off the board or illegal.
    pub fn apply(&mut self, command: Command) -> Result<(), MoveError> {
        self.apply_as(self.turn, command)
    }

    /// Apply a command with `actor` as the acting seat.
    ///
    /// Used by resync, where the actor is inferred rather than taken from the
    /// turn pointer. Non-play commands ignore `actor`.
    ///
    /// # Errors
    ///
    /// Returns a [`MoveError`] if the command is off the board or illegal.
    pub fn apply_as(&mut self, actor: SeatId, command: Command) -> Result<(), MoveError> {
        let result = match &command {
            Command::WeaponReq(n) => self.configure(*n),
            Command::Join { role, identity } => self.join(*role, identity.as_deref()),
            Command::Station(at) => self.build(actor, *at, Cell::Station(actor)),
            Command::Mine(at) => self.build(actor, *at, Cell::Mine(actor)),
            Command::Laser { target, sacrifice } => self.attack(actor, *target, *sacrifice),
        };
        match result {
            Ok(()) => {
                self.log.push(command);
                assert_invariants(self);
                Ok(())
            }
            Err(err) => {
                debug!("rejected `{command}` from seat {actor}: {err}");
                Err(err)
            }
        }
    }

    fn configure(&mut self, weapon_req: usize) -> Result<(), MoveError> {
        if self.phase != Phase::Setup {
            return Err(IllegalMove::AlreadyStarted.into());
        }
        if weapon_req == 0 {
            return Err(IllegalMove::ZeroWeaponReq.into());
        }
        self.weapon_req = weapon_req;
        Ok(())
    }

    fn join(&mut self, role: Role, identity: Option<&str>) -> Result<(), MoveError> {
        let identity = identity.unwrap_or_default();

        if self.phase == Phase::Setup {
            let free = self.seats.iter().find(|seat| !seat.role.is_playing()).map(|seat| seat.id);
            if let Some(seat) = free {
                let spawn = self.seats.get(seat).spawn;
                self.grid.set(spawn, Cell::Station(seat))?;
                let entry = self.seats.get_mut(seat);
                entry.role = role;
                entry.identity = identity.to_string();
                info!("seat {seat} joined as {role}");
                return Ok(());
            }
        }

        let reconnect = self
            .seats
            .iter()
            .find(|seat| seat.role == role && seat.identity.is_empty())
            .map(|seat| seat.id)
            .ok_or(IllegalMove::NoSeatAvailable)?;
        self.seats.get_mut(reconnect).identity = identity.to_string();
        debug!("seat {reconnect} reclaimed by role {role}");
        Ok(())
    }

    /// Checks shared by every play command. Closes seating on first use.
    fn begin_play(&mut self, actor: SeatId) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(IllegalMove::GameOver.into());
        }
        if self.seats.joined().next().is_none() {
            return Err(IllegalMove::NoPlayers.into());
        }
        if self.phase == Phase::Setup {
            self.seal();
            if self.is_over() {
                return Err(IllegalMove::GameOver.into());
            }
        }
        if !self.seats.get(actor).is_active() {
            return Err(IllegalMove::SeatLost.into());
        }
        Ok(())
    }

    fn build(&mut self, actor: SeatId, at: Coord, cell: Cell) -> Result<(), MoveError> {
        self.begin_play(actor)?;
        if self.grid.get(at)? != Cell::Empty {
            return Err(IllegalMove::CellOccupied.into());
        }
        if !rules::can_build(&self.grid, at, actor) {
            return Err(IllegalMove::NotAdjacent.into());
        }
        self.grid.set(at, cell)?;
        self.advance_turn(actor);
        Ok(())
    }

    fn attack(&mut self, actor: SeatId, target: Coord, sacrifice: Option<Coord>) -> Result<(), MoveError> {
        self.begin_play(actor)?;
        if !self.can_attack(actor) {
            return Err(IllegalMove::NoWeaponCharge.into());
        }
        self.grid.get(target)?;
        if let Some(cell) = sacrifice {
            self.grid.get(cell)?;
        }
        let rules = self.config.rules;
        rules.check_target(&self.grid, actor, target)?;
        rules.check_sacrifice(&self.grid, actor, self.weapon_req, target, sacrifice)?;

        self.grid.set(target, Cell::Rubble)?;
        if let Some(cell) = sacrifice {
            self.grid.set(cell, Cell::Rubble)?;
        }
        self.advance_turn(actor);
        Ok(())
    }

    /// Close seating: every unjoined seat is lost and its spawn blocked.
    ///
    /// Idempotent. Called by the constructor, by the first play command and
    /// at the end of a replay.
    pub(crate) fn seal(&mut self) {
        if self.phase != Phase::Setup {
            return;
        }
        for id in SeatId::ALL {
            let seat = self.seats.get_mut(id);
            if seat.role.is_playing() {
                continue;
            }
            seat.eliminate();
            let spawn = seat.spawn;
            if let Err(err) = self.grid.set(spawn, Cell::Dead) {
                warn!("cannot block spawn of seat {id}: {err}");
            }
        }
        self.phase = Phase::InProgress;

        if self.seats.active().next().is_none() {
            self.phase = Phase::GameOver;
            return;
        }
        if !self.seats.get(self.turn).is_active() {
            self.rotate_from(self.turn);
        }
    }

    /// Loss sweep, game-over check, then rotation to the next eligible seat.
    fn advance_turn(&mut self, actor: SeatId) {
        for id in SeatId::ALL {
            if self.seats.get(id).is_active() && !rules::can_player_move(&self.grid, id) {
                self.seats.get_mut(id).eliminate();
                info!("seat {id} has no legal build and is out");
            }
        }

        let active: Vec<SeatId> = self.seats.active().map(|seat| seat.id).collect();
        match active.as_slice() {
            [] => {
                self.finish();
                return;
            }
            [sole] => {
                let best_rival = self
                    .seats
                    .joined()
                    .filter(|seat| seat.id != *sole)
                    .map(|seat| self.score(seat.id))
                    .max()
                    .unwrap_or(0);
                if self.score(*sole) > best_rival {
                    self.finish();
                    return;
                }
            }
            _ => {}
        }

        self.rotate_from(actor);
    }

    /// Move the turn to the first active seat after `from`, at most one
    /// full cycle. Leaves the turn alone if nobody is eligible.
    pub(crate) fn rotate_from(&mut self, from: SeatId) {
        let mut next = from;
        for _ in 0..SEAT_COUNT {
            next = next.next();
            if self.seats.get(next).is_active() {
                debug!("turn passes to seat {next}");
                self.turn = next;
                return;
            }
        }
    }

    /// Hand the turn to `seat` if it can act, otherwise rotate on from it.
    pub(crate) fn set_turn(&mut self, seat: SeatId) {
        if self.is_over() {
            return;
        }
        if self.seats.get(seat).is_active() {
            self.turn = seat;
        } else {
            self.rotate_from(seat);
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::GameOver;
        info!("game over: {:?}", self.outcome());
    }

    /// State in the legacy save shape.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            roles: self.seats.iter().map(|seat| (seat.id.get(), seat.role)).collect(),
            weapon_req: self.weapon_req,
            turn: self.turn.get(),
            player_lost: self.seats.iter().map(|seat| (seat.id.get(), seat.lost)).collect(),
            game_over: self.is_over(),
            battle_log: self.log_lines(),
            player_ids: self
                .seats
                .iter()
                .map(|seat| (seat.id.get(), seat.identity.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player() -> Game {
        Game::new(
            [Role::Human, Role::Ai, Role::None, Role::None],
            GameConfig::default(),
        )
        .unwrap()
    }

    fn play(game: &mut Game, line: &str) {
        game.apply(line.parse().unwrap()).unwrap();
    }

    #[test]
    fn test_new_game_seals_unjoined_seats() {
        let game = two_player();
        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.turn(), SeatId::P1);
        assert_eq!(game.grid().get(Coord::new(1, 1)).unwrap(), Cell::Station(SeatId::P1));
        assert_eq!(game.grid().get(Coord::new(8, 8)).unwrap(), Cell::Station(SeatId::P2));
        assert_eq!(game.grid().get(Coord::new(1, 8)).unwrap(), Cell::Dead);
        assert_eq!(game.grid().get(Coord::new(8, 1)).unwrap(), Cell::Dead);
        assert!(game.seats().get(SeatId::P3).lost);
        assert!(game.seats().get(SeatId::P4).lost);
        assert_eq!(game.log_lines(), vec!["WEAPON_REQ 4", "JOIN human", "JOIN ai"]);
    }

    #[test]
    fn test_constructor_compacts_roles() {
        let game = Game::new(
            [Role::None, Role::Ai, Role::None, Role::Human],
            GameConfig::default(),
        )
        .unwrap();
        assert_eq!(game.seats().roles(), [Role::Ai, Role::Human, Role::None, Role::None]);
    }

    #[test]
    fn test_build_advances_turn() {
        let mut game = two_player();
        play(&mut game, "S 2 1");
        assert_eq!(game.grid().get(Coord::new(1, 2)).unwrap(), Cell::Station(SeatId::P1));
        assert_eq!(game.turn(), SeatId::P2);
        play(&mut game, "M 7 8");
        assert_eq!(game.score(SeatId::P2), 1);
        assert_eq!(game.turn(), SeatId::P1);
    }

    #[test]
    fn test_rejected_build_changes_nothing() {
        let mut game = two_player();
        let before = game.clone();

        assert_eq!(
            game.apply("S 5 5".parse().unwrap()),
            Err(MoveError::Illegal(IllegalMove::NotAdjacent))
        );
        assert_eq!(
            game.apply("S 1 1".parse().unwrap()),
            Err(MoveError::Illegal(IllegalMove::CellOccupied))
        );
        assert!(matches!(
            game.apply("S 99 99".parse().unwrap()),
            Err(MoveError::OutOfBounds { .. })
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn test_attack_requires_charge() {
        let mut game = two_player();
        assert_eq!(
            game.apply("L 8 8 1 1".parse().unwrap()),
            Err(MoveError::Illegal(IllegalMove::NoWeaponCharge))
        );
    }

    #[test]
    fn test_attack_with_sacrifice() {
        let mut game = two_player();
        for (p1, p2) in [("S 2 1", "S 7 8"), ("S 3 1", "S 6 8"), ("S 4 1", "S 5 8")] {
            play(&mut game, p1);
            play(&mut game, p2);
        }
        assert_eq!(game.line_power(SeatId::P1), 4);
        assert!(game.can_attack(SeatId::P1));

        play(&mut game, "L 8 8 4 1");
        assert_eq!(game.grid().get(Coord::new(8, 8)).unwrap(), Cell::Rubble);
        assert_eq!(game.grid().get(Coord::new(1, 4)).unwrap(), Cell::Rubble);
        assert_eq!(game.line_power(SeatId::P1), 3);
        assert_eq!(game.turn(), SeatId::P2);
    }

    #[test]
    fn test_join_after_start_only_reconnects() {
        let mut game = two_player();
        assert_eq!(game.apply("JOIN ai".parse().unwrap()), Ok(()));
        assert_eq!(game.seats().get(SeatId::P2).identity, "");
        assert_eq!(game.apply("JOIN human alice".parse().unwrap()), Ok(()));
        assert_eq!(game.seat_of_identity("alice"), Some(SeatId::P1));
        assert!(game.is_turn_of("alice"));
        assert_eq!(
            game.apply("JOIN human bob".parse().unwrap()),
            Err(MoveError::Illegal(IllegalMove::NoSeatAvailable))
        );
    }

    #[test]
    fn test_weapon_req_rejected_after_start() {
        let mut game = two_player();
        assert_eq!(
            game.apply(Command::WeaponReq(3)),
            Err(MoveError::Illegal(IllegalMove::AlreadyStarted))
        );
        assert_eq!(game.weapon_req(), 4);
    }

    #[test]
    fn test_play_without_players_rejected() {
        let mut game = Game::empty(GameConfig::default()).unwrap();
        assert_eq!(
            game.apply("S 2 1".parse().unwrap()),
            Err(MoveError::Illegal(IllegalMove::NoPlayers))
        );
        assert_eq!(game.phase(), Phase::Setup);
    }

    #[test]
    fn test_zero_weapon_req_rejected() {
        let mut game = Game::empty(GameConfig::default()).unwrap();
        assert_eq!(
            game.apply(Command::WeaponReq(0)),
            Err(MoveError::Illegal(IllegalMove::ZeroWeaponReq))
        );
        assert_eq!(game.weapon_req(), 4);
        assert!(game.log().is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "rubble cells from only 0 attacks")]
    fn test_accepted_command_checks_invariants() {
        let mut game = two_player();
        game.grid.set(Coord::new(5, 5), Cell::Rubble).unwrap();
        play(&mut game, "S 2 1");
    }

    #[test]
    fn test_snapshot_shape() {
        let game = two_player();
        let json = serde_json::to_value(game.snapshot()).unwrap();
        assert_eq!(json["roles"]["1"], "human");
        assert_eq!(json["roles"]["3"], "none");
        assert_eq!(json["player_lost"]["4"], true);
        assert_eq!(json["turn"], 1);
        assert_eq!(json["battleLog"][0], "WEAPON_REQ 4");
        assert_eq!(json["playerIds"]["2"], "");
    }

    #[test]
    fn test_outcome_draw_and_winner() {
        let mut game = two_player();
        assert_eq!(game.outcome(), None);

        game.phase = Phase::GameOver;
        assert_eq!(
            game.outcome(),
            Some(Outcome::Draw { seats: vec![SeatId::P1, SeatId::P2], score: 0 })
        );

        game.grid.set(Coord::new(0, 1), Cell::Mine(SeatId::P1)).unwrap();
        assert_eq!(game.outcome(), Some(Outcome::Winner { seat: SeatId::P1, score: 1 }));
    }
}
