//! Rebuilding a game from its command log.
//!
//! Two forms exist. Line replay trusts the turn pointer, exactly like live
//! play. Resync reads the semicolon-joined network form, which carries no
//! actor, and infers each play command's seat by cycling through the joined
//! seats in numeric order.
//!
//! Neither form aborts: malformed and rejected lines are recorded in the
//! [`ReplayReport`] and skipped.

use log::warn;

use crate::config::GameConfig;
use crate::error::{CommandError, ConfigError, MoveError};
use crate::game::{Game, SeatId};
use crate::protocol::Command;

/// Sentinel the battle server puts at the head of a fresh log.
pub const START_SENTINEL: &str = "START";

/// What happened to one log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    /// Parsed and applied.
    Applied,
    /// Blank entry or the `START` sentinel.
    Skipped,
    /// Did not parse.
    Malformed(CommandError),
    /// Parsed but refused by the rules.
    Rejected(MoveError),
}

/// Result for one log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    /// One-based position in the input.
    pub line_no: usize,
    /// The entry as given.
    pub text: String,
    /// Outcome.
    pub status: LineStatus,
}

/// Per-entry results of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplayReport {
    /// One report per input entry, in order.
    pub lines: Vec<LineReport>,
}

impl ReplayReport {
    fn record(&mut self, line_no: usize, text: &str, status: LineStatus) {
        match &status {
            LineStatus::Malformed(err) => warn!("line {line_no}: skipping malformed `{text}`: {err}"),
            LineStatus::Rejected(err) => warn!("line {line_no}: `{text}` rejected: {err}"),
            LineStatus::Applied | LineStatus::Skipped => {}
        }
        self.lines.push(LineReport {
            line_no,
            text: text.to_string(),
            status,
        });
    }

    /// Number of applied entries.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| line.status == LineStatus::Applied)
            .count()
    }

    /// Entries that did not parse.
    pub fn malformed(&self) -> impl Iterator<Item = &LineReport> {
        self.lines
            .iter()
            .filter(|line| matches!(line.status, LineStatus::Malformed(_)))
    }

    /// Entries refused by the rules.
    pub fn rejected(&self) -> impl Iterator<Item = &LineReport> {
        self.lines
            .iter()
            .filter(|line| matches!(line.status, LineStatus::Rejected(_)))
    }

    /// Whether every non-blank entry was applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.malformed().next().is_none() && self.rejected().next().is_none()
    }
}

fn status_of(result: Result<(), MoveError>) -> LineStatus {
    match result {
        Ok(()) => LineStatus::Applied,
        Err(err) => LineStatus::Rejected(err),
    }
}

/// Rebuild a game by applying `lines` in order from an empty game.
///
/// Play commands act as the seat to move. After the last line seating is
/// closed: unjoined seats are marked lost, their spawns become `X`, and the
/// turn moves off any seat that cannot act.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` is invalid. Bad lines never fail
/// the replay.
pub fn replay_lines<I, S>(lines: I, config: GameConfig) -> Result<(Game, ReplayReport), ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut game = Game::empty(config)?;
    let mut report = ReplayReport::default();

    for (idx, line) in lines.into_iter().enumerate() {
        let text = line.as_ref();
        let status = if text.trim().is_empty() {
            LineStatus::Skipped
        } else {
            match text.parse::<Command>() {
                Ok(command) => status_of(game.apply(command)),
                Err(err) => LineStatus::Malformed(err),
            }
        };
        report.record(idx + 1, text, status);
    }

    game.seal();
    let turn = game.turn();
    game.set_turn(turn);
    Ok((game, report))
}

/// [`replay_lines`] without the report.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` is invalid.
pub fn replay<I, S>(lines: I, config: GameConfig) -> Result<Game, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    replay_lines(lines, config).map(|(game, _)| game)
}

/// Entries of a semicolon-joined log, without blanks or the `START`
/// sentinel.
pub fn split_battle_log(log: &str) -> impl Iterator<Item = &str> {
    log.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && *entry != START_SENTINEL)
}

/// Join commands into the network form, `START;cmd;cmd;...`.
#[must_use]
pub fn join_battle_log<I, S>(commands: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut log = String::from(START_SENTINEL);
    for command in commands {
        log.push(';');
        log.push_str(command.as_ref());
    }
    log
}

/// Rebuild a game from the semicolon-joined network log.
///
/// Each play command is applied as `joined[i % n]`, where `joined` is the
/// seats joined so far in numeric order and `i` counts play commands applied
/// successfully. A rejected play command does not consume a slot. Afterwards
/// the turn is handed to the next inferred seat, or rotated on from it if
/// that seat cannot act.
///
/// Unlike [`replay_lines`], a log with no play command leaves seating open,
/// since the battle may still be gathering players.
///
/// The wire form carries no actor, so a log in which a seat was eliminated
/// while others kept playing will not rebuild the same state as line replay.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` is invalid.
pub fn resync(log: &str, config: GameConfig) -> Result<(Game, ReplayReport), ConfigError> {
    let mut game = Game::empty(config)?;
    let mut report = ReplayReport::default();
    let mut plays = 0usize;

    for (idx, entry) in log.split(';').enumerate() {
        let text = entry.trim();
        if text.is_empty() || text == START_SENTINEL {
            report.record(idx + 1, text, LineStatus::Skipped);
            continue;
        }
        let command = match text.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                report.record(idx + 1, text, LineStatus::Malformed(err));
                continue;
            }
        };
        let status = if command.is_play() {
            let actor = inferred_actor(&game, plays);
            let status = status_of(game.apply_as(actor, command));
            if status == LineStatus::Applied {
                plays += 1;
            }
            status
        } else {
            status_of(game.apply(command))
        };
        report.record(idx + 1, text, status);
    }

    let next = inferred_actor(&game, plays);
    game.set_turn(next);
    Ok((game, report))
}

fn inferred_actor(game: &Game, plays: usize) -> SeatId {
    let joined: Vec<SeatId> = game.seats().joined().map(|seat| seat.id).collect();
    if joined.is_empty() {
        SeatId::P1
    } else {
        joined[plays % joined.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Cell, Coord, Phase, Role};

    const OPENING: [&str; 5] = ["WEAPON_REQ 4", "JOIN human", "JOIN ai", "S 2 1", "S 7 8"];

    #[test]
    fn test_replay_matches_live_play() {
        let mut live = Game::new(
            [Role::Human, Role::Ai, Role::None, Role::None],
            GameConfig::default(),
        )
        .unwrap();
        live.apply("S 2 1".parse().unwrap()).unwrap();
        live.apply("S 7 8".parse().unwrap()).unwrap();

        let (replayed, report) = replay_lines(OPENING, GameConfig::default()).unwrap();
        assert!(report.is_clean());
        assert_eq!(replayed, live);
    }

    #[test]
    fn test_replay_skips_bad_lines() {
        let lines = ["WEAPON_REQ 4", "JOIN human", "JOIN ai", "S 99 99", "garbage", "", "S 2 1"];
        let (game, report) = replay_lines(lines, GameConfig::default()).unwrap();

        assert_eq!(game.grid().get(Coord::new(1, 2)).unwrap(), Cell::Station(SeatId::P1));
        assert_eq!(game.turn(), SeatId::P2);
        assert_eq!(report.applied(), 4);
        assert_eq!(report.rejected().map(|l| l.line_no).collect::<Vec<_>>(), vec![4]);
        assert_eq!(report.malformed().map(|l| l.line_no).collect::<Vec<_>>(), vec![5]);
        assert_eq!(report.lines[5].status, LineStatus::Skipped);
    }

    #[test]
    fn test_replay_seals_unjoined_seats() {
        let (game, _) = replay_lines(["JOIN ai"], GameConfig::default()).unwrap();
        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.grid().get(Coord::new(8, 8)).unwrap(), Cell::Dead);
        assert!(game.seats().get(SeatId::P4).lost);
        assert_eq!(game.turn(), SeatId::P1);
    }

    #[test]
    fn test_replay_of_nothing_is_over() {
        let (game, report) = replay_lines(Vec::<String>::new(), GameConfig::default()).unwrap();
        assert!(game.is_over());
        assert!(report.lines.is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let a = replay(OPENING, GameConfig::default()).unwrap();
        let b = replay(OPENING, GameConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_and_join_battle_log() {
        let log = join_battle_log(OPENING);
        assert_eq!(log, "START;WEAPON_REQ 4;JOIN human;JOIN ai;S 2 1;S 7 8");
        assert_eq!(split_battle_log(&log).collect::<Vec<_>>(), OPENING);
        assert_eq!(split_battle_log("START;;S 1 2;").collect::<Vec<_>>(), vec!["S 1 2"]);
    }

    #[test]
    fn test_resync_matches_line_replay() {
        let log = join_battle_log(OPENING);
        let (synced, report) = resync(&log, GameConfig::default()).unwrap();
        let lined = replay(OPENING, GameConfig::default()).unwrap();
        assert!(report.is_clean());
        assert_eq!(synced, lined);
    }

    #[test]
    fn test_resync_rejection_does_not_consume_slot() {
        // "S 5 5" is not adjacent to seat 1, so "S 2 1" is still seat 1's move.
        let log = "START;JOIN human;JOIN ai;S 5 5;S 2 1;S 7 8";
        let (game, report) = resync(log, GameConfig::default()).unwrap();
        assert_eq!(report.rejected().count(), 1);
        assert_eq!(game.grid().get(Coord::new(1, 2)).unwrap(), Cell::Station(SeatId::P1));
        assert_eq!(game.grid().get(Coord::new(8, 7)).unwrap(), Cell::Station(SeatId::P2));
        assert_eq!(game.turn(), SeatId::P1);
    }

    #[test]
    fn test_resync_keeps_seating_open_until_play() {
        let (mut game, _) = resync("START;WEAPON_REQ 3;JOIN human alice", GameConfig::default()).unwrap();
        assert_eq!(game.phase(), Phase::Setup);
        assert_eq!(game.turn(), SeatId::P1);

        game.apply("JOIN human bob".parse().unwrap()).unwrap();
        assert_eq!(game.seat_of_identity("bob"), Some(SeatId::P2));
    }

    #[test]
    fn test_resync_is_idempotent_input() {
        let log = "START;JOIN ai;JOIN ai;M 1 2";
        let first = resync(log, GameConfig::default()).unwrap();
        let second = resync(log, GameConfig::default()).unwrap();
        assert_eq!(first, second);
    }
}
