//! Canonical text form of game commands.
//!
//! Coordinates are written `col row`, column first. Every file and network
//! peer depends on that order.

use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;
use crate::game::{Coord, Role};

/// One state-changing event in the command log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// `WEAPON_REQ n`: set the weapon line-length requirement.
    WeaponReq(usize),
    /// `JOIN role [userId]`: take the next available seat.
    Join {
        /// Controller of the seat. Never [`Role::None`].
        role: Role,
        /// External identity to bind, if any.
        identity: Option<String>,
    },
    /// `S col row`: build a station.
    Station(Coord),
    /// `M col row`: build a mine.
    Mine(Coord),
    /// `L tcol trow [scol srow]`: fire at `target`, optionally destroying
    /// one of the attacker's own weapon cells.
    Laser {
        /// Cell to destroy.
        target: Coord,
        /// Own weapon cell spent on the shot.
        sacrifice: Option<Coord>,
    },
}

impl Command {
    /// Whether this is a build or attack, which consumes a turn.
    #[must_use]
    pub const fn is_play(&self) -> bool {
        matches!(self, Command::Station(_) | Command::Mine(_) | Command::Laser { .. })
    }

    /// Leading token of the text form.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Command::WeaponReq(_) => "WEAPON_REQ",
            Command::Join { .. } => "JOIN",
            Command::Station(_) => "S",
            Command::Mine(_) => "M",
            Command::Laser { .. } => "L",
        }
    }

    /// Arguments of the text form, everything after the verb.
    #[must_use]
    pub fn args(&self) -> String {
        let text = self.to_string();
        text.split_once(' ')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_default()
    }
}

fn number<T: FromStr>(token: &str) -> Result<T, CommandError> {
    token
        .parse()
        .map_err(|_| CommandError::BadNumber(token.to_string()))
}

fn coord(col: &str, row: &str) -> Result<Coord, CommandError> {
    Ok(Coord::new(number(row)?, number(col)?))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        match (verb, args.as_slice()) {
            ("WEAPON_REQ", [n]) => match number::<usize>(n)? {
                0 => Err(CommandError::ZeroWeaponReq),
                n => Ok(Command::WeaponReq(n)),
            },
            ("WEAPON_REQ", _) => Err(CommandError::Arity {
                verb: "WEAPON_REQ",
                expected: "1",
                found: args.len(),
            }),
            ("JOIN", [role, rest @ ..]) if rest.len() <= 1 => {
                let role: Role = role.parse()?;
                if !role.is_playing() {
                    return Err(CommandError::JoinAsNone);
                }
                Ok(Command::Join {
                    role,
                    identity: rest.first().map(|id| (*id).to_string()),
                })
            }
            ("JOIN", _) => Err(CommandError::Arity {
                verb: "JOIN",
                expected: "1 or 2",
                found: args.len(),
            }),
            ("S", [col, row]) => Ok(Command::Station(coord(col, row)?)),
            ("M", [col, row]) => Ok(Command::Mine(coord(col, row)?)),
            ("S" | "M", _) => Err(CommandError::Arity {
                verb: if verb == "S" { "S" } else { "M" },
                expected: "2",
                found: args.len(),
            }),
            ("L", [tc, tr]) => Ok(Command::Laser {
                target: coord(tc, tr)?,
                sacrifice: None,
            }),
            ("L", [tc, tr, sc, sr]) => Ok(Command::Laser {
                target: coord(tc, tr)?,
                sacrifice: Some(coord(sc, sr)?),
            }),
            ("L", _) => Err(CommandError::Arity {
                verb: "L",
                expected: "2 or 4",
                found: args.len(),
            }),
            _ => Err(CommandError::UnknownVerb(verb.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::WeaponReq(n) => write!(f, "WEAPON_REQ {n}"),
            Command::Join { role, identity: Some(id) } => write!(f, "JOIN {role} {id}"),
            Command::Join { role, identity: None } => write!(f, "JOIN {role}"),
            Command::Station(at) => write!(f, "S {} {}", at.col, at.row),
            Command::Mine(at) => write!(f, "M {} {}", at.col, at.row),
            Command::Laser { target, sacrifice: Some(s) } => {
                write!(f, "L {} {} {} {}", target.col, target.row, s.col, s.row)
            }
            Command::Laser { target, sacrifice: None } => {
                write!(f, "L {} {}", target.col, target.row)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_col_then_row() {
        let cmd: Command = "S 2 1".parse().unwrap();
        assert_eq!(cmd, Command::Station(Coord::new(1, 2)));
        assert_eq!(cmd.to_string(), "S 2 1");

        let mine: Command = "M 7 3".parse().unwrap();
        assert_eq!(mine, Command::Mine(Coord::new(3, 7)));
    }

    #[test]
    fn test_laser_with_and_without_sacrifice() {
        let cmd: Command = "L 5 6 1 2".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Laser {
                target: Coord::new(6, 5),
                sacrifice: Some(Coord::new(2, 1)),
            }
        );
        assert_eq!(cmd.to_string(), "L 5 6 1 2");

        let bare: Command = "L 5 6".parse().unwrap();
        assert_eq!(bare.to_string(), "L 5 6");
        assert!(matches!(
            "L 5 6 1".parse::<Command>(),
            Err(CommandError::Arity { verb: "L", found: 3, .. })
        ));
    }

    #[test]
    fn test_join_forms() {
        let cmd: Command = "JOIN ai".parse().unwrap();
        assert_eq!(cmd, Command::Join { role: Role::Ai, identity: None });

        // Older clients wrote a trailing space after the role.
        let trailing: Command = "JOIN human ".parse().unwrap();
        assert_eq!(trailing.to_string(), "JOIN human");

        let bound: Command = "JOIN human user-42".parse().unwrap();
        assert_eq!(bound.to_string(), "JOIN human user-42");

        assert_eq!("JOIN none".parse::<Command>(), Err(CommandError::JoinAsNone));
        assert!(matches!("JOIN robot".parse::<Command>(), Err(CommandError::UnknownRole(_))));
    }

    #[test]
    fn test_weapon_req() {
        assert_eq!("WEAPON_REQ 3".parse::<Command>().unwrap(), Command::WeaponReq(3));
        assert_eq!("WEAPON_REQ 0".parse::<Command>(), Err(CommandError::ZeroWeaponReq));
        assert!(matches!("WEAPON_REQ x".parse::<Command>(), Err(CommandError::BadNumber(_))));
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!("X 1 1".parse::<Command>(), Err(CommandError::UnknownVerb(_))));
        assert!(matches!("s 1 1".parse::<Command>(), Err(CommandError::UnknownVerb(_))));
        assert!(matches!("S -1 2".parse::<Command>(), Err(CommandError::BadNumber(_))));
        assert!(matches!("S 1".parse::<Command>(), Err(CommandError::Arity { .. })));
    }

    #[test]
    fn test_out_of_range_coordinates_still_parse() {
        let cmd: Command = "S 99 99".parse().unwrap();
        assert_eq!(cmd, Command::Station(Coord::new(99, 99)));
    }

    #[test]
    fn test_verb_and_args() {
        let cmd: Command = "L 1 2 3 4".parse().unwrap();
        assert_eq!(cmd.verb(), "L");
        assert_eq!(cmd.args(), "1 2 3 4");
        assert!(cmd.is_play());
        assert!(!Command::WeaponReq(4).is_play());
    }
}
