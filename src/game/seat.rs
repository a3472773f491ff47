//! Seat registry: the four fixed player slots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::game::Coord;

/// Number of seats at the table.
pub const SEAT_COUNT: usize = 4;

/// Identifier of one of the four seats, `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SeatId(u8);

impl SeatId {
    /// Seat 1.
    pub const P1: SeatId = SeatId(1);
    /// Seat 2.
    pub const P2: SeatId = SeatId(2);
    /// Seat 3.
    pub const P3: SeatId = SeatId(3);
    /// Seat 4.
    pub const P4: SeatId = SeatId(4);

    /// All seats in fixed numeric order. Every traversal uses this order.
    pub const ALL: [SeatId; SEAT_COUNT] = [Self::P1, Self::P2, Self::P3, Self::P4];

    /// Seat with the given number, if it is in `1..=4`.
    #[must_use]
    pub const fn new(id: u8) -> Option<Self> {
        if id >= 1 && id as usize <= SEAT_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Seat number, `1..=4`.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index into per-seat arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Next seat in rotation: `1→2→3→4→1`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 % SEAT_COUNT as u8 + 1)
    }

    /// Glyph of this seat's station.
    #[must_use]
    pub const fn station_glyph(self) -> char {
        match self.0 {
            1 => '↑',
            2 => '↓',
            3 => '←',
            _ => '→',
        }
    }

    /// Glyph of this seat's mine.
    #[must_use]
    pub const fn mine_glyph(self) -> char {
        match self.0 {
            1 => '○',
            2 => '△',
            3 => '□',
            _ => '◇',
        }
    }

    /// Display color as `#RRGGBB`.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self.0 {
            1 => "#FF6464",
            2 => "#64FF64",
            3 => "#6464FF",
            _ => "#FFC832",
        }
    }

    /// Spawn position for a `width × height` board: symmetric corners one
    /// cell in from the edge.
    #[must_use]
    pub const fn spawn(self, width: u16, height: u16) -> Coord {
        match self.0 {
            1 => Coord::new(1, 1),
            2 => Coord::new(height - 2, width - 2),
            3 => Coord::new(1, width - 2),
            _ => Coord::new(height - 2, 1),
        }
    }
}

impl TryFrom<u8> for SeatId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("seat {value} is not in 1..=4"))
    }
}

impl From<SeatId> for u8 {
    fn from(seat: SeatId) -> Self {
        seat.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who controls a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Moves come from a person.
    Human,
    /// Moves come from the planner.
    Ai,
    /// Nobody sits here; the seat is dead for the whole game.
    #[default]
    None,
}

impl Role {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Ai => "ai",
            Role::None => "none",
        }
    }

    /// Whether the seat takes part in the game.
    #[must_use]
    pub const fn is_playing(self) -> bool {
        !matches!(self, Role::None)
    }
}

impl FromStr for Role {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(Role::Human),
            "ai" => Ok(Role::Ai),
            "none" => Ok(Role::None),
            _ => Err(CommandError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State for a single seat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seat {
    /// Which seat this is.
    pub id: SeatId,
    /// Controller; set once by `JOIN`.
    pub role: Role,
    /// Spawn cell, where the first station is placed.
    pub spawn: Coord,
    /// Display name.
    pub name: String,
    /// External identity bound by `JOIN role userId`, empty when unbound.
    pub identity: String,
    /// Set once the seat can no longer move. Never reverts.
    pub lost: bool,
}

impl Seat {
    /// Create an unjoined seat for a board of the given size.
    #[must_use]
    pub fn new(id: SeatId, width: u16, height: u16) -> Self {
        Self {
            id,
            role: Role::None,
            spawn: id.spawn(width, height),
            name: format!("Player {id}"),
            identity: String::new(),
            lost: false,
        }
    }

    /// Glyph of this seat's station.
    #[must_use]
    pub const fn station_glyph(&self) -> char {
        self.id.station_glyph()
    }

    /// Glyph of this seat's mine.
    #[must_use]
    pub const fn mine_glyph(&self) -> char {
        self.id.mine_glyph()
    }

    /// Display color as `#RRGGBB`.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        self.id.color()
    }

    /// Whether the seat is joined and has not lost.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.role.is_playing() && !self.lost
    }

    /// Mark this seat as lost.
    pub fn eliminate(&mut self) {
        self.lost = true;
    }
}

/// The four seats as an ordered array indexed by [`SeatId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seats([Seat; SEAT_COUNT]);

impl Seats {
    /// Four unjoined seats for a board of the given size.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self(SeatId::ALL.map(|id| Seat::new(id, width, height)))
    }

    /// Seat by id.
    #[must_use]
    pub fn get(&self, id: SeatId) -> &Seat {
        &self.0[id.index()]
    }

    /// Mutable seat by id.
    #[must_use]
    pub fn get_mut(&mut self, id: SeatId) -> &mut Seat {
        &mut self.0[id.index()]
    }

    /// Seats in numeric order.
    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.0.iter()
    }

    /// Mutable seats in numeric order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Seat> {
        self.0.iter_mut()
    }

    /// Seats that joined the game (role other than `none`), lost or not.
    pub fn joined(&self) -> impl Iterator<Item = &Seat> {
        self.0.iter().filter(|seat| seat.role.is_playing())
    }

    /// Seats still in play.
    pub fn active(&self) -> impl Iterator<Item = &Seat> {
        self.0.iter().filter(|seat| seat.is_active())
    }

    /// Roles in seat order.
    #[must_use]
    pub fn roles(&self) -> [Role; SEAT_COUNT] {
        SeatId::ALL.map(|id| self.get(id).role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_rotation_wraps() {
        assert_eq!(SeatId::P1.next(), SeatId::P2);
        assert_eq!(SeatId::P4.next(), SeatId::P1);
        assert!(SeatId::new(0).is_none());
        assert!(SeatId::new(5).is_none());
    }

    #[test]
    fn test_spawn_positions_are_corners() {
        assert_eq!(SeatId::P1.spawn(10, 10), Coord::new(1, 1));
        assert_eq!(SeatId::P2.spawn(10, 10), Coord::new(8, 8));
        assert_eq!(SeatId::P3.spawn(12, 8), Coord::new(1, 10));
        assert_eq!(SeatId::P4.spawn(12, 8), Coord::new(6, 1));
    }

    #[test]
    fn test_glyphs_are_distinct() {
        let mut glyphs: Vec<char> = SeatId::ALL
            .iter()
            .flat_map(|s| [s.station_glyph(), s.mine_glyph()])
            .collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        assert_eq!(glyphs.len(), 8);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("human".parse::<Role>().unwrap(), Role::Human);
        assert_eq!("AI".parse::<Role>().unwrap(), Role::Ai);
        assert!("robot".parse::<Role>().is_err());
    }

    #[test]
    fn test_seat_eliminate() {
        let mut seats = Seats::new(10, 10);
        seats.get_mut(SeatId::P2).role = Role::Ai;
        assert!(seats.get(SeatId::P2).is_active());

        seats.get_mut(SeatId::P2).eliminate();
        assert!(!seats.get(SeatId::P2).is_active());
        assert_eq!(seats.joined().count(), 1);
        assert_eq!(seats.active().count(), 0);
    }

    #[test]
    fn test_seat_id_serde() {
        let json = serde_json::to_string(&SeatId::P3).unwrap();
        assert_eq!(json, "3");
        assert!(serde_json::from_str::<SeatId>("7").is_err());
    }
}
