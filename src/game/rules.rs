//! Legality checks and board evaluation.
//!
//! Everything here is a pure function of the grid. The mutating side lives
//! in [`crate::game::Game`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::IllegalMove;
use crate::game::{Cell, Coord, Grid, SeatId};

/// Which cells an attack may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Only another seat's station.
    #[default]
    EnemyStation,
    /// Any cell that is neither empty nor rubble.
    AnyOccupied,
}

/// Whether firing costs one of the attacker's weapon cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SacrificePolicy {
    /// Every attack names one of the attacker's weapon cells.
    #[default]
    Required,
    /// A sacrifice may be named; if it is, it must be valid.
    Optional,
    /// Attacks never sacrifice; naming one is rejected.
    Disabled,
}

/// Attack rules in force for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackRules {
    /// Valid attack targets.
    pub target: TargetPolicy,
    /// Sacrifice requirement.
    pub sacrifice: SacrificePolicy,
}

impl AttackRules {
    /// Check that `target` may be hit by `attacker`.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove::InvalidTarget`] if the cell is not a legal target.
    pub fn check_target(self, grid: &Grid, attacker: SeatId, target: Coord) -> Result<(), IllegalMove> {
        let cell = grid.cell(target).ok_or(IllegalMove::InvalidTarget)?;
        let legal = match self.target {
            TargetPolicy::EnemyStation => matches!(cell, Cell::Station(owner) if owner != attacker),
            TargetPolicy::AnyOccupied => !matches!(cell, Cell::Empty | Cell::Rubble),
        };
        if legal { Ok(()) } else { Err(IllegalMove::InvalidTarget) }
    }

    /// Check the sacrifice named for an attack by `attacker` on `target`.
    ///
    /// # Errors
    ///
    /// Returns an [`IllegalMove`] when the sacrifice is missing, forbidden,
    /// the same cell as the target, or not one of the attacker's weapon cells.
    pub fn check_sacrifice(
        self,
        grid: &Grid,
        attacker: SeatId,
        weapon_req: usize,
        target: Coord,
        sacrifice: Option<Coord>,
    ) -> Result<(), IllegalMove> {
        match (self.sacrifice, sacrifice) {
            (SacrificePolicy::Required, None) => Err(IllegalMove::MissingSacrifice),
            (SacrificePolicy::Disabled, Some(_)) => Err(IllegalMove::SacrificeNotAllowed),
            (_, None) => Ok(()),
            (_, Some(cell)) if cell == target => Err(IllegalMove::InvalidSacrifice),
            (_, Some(cell)) => {
                if seat_weapon_cells(grid, attacker, weapon_req).contains(&cell) {
                    Ok(())
                } else {
                    Err(IllegalMove::InvalidSacrifice)
                }
            }
        }
    }
}

/// Whether `seat` may build on `coord`: the cell is on the board, empty, and
/// orthogonally touches one of the seat's stations.
///
/// A seat's first station is placed by `JOIN`, not through this check.
#[must_use]
pub fn can_build(grid: &Grid, coord: Coord, seat: SeatId) -> bool {
    if grid.cell(coord) != Some(Cell::Empty) {
        return false;
    }
    grid.neighbors(coord)
        .any(|adj| grid.cell(adj) == Some(Cell::Station(seat)))
}

/// Every cell where `seat` may build, row-major.
pub fn build_cells(grid: &Grid, seat: SeatId) -> impl Iterator<Item = Coord> + '_ {
    grid.iter()
        .filter(|(_, cell)| *cell == Cell::Empty)
        .map(|(coord, _)| coord)
        .filter(move |coord| can_build(grid, *coord, seat))
}

/// Whether `seat` has at least one legal build anywhere.
#[must_use]
pub fn can_player_move(grid: &Grid, seat: SeatId) -> bool {
    build_cells(grid, seat).next().is_some()
}

/// Count of orthogonal neighbours that are still empty.
#[must_use]
pub fn freedom(grid: &Grid, coord: Coord) -> usize {
    grid.neighbors(coord)
        .filter(|adj| grid.cell(*adj) == Some(Cell::Empty))
        .count()
}

/// Walk every row and every column, reporting maximal runs of `seat`'s
/// station as `(start, length, horizontal)`.
fn station_runs(grid: &Grid, seat: SeatId, mut visit: impl FnMut(Coord, usize, bool)) {
    let station = Cell::Station(seat);
    let (width, height) = (grid.width(), grid.height());

    for row in 0..height {
        let mut run = 0usize;
        for col in 0..width {
            if grid.cell(Coord::new(row, col)) == Some(station) {
                run += 1;
            } else {
                if run > 0 {
                    #[allow(clippy::cast_possible_truncation)]
                    visit(Coord::new(row, col - run as u16), run, true);
                }
                run = 0;
            }
        }
        if run > 0 {
            #[allow(clippy::cast_possible_truncation)]
            visit(Coord::new(row, width - run as u16), run, true);
        }
    }

    for col in 0..width {
        let mut run = 0usize;
        for row in 0..height {
            if grid.cell(Coord::new(row, col)) == Some(station) {
                run += 1;
            } else {
                if run > 0 {
                    #[allow(clippy::cast_possible_truncation)]
                    visit(Coord::new(row - run as u16, col), run, false);
                }
                run = 0;
            }
        }
        if run > 0 {
            #[allow(clippy::cast_possible_truncation)]
            visit(Coord::new(height - run as u16, col), run, false);
        }
    }
}

/// Weapon charge: the longest contiguous run of `seat`'s stations in any
/// single row or column.
#[must_use]
pub fn line_power(grid: &Grid, seat: SeatId) -> usize {
    let mut best = 0;
    station_runs(grid, seat, |_, len, _| best = best.max(len));
    best
}

/// Cells of `seat`'s station runs of length at least `weapon_req`.
#[must_use]
pub fn seat_weapon_cells(grid: &Grid, seat: SeatId, weapon_req: usize) -> BTreeSet<Coord> {
    let mut cells = BTreeSet::new();
    station_runs(grid, seat, |start, len, horizontal| {
        if len < weapon_req {
            return;
        }
        for offset in 0..len {
            #[allow(clippy::cast_possible_truncation)]
            let offset = offset as u16;
            let coord = if horizontal {
                Coord::new(start.row, start.col + offset)
            } else {
                Coord::new(start.row + offset, start.col)
            };
            cells.insert(coord);
        }
    });
    cells
}

/// Cells belonging to any seat's weapon-capable run, for every seat in
/// `seats`.
#[must_use]
pub fn weapon_cells(
    grid: &Grid,
    seats: impl IntoIterator<Item = SeatId>,
    weapon_req: usize,
) -> BTreeSet<Coord> {
    seats
        .into_iter()
        .flat_map(|seat| seat_weapon_cells(grid, seat, weapon_req))
        .collect()
}

/// Score: number of `seat`'s mines on the board. Stations score nothing.
#[must_use]
pub fn score(grid: &Grid, seat: SeatId) -> usize {
    grid.count(Cell::Mine(seat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_stations(seat: SeatId, coords: &[(u16, u16)]) -> Grid {
        let mut grid = Grid::new(10, 10).unwrap();
        for &(r, c) in coords {
            grid.set(Coord::new(r, c), Cell::Station(seat)).unwrap();
        }
        grid
    }

    #[test]
    fn test_can_build_requires_adjacent_station() {
        let grid = grid_with_stations(SeatId::P1, &[(1, 1)]);
        assert!(can_build(&grid, Coord::new(1, 2), SeatId::P1));
        assert!(can_build(&grid, Coord::new(0, 1), SeatId::P1));
        assert!(!can_build(&grid, Coord::new(2, 2), SeatId::P1)); // diagonal
        assert!(!can_build(&grid, Coord::new(1, 2), SeatId::P2));
        assert!(!can_build(&grid, Coord::new(1, 1), SeatId::P1)); // occupied
        assert!(!can_build(&grid, Coord::new(10, 1), SeatId::P1));
    }

    #[test]
    fn test_mine_does_not_extend_territory() {
        let mut grid = grid_with_stations(SeatId::P1, &[(1, 1)]);
        grid.set(Coord::new(1, 2), Cell::Mine(SeatId::P1)).unwrap();
        assert!(!can_build(&grid, Coord::new(1, 3), SeatId::P1));
    }

    #[test]
    fn test_line_power_rows_and_columns() {
        let grid = grid_with_stations(
            SeatId::P1,
            &[(1, 1), (1, 2), (1, 3), (3, 5), (4, 5), (5, 5), (6, 5)],
        );
        assert_eq!(line_power(&grid, SeatId::P1), 4);
        assert_eq!(line_power(&grid, SeatId::P2), 0);
    }

    #[test]
    fn test_line_power_broken_run() {
        let mut grid = grid_with_stations(SeatId::P2, &[(0, 0), (0, 1), (0, 3), (0, 4)]);
        assert_eq!(line_power(&grid, SeatId::P2), 2);
        grid.set(Coord::new(0, 2), Cell::Station(SeatId::P2)).unwrap();
        assert_eq!(line_power(&grid, SeatId::P2), 5);
    }

    #[test]
    fn test_weapon_cells_only_long_runs() {
        let grid = grid_with_stations(
            SeatId::P1,
            &[(9, 6), (9, 7), (9, 8), (9, 9), (2, 2), (3, 2)],
        );
        let cells = seat_weapon_cells(&grid, SeatId::P1, 4);
        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&Coord::new(9, 9)));
        assert!(!cells.contains(&Coord::new(2, 2)));

        let all = weapon_cells(&grid, SeatId::ALL, 2);
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_enemy_station_target_policy() {
        let mut grid = grid_with_stations(SeatId::P1, &[(1, 1)]);
        grid.set(Coord::new(5, 5), Cell::Station(SeatId::P2)).unwrap();
        grid.set(Coord::new(5, 6), Cell::Mine(SeatId::P2)).unwrap();
        grid.set(Coord::new(5, 7), Cell::Dead).unwrap();
        let rules = AttackRules::default();

        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(5, 5)).is_ok());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(5, 6)).is_err());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(5, 7)).is_err());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(1, 1)).is_err());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(0, 0)).is_err());
    }

    #[test]
    fn test_any_occupied_target_policy() {
        let mut grid = grid_with_stations(SeatId::P1, &[(1, 1)]);
        grid.set(Coord::new(5, 6), Cell::Mine(SeatId::P2)).unwrap();
        grid.set(Coord::new(5, 7), Cell::Rubble).unwrap();
        let rules = AttackRules {
            target: TargetPolicy::AnyOccupied,
            ..AttackRules::default()
        };

        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(5, 6)).is_ok());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(1, 1)).is_ok());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(5, 7)).is_err());
        assert!(rules.check_target(&grid, SeatId::P1, Coord::new(0, 0)).is_err());
    }

    #[test]
    fn test_sacrifice_policies() {
        let grid = grid_with_stations(SeatId::P1, &[(1, 1), (1, 2), (1, 3), (1, 4), (3, 3)]);
        let target = Coord::new(8, 8);
        let required = AttackRules::default();

        assert_eq!(
            required.check_sacrifice(&grid, SeatId::P1, 4, target, None),
            Err(IllegalMove::MissingSacrifice)
        );
        assert!(required
            .check_sacrifice(&grid, SeatId::P1, 4, target, Some(Coord::new(1, 3)))
            .is_ok());
        assert_eq!(
            required.check_sacrifice(&grid, SeatId::P1, 4, target, Some(Coord::new(3, 3))),
            Err(IllegalMove::InvalidSacrifice)
        );

        let optional = AttackRules {
            sacrifice: SacrificePolicy::Optional,
            ..AttackRules::default()
        };
        assert!(optional.check_sacrifice(&grid, SeatId::P1, 4, target, None).is_ok());

        let disabled = AttackRules {
            sacrifice: SacrificePolicy::Disabled,
            ..AttackRules::default()
        };
        assert_eq!(
            disabled.check_sacrifice(&grid, SeatId::P1, 4, target, Some(Coord::new(1, 1))),
            Err(IllegalMove::SacrificeNotAllowed)
        );
    }

    #[test]
    fn test_score_counts_mines_only() {
        let mut grid = grid_with_stations(SeatId::P3, &[(1, 8), (2, 8)]);
        grid.set(Coord::new(3, 8), Cell::Mine(SeatId::P3)).unwrap();
        grid.set(Coord::new(4, 8), Cell::Mine(SeatId::P3)).unwrap();
        assert_eq!(score(&grid, SeatId::P3), 2);
        assert_eq!(score(&grid, SeatId::P1), 0);
    }

    #[test]
    fn test_can_player_move_boxed_in() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set(Coord::new(0, 0), Cell::Station(SeatId::P1)).unwrap();
        grid.set(Coord::new(0, 1), Cell::Rubble).unwrap();
        grid.set(Coord::new(1, 0), Cell::Mine(SeatId::P2)).unwrap();
        assert!(!can_player_move(&grid, SeatId::P1));
        assert_eq!(freedom(&grid, Coord::new(1, 1)), 2);
    }
}
