//! Board cells and the fixed-size grid.

use std::fmt;

use crate::error::MoveError;
use crate::game::SeatId;

/// Glyph of an empty, buildable cell.
pub const EMPTY_GLYPH: char = '.';
/// Glyph of a dead seat's spawn cell.
pub const DEAD_GLYPH: char = 'X';
/// Glyph of a destroyed cell.
pub const RUBBLE_GLYPH: char = '█';

/// A cell position on the board.
///
/// The command log writes coordinates as `col row`; in memory they are always
/// addressed row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    /// Row (y).
    pub row: u16,
    /// Column (x).
    pub col: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Get adjacent coordinates (up, down, left, right).
    ///
    /// Returns a fixed-size array and count to avoid heap allocation.
    /// The array contains valid coordinates in indices 0..count.
    #[must_use]
    #[inline]
    pub fn adjacent(&self, width: u16, height: u16) -> ([Coord; 4], u8) {
        let mut result = [Coord::new(0, 0); 4];
        let mut count = 0u8;

        if self.row > 0 {
            result[count as usize] = Coord::new(self.row - 1, self.col); // up
            count += 1;
        }
        if self.row + 1 < height {
            result[count as usize] = Coord::new(self.row + 1, self.col); // down
            count += 1;
        }
        if self.col > 0 {
            result[count as usize] = Coord::new(self.row, self.col - 1); // left
            count += 1;
        }
        if self.col + 1 < width {
            result[count as usize] = Coord::new(self.row, self.col + 1); // right
            count += 1;
        }

        (result, count)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Free cell `.`, the only buildable state.
    #[default]
    Empty,
    /// Spawn of a seat that never joined, `X`. Permanently blocked.
    Dead,
    /// Destroyed by an attack, `█`. Permanently blocked.
    Rubble,
    /// A seat's station: claims adjacency and forms weapon lines.
    Station(SeatId),
    /// A seat's mine: one point of score.
    Mine(SeatId),
}

impl Cell {
    /// The glyph this cell is drawn with.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Cell::Empty => EMPTY_GLYPH,
            Cell::Dead => DEAD_GLYPH,
            Cell::Rubble => RUBBLE_GLYPH,
            Cell::Station(seat) => seat.station_glyph(),
            Cell::Mine(seat) => seat.mine_glyph(),
        }
    }

    /// Parse a glyph back into a cell.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            EMPTY_GLYPH => Some(Cell::Empty),
            DEAD_GLYPH => Some(Cell::Dead),
            RUBBLE_GLYPH => Some(Cell::Rubble),
            _ => SeatId::ALL.into_iter().find_map(|seat| {
                if seat.station_glyph() == glyph {
                    Some(Cell::Station(seat))
                } else if seat.mine_glyph() == glyph {
                    Some(Cell::Mine(seat))
                } else {
                    None
                }
            }),
        }
    }

    /// Seat owning the building on this cell, if any.
    #[must_use]
    pub const fn owner(self) -> Option<SeatId> {
        match self {
            Cell::Station(seat) | Cell::Mine(seat) => Some(seat),
            Cell::Empty | Cell::Dead | Cell::Rubble => None,
        }
    }

    /// Whether this cell holds `seat`'s station.
    #[must_use]
    pub fn is_station_of(self, seat: SeatId) -> bool {
        self == Cell::Station(seat)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// The game board.
///
/// Dimensions are fixed for the lifetime of a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    /// Width of the board in cells.
    width: u16,
    /// Height of the board in cells.
    height: u16,
    /// Cells stored in row-major order.
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a new grid filled with empty cells.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let size = usize::from(width) * usize::from(height);
        Some(Self {
            width,
            height,
            cells: vec![Cell::Empty; size],
        })
    }

    /// Get the width of the grid.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the height of the grid.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Raw cells in row-major order.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Check if a coordinate is within the grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.height && coord.col < self.width
    }

    fn index(&self, coord: Coord) -> Result<usize, MoveError> {
        if self.in_bounds(coord) {
            Ok(usize::from(coord.row) * usize::from(self.width) + usize::from(coord.col))
        } else {
            Err(MoveError::OutOfBounds { coord })
        }
    }

    /// Get the cell at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutOfBounds`] outside `[0,height)×[0,width)`.
    pub fn get(&self, coord: Coord) -> Result<Cell, MoveError> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    /// Set the cell at the given coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::OutOfBounds`] outside `[0,height)×[0,width)`.
    pub fn set(&mut self, coord: Coord, cell: Cell) -> Result<(), MoveError> {
        let idx = self.index(coord)?;
        self.cells[idx] = cell;
        Ok(())
    }

    /// Cell at `coord`, treating anything off-board as absent.
    #[must_use]
    #[inline]
    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        self.get(coord).ok()
    }

    /// Orthogonal neighbours of `coord` that lie on the board.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> {
        let (adjacent, count) = coord.adjacent(self.width, self.height);
        adjacent.into_iter().take(usize::from(count))
    }

    /// Iterate over all coordinates and cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        let width = usize::from(self.width);
        self.cells.iter().enumerate().map(move |(idx, cell)| {
            #[allow(clippy::cast_possible_truncation)]
            let coord = Coord::new((idx / width) as u16, (idx % width) as u16);
            (coord, *cell)
        })
    }

    /// Rows as slices, top to bottom. Restartable, used for rendering.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(usize::from(self.width))
    }

    /// Count cells equal to `cell`.
    #[must_use]
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
