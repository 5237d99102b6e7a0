use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use ndarray::Array2;

use crate::error::GridParseError;
use crate::index::{Coord, GridIndex};
use crate::step::KingStep;

/// An immutable rectangular grid of binary cells. A cell is "on" when `true`.
///
/// Grids are built from rows ([`Grid::from_rows`]), text ([`str::parse`]), an [`ndarray::Array2`], or a [`GridBuilder`](crate::builder::GridBuilder).
/// Nothing in this crate mutates a grid once built.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Grid {
    pub(crate) cells: Array2<bool>,
}

impl Grid {
    /// Build a grid from rows of `0`/`1` values; any nonzero value counts as "on".
    ///
    /// Every row must have as many cells as the first. No rows at all is an empty `0 x 0` grid.
    pub fn from_rows<R, T>(rows: &[R]) -> Result<Self, GridParseError>
    where
        R: AsRef<[T]>,
        T: Copy + Into<u32>,
    {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        for (row, cells) in rows.iter().enumerate() {
            if cells.as_ref().len() != cols {
                return Err(GridParseError::Ragged { row, expected: cols, found: cells.as_ref().len() });
            }
        }

        Ok(Self {
            cells: Array2::from_shape_fn((rows.len(), cols), |(r, c)| Into::<u32>::into(rows[r].as_ref()[c]) != 0),
        })
    }

    /// `(rows, cols)`.
    pub fn dims(&self) -> (Coord, Coord) {
        self.cells.dim()
    }

    /// Number of rows.
    pub fn rows(&self) -> Coord {
        self.cells.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> Coord {
        self.cells.ncols()
    }

    /// Whether `index` lies inside this grid.
    pub fn contains(&self, index: GridIndex) -> bool {
        index.is_valid(self.rows(), self.cols())
    }

    /// Whether the cell at `index` is "on". Out-of-bounds indices are never on.
    pub fn is_on(&self, index: GridIndex) -> bool {
        self.cells.get(index.as_index()).copied().unwrap_or(false)
    }

    /// All "on" cells in row-major order.
    pub fn on_cells(&self) -> impl Iterator<Item = GridIndex> + '_ {
        self.cells.indexed_iter()
            .filter(|(_, on)| **on)
            .map(|(ind, _)| GridIndex::from(ind))
    }

    /// All in-bounds king-move neighbours of `index`, on or off.
    pub fn adjacent_indices(&self, index: GridIndex) -> Vec<GridIndex> {
        KingStep::neighbors_of(index)
            .filter(|neighbor| self.contains(*neighbor))
            .collect_vec()
    }

    /// The neighbours of `index` a path could step to next, i.e. in-bounds and "on".
    pub fn reachables(&self, index: GridIndex) -> Vec<GridIndex> {
        KingStep::neighbors_of(index)
            .filter(|neighbor| self.is_on(*neighbor))
            .collect_vec()
    }
}

impl From<Array2<bool>> for Grid {
    fn from(cells: Array2<bool>) -> Self {
        Self { cells }
    }
}

impl FromStr for Grid {
    type Err = GridParseError;

    /// One row per non-blank line, one `0` or `1` per cell; other whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s.lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect_vec())
            .filter(|row| !row.is_empty())
            .enumerate()
            .map(|(row, chars)| chars.into_iter()
                .enumerate()
                .map(|(col, c)| match c {
                    '0' => Ok(0u8),
                    '1' => Ok(1u8),
                    other => Err(GridParseError::BadCell { row, col, found: other.to_string() }),
                })
                .collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rows(&rows)
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = String::with_capacity(self.rows() * (self.cols() + 1));

        for row in self.cells.rows() {
            for on in row {
                out.push(if *on { '1' } else { '0' });
            }
            out.push('\n');
        }

        write!(f, "{out}")
    }
}
