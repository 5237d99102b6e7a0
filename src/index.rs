use std::fmt::{Display, Formatter};
use std::num::NonZero;

use ndarray::Ix;

pub(crate) type Coord = usize;
pub(crate) type Dimension = NonZero<Coord>;

/// A cell `(row, col)` on a [`Grid`](crate::Grid). The top left corner is `GridIndex { row: 0, col: 0 }`.
///
/// Indices are plain values; equality, hashing and ordering all go by `(row, col)`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GridIndex {
    /// Zero-based row, counted from the top.
    pub row: Coord,
    /// Zero-based column, counted from the left.
    pub col: Coord,
}

impl GridIndex {
    /// Construct the index at `row`, `col`.
    pub const fn new(row: Coord, col: Coord) -> Self {
        Self { row, col }
    }

    /// Whether this index lies inside a grid of `rows` by `cols` cells.
    pub fn is_valid(&self, rows: Coord, cols: Coord) -> bool {
        self.row < rows && self.col < cols
    }

    /// Whether `other` is one king move away from `self`. An index is not adjacent to itself.
    pub fn is_adjacent(&self, other: GridIndex) -> bool {
        *self != other && self.row.abs_diff(other.row) <= 1 && self.col.abs_diff(other.col) <= 1
    }

    // wrapping: stepping off the top or left edge lands far out of bounds instead of panicking
    pub(crate) fn offset_by(self, rhs: (isize, isize)) -> Self {
        Self::new(self.row.wrapping_add_signed(rhs.0), self.col.wrapping_add_signed(rhs.1))
    }

    pub(crate) fn as_index(&self) -> (Ix, Ix) {
        (self.row, self.col)
    }
}

impl From<(Ix, Ix)> for GridIndex {
    fn from(value: (Ix, Ix)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl Display for GridIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}
