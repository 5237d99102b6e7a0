use strum::VariantArray;

use crate::index::GridIndex;

/// The eight king-move directions. Two cells are adjacent when one [`KingStep`] leads from one to the other.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum KingStep {
    /// Row - 1.
    Up,
    /// Row - 1, col + 1.
    UpRight,
    /// Col + 1.
    Right,
    /// Row + 1, col + 1.
    DownRight,
    /// Row + 1.
    Down,
    /// Row + 1, col - 1.
    DownLeft,
    /// Col - 1.
    Left,
    /// Row - 1, col - 1.
    UpLeft,
}

impl KingStep {
    /// `(row, col)` delta of this step.
    pub const fn delta(&self) -> (isize, isize) {
        match self {
            Self::Up => (-1, 0),
            Self::UpRight => (-1, 1),
            Self::Right => (0, 1),
            Self::DownRight => (1, 1),
            Self::Down => (1, 0),
            Self::DownLeft => (1, -1),
            Self::Left => (0, -1),
            Self::UpLeft => (-1, -1),
        }
    }

    /// Attempt the step from `index` in the direction specified by `self` and return the resultant [`GridIndex`].
    ///
    /// No bounds are checked; stepping off the top or left edge wraps to an index which fails [`GridIndex::is_valid`] for any grid that fits in memory.
    pub fn attempt_from(&self, index: GridIndex) -> GridIndex {
        index.offset_by(self.delta())
    }

    /// Invert the direction specified by `self`.
    pub fn invert(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::UpRight => Self::DownLeft,
            Self::Right => Self::Left,
            Self::DownRight => Self::UpLeft,
            Self::Down => Self::Up,
            Self::DownLeft => Self::UpRight,
            Self::Left => Self::Right,
            Self::UpLeft => Self::DownRight,
        }
    }

    /// Determine the direction from `a` to `b`, or [`None`] if the two are not adjacent.
    pub fn direction_to(a: GridIndex, b: GridIndex) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|dir| dir.attempt_from(a) == b)
    }

    /// Every index one step away from `index` in "theory", in [`Self::VARIANTS`] order, bounds unchecked.
    pub fn neighbors_of(index: GridIndex) -> impl Iterator<Item = GridIndex> {
        Self::VARIANTS.iter().map(move |dir| dir.attempt_from(index))
    }
}
