//! Builders for [`Grid`]s, for callers that would rather place features than spell out rows.

use std::num::NonZero;
use std::ops::IndexMut;

use itertools::iproduct;
use ndarray::{Array2, AssignElem};

use crate::grid::Grid;
use crate::index::{Dimension, GridIndex};

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A cell or rectangle was specified outside the bounds given by `dims` on a builder.
    FeatureOutOfBounds,
    /// A rectangle's corners were given in the wrong order.
    InvertedRectangle,
}

/// A builder for [`Grid`]s, for callers that would rather place features than spell out rows.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Once a builder is invalid every further call does nothing and [`Self::build`] reports why.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    // rows, cols
    dims: (Dimension, Dimension),
    cells: Array2<bool>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::with_dims((NonZero::<usize>::MIN.saturating_add(4), NonZero::<usize>::MIN.saturating_add(4)))
    }
}

impl GridBuilder {
    /// Construct a new all-"off" builder with the specified dimensions, specified in `(rows, cols)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::from_elem((dims.0.get(), dims.1.get()), false),
            invalid_reasons: Default::default(),
        }
    }

    #[inline]
    fn in_bounds(&self, index: GridIndex) -> bool {
        index.is_valid(self.dims.0.get(), self.dims.1.get())
    }

    fn set(&mut self, index: GridIndex, on: bool) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(index) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        self.cells.index_mut(index.as_index()).assign_elem(on);
        self
    }

    /// Turn the cell at `index` on.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `index` is out of bounds.
    pub fn switch_on(&mut self, index: GridIndex) -> &mut Self {
        self.set(index, true)
    }

    /// Turn the cell at `index` off, under the same conditions as [`Self::switch_on`].
    pub fn switch_off(&mut self, index: GridIndex) -> &mut Self {
        self.set(index, false)
    }

    /// Turn on every cell of the rectangle spanning `top_left` to `bottom_right`, inclusive.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either corner is out of bounds,
    /// or an [`InvertedRectangle`](BuilderInvalidReason::InvertedRectangle) invalid state if `bottom_right` lies above or left of `top_left`.
    pub fn fill_rect(&mut self, top_left: GridIndex, bottom_right: GridIndex) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(top_left) || !self.in_bounds(bottom_right) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        if top_left.row > bottom_right.row || top_left.col > bottom_right.col {
            self.invalid_reasons.push(BuilderInvalidReason::InvertedRectangle);
            return self;
        }

        for (row, col) in iproduct!(top_left.row..=bottom_right.row, top_left.col..=bottom_right.col) {
            self.cells.index_mut((row, col)).assign_elem(true);
        }

        self
    }

    /// Check the validity of this builder.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`Grid`].
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<Grid, &Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(&self.invalid_reasons);
        }

        Ok(Grid::from(self.cells.clone()))
    }
}
