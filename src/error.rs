use std::any::Any;

use thiserror::Error;

/// Failures surfaced from the worker infrastructure.
///
/// None of these are retried internally; the caller may retry the whole operation.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ConcurrencyFailure {
    /// A worker task panicked. Carries the panic message when it was a string.
    #[error("a threading failure has occurred: worker task panicked: {0}")]
    TaskPanicked(String),
    /// Work was submitted to a pool which no longer accepts submissions.
    #[error("a threading failure has occurred: pool is shutting down")]
    Rejected,
    /// A worker thread could not be spawned or did not exit cleanly.
    #[error("a threading failure has occurred: worker thread lost: {0}")]
    WorkerLost(String),
}

impl ConcurrencyFailure {
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload.downcast_ref::<&str>().map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::TaskPanicked(message)
    }
}

/// Reasons [`count_submarines`](crate::GridSolver::count_submarines) may fail.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum SubmarineError {
    /// See [`ConcurrencyFailure`].
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyFailure),
    /// At least one component is a single cell or does not exactly fill its bounding rectangle.
    #[error("given matrix is not a valid submarine game matrix")]
    InvalidSubmarineMatrix,
}

/// Reasons a [`Grid`](crate::Grid) could not be read from rows or text.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum GridParseError {
    /// A row's length differs from the first row's.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A cell was neither `0` nor `1`.
    #[error("cell ({row},{col}) is {found:?}, expected 0 or 1")]
    BadCell {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        col: usize,
        /// What was found instead.
        found: String,
    },
}
