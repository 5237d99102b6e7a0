#![warn(missing_docs)]

//! # `kingsgrid`
//!
//! Connectivity questions over binary grids, where a cell is adjacent to all eight cells around it as a chess king moves.
//! Build a [`Grid`] from rows, text, or a [`GridBuilder`](builder::GridBuilder), wrap it in a [`GridSolver`], and ask:
//!
//! 1. [`components`](GridSolver::components): the maximal connected groups of "on" cells;
//! 2. [`all_paths`](GridSolver::all_paths): every simple path between two cells;
//! 3. [`shortest_paths`](GridSolver::shortest_paths): only the shortest of those;
//! 4. [`count_submarines`](GridSolver::count_submarines): how many components there are, provided each is a filled rectangle of more than one cell.
//!
//! The free functions [`find_components`], [`find_all_paths`], [`find_shortest_paths`] and [`count_submarines`] do the same with a default [`SolverConfig`].
//!
//! # Internals
//! Three of the four operations run on a bounded pool of worker threads created for the call.
//!
//! Components are found by racing flood fills: one task per cell claims unvisited cells for its own component and,
//! on running into a cell some other task claimed first, unites the two components in a disjoint-set forest.
//! Claiming and uniting share one lock, so the partition stays consistent while tasks race.
//!
//! The path enumeration forks a task for every onward step, each branch carrying its own copy of the path so far,
//! and collects whatever reaches the destination. Forks go onto the forking worker's own deque and no task waits on another,
//! so each worker walks its share of the tree depth first with a flat stack, whatever the tree's size.
//!
//! The shortest-path search is sequential: a depth-first backtrack pruned by the best length seen so far.
//!
//! Submarine validation checks each component on its own task while the calling thread drains the verdicts,
//! cancelling the remaining checks at the first invalid component.

use std::collections::HashSet;

pub use builder::{BuilderInvalidReason, GridBuilder};
pub use config::SolverConfig;
pub use error::{ConcurrencyFailure, GridParseError, SubmarineError};
pub use grid::Grid;
pub use index::GridIndex;
pub use solver::GridSolver;
pub use step::KingStep;
pub use submarine::is_valid_submarine;

pub mod builder;
pub(crate) mod component_map;
pub(crate) mod components;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod grid;
pub(crate) mod index;
pub(crate) mod paths;
pub(crate) mod pool;
pub(crate) mod shortest;
pub(crate) mod solver;
pub(crate) mod step;
pub(crate) mod submarine;

/// A maximal set of mutually reachable "on" cells.
pub type Component = HashSet<GridIndex>;

/// A walk from a source to a destination: consecutive cells adjacent, no cell repeated, every cell "on".
pub type Path = Vec<GridIndex>;

/// See [`GridSolver::components`].
pub fn find_components(grid: &Grid) -> Result<Vec<Component>, ConcurrencyFailure> {
    GridSolver::new(grid.clone()).components()
}

/// See [`GridSolver::all_paths`].
pub fn find_all_paths(grid: &Grid, source: GridIndex, dest: GridIndex) -> Result<Vec<Path>, ConcurrencyFailure> {
    GridSolver::new(grid.clone()).all_paths(source, dest)
}

/// See [`GridSolver::shortest_paths`].
pub fn find_shortest_paths(grid: &Grid, source: GridIndex, dest: GridIndex) -> Vec<Path> {
    shortest::find_shortest_paths(grid, source, dest)
}

/// See [`GridSolver::count_submarines`].
pub fn count_submarines(grid: &Grid) -> Result<usize, SubmarineError> {
    GridSolver::new(grid.clone()).count_submarines()
}
