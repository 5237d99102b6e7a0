use std::sync::Arc;

use itertools::iproduct;
use tracing::debug;

use crate::component_map::{ComponentMap, Visit};
use crate::config::SolverConfig;
use crate::error::ConcurrencyFailure;
use crate::grid::Grid;
use crate::index::GridIndex;
use crate::pool::TaskPool;
use crate::step::KingStep;
use crate::Component;

/// Partition the "on" cells of `grid` into connected components.
///
/// One exploration task is submitted per cell. Each task flood-fills from its seed, claiming unvisited cells for the
/// seed's component and uniting components wherever its fill runs into cells another task claimed first.
pub(crate) fn find_components(grid: &Arc<Grid>, config: &SolverConfig) -> Result<Vec<Component>, ConcurrencyFailure> {
    let (rows, cols) = grid.dims();
    debug!(rows, cols, "finding connected components");

    let map = Arc::new(ComponentMap::new(grid.dims()));
    let pool = TaskPool::new("components", config)?;
    let handle = pool.handle().clone();

    for (row, col) in iproduct!(0..rows, 0..cols) {
        let grid = Arc::clone(grid);
        let map = Arc::clone(&map);
        handle.execute(move || explore(&grid, &map, GridIndex::new(row, col)))?;
    }

    pool.shutdown()?;
    if let Some(failure) = handle.failure() {
        return Err(failure);
    }

    let components = map.components();
    debug!(count = components.len(), "found connected components");
    Ok(components)
}

fn explore(grid: &Grid, map: &ComponentMap, seed: GridIndex) {
    // (cell, the claimed cell it was reached from); a seed has no predecessor
    let mut frontier = vec![(seed, None)];

    while let Some((cell, predecessor)) = frontier.pop() {
        if !grid.is_on(cell) {
            continue;
        }

        if map.visit(cell, predecessor) == Visit::Claimed {
            frontier.extend(KingStep::neighbors_of(cell).map(|next| (next, Some(cell))));
        }
    }
}
