use std::mem;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::SolverConfig;
use crate::error::ConcurrencyFailure;
use crate::grid::Grid;
use crate::index::GridIndex;
use crate::pool::{Scope, TaskPool};
use crate::Path;

/// What every branch of one enumeration shares: the grid, the target and the paths found so far.
struct PathSearch {
    grid: Arc<Grid>,
    dest: GridIndex,
    found: Mutex<Vec<Path>>,
}

/// Every simple path from `source` to `dest`, shortest first. Paths of equal length come in no particular order.
///
/// The search forks one task per onward step, each owning its own copy of the path walked so far,
/// and is done once the pool has drained. It is exhaustive; cost grows exponentially with the number of "on" cells.
pub(crate) fn find_all_paths(
    grid: &Arc<Grid>,
    source: GridIndex,
    dest: GridIndex,
    config: &SolverConfig,
) -> Result<Vec<Path>, ConcurrencyFailure> {
    debug!(%source, %dest, "enumerating all paths");
    if !grid.is_on(source) || !grid.is_on(dest) {
        return Ok(Vec::new());
    }

    let search = Arc::new(PathSearch { grid: Arc::clone(grid), dest, found: Mutex::new(Vec::new()) });
    let pool = TaskPool::new("paths", config)?;
    let handle = pool.handle().clone();

    let root = Arc::clone(&search);
    handle.spawn(move |scope| extend(&root, scope, Vec::new(), source))?;
    pool.shutdown()?;
    if let Some(failure) = handle.failure() {
        return Err(failure);
    }

    let mut paths = mem::take(&mut *search.found.lock().expect("path collector mutex poisoned"));
    paths.sort_by_key(Vec::len);
    debug!(count = paths.len(), "enumerated all paths");
    Ok(paths)
}

// `index` is on and not yet in `path`
fn extend(search: &Arc<PathSearch>, scope: &Scope<'_>, mut path: Path, index: GridIndex) {
    path.push(index);
    if index == search.dest {
        search.found.lock().expect("path collector mutex poisoned").push(path);
        return;
    }

    for next in search.grid.reachables(index) {
        if path.contains(&next) {
            continue;
        }

        let search = Arc::clone(search);
        let branch = path.clone();
        scope.spawn(move |scope| extend(&search, scope, branch, next));
    }
}
