use tracing::debug;

use crate::grid::Grid;
use crate::index::GridIndex;
use crate::step::KingStep;
use crate::Path;

/// Sequential backtracking search for the shortest paths, pruned by the best length found so far.
struct ShortestSearch<'a> {
    grid: &'a Grid,
    dest: GridIndex,
    // only ever lowered; a branch longer than this cannot be among the shortest
    bound: usize,
    found: Vec<Path>,
}

impl ShortestSearch<'_> {
    fn visit(&mut self, index: GridIndex, path: &mut Path) {
        if !self.grid.is_on(index) || path.contains(&index) {
            return;
        }

        path.push(index);
        if path.len() <= self.bound {
            if index == self.dest {
                self.found.push(path.clone());
                self.bound = self.bound.min(path.len());
            } else {
                for next in KingStep::neighbors_of(index) {
                    self.visit(next, path);
                }
            }
        }
        path.pop();
    }
}

/// Every path from `source` to `dest` of minimum length, or nothing if `dest` is unreachable.
pub(crate) fn find_shortest_paths(grid: &Grid, source: GridIndex, dest: GridIndex) -> Vec<Path> {
    let mut search = ShortestSearch { grid, dest, bound: usize::MAX, found: Vec::new() };
    search.visit(source, &mut Vec::new());

    // paths recorded before the bound last tightened are still in the list
    let ShortestSearch { bound, mut found, .. } = search;
    found.retain(|path| path.len() <= bound);

    debug!(%source, %dest, count = found.len(), length = found.first().map(Vec::len), "found shortest paths");
    found
}
