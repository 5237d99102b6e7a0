use std::collections::HashSet;
use std::sync::Mutex;

use itertools::Itertools;
use ndarray::Array2;
use petgraph::unionfind::UnionFind;
use tracing::trace;

use crate::index::{Coord, GridIndex};
use crate::Component;

pub(crate) type ComponentId = usize;

/// What [`ComponentMap::visit`] did with a cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Visit {
    /// The cell was unvisited and now belongs to a component; the caller should continue into its neighbours.
    Claimed,
    /// The cell already belonged to a component other than its predecessor's, and the two were united.
    Merged,
    /// The cell was already visited and nothing changed.
    Settled,
}

struct MapState {
    owners: Array2<Option<ComponentId>>,
    // every claim without a predecessor opens a new id, so there are never more ids than cells
    sets: UnionFind<ComponentId>,
    next_id: ComponentId,
}

/// Which component owns each cell, shared by every exploration task.
///
/// Claiming and merging happen under one lock, so each [`Self::visit`] is atomic as seen by any other task.
pub(crate) struct ComponentMap {
    state: Mutex<MapState>,
}

impl ComponentMap {
    pub(crate) fn new(dims: (Coord, Coord)) -> Self {
        Self {
            state: Mutex::new(MapState {
                owners: Array2::from_elem(dims, None),
                sets: UnionFind::new(dims.0 * dims.1),
                next_id: 0,
            }),
        }
    }

    /// Claim `cell`, reached from `predecessor` (or seeded, if `None`), or unite its component with the predecessor's.
    ///
    /// `predecessor` must already have been claimed. `cell` must be in bounds.
    pub(crate) fn visit(&self, cell: GridIndex, predecessor: Option<GridIndex>) -> Visit {
        let mut state = self.state.lock().expect("component map mutex poisoned");
        let from = predecessor.and_then(|p| state.owners[p.as_index()]);
        let owner = state.owners[cell.as_index()];

        match owner {
            None => {
                let id = from.unwrap_or_else(|| {
                    let id = state.next_id;
                    state.next_id += 1;
                    id
                });
                state.owners[cell.as_index()] = Some(id);
                Visit::Claimed
            }
            Some(owner) => match from {
                Some(from) if state.sets.union(from, owner) => {
                    trace!(%cell, from, owner, "merged components");
                    Visit::Merged
                }
                _ => Visit::Settled,
            },
        }
    }

    /// One set of cells per surviving component, in no particular order.
    pub(crate) fn components(&self) -> Vec<Component> {
        let mut state = self.state.lock().expect("component map mutex poisoned");
        let MapState { owners, sets, .. } = &mut *state;

        owners.indexed_iter()
            .filter_map(|(ind, owner)| owner.map(|id| (sets.find_mut(id), GridIndex::from(ind))))
            .into_group_map()
            .into_values()
            .map(|cells| cells.into_iter().collect::<HashSet<_>>())
            .collect_vec()
    }
}
