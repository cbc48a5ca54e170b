use crate::context::EvalContext;
use crate::zone::Selection;
use cdo_adjacency::Adjacency;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// One flag per entity, claimed at most once.
#[derive(Debug)]
pub(crate) struct VisitedSet {
    flags: Vec<AtomicBool>,
}

impl VisitedSet {
    pub fn new(n_entities: usize) -> Self {
        Self {
            flags: (0..n_entities).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Marks the entity as visited. Returns `true` for exactly one caller per entity.
    pub fn claim(&self, id: usize) -> bool {
        self.flags[id]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// The entities reached from the selected cells through `cell_to_entity`, each listed once.
pub(crate) fn collect_unique_targets(
    ctx: &EvalContext,
    cells: Selection,
    n_entities: usize,
    cell_to_entity: &Adjacency<usize>,
) -> Vec<usize> {
    let visited = VisitedSet::new(n_entities);
    (0..cells.len())
        .into_par_iter()
        .with_min_len(ctx.min_len())
        .flat_map_iter(|i| {
            cell_to_entity
                .get(cells.element(i))
                .unwrap_or(&[])
                .iter()
                .copied()
                .filter(|id| visited.claim(*id))
                .collect::<Vec<_>>()
        })
        .collect()
}
