use super::{check_case, check_full_output, DofLocation};
use crate::context::{EvalContext, FrontierPolicy};
use crate::definition::{Definition, DefinitionKind};
use crate::error::{invalid_support, EvalError};
use crate::zone::Selection;
use log::{debug, warn};
use rayon::prelude::*;

/// Flags the vertices whose dual cell lies inside the selection of cells.
///
/// `cell_tags` covers local and ghost cells. A vertex of a selected cell is demoted when it
/// belongs to a face shared with a cell outside the selection, and, depending on the
/// policy, to a face on the domain boundary.
fn interior_vertices(ctx: &EvalContext, cell_tags: &[bool], selection: Selection) -> Vec<bool> {
    let connect = ctx.mesh().connect();
    let mut candidates = vec![false; connect.n_vertices()];
    for c_id in selection.iter() {
        for v in connect.c2v().get(c_id).unwrap_or(&[]) {
            candidates[*v] = true;
        }
    }

    let include_boundary = ctx.options().frontier_policy == FrontierPolicy::IncludeBoundaryFaces;
    for c_id in selection.iter() {
        for f_id in connect.c2f().get(c_id).unwrap_or(&[]) {
            let on_frontier = match connect.neighbor(c_id, *f_id) {
                Some(neighbor) => !cell_tags[neighbor],
                None => include_boundary,
            };
            if on_frontier {
                for v in connect.f2v().get(*f_id).unwrap_or(&[]) {
                    candidates[*v] = false;
                }
            }
        }
    }
    candidates
}

/// Sets a uniform value at the vertices whose dual cells lie inside the zone, such that
/// its integral over those dual cells equals the quantity of the definition.
///
/// Vertices on the frontier of the zone are left untouched. If the dual cells inside the
/// zone have no volume, the value is zero.
pub fn potential_by_qov(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "potential_by_qov";
    check_case(CALLER, location, def, &[DofLocation::PrimalVertex], &[1])?;
    let quantity = match def.kind() {
        DefinitionKind::QuantityOverVolume(quantity) => *quantity,
        kind => return Err(invalid_support(CALLER, format!("{kind:?} is not a quantity over a volume"))),
    };
    check_full_output(CALLER, ctx, location, 1, out)?;

    let connect = ctx.mesh().connect();
    let dual_vol = ctx.mesh().quant().dual_vol();
    let sync = ctx.sync();
    let selection = ctx.zone(CALLER, def)?.selection();

    let mut cell_tags = vec![false; connect.n_cells_with_ghosts()];
    for c_id in selection.iter() {
        cell_tags[c_id] = true;
    }
    if sync.n_ranks() > 1 {
        sync.sync_cell_flags(&mut cell_tags);
    }

    let mut candidates = interior_vertices(ctx, &cell_tags, selection);
    if sync.n_ranks() > 1 {
        sync.reduce_vertex_candidates(&mut candidates);
    }

    let c2v = connect.c2v();
    let cell_volumes: Vec<f64> = (0..selection.len())
        .into_par_iter()
        .with_min_len(ctx.min_len())
        .map(|i| {
            c2v.range(selection.element(i))
                .unwrap_or(0..0)
                .filter(|j| candidates[c2v.ids()[*j]])
                .map(|j| dual_vol[j])
                .sum::<f64>()
        })
        .collect();
    let local_volume: f64 = cell_volumes.iter().sum();
    let marked_volume = sync.sum(local_volume);

    let value = if marked_volume > 0.0 {
        quantity / marked_volume
    } else {
        warn!("{CALLER}: the zone has no interior dual volume, the quantity {quantity} cannot be distributed.");
        0.0
    };
    debug!("{CALLER}: distributing {quantity} over a volume of {marked_volume}, value {value}");

    for (o, candidate) in out.iter_mut().zip(&candidates) {
        if *candidate {
            *o = value;
        }
    }
    Ok(())
}
