use super::density::{integrate_in_cell, integrate_in_dual_cells};
use super::potential::{shared_targets, sync_shared};
use super::{analytic_of, array_of, check_case, check_full_output, map_cells, value_of, DofLocation};
use crate::cell_mesh::CellMesh;
use crate::context::EvalContext;
use crate::definition::{ArrayLocation, Definition};
use crate::error::{invalid_support, EvalError};
use crate::parallel::SharedEntity;
use crate::quadrature::{SimplexQuadrature, TetrahedronQuadrature, TriangleQuadrature};
use crate::sample;
use crate::sample::fill_selection;
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Sets a constant value on the faces of the cells of the zone.
pub fn average_on_faces_by_value(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "average_on_faces_by_value";
    check_case(CALLER, location, def, &[DofLocation::PrimalFace], &[1, 3])?;
    let value = value_of(CALLER, def)?;
    check_full_output(CALLER, ctx, location, def.dim(), out)?;

    let targets = shared_targets(CALLER, ctx, def, SharedEntity::Faces)?;
    sample::by_value(ctx, targets.selection(), false, value, out)?;
    sync_shared(ctx, SharedEntity::Faces, def.dim(), out);
    Ok(())
}

/// Mean values of an analytic function over the faces of the cells of the zone.
pub fn average_on_faces_by_analytic(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "average_on_faces_by_analytic";
    check_case(CALLER, location, def, &[DofLocation::PrimalFace], &[1, 3])?;
    let function = analytic_of(CALLER, def)?;
    let quadrature = TriangleQuadrature::from_type(CALLER, def.qtype())?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;

    let mesh = ctx.mesh();
    let face_areas = mesh.quant().face_areas();
    let time = ctx.time();
    let targets = shared_targets(CALLER, ctx, def, SharedEntity::Faces)?;
    fill_selection(ctx, targets.selection(), false, dim, out, |f_id, entry| {
        entry.fill(0.0);
        mesh.for_each_face_sub_triangle(f_id, |triangle, area| {
            quadrature.integrate_analytic(time, triangle, area, function, entry)
        });
        let inv_area = 1.0 / face_areas[f_id];
        entry.iter_mut().for_each(|e| *e *= inv_area);
    });
    sync_shared(ctx, SharedEntity::Faces, dim, out);
    Ok(())
}

/// Sets a constant value on the cells of the zone.
pub fn average_on_cells_by_value(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "average_on_cells_by_value";
    check_case(CALLER, location, def, &[DofLocation::PrimalCell], &[1, 3])?;
    let value = value_of(CALLER, def)?;
    check_full_output(CALLER, ctx, location, def.dim(), out)?;

    let selection = ctx.zone(CALLER, def)?.selection();
    sample::by_value(ctx, selection, false, value, out)
}

/// Copies the values of a cell array on the cells of the zone.
pub fn average_on_cells_by_array(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "average_on_cells_by_array";
    check_case(CALLER, location, def, &[DofLocation::PrimalCell], &[1, 3, 9])?;
    let array = array_of(CALLER, def)?;
    if array.location != ArrayLocation::PrimalCell {
        return Err(invalid_support(CALLER, format!("array located at {:?}", array.location)));
    }
    array.check_len(CALLER, ctx.mesh())?;
    check_full_output(CALLER, ctx, location, array.stride, out)?;

    let selection = ctx.zone(CALLER, def)?.selection();
    fill_selection(ctx, selection, false, array.stride, out, |c_id, entry| {
        entry.copy_from_slice(array.entity(c_id))
    });
    Ok(())
}

/// Mean values of an analytic function over the cells of the zone.
pub fn average_on_cells_by_analytic(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "average_on_cells_by_analytic";
    check_case(CALLER, location, def, &[DofLocation::PrimalCell], &[1, 3])?;
    let function = analytic_of(CALLER, def)?;
    let quadrature = TetrahedronQuadrature::from_type(CALLER, def.qtype())?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;

    let mesh = ctx.mesh();
    let time = ctx.time();
    let selection = ctx.zone(CALLER, def)?.selection();
    let cell_meshes: ThreadLocal<RefCell<CellMesh>> = ThreadLocal::new();
    fill_selection(ctx, selection, false, dim, out, |c_id, entry| {
        let cm = &mut *cell_meshes.get_or_default().borrow_mut();
        cm.build(c_id, mesh);
        integrate_in_cell(cm, time, &quadrature, function, entry);
        let inv_vol = 1.0 / cm.vol_c;
        entry.iter_mut().for_each(|e| *e *= inv_vol);
    });
    Ok(())
}

/// Mean values of an analytic function over the dual cells of the vertices of the zone.
///
/// Dual cells are restricted to the selected cells, so a vertex on the frontier of the zone
/// gets the mean value over the selected part of its dual cell.
pub fn dual_cell_average_by_analytic(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "dual_cell_average_by_analytic";
    check_case(CALLER, location, def, &[DofLocation::DualCell], &[1, 3])?;
    let function = analytic_of(CALLER, def)?;
    let quadrature = TetrahedronQuadrature::from_type(CALLER, def.qtype())?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;

    let n_vertices = ctx.mesh().connect().n_vertices();
    let time = ctx.time();
    let selection = ctx.zone(CALLER, def)?.selection();
    let contributions = map_cells(ctx, selection, |cm| {
        let integrals = integrate_in_dual_cells(cm, time, &quadrature, function, dim);
        let volumes: Vec<f64> = cm.wvc.iter().map(|w| w * cm.vol_c).collect();
        (cm.v_ids.clone(), volumes, integrals)
    });

    let mut integrals = vec![0.0; dim * n_vertices];
    let mut volumes = vec![0.0; n_vertices];
    for (v_ids, cell_volumes, cell_integrals) in contributions {
        for ((v, volume), values) in v_ids.iter().zip(cell_volumes).zip(cell_integrals.chunks_exact(dim)) {
            volumes[*v] += volume;
            for (acc, value) in integrals[dim * v..dim * (v + 1)].iter_mut().zip(values) {
                *acc += value;
            }
        }
    }

    for (v, volume) in volumes.iter().enumerate() {
        if *volume > 0.0 {
            for (o, integral) in out[dim * v..dim * (v + 1)]
                .iter_mut()
                .zip(&integrals[dim * v..dim * (v + 1)])
            {
                *o = integral / volume;
            }
        }
    }
    Ok(())
}
