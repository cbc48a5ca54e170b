use super::{analytic_of, check_case, check_full_output, map_cells, value_of, DofLocation};
use crate::cell_mesh::CellMesh;
use crate::context::EvalContext;
use crate::definition::{AnalyticFunction, Definition};
use crate::error::EvalError;
use crate::quadrature::{SimplexQuadrature, TetrahedronQuadrature};
use crate::sample::fill_selection;

const DENSITY_LOCATIONS: [DofLocation; 2] = [DofLocation::PrimalCell, DofLocation::DualCell];

/// Integral of `function` over the cell.
pub(crate) fn integrate_in_cell(
    cm: &CellMesh,
    time: f64,
    quadrature: &TetrahedronQuadrature,
    function: &dyn AnalyticFunction,
    out: &mut [f64],
) {
    out.fill(0.0);
    cm.for_each_sub_tetrahedron(|tet, volume| quadrature.integrate_analytic(time, tet, volume, function, out));
}

/// Integrals of `function` over the portions of the dual cells of the cell vertices inside
/// the cell, `dim` values per local vertex.
pub(crate) fn integrate_in_dual_cells(
    cm: &CellMesh,
    time: f64,
    quadrature: &TetrahedronQuadrature,
    function: &dyn AnalyticFunction,
    dim: usize,
) -> Vec<f64> {
    let mut integrals = vec![0.0; dim * cm.n_vc()];
    cm.for_each_dual_sub_tetrahedron(|v, tet, volume| {
        let acc = &mut integrals[dim * v..dim * (v + 1)];
        quadrature.integrate_analytic(time, tet, volume, function, acc)
    });
    integrals
}

/// Adds the integrals of an analytic function over the primal or dual cells reached by the
/// zone of the definition.
///
/// Dual cells accumulate the contributions of every selected cell they intersect.
pub fn density_by_analytic(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "density_by_analytic";
    check_case(CALLER, location, def, &DENSITY_LOCATIONS, &[1, 3])?;
    let function = analytic_of(CALLER, def)?;
    let quadrature = TetrahedronQuadrature::from_type(CALLER, def.qtype())?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;

    let selection = ctx.zone(CALLER, def)?.selection();
    let time = ctx.time();
    match location {
        DofLocation::PrimalCell => {
            let integrals = map_cells(ctx, selection, |cm| {
                let mut integral = [0.0; 3];
                integrate_in_cell(cm, time, &quadrature, function, &mut integral[..dim]);
                integral
            });
            for (c_id, integral) in selection.iter().zip(integrals) {
                for (o, value) in out[dim * c_id..dim * (c_id + 1)].iter_mut().zip(integral) {
                    *o += value;
                }
            }
        }
        _ => {
            let integrals = map_cells(ctx, selection, |cm| {
                let integrals = integrate_in_dual_cells(cm, time, &quadrature, function, dim);
                (cm.v_ids.clone(), integrals)
            });
            for (v_ids, integrals) in integrals {
                for (v, values) in v_ids.iter().zip(integrals.chunks_exact(dim)) {
                    for (o, value) in out[dim * v..dim * (v + 1)].iter_mut().zip(values) {
                        *o += value;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Integrals of a constant value over the primal or dual cells reached by the zone.
///
/// Primal cells are overwritten with `|c| * value`, whereas dual cells accumulate
/// `|c ∩ dual(v)| * value` over the selected cells.
pub fn density_by_value(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "density_by_value";
    check_case(CALLER, location, def, &DENSITY_LOCATIONS, &[1, 3])?;
    let value = value_of(CALLER, def)?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;

    let mesh = ctx.mesh();
    let selection = ctx.zone(CALLER, def)?.selection();
    match location {
        DofLocation::PrimalCell => {
            let cell_vol = mesh.quant().cell_vol();
            fill_selection(ctx, selection, false, dim, out, |c_id, entry| {
                for (e, v) in entry.iter_mut().zip(value) {
                    *e = cell_vol[c_id] * v;
                }
            });
        }
        _ => {
            let c2v = mesh.connect().c2v();
            let dual_vol = mesh.quant().dual_vol();
            for c_id in selection.iter() {
                for j in c2v.range(c_id).unwrap_or(0..0) {
                    let v = c2v.ids()[j];
                    for (o, k) in out[dim * v..dim * (v + 1)].iter_mut().zip(value) {
                        *o += dual_vol[j] * k;
                    }
                }
            }
        }
    }
    Ok(())
}
