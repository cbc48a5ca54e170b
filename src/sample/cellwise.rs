//! Evaluation of definitions inside a single cell, given by its local view.
use crate::cell_mesh::CellMesh;
use crate::context::EvalContext;
use crate::definition::{AnalyticFunction, ArrayInput, ArrayLocation, Definition, Field, FieldLocation};
use crate::error::{check_output_len, invalid_support, EvalError};
use crate::reco;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Fails unless `values` reaches every entry a cell reads, i.e. the first `required`.
fn check_cell_entries(caller: &'static str, cm: &CellMesh, values: &[f64], required: usize) -> Result<(), EvalError> {
    if values.len() < required {
        return Err(invalid_support(
            caller,
            format!("{} values cannot describe cell {}, {required} are needed", values.len(), cm.c_id),
        ));
    }
    Ok(())
}

/// Length of the prefix of a per-vertex array covering the vertices of the cell.
fn vertex_entries(cm: &CellMesh, stride: usize) -> usize {
    cm.v_ids.iter().max().map_or(0, |v| stride * (v + 1))
}

pub fn cw_by_value(value: &[f64], out: &mut [f64]) {
    out[..value.len()].copy_from_slice(value);
}

/// Samples an analytic function at the cell center.
pub fn cw_cell_by_analytic(cm: &CellMesh, time: f64, function: &dyn AnalyticFunction, out: &mut [f64]) {
    function.evaluate(time, &cm.xc, out);
}

/// Evaluates an array at the cell center. `out` holds one entry per array component, or 3
/// entries for arrays on dual faces.
pub fn cw_cell_by_array(cm: &CellMesh, array: &ArrayInput, out: &mut [f64]) -> Result<(), EvalError> {
    let required = match array.location {
        ArrayLocation::PrimalCell => array.stride * (cm.c_id + 1),
        ArrayLocation::PrimalVertex => vertex_entries(cm, array.stride),
        ArrayLocation::DualFaceByCell => cm.c2e_offset + cm.n_ec(),
    };
    check_cell_entries("cw_cell_by_array", cm, &array.values, required)?;
    match array.location {
        ArrayLocation::PrimalCell => out[..array.stride].copy_from_slice(array.entity(cm.c_id)),
        ArrayLocation::PrimalVertex => reco::cw_pv_at_cell_center(cm, &array.values, array.stride, out),
        ArrayLocation::DualFaceByCell => {
            let vector = reco::cw_dfbyc_in_cell(cm, &array.values);
            out[..3].copy_from_slice(vector.as_slice());
        }
    }
    Ok(())
}

pub fn cw_cell_by_field(cm: &CellMesh, field: &Field, out: &mut [f64]) -> Result<(), EvalError> {
    let required = match field.location {
        FieldLocation::Cells => field.dim * (cm.c_id + 1),
        FieldLocation::Vertices => vertex_entries(cm, field.dim),
    };
    check_cell_entries("cw_cell_by_field", cm, &field.values, required)?;
    match field.location {
        FieldLocation::Cells => out[..field.dim].copy_from_slice(field.entity(cm.c_id)),
        FieldLocation::Vertices => reco::cw_pv_at_cell_center(cm, &field.values, field.dim, out),
    }
    Ok(())
}

/// Samples an analytic function at arbitrary points of the cell, `dim` values per point.
pub fn cw_at_xyz_by_analytic(
    time: f64,
    function: &dyn AnalyticFunction,
    dim: usize,
    points: &[Point3<f64>],
    out: &mut [f64],
) -> Result<(), EvalError> {
    check_output_len("cw_at_xyz_by_analytic", out, dim * points.len())?;
    function.evaluate_points(time, points, dim, out);
    Ok(())
}

fn replicate_vector(vector: &Vector3<f64>, n_points: usize, out: &mut [f64]) {
    for entry in out[..3 * n_points].chunks_exact_mut(3) {
        entry.copy_from_slice(vector.as_slice());
    }
}

/// Writes a constant vector at each of `n_points` points.
pub fn cw_vector_at_xyz_by_value(value: &Vector3<f64>, n_points: usize, out: &mut [f64]) -> Result<(), EvalError> {
    check_output_len("cw_vector_at_xyz_by_value", out, 3 * n_points)?;
    replicate_vector(value, n_points, out);
    Ok(())
}

/// Writes the cell vector defined by a vector array at each of `n_points` points of the cell.
pub fn cw_vector_at_xyz_by_array(
    cm: &CellMesh,
    array: &ArrayInput,
    n_points: usize,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "cw_vector_at_xyz_by_array";
    check_output_len(CALLER, out, 3 * n_points)?;
    if array.location != ArrayLocation::DualFaceByCell && array.stride != 3 {
        return Err(invalid_support(CALLER, format!("stride {} for a vector array", array.stride)));
    }
    let mut vector = Vector3::zeros();
    cw_cell_by_array(cm, array, vector.as_mut_slice())?;
    replicate_vector(&vector, n_points, out);
    Ok(())
}

/// Writes the cell vector defined by a vector field at each of `n_points` points of the cell.
pub fn cw_vector_at_xyz_by_field(
    cm: &CellMesh,
    field: &Field,
    n_points: usize,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "cw_vector_at_xyz_by_field";
    check_output_len(CALLER, out, 3 * n_points)?;
    if field.dim != 3 {
        return Err(invalid_support(CALLER, format!("field \"{}\" of dimension {}", field.name, field.dim)));
    }
    let mut vector = Vector3::zeros();
    cw_cell_by_field(cm, field, vector.as_mut_slice())?;
    replicate_vector(&vector, n_points, out);
    Ok(())
}

/// Evaluates a definition at the center of every cell of its zone, one cell at a time.
///
/// This is the cell-wise counterpart of the potential evaluators at primal cells.
pub fn eval_cells(ctx: &EvalContext, def: &Definition, compact: bool, out: &mut [f64]) -> Result<(), EvalError> {
    const CALLER: &str = "eval_cells";
    let zone = ctx.zone(CALLER, def)?;
    let selection = zone.selection();
    let dim = def.dim();
    check_output_len(CALLER, out, selection.required_len(dim, compact))?;

    let mesh = ctx.mesh();
    let time = ctx.time();
    let cell_meshes: ThreadLocal<RefCell<CellMesh>> = ThreadLocal::new();
    let mut buffer = vec![0.0; dim * selection.len()];
    buffer
        .par_chunks_mut(dim.max(1))
        .with_min_len(ctx.min_len())
        .enumerate()
        .try_for_each(|(i, entry)| {
            let cm = &mut *cell_meshes.get_or_default().borrow_mut();
            cm.build(selection.element(i), mesh);
            def.eval_in_cell(cm, time, entry)
        })?;

    for (i, values) in buffer.chunks_exact(dim.max(1)).enumerate() {
        let index = selection.output_index(i, compact);
        out[dim * index..dim * (index + 1)].copy_from_slice(values);
    }
    Ok(())
}
