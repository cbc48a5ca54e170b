//! Pointwise evaluation of definitions over a selection of entities.
//!
//! Every function writes `stride` values per selected entity. With an explicit list of ids,
//! values are written at `stride * id` unless `compact` is set, in which case they are
//! written at `stride * i` for the `i`-th selected entity. Entries not addressed by the
//! selection are left untouched.
use crate::context::EvalContext;
use crate::definition::{AnalyticFunction, ArrayInput, ArrayLocation, Field, FieldLocation};
use crate::error::{check_output_len, invalid_support, EvalError};
use crate::reco;
use crate::zone::Selection;
use rayon::prelude::*;

pub mod cellwise;

/// Fills the output entries of every selected entity with `f(id, entry)`.
pub(crate) fn fill_selection<F>(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    stride: usize,
    out: &mut [f64],
    f: F,
) where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    let n = selection.len();
    if n == 0 || stride == 0 {
        return;
    }

    if selection.is_full() || compact {
        out[..n * stride]
            .par_chunks_mut(stride)
            .with_min_len(ctx.min_len())
            .enumerate()
            .for_each(|(i, entry)| f(selection.element(i), entry));
    } else {
        let mut buffer = vec![0.0; n * stride];
        buffer
            .par_chunks_mut(stride)
            .with_min_len(ctx.min_len())
            .enumerate()
            .for_each(|(i, entry)| f(selection.element(i), entry));
        for (id, values) in selection.iter().zip(buffer.chunks_exact(stride)) {
            out[stride * id..stride * (id + 1)].copy_from_slice(values);
        }
    }
}

/// Copies a constant value (scalar, vector or tensor) to every selected entity.
pub fn by_value(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    value: &[f64],
    out: &mut [f64],
) -> Result<(), EvalError> {
    check_output_len("by_value", out, selection.required_len(value.len(), compact))?;
    fill_selection(ctx, selection, compact, value.len(), out, |_, entry| {
        entry.copy_from_slice(value)
    });
    Ok(())
}

/// Samples an analytic function at the centers of the selected cells.
pub fn at_cells_by_analytic(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    dim: usize,
    function: &dyn AnalyticFunction,
    out: &mut [f64],
) -> Result<(), EvalError> {
    check_output_len("at_cells_by_analytic", out, selection.required_len(dim, compact))?;
    let cell_centers = ctx.mesh().quant().cell_centers();
    let time = ctx.time();
    fill_selection(ctx, selection, compact, dim, out, |c_id, entry| {
        function.evaluate(time, &cell_centers[c_id], entry)
    });
    Ok(())
}

/// Samples an analytic function at the selected vertices.
pub fn at_vertices_by_analytic(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    dim: usize,
    function: &dyn AnalyticFunction,
    out: &mut [f64],
) -> Result<(), EvalError> {
    check_output_len("at_vertices_by_analytic", out, selection.required_len(dim, compact))?;
    let vertices = ctx.mesh().quant().vtx_coord();
    let time = ctx.time();
    fill_selection(ctx, selection, compact, dim, out, |v_id, entry| {
        function.evaluate(time, &vertices[v_id], entry)
    });
    Ok(())
}

/// Copies the values of a vertex array at the selected vertices.
pub fn at_vertices_by_array(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    array: &ArrayInput,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "at_vertices_by_array";
    if array.location != ArrayLocation::PrimalVertex {
        return Err(invalid_support(CALLER, format!("array located at {:?}", array.location)));
    }
    array.check_len(CALLER, ctx.mesh())?;
    check_output_len(CALLER, out, selection.required_len(array.stride, compact))?;
    fill_selection(ctx, selection, compact, array.stride, out, |v_id, entry| {
        entry.copy_from_slice(array.entity(v_id))
    });
    Ok(())
}

/// Evaluates a scalar array at the selected cells, reconstructing cell values from vertex
/// values if needed.
pub fn scalar_at_cells_by_array(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    array: &ArrayInput,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "scalar_at_cells_by_array";
    if array.stride != 1 {
        return Err(invalid_support(CALLER, format!("stride {} for a scalar array", array.stride)));
    }
    check_output_len(CALLER, out, selection.required_len(1, compact))?;
    let mesh = ctx.mesh();
    if array.location != ArrayLocation::DualFaceByCell {
        array.check_len(CALLER, mesh)?;
    }
    match array.location {
        ArrayLocation::PrimalCell => fill_selection(ctx, selection, compact, 1, out, |c_id, entry| {
            entry[0] = array.values[c_id]
        }),
        ArrayLocation::PrimalVertex => fill_selection(ctx, selection, compact, 1, out, |c_id, entry| {
            reco::pv_at_cell_center(mesh, c_id, &array.values, 1, entry)
        }),
        ArrayLocation::DualFaceByCell => {
            return Err(invalid_support(CALLER, "dual face arrays define vectors"));
        }
    }
    Ok(())
}

/// Evaluates an array with several values per cell at the selected cells.
///
/// Arrays defined on dual faces are reconstructed as a vector at the cell center.
pub fn nd_at_cells_by_array(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    array: &ArrayInput,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "nd_at_cells_by_array";
    let mesh = ctx.mesh();
    match array.location {
        ArrayLocation::PrimalCell if array.stride > 1 => {
            array.check_len(CALLER, mesh)?;
            check_output_len(CALLER, out, selection.required_len(array.stride, compact))?;
            fill_selection(ctx, selection, compact, array.stride, out, |c_id, entry| {
                entry.copy_from_slice(array.entity(c_id))
            });
        }
        ArrayLocation::DualFaceByCell => {
            array.check_len(CALLER, mesh)?;
            check_output_len(CALLER, out, selection.required_len(3, compact))?;
            fill_selection(ctx, selection, compact, 3, out, |c_id, entry| {
                let vector = reco::dfbyc_at_cell_center(mesh, c_id, &array.values);
                entry.copy_from_slice(vector.as_slice())
            });
        }
        location => {
            return Err(invalid_support(
                CALLER,
                format!("array located at {location:?} with stride {}", array.stride),
            ))
        }
    }
    Ok(())
}

/// Evaluates a vector array at every vertex, as the dual volume weighted average of the
/// vectors of the surrounding cells.
///
/// Only the full selection of vertices is supported.
pub fn vector_at_all_vertices_by_array(
    ctx: &EvalContext,
    selection: Selection,
    array: &ArrayInput,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "vector_at_all_vertices_by_array";
    let mesh = ctx.mesh();
    let n_vertices = mesh.connect().n_vertices();
    if !selection.is_full() || selection.len() < n_vertices {
        return Err(invalid_support(CALLER, "a partial selection of vertices"));
    }
    check_output_len(CALLER, out, 3 * n_vertices)?;

    let n_cells = mesh.connect().n_cells();
    match array.location {
        ArrayLocation::PrimalCell if array.stride == 3 => {
            array.check_len(CALLER, mesh)?;
            reco::cells_to_vertices(mesh, &array.values[..3 * n_cells], 3, out);
        }
        ArrayLocation::DualFaceByCell => {
            array.check_len(CALLER, mesh)?;
            let mut cell_vectors = vec![0.0; 3 * n_cells];
            cell_vectors
                .par_chunks_mut(3)
                .with_min_len(ctx.min_len())
                .enumerate()
                .for_each(|(c_id, entry)| {
                    let vector = reco::dfbyc_at_cell_center(mesh, c_id, &array.values);
                    entry.copy_from_slice(vector.as_slice())
                });
            reco::cells_to_vertices(mesh, &cell_vectors, 3, out);
        }
        location => {
            return Err(invalid_support(
                CALLER,
                format!("array located at {location:?} with stride {}", array.stride),
            ))
        }
    }
    Ok(())
}

/// Evaluates a field at the selected cells, reconstructing cell values from vertex values
/// if needed.
pub fn cell_by_field(
    ctx: &EvalContext,
    selection: Selection,
    compact: bool,
    field: &Field,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "cell_by_field";
    let mesh = ctx.mesh();
    field.check_len(CALLER, mesh)?;
    check_output_len(CALLER, out, selection.required_len(field.dim, compact))?;
    match field.location {
        FieldLocation::Cells => fill_selection(ctx, selection, compact, field.dim, out, |c_id, entry| {
            entry.copy_from_slice(field.entity(c_id))
        }),
        FieldLocation::Vertices => fill_selection(ctx, selection, compact, field.dim, out, |c_id, entry| {
            reco::pv_at_cell_center(mesh, c_id, &field.values, field.dim, entry)
        }),
    }
    Ok(())
}
