//! Evaluation of definitions at the degrees of freedom of a discretization.
//!
//! Every entry point takes an [`EvalContext`], the location of the degrees of freedom, a
//! [`Definition`] and an output buffer sized for every entity at that location. Only the
//! entries addressed by the zone of the definition are written.
use crate::cell_mesh::CellMesh;
use crate::context::EvalContext;
use crate::definition::{AnalyticFunction, ArrayInput, Definition, DefinitionKind, Field, Support};
use crate::error::{check_output_len, invalid_support, EvalError};
use crate::zone::Selection;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use thread_local::ThreadLocal;

mod average;
mod density;
mod potential;
mod qov;
mod visited;

pub use average::*;
pub use density::*;
pub use potential::*;
pub use qov::*;

/// Location of degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DofLocation {
    PrimalVertex,
    PrimalFace,
    PrimalCell,
    /// Dual vertices coincide with primal cells.
    DualVertex,
    /// Dual cells are attached to primal vertices.
    DualCell,
}

/// What the degrees of freedom represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reduction {
    /// Integrals over the entities.
    Density,
    /// Point values at the entities.
    Potential,
    /// Mean values over the entities.
    Average,
}

/// Evaluates a definition of any kind, dispatching to the matching entry point.
pub fn evaluate(
    ctx: &EvalContext,
    reduction: Reduction,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    use DefinitionKind as K;
    use DofLocation as L;
    use Reduction as R;
    match (reduction, def.kind(), location) {
        (R::Density, K::Value(_), _) => density_by_value(ctx, location, def, out),
        (R::Density, K::Analytic(_), _) => density_by_analytic(ctx, location, def, out),
        (R::Potential, K::Value(_), _) => potential_by_value(ctx, location, def, out),
        (R::Potential, K::Analytic(_), _) => potential_by_analytic(ctx, location, def, out),
        (R::Potential, K::Array(_), _) => potential_by_array(ctx, location, def, out),
        (R::Potential, K::Field(_), _) => potential_by_field(ctx, location, def, out),
        (R::Potential, K::QuantityOverVolume(_), _) => potential_by_qov(ctx, location, def, out),
        (R::Average, K::Value(_), L::PrimalFace) => average_on_faces_by_value(ctx, location, def, out),
        (R::Average, K::Analytic(_), L::PrimalFace) => average_on_faces_by_analytic(ctx, location, def, out),
        (R::Average, K::Value(_), _) => average_on_cells_by_value(ctx, location, def, out),
        (R::Average, K::Array(_), _) => average_on_cells_by_array(ctx, location, def, out),
        (R::Average, K::Analytic(_), L::DualCell) => dual_cell_average_by_analytic(ctx, location, def, out),
        (R::Average, K::Analytic(_), _) => average_on_cells_by_analytic(ctx, location, def, out),
        (_, kind, _) => Err(invalid_support(
            "evaluate",
            format!("{reduction:?} of a definition {kind:?} at {location:?}"),
        )),
    }
}

fn check_volume_support(caller: &'static str, def: &Definition) -> Result<(), EvalError> {
    match def.support() {
        Support::Volume => Ok(()),
        Support::Boundary => Err(invalid_support(caller, "a definition on the boundary")),
    }
}

/// Checks that the evaluator handles the location and the dimension of the definition.
fn check_case(
    caller: &'static str,
    location: DofLocation,
    def: &Definition,
    locations: &[DofLocation],
    dims: &[usize],
) -> Result<(), EvalError> {
    check_volume_support(caller, def)?;
    if locations.contains(&location) && dims.contains(&def.dim()) {
        Ok(())
    } else {
        Err(EvalError::NotHandled {
            caller,
            location,
            dim: def.dim(),
        })
    }
}

fn check_full_output(
    caller: &'static str,
    ctx: &EvalContext,
    location: DofLocation,
    stride: usize,
    out: &[f64],
) -> Result<(), EvalError> {
    check_output_len(caller, out, ctx.mesh().n_entities(location) * stride)
}

fn value_of<'a>(caller: &'static str, def: &'a Definition) -> Result<&'a [f64], EvalError> {
    match def.kind() {
        DefinitionKind::Value(value) => Ok(value.as_slice()),
        kind => Err(invalid_support(caller, format!("{kind:?} is not a constant value"))),
    }
}

fn analytic_of<'a>(caller: &'static str, def: &'a Definition) -> Result<&'a dyn AnalyticFunction, EvalError> {
    match def.kind() {
        DefinitionKind::Analytic(function) => Ok(function.as_ref()),
        kind => Err(invalid_support(caller, format!("{kind:?} is not an analytic function"))),
    }
}

fn array_of<'a>(caller: &'static str, def: &'a Definition) -> Result<&'a ArrayInput, EvalError> {
    match def.kind() {
        DefinitionKind::Array(array) => Ok(array),
        kind => Err(invalid_support(caller, format!("{kind:?} is not an array"))),
    }
}

fn field_of<'a>(caller: &'static str, def: &'a Definition) -> Result<&'a Field, EvalError> {
    match def.kind() {
        DefinitionKind::Field(field) => Ok(field.as_ref()),
        kind => Err(invalid_support(caller, format!("{kind:?} is not a field"))),
    }
}

/// Computes `f` on the local view of every selected cell, in parallel.
///
/// The results are returned in the order of the selection.
fn map_cells<T, F>(ctx: &EvalContext, selection: Selection, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&CellMesh) -> T + Send + Sync,
{
    let mesh = ctx.mesh();
    let cell_meshes: ThreadLocal<RefCell<CellMesh>> = ThreadLocal::new();
    (0..selection.len())
        .into_par_iter()
        .with_min_len(ctx.min_len())
        .map(|i| {
            let cm = &mut *cell_meshes.get_or_default().borrow_mut();
            cm.build(selection.element(i), mesh);
            f(cm)
        })
        .collect()
}
