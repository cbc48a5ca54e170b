use super::visited::collect_unique_targets;
use super::{analytic_of, array_of, check_case, check_full_output, field_of, value_of, DofLocation};
use crate::context::EvalContext;
use crate::definition::{ArrayLocation, Definition, FieldLocation};
use crate::error::{invalid_support, EvalError};
use crate::parallel::SharedEntity;
use crate::reco;
use crate::sample;
use crate::sample::fill_selection;
use crate::zone::Selection;
use log::debug;

const POTENTIAL_LOCATIONS: [DofLocation; 4] = [
    DofLocation::PrimalVertex,
    DofLocation::PrimalFace,
    DofLocation::PrimalCell,
    DofLocation::DualVertex,
];

/// Vertices or faces reached from the cells of a zone, each listed once.
///
/// The ids are owned by the returned value unless the zone covers the whole mesh.
pub(super) enum Targets {
    All(usize),
    Unique(Vec<usize>),
}

impl Targets {
    pub fn selection(&self) -> Selection<'_> {
        match self {
            Self::All(n) => Selection::all(*n),
            Self::Unique(ids) => Selection::from_ids(ids),
        }
    }
}

pub(super) fn shared_targets(
    caller: &'static str,
    ctx: &EvalContext,
    def: &Definition,
    entity: SharedEntity,
) -> Result<Targets, EvalError> {
    let zone = ctx.zone(caller, def)?;
    let connect = ctx.mesh().connect();
    let (n_entities, cell_to_entity) = match entity {
        SharedEntity::Vertices => (connect.n_vertices(), connect.c2v()),
        SharedEntity::Faces => (connect.n_faces(), connect.c2f()),
    };
    if zone.is_full() {
        debug!("{caller}: zone \"{}\" covers the mesh, evaluating all {entity:?}", zone.name());
        Ok(Targets::All(n_entities))
    } else {
        let ids = collect_unique_targets(ctx, zone.selection(), n_entities, cell_to_entity);
        Ok(Targets::Unique(ids))
    }
}

pub(super) fn sync_shared(ctx: &EvalContext, entity: SharedEntity, stride: usize, out: &mut [f64]) {
    let sync = ctx.sync();
    if sync.n_ranks() > 1 {
        sync.sync_shared(entity, stride, out);
    }
}

fn shared_entity(location: DofLocation) -> Option<SharedEntity> {
    match location {
        DofLocation::PrimalVertex => Some(SharedEntity::Vertices),
        DofLocation::PrimalFace => Some(SharedEntity::Faces),
        _ => None,
    }
}

/// Samples an analytic function at the vertices, faces or cells reached by the zone.
///
/// Each vertex or face is evaluated once, however many selected cells share it.
pub fn potential_by_analytic(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "potential_by_analytic";
    check_case(CALLER, location, def, &POTENTIAL_LOCATIONS, &[1, 3])?;
    let function = analytic_of(CALLER, def)?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;

    match shared_entity(location) {
        Some(entity) => {
            let targets = shared_targets(CALLER, ctx, def, entity)?;
            match entity {
                SharedEntity::Vertices => {
                    sample::at_vertices_by_analytic(ctx, targets.selection(), false, dim, function, out)?
                }
                SharedEntity::Faces => {
                    let face_centers = ctx.mesh().quant().face_centers();
                    let time = ctx.time();
                    fill_selection(ctx, targets.selection(), false, dim, out, |f_id, entry| {
                        function.evaluate(time, &face_centers[f_id], entry)
                    });
                }
            }
            sync_shared(ctx, entity, dim, out);
        }
        None => {
            let selection = ctx.zone(CALLER, def)?.selection();
            sample::at_cells_by_analytic(ctx, selection, false, dim, function, out)?;
        }
    }
    Ok(())
}

/// Sets a constant value at the vertices, faces or cells reached by the zone.
pub fn potential_by_value(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "potential_by_value";
    check_case(CALLER, location, def, &POTENTIAL_LOCATIONS, &[1, 3])?;
    let value = value_of(CALLER, def)?;
    check_full_output(CALLER, ctx, location, def.dim(), out)?;

    match shared_entity(location) {
        Some(entity) => {
            let targets = shared_targets(CALLER, ctx, def, entity)?;
            sample::by_value(ctx, targets.selection(), false, value, out)?;
            sync_shared(ctx, entity, def.dim(), out);
        }
        None => {
            let selection = ctx.zone(CALLER, def)?.selection();
            sample::by_value(ctx, selection, false, value, out)?;
        }
    }
    Ok(())
}

/// Evaluates an array at the vertices or cells reached by the zone.
///
/// Cell values are copied or reconstructed from vertex or dual face values. Vertex values
/// are copied, or reconstructed from cell values when the zone covers the whole mesh.
pub fn potential_by_array(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "potential_by_array";
    let locations = [DofLocation::PrimalVertex, DofLocation::PrimalCell, DofLocation::DualVertex];
    check_case(CALLER, location, def, &locations, &[1, 3, 9])?;
    let array = array_of(CALLER, def)?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;
    let mesh = ctx.mesh();
    array.check_len(CALLER, mesh)?;

    if location == DofLocation::PrimalVertex {
        let targets = shared_targets(CALLER, ctx, def, SharedEntity::Vertices)?;
        match (array.location, &targets) {
            (ArrayLocation::PrimalVertex, _) => {
                sample::at_vertices_by_array(ctx, targets.selection(), false, array, out)?;
            }
            (ArrayLocation::DualFaceByCell, Targets::All(_)) => {
                sample::vector_at_all_vertices_by_array(ctx, targets.selection(), array, out)?;
            }
            (ArrayLocation::PrimalCell, Targets::All(_)) => {
                let n_cells = mesh.connect().n_cells();
                reco::cells_to_vertices(mesh, &array.values[..dim * n_cells], dim, out);
            }
            (array_location, _) => {
                return Err(invalid_support(
                    CALLER,
                    format!("array at {array_location:?} evaluated at the vertices of a partial zone"),
                ))
            }
        }
        sync_shared(ctx, SharedEntity::Vertices, dim, out);
    } else {
        let selection = ctx.zone(CALLER, def)?.selection();
        match array.location {
            ArrayLocation::PrimalVertex if array.stride > 1 => {
                fill_selection(ctx, selection, false, dim, out, |c_id, entry| {
                    reco::pv_at_cell_center(mesh, c_id, &array.values, dim, entry)
                });
            }
            ArrayLocation::PrimalCell | ArrayLocation::PrimalVertex if array.stride == 1 => {
                sample::scalar_at_cells_by_array(ctx, selection, false, array, out)?
            }
            _ => sample::nd_at_cells_by_array(ctx, selection, false, array, out)?,
        }
    }
    Ok(())
}

/// Evaluates a field at the vertices or cells reached by the zone.
pub fn potential_by_field(
    ctx: &EvalContext,
    location: DofLocation,
    def: &Definition,
    out: &mut [f64],
) -> Result<(), EvalError> {
    const CALLER: &str = "potential_by_field";
    let locations = [DofLocation::PrimalVertex, DofLocation::PrimalCell, DofLocation::DualVertex];
    check_case(CALLER, location, def, &locations, &[1, 3, 9])?;
    let field = field_of(CALLER, def)?;
    let dim = def.dim();
    check_full_output(CALLER, ctx, location, dim, out)?;
    let mesh = ctx.mesh();
    field.check_len(CALLER, mesh)?;

    if location == DofLocation::PrimalVertex {
        let targets = shared_targets(CALLER, ctx, def, SharedEntity::Vertices)?;
        match (field.location, &targets) {
            (FieldLocation::Vertices, _) => {
                fill_selection(ctx, targets.selection(), false, dim, out, |v_id, entry| {
                    entry.copy_from_slice(field.entity(v_id))
                });
            }
            (FieldLocation::Cells, Targets::All(_)) => {
                let n_cells = mesh.connect().n_cells();
                reco::cells_to_vertices(mesh, &field.values[..dim * n_cells], dim, out);
            }
            (FieldLocation::Cells, Targets::Unique(_)) => {
                return Err(invalid_support(
                    CALLER,
                    format!("cell field \"{}\" evaluated at the vertices of a partial zone", field.name),
                ))
            }
        }
        sync_shared(ctx, SharedEntity::Vertices, dim, out);
    } else {
        let selection = ctx.zone(CALLER, def)?.selection();
        sample::cell_by_field(ctx, selection, false, field, out)?;
    }
    Ok(())
}
