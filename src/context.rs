//! Evaluation context and options.
use crate::definition::Definition;
use crate::error::{invalid_support, EvalError};
use crate::mesh::CdoMesh;
use crate::parallel::{ParallelSync, SerialSync};
use crate::zone::{Zone, ZoneRegistry};
use serde::{Deserialize, Serialize};

/// Which vertices of a selection lie on its frontier when distributing a quantity over a
/// volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FrontierPolicy {
    /// Only vertices of faces shared with a cell outside the selection.
    #[default]
    InteriorFacesOnly,
    /// Additionally, vertices of selected cells on the domain boundary.
    IncludeBoundaryFaces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Minimal number of items handled by a single parallel task.
    pub parallel_threshold: usize,
    pub frontier_policy: FrontierPolicy,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: 128,
            frontier_policy: FrontierPolicy::default(),
        }
    }
}

static SERIAL: SerialSync = SerialSync;

/// Everything an evaluation needs besides the definition itself.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    mesh: &'a CdoMesh,
    zones: &'a ZoneRegistry,
    time: f64,
    sync: &'a dyn ParallelSync,
    options: &'a EvalOptions,
}

static DEFAULT_OPTIONS: EvalOptions = EvalOptions {
    parallel_threshold: 128,
    frontier_policy: FrontierPolicy::InteriorFacesOnly,
};

impl<'a> EvalContext<'a> {
    /// A serial context at time zero with default options.
    pub fn new(mesh: &'a CdoMesh, zones: &'a ZoneRegistry) -> Self {
        Self {
            mesh,
            zones,
            time: 0.0,
            sync: &SERIAL,
            options: &DEFAULT_OPTIONS,
        }
    }

    pub fn with_time(self, time: f64) -> Self {
        Self { time, ..self }
    }

    pub fn with_sync(self, sync: &'a dyn ParallelSync) -> Self {
        Self { sync, ..self }
    }

    pub fn with_options(self, options: &'a EvalOptions) -> Self {
        Self { options, ..self }
    }

    pub fn mesh(&self) -> &'a CdoMesh {
        self.mesh
    }

    pub fn zones(&self) -> &'a ZoneRegistry {
        self.zones
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn sync(&self) -> &'a dyn ParallelSync {
        self.sync
    }

    pub fn options(&self) -> &'a EvalOptions {
        self.options
    }

    /// The zone a definition applies to.
    ///
    /// Fails if the zone selects cells the mesh does not have. A zone covering every cell
    /// must have been registered for exactly as many cells as the mesh.
    pub fn zone(&self, caller: &'static str, def: &Definition) -> Result<&'a Zone, EvalError> {
        let zone = self.zones.by_id(def.zone_id())?;
        let n_cells = self.mesh.connect().n_cells();
        let mismatch = match zone.elt_ids() {
            Some(ids) => ids
                .iter()
                .find(|id| **id >= n_cells)
                .map(|id| format!("zone \"{}\" selects cell {id}", zone.name())),
            None => (zone.n_elts() != n_cells).then(|| format!("zone \"{}\" covers {} cells", zone.name(), zone.n_elts())),
        };
        match mismatch {
            Some(reason) => Err(invalid_support(caller, format!("{reason} of a mesh with {n_cells} cells"))),
            None => Ok(zone),
        }
    }

    pub(crate) fn min_len(&self) -> usize {
        self.options.parallel_threshold.max(1)
    }
}
