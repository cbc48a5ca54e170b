//! Definitions of the quantities evaluated by the engine.
use crate::cell_mesh::CellMesh;
use crate::error::{invalid_support, EvalError};
use crate::mesh::CdoMesh;
use crate::quadrature::QuadratureType;
use crate::sample::cellwise;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A function of time and space with values of a fixed dimension.
pub trait AnalyticFunction: Send + Sync {
    /// Evaluates the function at `x`. The length of `out` is the dimension of the function.
    fn evaluate(&self, time: f64, x: &Point3<f64>, out: &mut [f64]);

    /// Evaluates the function at every point, writing `stride` values per point.
    fn evaluate_points(&self, time: f64, points: &[Point3<f64>], stride: usize, out: &mut [f64]) {
        for (x, out) in points.iter().zip(out.chunks_exact_mut(stride)) {
            self.evaluate(time, x, out);
        }
    }
}

impl<F> AnalyticFunction for F
where
    F: Fn(f64, &Point3<f64>, &mut [f64]) + Send + Sync,
{
    fn evaluate(&self, time: f64, x: &Point3<f64>, out: &mut [f64]) {
        self(time, x, out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Support {
    #[default]
    Volume,
    Boundary,
}

/// Location of the values of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayLocation {
    PrimalCell,
    PrimalVertex,
    /// One scalar per (cell, edge) incidence: the flux of a vector through the portion of
    /// the dual face of the edge inside the cell.
    DualFaceByCell,
}

/// Values given by an array at a mesh location, `stride` values per entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInput {
    pub location: ArrayLocation,
    pub stride: usize,
    pub values: Arc<[f64]>,
}

impl ArrayInput {
    pub fn new(location: ArrayLocation, stride: usize, values: impl Into<Arc<[f64]>>) -> Self {
        Self {
            location,
            stride,
            values: values.into(),
        }
    }

    /// The values attached to entity `id`.
    pub fn entity(&self, id: usize) -> &[f64] {
        &self.values[self.stride * id..self.stride * (id + 1)]
    }

    /// Checks that the array holds `stride` values for every entity of its location on `mesh`.
    pub fn check_len(&self, caller: &'static str, mesh: &CdoMesh) -> Result<(), EvalError> {
        let connect = mesh.connect();
        let n_entities = match self.location {
            ArrayLocation::PrimalCell => connect.n_cells(),
            ArrayLocation::PrimalVertex => connect.n_vertices(),
            ArrayLocation::DualFaceByCell => connect.c2e().nnz(),
        };
        let required = self.stride * n_entities;
        if self.values.len() < required {
            return Err(invalid_support(
                caller,
                format!(
                    "array at {:?} holds {} values, {required} are needed",
                    self.location,
                    self.values.len()
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLocation {
    Cells,
    Vertices,
}

/// An existing solution field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub location: FieldLocation,
    pub dim: usize,
    pub values: Vec<f64>,
}

impl Field {
    pub fn new(name: impl Into<String>, location: FieldLocation, dim: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            location,
            dim,
            values,
        }
    }

    pub fn entity(&self, id: usize) -> &[f64] {
        &self.values[self.dim * id..self.dim * (id + 1)]
    }

    /// Checks that the field holds `dim` values for every cell or vertex of `mesh`.
    pub fn check_len(&self, caller: &'static str, mesh: &CdoMesh) -> Result<(), EvalError> {
        let n_entities = match self.location {
            FieldLocation::Cells => mesh.connect().n_cells(),
            FieldLocation::Vertices => mesh.connect().n_vertices(),
        };
        if self.values.len() < self.dim * n_entities {
            return Err(invalid_support(
                caller,
                format!("field \"{}\" holds {} values for {n_entities} entities", self.name, self.values.len()),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub enum DefinitionKind {
    Value(Vec<f64>),
    Analytic(Arc<dyn AnalyticFunction>),
    Array(ArrayInput),
    Field(Arc<Field>),
    /// A total quantity distributed uniformly over the interior of a zone.
    QuantityOverVolume(f64),
}

impl Debug for DefinitionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Analytic(_) => f.debug_tuple("Analytic").field(&"<function>").finish(),
            Self::Array(array) => f
                .debug_struct("Array")
                .field("location", &array.location)
                .field("stride", &array.stride)
                .field("len", &array.values.len())
                .finish(),
            Self::Field(field) => f.debug_tuple("Field").field(&field.name).finish(),
            Self::QuantityOverVolume(quantity) => f.debug_tuple("QuantityOverVolume").field(quantity).finish(),
        }
    }
}

/// How a physical quantity is defined over a zone of the mesh.
#[derive(Debug, Clone)]
pub struct Definition {
    dim: usize,
    support: Support,
    qtype: QuadratureType,
    zone_id: usize,
    kind: DefinitionKind,
}

fn check_dim(dim: usize) -> Result<(), EvalError> {
    if matches!(dim, 1 | 3 | 9) {
        Ok(())
    } else {
        Err(EvalError::InvalidDefinition {
            reason: format!("dimension must be 1, 3 or 9, got {dim}"),
        })
    }
}

impl Definition {
    fn new(dim: usize, zone_id: usize, kind: DefinitionKind) -> Self {
        Self {
            dim,
            support: Support::Volume,
            qtype: QuadratureType::default(),
            zone_id,
            kind,
        }
    }

    /// A constant value, whose length gives the dimension.
    pub fn by_value(zone_id: usize, value: &[f64]) -> Result<Self, EvalError> {
        check_dim(value.len())?;
        Ok(Self::new(value.len(), zone_id, DefinitionKind::Value(value.to_vec())))
    }

    pub fn by_analytic(
        zone_id: usize,
        dim: usize,
        function: impl AnalyticFunction + 'static,
    ) -> Result<Self, EvalError> {
        check_dim(dim)?;
        Ok(Self::new(dim, zone_id, DefinitionKind::Analytic(Arc::new(function))))
    }

    pub fn by_array(zone_id: usize, dim: usize, array: ArrayInput) -> Result<Self, EvalError> {
        check_dim(dim)?;
        if array.stride == 0 || array.values.len() % array.stride != 0 {
            return Err(EvalError::InvalidDefinition {
                reason: format!(
                    "array of length {} is not a multiple of its stride {}",
                    array.values.len(),
                    array.stride
                ),
            });
        }
        match array.location {
            ArrayLocation::DualFaceByCell if array.stride != 1 || dim != 3 => {
                return Err(EvalError::InvalidDefinition {
                    reason: "dual face arrays hold one scalar per cell-edge pair and define a vector".into(),
                })
            }
            ArrayLocation::PrimalCell | ArrayLocation::PrimalVertex if array.stride != dim => {
                return Err(EvalError::InvalidDefinition {
                    reason: format!("array stride {} differs from the dimension {dim}", array.stride),
                })
            }
            _ => {}
        }
        Ok(Self::new(dim, zone_id, DefinitionKind::Array(array)))
    }

    pub fn by_field(zone_id: usize, field: Arc<Field>) -> Result<Self, EvalError> {
        check_dim(field.dim)?;
        if field.values.len() % field.dim != 0 {
            return Err(EvalError::InvalidDefinition {
                reason: format!(
                    "field \"{}\" holds {} values, not a multiple of its dimension {}",
                    field.name,
                    field.values.len(),
                    field.dim
                ),
            });
        }
        Ok(Self::new(field.dim, zone_id, DefinitionKind::Field(field)))
    }

    /// A scalar total `quantity` to distribute over the interior of the zone.
    pub fn by_qov(zone_id: usize, quantity: f64) -> Self {
        Self::new(1, zone_id, DefinitionKind::QuantityOverVolume(quantity))
    }

    pub fn with_quadrature(mut self, qtype: QuadratureType) -> Self {
        self.qtype = qtype;
        self
    }

    pub fn with_support(mut self, support: Support) -> Self {
        self.support = support;
        self
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn support(&self) -> Support {
        self.support
    }

    pub fn qtype(&self) -> QuadratureType {
        self.qtype
    }

    pub fn zone_id(&self) -> usize {
        self.zone_id
    }

    pub fn kind(&self) -> &DefinitionKind {
        &self.kind
    }

    /// Evaluates the definition at the center of the cell described by `cm`, writing `dim`
    /// values into `out`.
    pub fn eval_in_cell(&self, cm: &CellMesh, time: f64, out: &mut [f64]) -> Result<(), EvalError> {
        const CALLER: &str = "Definition::eval_in_cell";
        crate::error::check_output_len(CALLER, out, self.dim)?;
        let out = &mut out[..self.dim];
        match &self.kind {
            DefinitionKind::Value(value) => cellwise::cw_by_value(value, out),
            DefinitionKind::Analytic(function) => cellwise::cw_cell_by_analytic(cm, time, function.as_ref(), out),
            DefinitionKind::Array(array) => cellwise::cw_cell_by_array(cm, array, out)?,
            DefinitionKind::Field(field) => cellwise::cw_cell_by_field(cm, field, out)?,
            DefinitionKind::QuantityOverVolume(_) => {
                return Err(invalid_support(
                    CALLER,
                    "a quantity over a volume has no value in a single cell",
                ))
            }
        }
        Ok(())
    }
}
