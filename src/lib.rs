//! Evaluation of field definitions at the degrees of freedom of compatible discrete operator
//! schemes on polyhedral meshes.
//!
//! A [`Definition`](definition::Definition) describes a quantity over a zone of cells, as a
//! constant value, an analytic function, an array, a field or a total quantity. The entry
//! points of [`evaluate`] turn it into point values, integrals or mean values located at the
//! vertices, faces or cells of the primal mesh or of its dual.
pub mod cell_mesh;
pub mod context;
pub mod definition;
pub mod error;
pub mod evaluate;
pub mod mesh;
pub mod parallel;
pub mod quadrature;
pub mod reco;
pub mod sample;
pub mod zone;

pub use context::{EvalContext, EvalOptions, FrontierPolicy};
pub use error::EvalError;
pub use evaluate::{evaluate, DofLocation, Reduction};

pub extern crate nalgebra;
