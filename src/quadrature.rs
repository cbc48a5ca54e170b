//! Quadrature on the tetrahedra and triangles that decompose cells and faces.
use crate::definition::AnalyticFunction;
use crate::error::EvalError;
use cdo_quadrature::simplex;
use nalgebra::Point3;
use num::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{AddAssign, Mul};
use std::str::FromStr;

/// Requested precision of the integration of an analytic function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureType {
    /// No integration: analytic functions can only be sampled pointwise.
    None,
    /// One point at the barycenter of each simplex.
    #[default]
    Bary,
    /// One point at the barycenter of each simplex of the cell subdivision.
    BarySubdiv,
    /// Rules with equal weights, exact for quadratic polynomials.
    Higher,
    /// The most accurate rules available, exact for cubic polynomials.
    Highest,
}

impl QuadratureType {
    /// The polynomial degree integrated exactly, or `None` if no integration is requested.
    pub fn strength(&self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Bary | Self::BarySubdiv => Some(1),
            Self::Higher => Some(2),
            Self::Highest => Some(3),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bary => "bary",
            Self::BarySubdiv => "bary_subdiv",
            Self::Higher => "higher",
            Self::Highest => "highest",
        }
    }
}

impl Display for QuadratureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseQuadratureTypeError {
    input: String,
}

impl Display for ParseQuadratureTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown quadrature type \"{}\"", self.input)
    }
}

impl std::error::Error for ParseQuadratureTypeError {}

impl FromStr for QuadratureType {
    type Err = ParseQuadratureTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "bary" => Ok(Self::Bary),
            "bary_subdiv" => Ok(Self::BarySubdiv),
            "higher" => Ok(Self::Higher),
            "highest" => Ok(Self::Highest),
            _ => Err(ParseQuadratureTypeError { input: s.to_string() }),
        }
    }
}

/// Largest dimension of the functions integrated by the evaluators (tensors).
const MAX_DIM: usize = 9;

/// A quadrature rule on a simplex with `N` vertices, with normalized weights and points in
/// barycentric coordinates.
pub trait SimplexQuadrature<const N: usize> {
    fn weights(&self) -> &[f64];
    fn points(&self) -> &[[f64; N]];

    /// Physical quadrature points on the simplex with the given vertices.
    fn physical_points<'a>(&'a self, vertices: &'a [Point3<f64>; N]) -> impl Iterator<Item = Point3<f64>> + 'a {
        self.points().iter().map(move |lambda| {
            let mut x = Point3::origin();
            for (l, v) in lambda.iter().zip(vertices) {
                x.coords += *l * v.coords;
            }
            x
        })
    }

    /// Approximates the integral over a simplex of measure `measure` of a function of the
    /// physical coordinates.
    fn integrate<U, F>(&self, vertices: &[Point3<f64>; N], measure: f64, f: F) -> U
    where
        F: Fn(&Point3<f64>) -> U,
        U: Zero + Mul<f64, Output = U> + AddAssign<U>,
    {
        let mut integral = U::zero();
        for (w, x) in self.weights().iter().zip(self.physical_points(vertices)) {
            integral += f(&x) * (w * measure);
        }
        integral
    }

    /// Adds the integral of an analytic function over the simplex to `acc`.
    ///
    /// The length of `acc` is the dimension of the function, at most 9.
    fn integrate_analytic(
        &self,
        time: f64,
        vertices: &[Point3<f64>; N],
        measure: f64,
        function: &dyn AnalyticFunction,
        acc: &mut [f64],
    ) {
        let dim = acc.len();
        debug_assert!(dim <= MAX_DIM);
        let mut value = [0.0; MAX_DIM];
        for (w, x) in self.weights().iter().zip(self.physical_points(vertices)) {
            function.evaluate(time, &x, &mut value[..dim]);
            for (a, v) in acc.iter_mut().zip(&value[..dim]) {
                *a += w * measure * v;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<const N: usize> {
    weights: Vec<f64>,
    points: Vec<[f64; N]>,
}

pub type TetrahedronQuadrature = QuadratureRule<4>;
pub type TriangleQuadrature = QuadratureRule<3>;

impl<const N: usize> SimplexQuadrature<N> for QuadratureRule<N> {
    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn points(&self) -> &[[f64; N]] {
        &self.points
    }
}

fn strength_for(caller: &'static str, qtype: QuadratureType) -> Result<usize, EvalError> {
    qtype
        .strength()
        .ok_or(EvalError::InvalidQuadratureType { caller, qtype })
}

impl TetrahedronQuadrature {
    pub fn from_type(caller: &'static str, qtype: QuadratureType) -> Result<Self, EvalError> {
        let (weights, points) = simplex::tetrahedron(strength_for(caller, qtype)?)
            .map_err(|_| EvalError::InvalidQuadratureType { caller, qtype })?;
        Ok(Self { weights, points })
    }
}

impl TriangleQuadrature {
    pub fn from_type(caller: &'static str, qtype: QuadratureType) -> Result<Self, EvalError> {
        let (weights, points) = simplex::triangle(strength_for(caller, qtype)?)
            .map_err(|_| EvalError::InvalidQuadratureType { caller, qtype })?;
        Ok(Self { weights, points })
    }
}
