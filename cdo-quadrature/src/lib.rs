//! Quadrature rules for simplices.
//!
//! The main purpose of this crate is to support the cell-wise integration performed by
//! `cdo-eval`, where every polyhedral cell is split into tetrahedra and every polygonal face
//! into triangles. Rules are therefore expressed in *barycentric* coordinates with weights
//! that sum to one: the integral of `f` over a simplex `S` is approximated by
//! `|S| * sum_q w_q f(x_q)`, where `x_q` is the physical point with barycentric
//! coordinates `lambda_q`.
//!
//! Rules are selected by *strength*, the maximal total polynomial degree integrated exactly.
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(
                    f,
                    "There is no quadrature rule satisfying the requirements available"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// Barycentric coordinates with respect to the `N` vertices of a simplex.
pub type Barycentric<const N: usize> = [f64; N];

/// Normalized weights and barycentric points.
pub type SimplexRule<const N: usize> = (Vec<f64>, Vec<Barycentric<N>>);

/// A rule on the tetrahedron.
pub type TetrahedronRule = SimplexRule<4>;

/// A rule on the triangle.
pub type TriangleRule = SimplexRule<3>;

/// Approximates the *mean value* of `f` over a simplex, with `f` given as a function of
/// barycentric coordinates.
///
/// Multiply the result by the measure of the simplex to obtain the integral.
pub fn integrate<const N: usize>(rule: &SimplexRule<N>, f: impl Fn(&Barycentric<N>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, lambda)| w * f(lambda)).sum()
}

/// Maps barycentric coordinates to physical coordinates given the simplex vertices.
pub fn to_physical<const N: usize>(lambda: &Barycentric<N>, vertices: &[[f64; 3]; N]) -> [f64; 3] {
    let mut x = [0.0; 3];
    for (l, v) in lambda.iter().zip(vertices) {
        for k in 0..3 {
            x[k] += l * v[k];
        }
    }
    x
}
