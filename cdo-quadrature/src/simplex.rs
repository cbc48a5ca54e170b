//! Low-order rules on the tetrahedron and the triangle.
//!
//! | strength | tetrahedron            | triangle                   |
//! |----------|------------------------|----------------------------|
//! | 0, 1     | centroid               | centroid                   |
//! | 2        | 4 points, equal weight | 3 points, equal weight     |
//! | 3        | Keast, 5 points        | Strang-Fix, 4 points       |
//!
//! The strength 3 rules both contain a negative centroid weight.
use crate::{Error, TetrahedronRule, TriangleRule};

const TET_A: f64 = 0.5854101966249685;
const TET_B: f64 = 0.1381966011250105;

/// Returns all distinct placements of `major` in one slot, `minor` in the others.
fn permutations<const N: usize>(major: f64, minor: f64) -> Vec<[f64; N]> {
    (0..N)
        .map(|i| {
            let mut lambda = [minor; N];
            lambda[i] = major;
            lambda
        })
        .collect()
}

/// A rule on the tetrahedron integrating polynomials of total degree `strength` exactly.
pub fn tetrahedron(strength: usize) -> Result<TetrahedronRule, Error> {
    match strength {
        0 | 1 => Ok((vec![1.0], vec![[0.25; 4]])),
        2 => Ok((vec![0.25; 4], permutations(TET_A, TET_B))),
        3 => {
            let mut weights = vec![-0.8];
            let mut points = vec![[0.25; 4]];
            weights.extend([0.45; 4]);
            points.extend(permutations(0.5, 1.0 / 6.0));
            Ok((weights, points))
        }
        _ => Err(Error::NoRuleAvailable),
    }
}

/// A rule on the triangle integrating polynomials of total degree `strength` exactly.
pub fn triangle(strength: usize) -> Result<TriangleRule, Error> {
    match strength {
        0 | 1 => Ok((vec![1.0], vec![[1.0 / 3.0; 3]])),
        2 => Ok((vec![1.0 / 3.0; 3], permutations(2.0 / 3.0, 1.0 / 6.0))),
        3 => {
            let mut weights = vec![-27.0 / 48.0];
            let mut points = vec![[1.0 / 3.0; 3]];
            weights.extend([25.0 / 48.0; 3]);
            points.extend(permutations(0.6, 0.2));
            Ok((weights, points))
        }
        _ => Err(Error::NoRuleAvailable),
    }
}
