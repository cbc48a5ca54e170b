use cdo_quadrature::simplex::{tetrahedron, triangle};
use cdo_quadrature::{integrate, to_physical, Error};

use approx::assert_abs_diff_eq;

macro_rules! assert_quadrature_size {
    ($quadrature_fn:ident, strength = $strength:expr, size = $size:expr) => {{
        let (weights, points) = $quadrature_fn($strength).expect("Expected valid quadrature rule");
        assert_eq!(points.len(), weights.len());
        assert_eq!(points.len(), $size);
    }};
}

macro_rules! assert_no_quadrature_for_strength {
    ($quadrature_fn:ident, strength = $strength:expr) => {
        assert_eq!($quadrature_fn($strength), Err(Error::NoRuleAvailable));
    };
}

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

const REFERENCE_TETRAHEDRON: [[f64; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
const REFERENCE_TRIANGLE: [[f64; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

/// Mean value of x^a y^b z^c over the reference tetrahedron.
fn tetrahedron_monomial_mean(a: u32, b: u32, c: u32) -> f64 {
    6.0 * factorial(a) * factorial(b) * factorial(c) / factorial(a + b + c + 3)
}

/// Mean value of x^a y^b over the reference triangle.
fn triangle_monomial_mean(a: u32, b: u32) -> f64 {
    2.0 * factorial(a) * factorial(b) / factorial(a + b + 2)
}

#[test]
fn rules_have_expected_numbers_of_points() {
    assert_quadrature_size!(tetrahedron, strength = 0, size = 1);
    assert_quadrature_size!(tetrahedron, strength = 1, size = 1);
    assert_quadrature_size!(tetrahedron, strength = 2, size = 4);
    assert_quadrature_size!(tetrahedron, strength = 3, size = 5);
    assert_no_quadrature_for_strength!(tetrahedron, strength = 4);

    assert_quadrature_size!(triangle, strength = 0, size = 1);
    assert_quadrature_size!(triangle, strength = 1, size = 1);
    assert_quadrature_size!(triangle, strength = 2, size = 3);
    assert_quadrature_size!(triangle, strength = 3, size = 4);
    assert_no_quadrature_for_strength!(triangle, strength = 4);
}

#[test]
fn weights_sum_to_one_and_points_are_barycentric() {
    for strength in 0..=3 {
        let (weights, points) = tetrahedron(strength).unwrap();
        assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        for lambda in points {
            assert_abs_diff_eq!(lambda.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        }

        let (weights, points) = triangle(strength).unwrap();
        assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        for lambda in points {
            assert_abs_diff_eq!(lambda.iter().sum::<f64>(), 1.0, epsilon = 1e-14);
        }
    }
}

#[test]
fn tetrahedron_rules_satisfy_expected_accuracy() {
    for strength in 1..=3 {
        let rule = tetrahedron(strength).unwrap();
        for degree in 0..=strength as u32 {
            for a in 0..=degree {
                for b in 0..=(degree - a) {
                    let c = degree - a - b;
                    let estimated = integrate(&rule, |lambda| {
                        let [x, y, z] = to_physical(lambda, &REFERENCE_TETRAHEDRON);
                        x.powi(a as i32) * y.powi(b as i32) * z.powi(c as i32)
                    });
                    assert_abs_diff_eq!(estimated, tetrahedron_monomial_mean(a, b, c), epsilon = 1e-13);
                }
            }
        }
    }
}

#[test]
fn triangle_rules_satisfy_expected_accuracy() {
    for strength in 1..=3 {
        let rule = triangle(strength).unwrap();
        for degree in 0..=strength as u32 {
            for a in 0..=degree {
                let b = degree - a;
                let estimated = integrate(&rule, |lambda| {
                    let [x, y, _] = to_physical(lambda, &REFERENCE_TRIANGLE);
                    x.powi(a as i32) * y.powi(b as i32)
                });
                assert_abs_diff_eq!(estimated, triangle_monomial_mean(a, b), epsilon = 1e-13);
            }
        }
    }
}

#[test]
fn centroid_rule_is_not_exact_for_quadratics() {
    let rule = tetrahedron(1).unwrap();
    let estimated = integrate(&rule, |lambda| to_physical(lambda, &REFERENCE_TETRAHEDRON)[0].powi(2));
    // 1/16 at the centroid versus the exact mean 1/10
    assert_abs_diff_eq!(estimated, 1.0 / 16.0, epsilon = 1e-15);
    assert!((estimated - tetrahedron_monomial_mean(2, 0, 0)).abs() > 1e-2);
}
