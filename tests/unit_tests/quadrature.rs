use approx::assert_abs_diff_eq;
use cdo_eval::quadrature::{QuadratureType, SimplexQuadrature, TetrahedronQuadrature, TriangleQuadrature};
use cdo_eval::EvalError;
use nalgebra::{Point3, Vector3};

fn reference_tetrahedron() -> [Point3<f64>; 4] {
    [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ]
}

fn reference_triangle() -> [Point3<f64>; 3] {
    [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)]
}

type Monomial = (usize, fn(&Point3<f64>) -> f64, f64);

/// Monomials with their total degree and their exact integral over the reference tetrahedron.
static TETRAHEDRON_MONOMIALS: [Monomial; 8] = [
    (0, |_: &Point3<f64>| 1.0, 1.0 / 6.0),
    (1, |x: &Point3<f64>| x.x, 1.0 / 24.0),
    (1, |x: &Point3<f64>| x.z, 1.0 / 24.0),
    (2, |x: &Point3<f64>| x.x * x.x, 1.0 / 60.0),
    (2, |x: &Point3<f64>| x.x * x.y, 1.0 / 120.0),
    (3, |x: &Point3<f64>| x.x * x.x * x.y, 1.0 / 360.0),
    (3, |x: &Point3<f64>| x.x * x.x * x.x, 1.0 / 120.0),
    (3, |x: &Point3<f64>| x.x * x.y * x.z, 1.0 / 720.0),
];

/// Same as [`TETRAHEDRON_MONOMIALS`] for the reference triangle in the plane z = 0.
static TRIANGLE_MONOMIALS: [Monomial; 6] = [
    (0, |_: &Point3<f64>| 1.0, 0.5),
    (1, |x: &Point3<f64>| x.y, 1.0 / 6.0),
    (2, |x: &Point3<f64>| x.x * x.x, 1.0 / 12.0),
    (2, |x: &Point3<f64>| x.x * x.y, 1.0 / 24.0),
    (3, |x: &Point3<f64>| x.x * x.x * x.x, 1.0 / 20.0),
    (3, |x: &Point3<f64>| x.x * x.y * x.y, 1.0 / 60.0),
];

fn check_tetrahedron_exactness(qtype: QuadratureType, degree: usize) {
    let quadrature = TetrahedronQuadrature::from_type("test", qtype).unwrap();
    for &(monomial_degree, f, exact) in &TETRAHEDRON_MONOMIALS {
        if monomial_degree <= degree {
            let integral: f64 = quadrature.integrate(&reference_tetrahedron(), 1.0 / 6.0, f);
            assert_abs_diff_eq!(integral, exact, epsilon = 1e-14);
        }
    }
}

fn check_triangle_exactness(qtype: QuadratureType, degree: usize) {
    let quadrature = TriangleQuadrature::from_type("test", qtype).unwrap();
    for &(monomial_degree, f, exact) in &TRIANGLE_MONOMIALS {
        if monomial_degree <= degree {
            let integral: f64 = quadrature.integrate(&reference_triangle(), 0.5, f);
            assert_abs_diff_eq!(integral, exact, epsilon = 1e-14);
        }
    }
}

macro_rules! exactness_tests {
    ($($qtype:ident => $degree:literal),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<tetrahedron_ $qtype:snake _is_exact_up_to_degree_ $degree>]() {
                    assert_eq!(QuadratureType::$qtype.strength(), Some($degree));
                    check_tetrahedron_exactness(QuadratureType::$qtype, $degree);
                }

                #[test]
                fn [<triangle_ $qtype:snake _is_exact_up_to_degree_ $degree>]() {
                    check_triangle_exactness(QuadratureType::$qtype, $degree);
                }
            }
        )*
    };
}

exactness_tests!(
    Bary => 1,
    BarySubdiv => 1,
    Higher => 2,
    Highest => 3,
);

#[test]
fn barycenter_rule_underestimates_convex_functions() {
    let quadrature = TetrahedronQuadrature::from_type("test", QuadratureType::Bary).unwrap();
    let integral: f64 = quadrature.integrate(&reference_tetrahedron(), 1.0 / 6.0, |x| x.x * x.x);
    assert_abs_diff_eq!(integral, 1.0 / 96.0, epsilon = 1e-15);
    assert!(integral < 1.0 / 60.0);
}

#[test]
fn no_quadrature_cannot_integrate() {
    let expected = EvalError::InvalidQuadratureType {
        caller: "caller",
        qtype: QuadratureType::None,
    };
    assert_eq!(TetrahedronQuadrature::from_type("caller", QuadratureType::None), Err(expected.clone()));
    assert_eq!(TriangleQuadrature::from_type("caller", QuadratureType::None), Err(expected));
    assert_eq!(QuadratureType::None.strength(), None);
}

#[test]
fn vector_valued_integration() {
    let quadrature = TetrahedronQuadrature::from_type("test", QuadratureType::Higher).unwrap();
    let integral: Vector3<f64> = quadrature.integrate(&reference_tetrahedron(), 1.0 / 6.0, |x| {
        Vector3::new(1.0, x.y, x.x * x.z)
    });
    assert_abs_diff_eq!(integral, Vector3::new(1.0 / 6.0, 1.0 / 24.0, 1.0 / 120.0), epsilon = 1e-14);
}

#[test]
fn analytic_integration_accumulates() {
    let quadrature = TetrahedronQuadrature::from_type("test", QuadratureType::Highest).unwrap();
    let f = |_t: f64, x: &Point3<f64>, out: &mut [f64]| {
        out[0] = x.x;
        out[1] = x.y * x.y;
        out[2] = 2.0;
    };
    let mut acc = [1.0, 0.0, 0.0];
    quadrature.integrate_analytic(0.0, &reference_tetrahedron(), 1.0 / 6.0, &f, &mut acc);
    quadrature.integrate_analytic(0.0, &reference_tetrahedron(), 1.0 / 6.0, &f, &mut acc);
    util::assert_approx_slice_eq!(acc, [1.0 + 1.0 / 12.0, 1.0 / 30.0, 2.0 / 3.0], abstol = 1e-14);
}

#[test]
fn physical_points_lie_in_the_simplex() {
    let quadrature = TetrahedronQuadrature::from_type("test", QuadratureType::Highest).unwrap();
    let vertices = [
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(2.0, 1.0, 1.0),
        Point3::new(1.0, 2.0, 1.0),
        Point3::new(1.0, 1.0, 2.0),
    ];
    for x in quadrature.physical_points(&vertices) {
        let local = x - vertices[0];
        assert!(local.iter().all(|c| *c > 0.0));
        assert!(local.sum() < 1.0);
    }
}

#[test]
fn quadrature_type_names() {
    let all = [
        QuadratureType::None,
        QuadratureType::Bary,
        QuadratureType::BarySubdiv,
        QuadratureType::Higher,
        QuadratureType::Highest,
    ];
    for qtype in all {
        assert_eq!(qtype.to_string().parse::<QuadratureType>(), Ok(qtype));
    }
    assert_eq!(" Bary_Subdiv ".parse::<QuadratureType>(), Ok(QuadratureType::BarySubdiv));
    assert_eq!(QuadratureType::default(), QuadratureType::Bary);

    let error = "gauss".parse::<QuadratureType>().unwrap_err();
    assert_eq!(error.to_string(), "Unknown quadrature type \"gauss\"");
}
