use crate::{hex_box, registry_with_all_cells, registry_with_cells, tet_box, RecordingSync};
use approx::assert_abs_diff_eq;
use cdo_eval::definition::{ArrayInput, ArrayLocation, Definition, Field, FieldLocation};
use cdo_eval::evaluate::{
    average_on_cells_by_analytic, average_on_cells_by_array, average_on_faces_by_analytic, dual_cell_average_by_analytic,
};
use cdo_eval::parallel::SharedEntity;
use cdo_eval::quadrature::QuadratureType;
use cdo_eval::{evaluate, DofLocation, EvalContext, EvalError, Reduction};
use nalgebra::Point3;
use std::sync::Arc;
use util::assert_approx_slice_eq;

const SENTINEL: f64 = -123.0;

fn affine(x: &Point3<f64>) -> f64 {
    3.0 - x.x + 0.5 * x.y + 2.0 * x.z
}

fn affine_definition(zone_id: usize) -> Definition {
    Definition::by_analytic(zone_id, 3, |_t: f64, x: &Point3<f64>, out: &mut [f64]| {
        out[0] = affine(x);
        out[1] = x.y;
        out[2] = -x.z;
    })
    .unwrap()
}

#[test]
fn mean_of_affine_function_is_its_value_at_the_center() {
    for mesh in [hex_box(2), tet_box(1)] {
        let zones = registry_with_all_cells(&mesh);
        let ctx = EvalContext::new(&mesh, &zones);
        let def = affine_definition(0);
        let quant = mesh.quant();

        let mut cells = vec![0.0; 3 * mesh.connect().n_cells()];
        average_on_cells_by_analytic(&ctx, DofLocation::PrimalCell, &def, &mut cells).unwrap();
        for (values, xc) in cells.chunks_exact(3).zip(quant.cell_centers()) {
            assert_approx_slice_eq!(values, [affine(xc), xc.y, -xc.z], abstol = 1e-13);
        }

        let mut faces = vec![0.0; 3 * mesh.connect().n_faces()];
        average_on_faces_by_analytic(&ctx, DofLocation::PrimalFace, &def, &mut faces).unwrap();
        for (values, xf) in faces.chunks_exact(3).zip(quant.face_centers()) {
            assert_approx_slice_eq!(values, [affine(xf), xf.y, -xf.z], abstol = 1e-13);
        }
    }
}

#[test]
fn averages_are_restricted_to_the_zone() {
    let mesh = hex_box(2);
    let zones = registry_with_cells(&mesh, &[4]);
    let ctx = EvalContext::new(&mesh, &zones);
    let def = Definition::by_analytic(0, 1, |_t: f64, x: &Point3<f64>, out: &mut [f64]| out[0] = affine(x))
        .unwrap()
        .with_quadrature(QuadratureType::Highest);

    let mut cells = vec![SENTINEL; 8];
    evaluate(&ctx, Reduction::Average, DofLocation::PrimalCell, &def, &mut cells).unwrap();
    for (c_id, value) in cells.iter().enumerate() {
        if c_id == 4 {
            assert_abs_diff_eq!(*value, affine(&mesh.quant().cell_centers()[4]), epsilon = 1e-13);
        } else {
            assert_eq!(*value, SENTINEL);
        }
    }

    let n_faces = mesh.connect().n_faces();
    let mut faces = vec![SENTINEL; n_faces];
    evaluate(&ctx, Reduction::Average, DofLocation::PrimalFace, &def, &mut faces).unwrap();
    let cell_faces = mesh.connect().c2f().get(4).unwrap();
    for f in 0..n_faces {
        assert_eq!(faces[f] != SENTINEL, cell_faces.contains(&f));
    }
}

#[test]
fn constant_averages() {
    let mesh = hex_box(2);
    let zones = registry_with_cells(&mesh, &[0, 7]);
    let sync = RecordingSync::default();
    let ctx = EvalContext::new(&mesh, &zones).with_sync(&sync);
    let def = Definition::by_value(0, &[2.0]).unwrap();

    let mut cells = vec![0.0; 8];
    evaluate(&ctx, Reduction::Average, DofLocation::PrimalCell, &def, &mut cells).unwrap();
    assert_eq!(cells, [2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);

    let mut faces = vec![0.0; mesh.connect().n_faces()];
    evaluate(&ctx, Reduction::Average, DofLocation::PrimalFace, &def, &mut faces).unwrap();
    assert_eq!(faces.iter().filter(|v| **v == 2.0).count(), 12);
    assert_eq!(sync.shared_syncs(), vec![(SharedEntity::Faces, 1)]);

    let result = evaluate(&ctx, Reduction::Average, DofLocation::DualCell, &def, &mut vec![0.0; 27]);
    assert!(matches!(
        result,
        Err(EvalError::NotHandled {
            caller: "average_on_cells_by_value",
            ..
        })
    ));
}

#[test]
fn cell_array_averages() {
    let mesh = hex_box(2);
    let zones = registry_with_cells(&mesh, &[6]);
    let ctx = EvalContext::new(&mesh, &zones);
    let values: Vec<f64> = (0..24).map(f64::from).collect();
    let def = Definition::by_array(0, 3, ArrayInput::new(ArrayLocation::PrimalCell, 3, values)).unwrap();

    let mut out = vec![0.0; 24];
    average_on_cells_by_array(&ctx, DofLocation::PrimalCell, &def, &mut out).unwrap();
    assert_eq!(out[18..], [18.0, 19.0, 20.0]);
    assert!(out[..18].iter().all(|v| *v == 0.0));

    let def = Definition::by_array(0, 1, ArrayInput::new(ArrayLocation::PrimalVertex, 1, vec![0.0; 27])).unwrap();
    let result = average_on_cells_by_array(&ctx, DofLocation::PrimalCell, &def, &mut out);
    assert!(matches!(result, Err(EvalError::InvalidSupport { .. })));

    let def = Definition::by_array(0, 3, ArrayInput::new(ArrayLocation::PrimalCell, 3, vec![0.0; 21])).unwrap();
    let result = average_on_cells_by_array(&ctx, DofLocation::PrimalCell, &def, &mut out);
    assert!(matches!(result, Err(EvalError::InvalidSupport { caller: "average_on_cells_by_array", .. })));
}

#[test]
fn dual_cell_averages() {
    let mesh = hex_box(2);
    let zones = registry_with_all_cells(&mesh);
    let ctx = EvalContext::new(&mesh, &zones);
    let def = affine_definition(0);

    let mut out = vec![0.0; 81];
    dual_cell_average_by_analytic(&ctx, DofLocation::DualCell, &def, &mut out).unwrap();
    // The dual cell of the center vertex is a cube around it
    let center = Point3::new(0.5, 0.5, 0.5);
    assert_approx_slice_eq!(out[39..42], [affine(&center), 0.5, -0.5], abstol = 1e-13);
    // The dual cell of a corner vertex is the cube [0, 1/4]^3
    let corner = Point3::new(0.125, 0.125, 0.125);
    assert_approx_slice_eq!(out[..3], [affine(&corner), 0.125, -0.125], abstol = 1e-13);

    let zones = registry_with_cells(&mesh, &[0]);
    let ctx = EvalContext::new(&mesh, &zones);
    let def = Definition::by_analytic(0, 1, |_t: f64, _x: &Point3<f64>, out: &mut [f64]| out[0] = 7.0).unwrap();
    let mut out = vec![SENTINEL; 27];
    evaluate(&ctx, Reduction::Average, DofLocation::DualCell, &def, &mut out).unwrap();
    let cell_0_vertices = mesh.connect().c2v().get(0).unwrap();
    for (v, value) in out.iter().enumerate() {
        let expected = if cell_0_vertices.contains(&v) { 7.0 } else { SENTINEL };
        assert_abs_diff_eq!(*value, expected, epsilon = 1e-14);
    }
}

#[test]
fn unsupported_averages() {
    let mesh = hex_box(1);
    let zones = registry_with_all_cells(&mesh);
    let ctx = EvalContext::new(&mesh, &zones);

    let def = affine_definition(0).with_quadrature(QuadratureType::None);
    let result = average_on_faces_by_analytic(&ctx, DofLocation::PrimalFace, &def, &mut vec![0.0; 18]);
    assert_eq!(
        result,
        Err(EvalError::InvalidQuadratureType {
            caller: "average_on_faces_by_analytic",
            qtype: QuadratureType::None
        })
    );

    let field = Arc::new(Field::new("pressure", FieldLocation::Cells, 1, vec![1.0]));
    let def = Definition::by_field(0, field).unwrap();
    let result = evaluate(&ctx, Reduction::Average, DofLocation::PrimalCell, &def, &mut vec![0.0; 1]);
    assert!(matches!(result, Err(EvalError::InvalidSupport { caller: "evaluate", .. })));

    let def = Definition::by_qov(0, 1.0);
    let result = evaluate(&ctx, Reduction::Density, DofLocation::PrimalCell, &def, &mut vec![0.0; 1]);
    assert!(matches!(result, Err(EvalError::InvalidSupport { caller: "evaluate", .. })));
}
