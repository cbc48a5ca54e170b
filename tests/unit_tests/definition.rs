use crate::{constant_dual_fluxes, hex_box, tet_box};
use cdo_eval::cell_mesh::CellMesh;
use cdo_eval::definition::{ArrayInput, ArrayLocation, Definition, Field, FieldLocation, Support};
use cdo_eval::quadrature::QuadratureType;
use cdo_eval::EvalError;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use util::assert_approx_slice_eq;

fn affine(x: &Point3<f64>) -> f64 {
    1.0 + 2.0 * x.x - x.y + 0.5 * x.z
}

fn assert_invalid_definition(result: Result<Definition, EvalError>) {
    assert!(matches!(result, Err(EvalError::InvalidDefinition { .. })), "{result:?}");
}

#[test]
fn dimensions_are_validated() {
    assert_invalid_definition(Definition::by_value(0, &[1.0, 2.0]));
    assert_invalid_definition(Definition::by_value(0, &[]));
    assert_invalid_definition(Definition::by_analytic(0, 2, |_t: f64, _x: &Point3<f64>, _out: &mut [f64]| {}));
    assert_invalid_definition(Definition::by_field(
        0,
        Arc::new(Field::new("velocity", FieldLocation::Cells, 2, vec![0.0; 4])),
    ));

    let def = Definition::by_value(1, &[0.0; 9]).unwrap();
    assert_eq!(def.dim(), 9);
    assert_eq!(def.zone_id(), 1);
    assert_eq!(def.support(), Support::Volume);
    assert_eq!(def.qtype(), QuadratureType::Bary);
    assert_eq!(Definition::by_qov(0, 3.0).dim(), 1);
}

#[test]
fn arrays_are_validated() {
    let array = |location, stride, len| ArrayInput::new(location, stride, vec![0.0; len]);
    assert_invalid_definition(Definition::by_array(0, 1, array(ArrayLocation::PrimalCell, 0, 4)));
    assert_invalid_definition(Definition::by_array(0, 3, array(ArrayLocation::PrimalCell, 3, 4)));
    assert_invalid_definition(Definition::by_array(0, 3, array(ArrayLocation::PrimalVertex, 1, 9)));
    assert_invalid_definition(Definition::by_array(0, 3, array(ArrayLocation::DualFaceByCell, 3, 9)));
    assert_invalid_definition(Definition::by_array(0, 1, array(ArrayLocation::DualFaceByCell, 1, 9)));

    assert!(Definition::by_array(0, 3, array(ArrayLocation::DualFaceByCell, 1, 7)).is_ok());
    assert!(Definition::by_array(0, 9, array(ArrayLocation::PrimalCell, 9, 18)).is_ok());

    let field = Field::new("pressure", FieldLocation::Vertices, 3, vec![0.0; 7]);
    assert_invalid_definition(Definition::by_field(0, Arc::new(field)));
}

#[test]
fn builders_and_debug_output() {
    let def = Definition::by_analytic(0, 3, |_t: f64, _x: &Point3<f64>, out: &mut [f64]| out.fill(1.0))
        .unwrap()
        .with_quadrature(QuadratureType::Highest)
        .with_support(Support::Boundary);
    assert_eq!(def.qtype(), QuadratureType::Highest);
    assert_eq!(def.support(), Support::Boundary);

    let debug = format!("{def:?}");
    assert!(debug.contains("Analytic(\"<function>\")"), "{debug}");

    let array = ArrayInput::new(ArrayLocation::PrimalCell, 1, vec![1.0, 2.0]);
    let debug = format!("{:?}", Definition::by_array(0, 1, array).unwrap().kind());
    assert!(debug.contains("len: 2"), "{debug}");
}

#[test]
fn evaluation_in_a_cell() {
    let mesh = hex_box(2);
    let cm = CellMesh::from_cell(7, &mesh);
    let center = Point3::new(0.75, 0.75, 0.75);
    let mut out = [0.0; 3];

    let def = Definition::by_value(0, &[1.0, 2.0, 3.0]).unwrap();
    def.eval_in_cell(&cm, 0.0, &mut out).unwrap();
    assert_eq!(out, [1.0, 2.0, 3.0]);

    let def = Definition::by_analytic(0, 1, |t: f64, x: &Point3<f64>, out: &mut [f64]| out[0] = t + affine(x)).unwrap();
    def.eval_in_cell(&cm, 2.0, &mut out).unwrap();
    assert_approx_slice_eq!(out[..1], [2.0 + affine(&center)], abstol = 1e-14);

    let vertex_values: Vec<f64> = mesh.quant().vtx_coord().iter().map(affine).collect();
    let def = Definition::by_array(0, 1, ArrayInput::new(ArrayLocation::PrimalVertex, 1, vertex_values)).unwrap();
    def.eval_in_cell(&cm, 0.0, &mut out).unwrap();
    assert_approx_slice_eq!(out[..1], [affine(&center)], abstol = 1e-14);

    let u = Vector3::new(0.5, -1.0, 2.0);
    let fluxes = ArrayInput::new(ArrayLocation::DualFaceByCell, 1, constant_dual_fluxes(&mesh, &u));
    let def = Definition::by_array(0, 3, fluxes).unwrap();
    def.eval_in_cell(&cm, 0.0, &mut out).unwrap();
    assert_approx_slice_eq!(out, u.as_slice(), abstol = 1e-13);

    let cell_values: Vec<f64> = (0..8).map(|c| c as f64).collect();
    let field = Field::new("temperature", FieldLocation::Cells, 1, cell_values);
    let def = Definition::by_field(0, Arc::new(field)).unwrap();
    def.eval_in_cell(&cm, 0.0, &mut out).unwrap();
    assert_eq!(out[0], 7.0);
}

#[test]
fn vector_fields_at_vertices_are_reconstructed() {
    let mesh = tet_box(1);
    let values: Vec<f64> = mesh
        .quant()
        .vtx_coord()
        .iter()
        .flat_map(|x| [affine(x), x.y, -x.z])
        .collect();
    let field = Field::new("displacement", FieldLocation::Vertices, 3, values);
    let def = Definition::by_field(0, Arc::new(field)).unwrap();

    for c_id in 0..mesh.connect().n_cells() {
        let cm = CellMesh::from_cell(c_id, &mesh);
        let mut out = [0.0; 3];
        def.eval_in_cell(&cm, 0.0, &mut out).unwrap();
        assert_approx_slice_eq!(out, [affine(&cm.xc), cm.xc.y, -cm.xc.z], abstol = 1e-14);
    }
}

#[test]
fn evaluation_in_a_cell_errors() {
    let mesh = hex_box(1);
    let cm = CellMesh::from_cell(0, &mesh);

    let mut out = [0.0; 1];
    let result = Definition::by_qov(0, 1.0).eval_in_cell(&cm, 0.0, &mut out);
    assert!(matches!(result, Err(EvalError::InvalidSupport { .. })));

    let def = Definition::by_value(0, &[1.0, 2.0, 3.0]).unwrap();
    let result = def.eval_in_cell(&cm, 0.0, &mut out);
    assert_eq!(
        result,
        Err(EvalError::OutputTooSmall {
            caller: "Definition::eval_in_cell",
            required: 3,
            actual: 1
        })
    );
}
