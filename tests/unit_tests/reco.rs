use crate::{constant_dual_fluxes, hex_box, tet_box};
use approx::assert_abs_diff_eq;
use cdo_eval::cell_mesh::CellMesh;
use cdo_eval::mesh::CdoMesh;
use cdo_eval::reco::{cells_to_vertices, cw_dfbyc_in_cell, cw_pv_at_cell_center, dfbyc_at_cell_center, pv_at_cell_center};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use util::assert_approx_slice_eq;

fn affine(x: &Point3<f64>) -> f64 {
    -0.5 + x.x + 3.0 * x.y - 2.0 * x.z
}

fn check_constant_vector_reconstruction(mesh: &CdoMesh, u: &Vector3<f64>) {
    let fluxes = constant_dual_fluxes(mesh, u);
    for c_id in 0..mesh.connect().n_cells() {
        let reconstructed = dfbyc_at_cell_center(mesh, c_id, &fluxes);
        assert_abs_diff_eq!(reconstructed, *u, epsilon = 1e-12);
        let cm = CellMesh::from_cell(c_id, mesh);
        assert_abs_diff_eq!(cw_dfbyc_in_cell(&cm, &fluxes), *u, epsilon = 1e-12);
    }
}

proptest! {
    #[test]
    fn dual_face_reconstruction_is_exact_for_constant_vectors(
        [ux, uy, uz] in [-10.0..10.0f64, -10.0..10.0f64, -10.0..10.0f64]
    ) {
        let u = Vector3::new(ux, uy, uz);
        check_constant_vector_reconstruction(&hex_box(2), &u);
        check_constant_vector_reconstruction(&tet_box(1), &u);
    }
}

#[test]
fn vertex_reconstruction_is_exact_for_affine_functions() {
    for mesh in [hex_box(3), tet_box(2)] {
        let pv: Vec<f64> = mesh.quant().vtx_coord().iter().map(affine).collect();
        for c_id in 0..mesh.connect().n_cells() {
            let xc = mesh.quant().cell_centers()[c_id];
            let mut value = [f64::NAN];
            pv_at_cell_center(&mesh, c_id, &pv, 1, &mut value);
            assert_abs_diff_eq!(value[0], affine(&xc), epsilon = 1e-13);

            let cm = CellMesh::from_cell(c_id, &mesh);
            cw_pv_at_cell_center(&cm, &pv, 1, &mut value);
            assert_abs_diff_eq!(value[0], affine(&xc), epsilon = 1e-13);
        }
    }
}

#[test]
fn vertex_reconstruction_of_quadratic_has_known_error() {
    // Averaging x^2 over the corners of a cell of width h overestimates it by h^2 / 4
    for n in [1, 2, 4] {
        let mesh = hex_box(n);
        let h = 1.0 / n as f64;
        let pv: Vec<f64> = mesh.quant().vtx_coord().iter().map(|x| x.x * x.x).collect();
        for c_id in 0..mesh.connect().n_cells() {
            let xc = mesh.quant().cell_centers()[c_id];
            let mut value = [0.0];
            pv_at_cell_center(&mesh, c_id, &pv, 1, &mut value);
            assert_abs_diff_eq!(value[0] - xc.x * xc.x, h * h / 4.0, epsilon = 1e-13);
        }
    }
}

#[test]
fn vertex_reconstruction_of_vectors() {
    let mesh = hex_box(2);
    let pv: Vec<f64> = mesh
        .quant()
        .vtx_coord()
        .iter()
        .flat_map(|x| [x.x, affine(x), 4.0])
        .collect();
    let xc = mesh.quant().cell_centers()[5];
    let mut value = [0.0; 3];
    pv_at_cell_center(&mesh, 5, &pv, 3, &mut value);
    assert_approx_slice_eq!(value, [xc.x, affine(&xc), 4.0], abstol = 1e-14);
}

#[test]
fn cell_to_vertex_averaging() {
    let mesh = tet_box(2);
    let n_cells = mesh.connect().n_cells();
    let n_vertices = mesh.connect().n_vertices();

    let cell_values: Vec<f64> = (0..n_cells).flat_map(|_| [1.5, -2.0, 0.0]).collect();
    let mut out = vec![f64::NAN; 3 * n_vertices];
    cells_to_vertices(&mesh, &cell_values, 3, &mut out);
    for values in out.chunks_exact(3) {
        assert_approx_slice_eq!(values, [1.5, -2.0, 0.0], abstol = 1e-14);
    }

    // On a uniform hexahedral mesh, a corner vertex only sees its own cell
    let mesh = hex_box(2);
    let cell_values: Vec<f64> = (0..8).map(|c| c as f64).collect();
    let mut out = vec![0.0; 27];
    cells_to_vertices(&mesh, &cell_values, 1, &mut out);
    assert_abs_diff_eq!(out[0], 0.0);
    assert_abs_diff_eq!(out[26], 7.0, epsilon = 1e-14);
    // The center vertex averages all cells with equal weights
    assert_abs_diff_eq!(out[13], 3.5, epsilon = 1e-14);
}
