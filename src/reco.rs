//! Reconstruction of values between mesh locations.
use crate::cell_mesh::CellMesh;
use crate::mesh::CdoMesh;
use log::warn;
use nalgebra::Vector3;

/// Reconstructs values at the center of a cell from values at its vertices, weighting each
/// vertex by the portion of its dual cell inside the cell.
///
/// `pv` holds `stride` values per vertex, and `stride` values are written to `out`.
pub fn pv_at_cell_center(mesh: &CdoMesh, c_id: usize, pv: &[f64], stride: usize, out: &mut [f64]) {
    let connect = mesh.connect();
    let quant = mesh.quant();
    let inv_vol = 1.0 / quant.cell_vol()[c_id];
    let out = &mut out[..stride];
    out.fill(0.0);
    for j in connect.c2v().range(c_id).unwrap_or(0..0) {
        let v = connect.c2v().ids()[j];
        let weight = quant.dual_vol()[j] * inv_vol;
        for (o, value) in out.iter_mut().zip(&pv[stride * v..stride * (v + 1)]) {
            *o += weight * value;
        }
    }
}

/// Reconstructs a vector at the center of a cell from its fluxes through the portions of
/// dual faces inside the cell.
///
/// `dual_fluxes` holds one value per (cell, edge) incidence, in the order of the c2e ids.
/// The reconstruction is exact for constant vectors.
pub fn dfbyc_at_cell_center(mesh: &CdoMesh, c_id: usize, dual_fluxes: &[f64]) -> Vector3<f64> {
    let connect = mesh.connect();
    let quant = mesh.quant();
    let mut vector = Vector3::zeros();
    for j in connect.c2e().range(c_id).unwrap_or(0..0) {
        let e = connect.c2e().ids()[j];
        vector += dual_fluxes[j] * quant.edge_vectors()[e];
    }
    vector / quant.cell_vol()[c_id]
}

/// Counterpart of [`pv_at_cell_center`] for a cell-local view.
pub fn cw_pv_at_cell_center(cm: &CellMesh, pv: &[f64], stride: usize, out: &mut [f64]) {
    let out = &mut out[..stride];
    out.fill(0.0);
    for (v, weight) in cm.v_ids.iter().zip(&cm.wvc) {
        for (o, value) in out.iter_mut().zip(&pv[stride * v..stride * (v + 1)]) {
            *o += weight * value;
        }
    }
}

/// Counterpart of [`dfbyc_at_cell_center`] for a cell-local view.
///
/// `dual_fluxes` is indexed as the global c2e ids.
pub fn cw_dfbyc_in_cell(cm: &CellMesh, dual_fluxes: &[f64]) -> Vector3<f64> {
    let local_fluxes = &dual_fluxes[cm.c2e_offset..cm.c2e_offset + cm.n_ec()];
    let vector: Vector3<f64> = local_fluxes
        .iter()
        .zip(&cm.edge_vectors)
        .map(|(flux, tangent)| *flux * tangent)
        .sum();
    vector / cm.vol_c
}

/// Reconstructs values at every vertex from values at every cell, weighting each cell by the
/// portion of the dual cell of the vertex it contains.
///
/// Vertices without any dual volume get zero.
pub fn cells_to_vertices(mesh: &CdoMesh, cell_values: &[f64], stride: usize, out: &mut [f64]) {
    let connect = mesh.connect();
    let quant = mesh.quant();
    let out = &mut out[..stride * connect.n_vertices()];
    out.fill(0.0);
    let mut weights = vec![0.0; connect.n_vertices()];
    for c_id in 0..connect.n_cells() {
        let values = &cell_values[stride * c_id..stride * (c_id + 1)];
        for j in connect.c2v().range(c_id).unwrap_or(0..0) {
            let v = connect.c2v().ids()[j];
            let weight = quant.dual_vol()[j];
            weights[v] += weight;
            for (o, value) in out[stride * v..stride * (v + 1)].iter_mut().zip(values) {
                *o += weight * value;
            }
        }
    }

    for (v, weight) in weights.iter().enumerate() {
        let vertex_values = &mut out[stride * v..stride * (v + 1)];
        if *weight > 0.0 {
            vertex_values.iter_mut().for_each(|o| *o /= weight);
        } else {
            warn!("Vertex {v} has no dual volume, its reconstructed value is set to zero.");
            vertex_values.fill(0.0);
        }
    }
}
