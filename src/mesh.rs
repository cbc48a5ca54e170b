//! Mesh connectivity and geometric quantities used by the evaluators.
use crate::evaluate::DofLocation;
use log::debug;
use nalgebra::Point3;

mod connect;
mod polymesh;
mod quantities;

pub mod procedural;

pub use connect::*;
pub use polymesh::*;
pub use quantities::*;

/// A mesh partition with everything the evaluators need to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct CdoMesh {
    connect: CdoConnect,
    quant: CdoQuantities,
}

impl CdoMesh {
    pub fn from_poly_mesh(mesh: &PolyMesh3d) -> eyre::Result<Self> {
        Self::from_partitioned_poly_mesh(mesh, &[])
    }

    /// Build a mesh partition whose faces listed in `ghost_faces` border cells owned by
    /// another partition. See [`CdoConnect::from_poly_mesh`].
    pub fn from_partitioned_poly_mesh(mesh: &PolyMesh3d, ghost_faces: &[(usize, usize)]) -> eyre::Result<Self> {
        let connect = CdoConnect::from_poly_mesh(mesh, ghost_faces)?;
        let quant = CdoQuantities::compute(&connect, mesh.vertices())?;
        debug!(
            "Built CDO mesh with {} vertices, {} edges, {} faces, {} cells and {} ghost cells",
            connect.n_vertices(),
            connect.n_edges(),
            connect.n_faces(),
            connect.n_cells(),
            connect.n_ghost_cells()
        );
        Ok(Self { connect, quant })
    }

    pub fn connect(&self) -> &CdoConnect {
        &self.connect
    }

    pub fn quant(&self) -> &CdoQuantities {
        &self.quant
    }

    /// Number of entities carrying a DoF at the given location.
    pub fn n_entities(&self, location: DofLocation) -> usize {
        match location {
            DofLocation::PrimalVertex | DofLocation::DualCell => self.connect.n_vertices(),
            DofLocation::PrimalFace => self.connect.n_faces(),
            DofLocation::PrimalCell | DofLocation::DualVertex => self.connect.n_cells(),
        }
    }

    /// Visit the tetrahedra partitioning a cell, together with their volumes.
    ///
    /// A tetrahedral cell is visited as a whole. Otherwise a triangular face gives one
    /// tetrahedron with apex at the cell center, and any other face gives one tetrahedron per
    /// edge, spanned by the edge, the face center and the cell center.
    pub fn for_each_sub_tetrahedron(&self, c_id: usize, mut f: impl FnMut(&[Point3<f64>; 4], f64)) {
        let connect = &self.connect;
        let quant = &self.quant;
        let xv = quant.vtx_coord();
        let xc = quant.cell_centers()[c_id];

        if connect.is_tetrahedron(c_id) {
            if let Some(&[a, b, c, d]) = connect.c2v().get(c_id) {
                f(&[xv[a], xv[b], xv[c], xv[d]], quant.cell_vol()[c_id]);
            }
            return;
        }

        let c2f_range = connect.c2f().range(c_id).unwrap_or(0..0);
        for j in c2f_range {
            let f_id = connect.c2f().ids()[j];
            let hf_coef = quant.hfc()[j] / 3.0;

            if let Some([a, b, c]) = connect.next_3_vertices(f_id) {
                f(&[xv[a], xv[b], xv[c], xc], hf_coef * quant.face_areas()[f_id]);
            } else {
                let xf = quant.face_centers()[f_id];
                for i in connect.f2e().range(f_id).unwrap_or(0..0) {
                    let [a, b] = connect.e2v()[connect.f2e().ids()[i]];
                    f(&[xv[a], xv[b], xf, xc], hf_coef * quant.tef()[i]);
                }
            }
        }
    }

    /// Visit the portions of dual cells inside a primal cell, as tetrahedra spanned by a
    /// vertex, the center of an edge through it, the center of a face through that edge and
    /// the cell center.
    ///
    /// The first argument of `f` is the position of the vertex in the c2v ids.
    pub fn for_each_dual_sub_tetrahedron(&self, c_id: usize, mut f: impl FnMut(usize, &[Point3<f64>; 4], f64)) {
        let connect = &self.connect;
        let quant = &self.quant;
        let xv = quant.vtx_coord();
        let xc = quant.cell_centers()[c_id];
        let c2v_range = connect.c2v().range(c_id).unwrap_or(0..0);
        let cell_vertices = &connect.c2v().ids()[c2v_range.clone()];

        for j in connect.c2f().range(c_id).unwrap_or(0..0) {
            let f_id = connect.c2f().ids()[j];
            let xf = quant.face_centers()[f_id];
            for i in connect.f2e().range(f_id).unwrap_or(0..0) {
                let e_id = connect.f2e().ids()[i];
                let xe = quant.edge_centers()[e_id];
                let sub_volume = quant.hfc()[j] * quant.tef()[i] / 6.0;
                for v in connect.e2v()[e_id] {
                    if let Some(offset) = cell_vertices.iter().position(|w| *w == v) {
                        f(c2v_range.start + offset, &[xv[v], xe, xf, xc], sub_volume);
                    }
                }
            }
        }
    }

    /// Visit the triangles partitioning a face, together with their areas.
    pub fn for_each_face_sub_triangle(&self, f_id: usize, mut f: impl FnMut(&[Point3<f64>; 3], f64)) {
        let connect = &self.connect;
        let quant = &self.quant;
        let xv = quant.vtx_coord();

        if let Some([a, b, c]) = connect.next_3_vertices(f_id) {
            f(&[xv[a], xv[b], xv[c]], quant.face_areas()[f_id]);
        } else {
            let xf = quant.face_centers()[f_id];
            for i in connect.f2e().range(f_id).unwrap_or(0..0) {
                let [a, b] = connect.e2v()[connect.f2e().ids()[i]];
                f(&[xv[a], xv[b], xf], quant.tef()[i]);
            }
        }
    }
}
