//! Local view of a single cell.
//!
//! A [`CellMesh`] gathers everything a cell-wise evaluation needs, with local numbering of
//! the cell's vertices, edges and faces. It is meant to be rebuilt cell after cell, reusing
//! its allocations.
use crate::mesh::{CdoMesh, CellType};
use cdo_adjacency::Adjacency;
use nalgebra::{Point3, Vector3};
use std::cell::RefCell;

#[derive(Debug, Clone)]
pub struct CellMesh {
    pub c_id: usize,
    pub cell_type: CellType,
    pub xc: Point3<f64>,
    pub vol_c: f64,

    /// Global ids of the cell vertices.
    pub v_ids: Vec<usize>,
    pub xv: Vec<Point3<f64>>,
    /// Portion of the dual cell of each vertex inside this cell, relative to the cell volume.
    pub wvc: Vec<f64>,

    /// Global ids of the cell edges.
    pub e_ids: Vec<usize>,
    /// Local vertex numbers of each local edge, in global orientation.
    pub e2v: Vec<[usize; 2]>,
    pub edge_centers: Vec<Point3<f64>>,
    pub edge_vectors: Vec<Vector3<f64>>,
    pub dual_faces: Vec<Vector3<f64>>,
    /// Offset of this cell's edges in the global c2e ids.
    pub c2e_offset: usize,

    /// Global ids of the cell faces.
    pub f_ids: Vec<usize>,
    pub face_centers: Vec<Point3<f64>>,
    pub face_normals: Vec<Vector3<f64>>,
    pub face_areas: Vec<f64>,
    pub hfc: Vec<f64>,
    /// Local edge numbers of each local face, in loop order.
    pub f2e: Adjacency<usize>,
    /// Area of the triangle spanned by an edge and the face center, parallel to `f2e`.
    pub tef: Vec<f64>,
}

impl Default for CellMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl CellMesh {
    pub fn new() -> Self {
        Self {
            c_id: 0,
            cell_type: CellType::Polyhedron,
            xc: Point3::origin(),
            vol_c: 0.0,
            v_ids: Vec::new(),
            xv: Vec::new(),
            wvc: Vec::new(),
            e_ids: Vec::new(),
            e2v: Vec::new(),
            edge_centers: Vec::new(),
            edge_vectors: Vec::new(),
            dual_faces: Vec::new(),
            c2e_offset: 0,
            f_ids: Vec::new(),
            face_centers: Vec::new(),
            face_normals: Vec::new(),
            face_areas: Vec::new(),
            hfc: Vec::new(),
            f2e: Adjacency::new(),
            tef: Vec::new(),
        }
    }

    /// A freshly built view of the given cell.
    pub fn from_cell(c_id: usize, mesh: &CdoMesh) -> Self {
        let mut cm = Self::new();
        cm.build(c_id, mesh);
        cm
    }

    /// Rebuild this view for another cell, reusing allocations.
    pub fn build(&mut self, c_id: usize, mesh: &CdoMesh) {
        let connect = mesh.connect();
        let quant = mesh.quant();

        self.c_id = c_id;
        self.cell_type = connect.cell_type(c_id);
        self.xc = quant.cell_centers()[c_id];
        self.vol_c = quant.cell_vol()[c_id];

        let c2v_range = connect.c2v().range(c_id).unwrap_or(0..0);
        self.v_ids.clear();
        self.v_ids
            .extend_from_slice(&connect.c2v().ids()[c2v_range.clone()]);
        self.xv.clear();
        self.xv
            .extend(self.v_ids.iter().map(|v| quant.vtx_coord()[*v]));
        self.wvc.clear();
        self.wvc
            .extend(quant.dual_vol()[c2v_range].iter().map(|vol| vol / self.vol_c));

        let c2e_range = connect.c2e().range(c_id).unwrap_or(0..0);
        self.c2e_offset = c2e_range.start;
        self.e_ids.clear();
        self.e_ids
            .extend_from_slice(&connect.c2e().ids()[c2e_range.clone()]);
        self.e2v.clear();
        self.edge_centers.clear();
        self.edge_vectors.clear();
        for &e in &self.e_ids {
            let [a, b] = connect.e2v()[e];
            self.e2v
                .push([local_index(&self.v_ids, a), local_index(&self.v_ids, b)]);
            self.edge_centers.push(quant.edge_centers()[e]);
            self.edge_vectors.push(quant.edge_vectors()[e]);
        }
        self.dual_faces.clear();
        self.dual_faces
            .extend_from_slice(&quant.dual_faces()[c2e_range]);

        let c2f_range = connect.c2f().range(c_id).unwrap_or(0..0);
        self.f_ids.clear();
        self.f_ids
            .extend_from_slice(&connect.c2f().ids()[c2f_range.clone()]);
        self.hfc.clear();
        self.hfc.extend_from_slice(&quant.hfc()[c2f_range]);
        self.face_centers.clear();
        self.face_normals.clear();
        self.face_areas.clear();
        self.f2e.clear();
        self.tef.clear();
        for &f in &self.f_ids {
            self.face_centers.push(quant.face_centers()[f]);
            self.face_normals.push(quant.face_normals()[f]);
            self.face_areas.push(quant.face_areas()[f]);

            let f2e_range = connect.f2e().range(f).unwrap_or(0..0);
            let mut face_edges = self.f2e.begin_array();
            for &e in &connect.f2e().ids()[f2e_range.clone()] {
                face_edges.push_single(local_index(&self.e_ids, e));
            }
            self.tef.extend_from_slice(&quant.tef()[f2e_range]);
        }
    }

    pub fn n_vc(&self) -> usize {
        self.v_ids.len()
    }

    pub fn n_ec(&self) -> usize {
        self.e_ids.len()
    }

    pub fn n_fc(&self) -> usize {
        self.f_ids.len()
    }

    /// Local vertices of a triangular local face, or `None` if the face is not a triangle.
    pub fn next_3_vertices(&self, f: usize) -> Option<[usize; 3]> {
        let &[e0, e1, _] = self.f2e.get(f)? else {
            return None;
        };
        let [a, b] = self.e2v[e0];
        let [c, d] = self.e2v[e1];
        let third = if c == a || c == b { d } else { c };
        Some([a, b, third])
    }

    /// Cell-local counterpart of [`CdoMesh::for_each_sub_tetrahedron`].
    pub fn for_each_sub_tetrahedron(&self, mut f: impl FnMut(&[Point3<f64>; 4], f64)) {
        if self.cell_type == CellType::Tetrahedron {
            f(&[self.xv[0], self.xv[1], self.xv[2], self.xv[3]], self.vol_c);
            return;
        }

        for face in 0..self.n_fc() {
            let hf_coef = self.hfc[face] / 3.0;
            if let Some([a, b, c]) = self.next_3_vertices(face) {
                f(
                    &[self.xv[a], self.xv[b], self.xv[c], self.xc],
                    hf_coef * self.face_areas[face],
                );
            } else {
                let xf = self.face_centers[face];
                for i in self.f2e.range(face).unwrap_or(0..0) {
                    let [a, b] = self.e2v[self.f2e.ids()[i]];
                    f(&[self.xv[a], self.xv[b], xf, self.xc], hf_coef * self.tef[i]);
                }
            }
        }
    }

    /// Cell-local counterpart of [`CdoMesh::for_each_dual_sub_tetrahedron`]; the first
    /// argument of `f` is the local vertex number.
    pub fn for_each_dual_sub_tetrahedron(&self, mut f: impl FnMut(usize, &[Point3<f64>; 4], f64)) {
        for face in 0..self.n_fc() {
            let xf = self.face_centers[face];
            for i in self.f2e.range(face).unwrap_or(0..0) {
                let e = self.f2e.ids()[i];
                let xe = self.edge_centers[e];
                let sub_volume = self.hfc[face] * self.tef[i] / 6.0;
                for v in self.e2v[e] {
                    f(v, &[self.xv[v], xe, xf, self.xc], sub_volume);
                }
            }
        }
    }
}

fn local_index(ids: &[usize], id: usize) -> usize {
    ids.iter()
        .position(|x| *x == id)
        .expect("Internal error: entity of a face must belong to its cell")
}

thread_local! { static CELL_MESH: RefCell<CellMesh> = RefCell::new(CellMesh::new()) }

/// Run `f` on a view of the given cell, built in a buffer local to the current thread.
pub fn with_cell_mesh<R>(c_id: usize, mesh: &CdoMesh, f: impl FnOnce(&CellMesh) -> R) -> R {
    CELL_MESH.with(|cm| {
        let cm = &mut *cm.borrow_mut();
        cm.build(c_id, mesh);
        f(cm)
    })
}
