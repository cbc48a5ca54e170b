use crate::mesh::PolyMesh3d;
use cdo_adjacency::Adjacency;
use eyre::eyre;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    Tetrahedron,
    #[default]
    Polyhedron,
}

/// Topological relations between the vertices, edges, faces and cells of a mesh partition.
///
/// Edges are implicit in the polyhedral input and are numbered in order of first appearance
/// while walking the face loops. The vertices of an edge are stored in increasing order, which
/// defines the edge orientation.
///
/// Cell ids in `n_cells..n_cells + n_ghost_cells` denote cells owned by another partition and
/// only appear as the second neighbour of a face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdoConnect {
    n_vertices: usize,
    n_ghost_cells: usize,
    c2f: Adjacency<usize>,
    f2c: Vec<[Option<usize>; 2]>,
    f2v: Adjacency<usize>,
    f2e: Adjacency<usize>,
    e2v: Vec<[usize; 2]>,
    c2e: Adjacency<usize>,
    c2v: Adjacency<usize>,
    cell_type: Vec<CellType>,
}

impl CdoConnect {
    /// Build the connectivity of a mesh partition.
    ///
    /// `ghost_faces` lists pairs `(face, ghost)`: the face lies on the partition boundary and
    /// its neighbour on the other side is ghost cell number `ghost`.
    pub fn from_poly_mesh(mesh: &PolyMesh3d, ghost_faces: &[(usize, usize)]) -> eyre::Result<Self> {
        let n_cells = mesh.num_cells();
        let n_faces = mesh.num_faces();
        let n_ghost_cells = ghost_faces
            .iter()
            .map(|(_, ghost)| ghost + 1)
            .max()
            .unwrap_or(0);

        let face_cells = mesh.compute_face_cell_connectivity();
        let mut f2c = Vec::with_capacity(n_faces);
        for (face_idx, cells) in face_cells.iter().enumerate() {
            match cells {
                [c] => f2c.push([Some(*c), None]),
                [c1, c2] => f2c.push([Some(*c1), Some(*c2)]),
                _ => return Err(eyre!("Face {face_idx} must belong to one or two cells.")),
            }
        }

        for &(face_idx, ghost) in ghost_faces {
            let neighbors = f2c
                .get_mut(face_idx)
                .ok_or_else(|| eyre!("Ghost face {face_idx} does not exist."))?;
            if neighbors[1].is_some() {
                return Err(eyre!(
                    "Face {face_idx} is shared by two local cells and cannot border a ghost cell."
                ));
            }
            neighbors[1] = Some(n_cells + ghost);
        }

        let mut edge_map = FxHashMap::default();
        let mut e2v = Vec::new();
        let mut f2e = Adjacency::with_capacity(n_faces, mesh.faces().nnz());
        for face in mesh.face_connectivity_iter() {
            let mut face_edges = f2e.begin_array();
            let loop_edges = face.iter().copied().circular_tuple_windows::<(usize, usize)>();
            for (a, b) in loop_edges {
                let key = [a.min(b), a.max(b)];
                let edge_idx = *edge_map.entry(key).or_insert_with(|| {
                    e2v.push(key);
                    e2v.len() - 1
                });
                face_edges.push_single(edge_idx);
            }
        }

        let mut c2e = Adjacency::with_capacity(n_cells, 0);
        let mut c2v = Adjacency::with_capacity(n_cells, 0);
        let mut cell_type = Vec::with_capacity(n_cells);
        for cell_faces in mesh.cell_connectivity_iter() {
            {
                let mut cell_edges = c2e.begin_array();
                for &f in cell_faces {
                    for &e in f2e.get(f).unwrap_or(&[]) {
                        if !cell_edges.contains(&e) {
                            cell_edges.push_single(e);
                        }
                    }
                }
            }
            let mut cell_vertices = c2v.begin_array();
            for &f in cell_faces {
                for &v in mesh.get_face_connectivity(f).unwrap_or(&[]) {
                    if !cell_vertices.contains(&v) {
                        cell_vertices.push_single(v);
                    }
                }
            }

            let all_triangles = cell_faces
                .iter()
                .all(|&f| mesh.faces().degree(f) == 3);
            if cell_faces.len() == 4 && all_triangles && cell_vertices.count() == 4 {
                cell_type.push(CellType::Tetrahedron);
            } else {
                cell_type.push(CellType::Polyhedron);
            }
        }

        Ok(Self {
            n_vertices: mesh.num_vertices(),
            n_ghost_cells,
            c2f: mesh.cells().clone(),
            f2c,
            f2v: mesh.faces().clone(),
            f2e,
            e2v,
            c2e,
            c2v,
            cell_type,
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    pub fn n_edges(&self) -> usize {
        self.e2v.len()
    }

    pub fn n_faces(&self) -> usize {
        self.f2c.len()
    }

    pub fn n_cells(&self) -> usize {
        self.c2f.len()
    }

    pub fn n_ghost_cells(&self) -> usize {
        self.n_ghost_cells
    }

    /// Size of cell-based arrays exchanged with neighbouring partitions.
    pub fn n_cells_with_ghosts(&self) -> usize {
        self.n_cells() + self.n_ghost_cells
    }

    pub fn c2f(&self) -> &Adjacency<usize> {
        &self.c2f
    }

    /// Cells on each side of every face.
    ///
    /// The first entry is always a local cell. The second is `None` on the domain boundary.
    pub fn f2c(&self) -> &[[Option<usize>; 2]] {
        &self.f2c
    }

    /// Face vertices, in loop order.
    pub fn f2v(&self) -> &Adjacency<usize> {
        &self.f2v
    }

    /// Face edges, in loop order.
    pub fn f2e(&self) -> &Adjacency<usize> {
        &self.f2e
    }

    pub fn e2v(&self) -> &[[usize; 2]] {
        &self.e2v
    }

    pub fn c2e(&self) -> &Adjacency<usize> {
        &self.c2e
    }

    pub fn c2v(&self) -> &Adjacency<usize> {
        &self.c2v
    }

    pub fn cell_type(&self, c_id: usize) -> CellType {
        self.cell_type[c_id]
    }

    pub fn is_boundary_face(&self, f_id: usize) -> bool {
        self.f2c[f_id][1].is_none()
    }

    /// The neighbour of `c_id` across face `f_id`, which may be a ghost cell.
    ///
    /// Returns `None` on the domain boundary.
    pub fn neighbor(&self, c_id: usize, f_id: usize) -> Option<usize> {
        match self.f2c[f_id] {
            [Some(c1), c2] if c1 == c_id => c2,
            [c1, _] => c1,
        }
    }

    /// The three vertices of a triangular face, in loop order.
    pub fn next_3_vertices(&self, f_id: usize) -> Option<[usize; 3]> {
        match self.f2v.get(f_id)? {
            &[a, b, c] => Some([a, b, c]),
            _ => None,
        }
    }

    /// Whether the cell is a tetrahedron.
    pub fn is_tetrahedron(&self, c_id: usize) -> bool {
        self.cell_type[c_id] == CellType::Tetrahedron
    }

    /// Position of `v_id` within the vertices of `c_id`, as an offset into [`Self::c2v`] ids.
    pub(crate) fn c2v_position(&self, c_id: usize, v_id: usize) -> Option<usize> {
        let range = self.c2v.range(c_id)?;
        let offset = self.c2v.get(c_id)?.iter().position(|v| *v == v_id)?;
        Some(range.start + offset)
    }

    /// Position of `e_id` within the edges of `c_id`, as an offset into [`Self::c2e`] ids.
    pub(crate) fn c2e_position(&self, c_id: usize, e_id: usize) -> Option<usize> {
        let range = self.c2e.range(c_id)?;
        let offset = self.c2e.get(c_id)?.iter().position(|e| *e == e_id)?;
        Some(range.start + offset)
    }
}
