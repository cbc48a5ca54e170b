use cdo_adjacency::Adjacency;
use eyre::eyre;
use itertools::Itertools;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A volumetric polyhedral mesh given by vertex loops for faces and face lists for cells.
///
/// This is the raw input from which the CDO connectivity and quantities are computed.
/// It is assumed that each face is planar and that each cell is star-shaped with respect to
/// its centroid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyMesh3d {
    vertices: Vec<Point3<f64>>,
    faces: Adjacency<usize>,
    cells: Adjacency<usize>,
}

impl PolyMesh3d {
    /// Creates an empty poly mesh without any vertices, faces or cells.
    pub fn new_empty() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Adjacency::new(),
            cells: Adjacency::new(),
        }
    }

    pub fn from_poly_data(
        vertices: Vec<Point3<f64>>,
        faces: Adjacency<usize>,
        cells: Adjacency<usize>,
    ) -> eyre::Result<Self> {
        let num_vertices = vertices.len();
        let num_faces = faces.len();

        for (face_idx, face) in faces.iter().enumerate() {
            if let Some(idx) = face.iter().find(|idx| **idx >= num_vertices) {
                return Err(eyre!("Vertex index {idx} out of bounds in face {face_idx}."));
            }
            if face.iter().unique().count() < 3 {
                return Err(eyre!("Face {face_idx} has less than 3 distinct vertices."));
            }
        }

        for (cell_idx, cell) in cells.iter().enumerate() {
            if let Some(idx) = cell.iter().find(|idx| **idx >= num_faces) {
                return Err(eyre!("Face index {idx} out of bounds in cell {cell_idx}."));
            }
            if cell.iter().unique().count() < 4 {
                return Err(eyre!("Cell {cell_idx} has less than 4 distinct faces."));
            }
        }

        let mesh = Self { vertices, faces, cells };
        let face_cells = mesh.compute_face_cell_connectivity();
        if let Some((face_idx, _)) = face_cells
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() > 2)
        {
            return Err(eyre!("Face {face_idx} is shared by more than two cells."));
        }

        Ok(mesh)
    }

    /// Concatenates several meshes into a single mesh, without merging any entities.
    pub fn concatenate<'a>(meshes: impl IntoIterator<Item = &'a PolyMesh3d>) -> Self {
        let mut result = Self::new_empty();
        for mesh in meshes {
            let vertex_offset = result.vertices.len();
            let face_offset = result.faces.len();
            result.vertices.extend_from_slice(&mesh.vertices);
            for face in mesh.faces.iter() {
                let mut appender = result.faces.begin_array();
                for v in face {
                    appender.push_single(v + vertex_offset);
                }
            }
            for cell in mesh.cells.iter() {
                let mut appender = result.cells.begin_array();
                for f in cell {
                    appender.push_single(f + face_offset);
                }
            }
        }
        result
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn faces(&self) -> &Adjacency<usize> {
        &self.faces
    }

    pub fn cells(&self) -> &Adjacency<usize> {
        &self.cells
    }

    pub fn face_connectivity_iter(&self) -> impl '_ + Iterator<Item = &'_ [usize]> {
        self.faces.iter()
    }

    pub fn cell_connectivity_iter(&self) -> impl '_ + Iterator<Item = &'_ [usize]> {
        self.cells.iter()
    }

    pub fn get_face_connectivity(&self, index: usize) -> Option<&[usize]> {
        self.faces.get(index)
    }

    pub fn get_cell_connectivity(&self, index: usize) -> Option<&[usize]> {
        self.cells.get(index)
    }

    /// Returns an adjacency in which source i contains the indices of the cells
    /// associated with face i, in increasing order.
    pub fn compute_face_cell_connectivity(&self) -> Adjacency<usize> {
        self.cells.transpose(self.num_faces())
    }

    /// Returns the indices of the faces which are only referenced by at most one cell.
    pub fn find_boundary_faces(&self) -> Vec<usize> {
        let mut face_occurences = vec![0; self.num_faces()];

        for cell_faces in self.cell_connectivity_iter() {
            for face in cell_faces {
                face_occurences[*face] += 1;
            }
        }

        face_occurences
            .into_iter()
            .enumerate()
            .filter_map(|(face_idx, count)| if count <= 1 { Some(face_idx) } else { None })
            .collect()
    }
}
