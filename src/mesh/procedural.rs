//! Basic procedural mesh generation routines.
use crate::mesh::PolyMesh3d;
use cdo_adjacency::Adjacency;
use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Incrementally builds a poly mesh from cells given as lists of vertex loops,
/// merging faces that connect the same set of vertices.
#[derive(Debug, Default)]
struct PolyMeshBuilder {
    vertices: Vec<Point3<f64>>,
    faces: Adjacency<usize>,
    cells: Adjacency<usize>,
    face_map: FxHashMap<Vec<usize>, usize>,
}

impl PolyMeshBuilder {
    fn face_index(&mut self, face_vertices: &[usize]) -> usize {
        let mut key = face_vertices.to_vec();
        key.sort_unstable();
        let num_faces = self.faces.len();
        let faces = &mut self.faces;
        *self.face_map.entry(key).or_insert_with(|| {
            faces.push(face_vertices);
            num_faces
        })
    }

    fn add_cell(&mut self, cell_faces: &[&[usize]]) {
        let face_indices: Vec<_> = cell_faces
            .iter()
            .map(|face| self.face_index(face))
            .collect();
        self.cells.push(&face_indices);
    }

    fn build(self) -> PolyMesh3d {
        PolyMesh3d::from_poly_data(self.vertices, self.faces, self.cells)
            .expect("Procedurally generated meshes are valid by construction")
    }
}

struct GridIndexing {
    num_vertices_x: usize,
    num_vertices_y: usize,
}

impl GridIndexing {
    fn vertex(&self, i: usize, j: usize, k: usize) -> usize {
        (self.num_vertices_x * self.num_vertices_y) * k + self.num_vertices_x * j + i
    }
}

fn create_grid_vertices(cell_size: f64, num_cells: [usize; 3]) -> (Vec<Point3<f64>>, GridIndexing) {
    let [nx, ny, nz] = num_cells;
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push(Point3::new(
                    i as f64 * cell_size,
                    j as f64 * cell_size,
                    k as f64 * cell_size,
                ));
            }
        }
    }
    let indexing = GridIndexing {
        num_vertices_x: nx + 1,
        num_vertices_y: ny + 1,
    };
    (vertices, indexing)
}

/// Generates an axis-aligned rectangular uniform hexahedral poly mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// The resulting box is given by the set `[0, u * ux] x [0, u * uy] x [0, u * uz]`
/// where u denotes the unit length, ux, uy and uz denote the number of units along each
/// coordinate axis.
pub fn create_rectangular_uniform_hex_poly_mesh(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    units_z: usize,
    cells_per_unit: usize,
) -> PolyMesh3d {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 || units_z == 0 {
        return PolyMesh3d::new_empty();
    }

    let cell_size = unit_length / cells_per_unit as f64;
    let num_cells = [
        units_x * cells_per_unit,
        units_y * cells_per_unit,
        units_z * cells_per_unit,
    ];
    let (vertices, grid) = create_grid_vertices(cell_size, num_cells);
    let mut builder = PolyMeshBuilder {
        vertices,
        ..Default::default()
    };

    for k in 0..num_cells[2] {
        for j in 0..num_cells[1] {
            for i in 0..num_cells[0] {
                let v = [
                    grid.vertex(i, j, k),
                    grid.vertex(i + 1, j, k),
                    grid.vertex(i + 1, j + 1, k),
                    grid.vertex(i, j + 1, k),
                    grid.vertex(i, j, k + 1),
                    grid.vertex(i + 1, j, k + 1),
                    grid.vertex(i + 1, j + 1, k + 1),
                    grid.vertex(i, j + 1, k + 1),
                ];
                builder.add_cell(&[
                    &[v[0], v[3], v[2], v[1]],
                    &[v[4], v[5], v[6], v[7]],
                    &[v[0], v[1], v[5], v[4]],
                    &[v[1], v[2], v[6], v[5]],
                    &[v[2], v[3], v[7], v[6]],
                    &[v[3], v[0], v[4], v[7]],
                ]);
            }
        }
    }

    builder.build()
}

pub fn create_unit_box_uniform_hex_poly_mesh(cells_per_dim: usize) -> PolyMesh3d {
    create_rectangular_uniform_hex_poly_mesh(1.0, 1, 1, 1, cells_per_dim)
}

/// Generates the same box as [`create_rectangular_uniform_hex_poly_mesh`], with every
/// hexahedron split into six tetrahedra sharing the diagonal from its lowest to its highest
/// corner.
///
/// All hexahedra are split in the same way, so the triangulation is conforming.
pub fn create_rectangular_uniform_tet_poly_mesh(
    unit_length: f64,
    units_x: usize,
    units_y: usize,
    units_z: usize,
    cells_per_unit: usize,
) -> PolyMesh3d {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 || units_z == 0 {
        return PolyMesh3d::new_empty();
    }

    let cell_size = unit_length / cells_per_unit as f64;
    let num_cells = [
        units_x * cells_per_unit,
        units_y * cells_per_unit,
        units_z * cells_per_unit,
    ];
    let (vertices, grid) = create_grid_vertices(cell_size, num_cells);
    let mut builder = PolyMeshBuilder {
        vertices,
        ..Default::default()
    };

    // Each tetrahedron follows a monotone path along the axes through the hexahedron
    let axis_orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    for k in 0..num_cells[2] {
        for j in 0..num_cells[1] {
            for i in 0..num_cells[0] {
                for axes in &axis_orders {
                    let mut corner = [i, j, k];
                    let mut tet = [grid.vertex(i, j, k); 4];
                    for (n, axis) in axes.iter().enumerate() {
                        corner[*axis] += 1;
                        tet[n + 1] = grid.vertex(corner[0], corner[1], corner[2]);
                    }
                    add_tetrahedron(&mut builder, tet);
                }
            }
        }
    }

    builder.build()
}

fn add_tetrahedron(builder: &mut PolyMeshBuilder, [a, b, c, d]: [usize; 4]) {
    builder.add_cell(&[&[a, c, b], &[a, b, d], &[b, c, d], &[a, d, c]]);
}

/// A mesh consisting of a single tetrahedron.
pub fn create_single_tetrahedron_poly_mesh(vertices: [Point3<f64>; 4]) -> PolyMesh3d {
    let mut builder = PolyMeshBuilder {
        vertices: vertices.to_vec(),
        ..Default::default()
    };
    add_tetrahedron(&mut builder, [0, 1, 2, 3]);
    builder.build()
}

/// A mesh consisting of a single hexahedron with the given corners, ordered as the
/// cells of [`create_rectangular_uniform_hex_poly_mesh`].
///
/// The faces must be planar for the computed quantities to be meaningful.
pub fn create_single_hexahedron_poly_mesh(vertices: [Point3<f64>; 8]) -> PolyMesh3d {
    let mut builder = PolyMeshBuilder {
        vertices: vertices.to_vec(),
        ..Default::default()
    };
    builder.add_cell(&[
        &[0, 3, 2, 1],
        &[4, 5, 6, 7],
        &[0, 1, 5, 4],
        &[1, 2, 6, 5],
        &[2, 3, 7, 6],
        &[3, 0, 4, 7],
    ]);
    builder.build()
}
