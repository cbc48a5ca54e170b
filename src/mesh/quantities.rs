use crate::mesh::CdoConnect;
use eyre::eyre;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Geometric quantities attached to the entities of a [`CdoConnect`].
///
/// Quantities attached to an incidence (`hfc`, `tef`, `dual_vol`, `dual_faces`) are stored
/// in arrays parallel to the ids of the corresponding adjacency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdoQuantities {
    vtx_coord: Vec<Point3<f64>>,
    edge_centers: Vec<Point3<f64>>,
    edge_vectors: Vec<Vector3<f64>>,
    face_centers: Vec<Point3<f64>>,
    face_normals: Vec<Vector3<f64>>,
    face_areas: Vec<f64>,
    cell_centers: Vec<Point3<f64>>,
    cell_vol: Vec<f64>,
    /// Per c2f incidence: distance between the cell center and the face plane.
    hfc: Vec<f64>,
    /// Per f2e incidence: area of the triangle spanned by the edge and the face center.
    tef: Vec<f64>,
    /// Per c2v incidence: volume of the portion of the dual cell inside the primal cell.
    dual_vol: Vec<f64>,
    /// Per c2e incidence: vector area of the portion of the dual face inside the cell.
    dual_faces: Vec<Vector3<f64>>,
    vertex_dual_vol: Vec<f64>,
    total_volume: f64,
}

fn centroid<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Point3<f64> {
    let mut sum = Vector3::zeros();
    let mut count = 0;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    Point3::from(sum / count as f64)
}

/// Volume of the tetrahedron spanned by the given points.
pub fn tetrahedron_volume(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).dot(&(d - a)).abs() / 6.0
}

/// Area of the triangle spanned by the given points.
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

impl CdoQuantities {
    pub fn compute(connect: &CdoConnect, vertices: &[Point3<f64>]) -> eyre::Result<Self> {
        let e2v = connect.e2v();
        let edge_centers: Vec<_> = e2v
            .iter()
            .map(|[a, b]| Point3::from((vertices[*a].coords + vertices[*b].coords) * 0.5))
            .collect();
        let edge_vectors: Vec<_> = e2v
            .iter()
            .map(|[a, b]| vertices[*b] - vertices[*a])
            .collect();

        let n_faces = connect.n_faces();
        let mut face_centers = Vec::with_capacity(n_faces);
        let mut face_normals = Vec::with_capacity(n_faces);
        let mut face_areas = Vec::with_capacity(n_faces);
        for (f_id, face) in connect.f2v().iter().enumerate() {
            let xm = centroid(face.iter().map(|v| &vertices[*v]));
            let mut vector_area = Vector3::zeros();
            for (i, a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                vector_area += 0.5 * (vertices[*a] - xm).cross(&(vertices[b] - xm));
            }
            let norm = vector_area.norm();
            if norm <= f64::EPSILON * f64::EPSILON {
                return Err(eyre!("Face {f_id} has a degenerate area."));
            }
            let normal = vector_area / norm;

            let mut area = 0.0;
            let mut weighted_center = Vector3::zeros();
            for (i, a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                let (xa, xb) = (&vertices[*a], &vertices[b]);
                let sub_area = 0.5 * (xa - xm).cross(&(xb - xm)).dot(&normal);
                area += sub_area;
                weighted_center += sub_area * (xa.coords + xb.coords + xm.coords) / 3.0;
            }
            face_centers.push(Point3::from(weighted_center / area));
            face_normals.push(normal);
            face_areas.push(area);
        }

        let mut tef = Vec::with_capacity(connect.f2e().nnz());
        for (f_id, face_edges) in connect.f2e().iter().enumerate() {
            let xf = &face_centers[f_id];
            for e in face_edges {
                let [a, b] = e2v[*e];
                tef.push(triangle_area(&vertices[a], &vertices[b], xf));
            }
        }

        let n_cells = connect.n_cells();
        let mut cell_centers = Vec::with_capacity(n_cells);
        let mut cell_vol = Vec::with_capacity(n_cells);
        for c_id in 0..n_cells {
            let cell_vertices = connect.c2v().get(c_id).unwrap_or(&[]);
            let xm = centroid(cell_vertices.iter().map(|v| &vertices[*v]));
            let mut volume = 0.0;
            let mut weighted_center = Vector3::zeros();
            for f in connect.c2f().get(c_id).unwrap_or(&[]) {
                let xf = &face_centers[*f];
                for e in connect.f2e().get(*f).unwrap_or(&[]) {
                    let [a, b] = e2v[*e];
                    let (xa, xb) = (&vertices[a], &vertices[b]);
                    let sub_volume = tetrahedron_volume(xa, xb, xf, &xm);
                    volume += sub_volume;
                    weighted_center += sub_volume * (xa.coords + xb.coords + xf.coords + xm.coords) / 4.0;
                }
            }
            if volume <= 0.0 {
                return Err(eyre!("Cell {c_id} has a non-positive volume."));
            }
            cell_centers.push(Point3::from(weighted_center / volume));
            cell_vol.push(volume);
        }

        // Orient face normals outwards with respect to their first cell
        for (f_id, [first, _]) in connect.f2c().iter().enumerate() {
            if let Some(c) = first {
                if face_normals[f_id].dot(&(face_centers[f_id] - cell_centers[*c])) < 0.0 {
                    face_normals[f_id] = -face_normals[f_id];
                }
            }
        }

        let mut hfc = vec![0.0; connect.c2f().nnz()];
        let mut dual_vol = vec![0.0; connect.c2v().nnz()];
        let mut dual_faces = vec![Vector3::zeros(); connect.c2e().nnz()];
        let mut vertex_dual_vol = vec![0.0; connect.n_vertices()];
        for c_id in 0..n_cells {
            let xc = &cell_centers[c_id];
            let c2f_range = connect.c2f().range(c_id).unwrap_or(0..0);
            for j in c2f_range {
                let f = connect.c2f().ids()[j];
                let xf = &face_centers[f];
                hfc[j] = face_normals[f].dot(&(xf - xc)).abs();

                let f2e_range = connect.f2e().range(f).unwrap_or(0..0);
                for i in f2e_range {
                    let e = connect.f2e().ids()[i];
                    let [a, b] = e2v[e];
                    let sub_volume = hfc[j] * tef[i] / 6.0;
                    for v in [a, b] {
                        let position = connect
                            .c2v_position(c_id, v)
                            .ok_or_else(|| eyre!("Vertex {v} of face {f} is missing from cell {c_id}."))?;
                        dual_vol[position] += sub_volume;
                        vertex_dual_vol[v] += sub_volume;
                    }

                    let xe = &edge_centers[e];
                    let mut dual_face = 0.5 * (xf - xe).cross(&(xc - xe));
                    if dual_face.dot(&edge_vectors[e]) < 0.0 {
                        dual_face = -dual_face;
                    }
                    let position = connect
                        .c2e_position(c_id, e)
                        .ok_or_else(|| eyre!("Edge {e} of face {f} is missing from cell {c_id}."))?;
                    dual_faces[position] += dual_face;
                }
            }
        }

        let total_volume = cell_vol.iter().sum();

        Ok(Self {
            vtx_coord: vertices.to_vec(),
            edge_centers,
            edge_vectors,
            face_centers,
            face_normals,
            face_areas,
            cell_centers,
            cell_vol,
            hfc,
            tef,
            dual_vol,
            dual_faces,
            vertex_dual_vol,
            total_volume,
        })
    }

    pub fn vtx_coord(&self) -> &[Point3<f64>] {
        &self.vtx_coord
    }

    pub fn edge_centers(&self) -> &[Point3<f64>] {
        &self.edge_centers
    }

    /// Edge vectors, pointing from the first to the second vertex of each edge.
    pub fn edge_vectors(&self) -> &[Vector3<f64>] {
        &self.edge_vectors
    }

    pub fn face_centers(&self) -> &[Point3<f64>] {
        &self.face_centers
    }

    /// Unit face normals, pointing out of the first cell of each face.
    pub fn face_normals(&self) -> &[Vector3<f64>] {
        &self.face_normals
    }

    pub fn face_areas(&self) -> &[f64] {
        &self.face_areas
    }

    pub fn cell_centers(&self) -> &[Point3<f64>] {
        &self.cell_centers
    }

    pub fn cell_vol(&self) -> &[f64] {
        &self.cell_vol
    }

    pub fn hfc(&self) -> &[f64] {
        &self.hfc
    }

    pub fn tef(&self) -> &[f64] {
        &self.tef
    }

    pub fn dual_vol(&self) -> &[f64] {
        &self.dual_vol
    }

    pub fn dual_faces(&self) -> &[Vector3<f64>] {
        &self.dual_faces
    }

    /// Volume of the dual cell of each vertex, restricted to the cells of this partition.
    pub fn vertex_dual_vol(&self) -> &[f64] {
        &self.vertex_dual_vol
    }

    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }
}
