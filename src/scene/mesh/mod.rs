mod obj_loading;
mod ray_mesh_intersection;

use index_vec::IndexVec;
use itertools::Itertools as _;
use nalgebra::Unit;
use thiserror::Error;

use crate::geometry::{Triangle, WorldPoint, WorldVector};

pub use obj_loading::ObjOpenError;

index_vec::define_index_type! {
    pub struct VertexIdx = usize;
}

/// Polygon mesh, fan tessellated into flat triangles.
/// Vertex positions are stored once; faces refer to them by index.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: IndexVec<VertexIdx, WorldPoint>,
    faces: Vec<MeshFace>,
}

#[derive(Clone, Debug)]
struct MeshFace {
    vertex_indices: Triangle<VertexIdx>,
    normal: Unit<WorldVector>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("Face {face} has only {vertex_count} vertices")]
    FaceTooSmall { face: usize, vertex_count: usize },

    #[error("Face {face} refers to vertex {index}, but the mesh only has {vertex_count} vertices")]
    VertexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
}

impl Mesh {
    /// Builds a mesh from vertex positions and polygon faces (lists of vertex indices).
    /// Face `[p0, p1, ..., pk]` becomes triangles `(p0, p1, p2), (p0, p2, p3), ..., (p0, pk-1, pk)`.
    pub fn new<F>(
        vertices: Vec<WorldPoint>,
        faces: impl IntoIterator<Item = F>,
    ) -> Result<Mesh, MeshError>
    where
        F: AsRef<[usize]>,
    {
        let mut mesh = Mesh {
            vertices: IndexVec::from_vec(vertices),
            faces: Vec::new(),
        };

        for (face_number, face) in faces.into_iter().enumerate() {
            mesh.tessellate_face(face_number, face.as_ref())?;
        }

        log::debug!(
            "Built mesh with {} vertices and {} triangles",
            mesh.vertices.len(),
            mesh.faces.len()
        );

        Ok(mesh)
    }

    fn tessellate_face(&mut self, face_number: usize, face: &[usize]) -> Result<(), MeshError> {
        if face.len() < 3 {
            return Err(MeshError::FaceTooSmall {
                face: face_number,
                vertex_count: face.len(),
            });
        }
        if let Some(&index) = face.iter().find(|&&i| i >= self.vertices.len()) {
            return Err(MeshError::VertexOutOfRange {
                face: face_number,
                index,
                vertex_count: self.vertices.len(),
            });
        }

        let pivot = VertexIdx::from_usize(face[0]);
        for (b, c) in face[1..].iter().tuple_windows() {
            let vertex_indices =
                Triangle::new(pivot, VertexIdx::from_usize(*b), VertexIdx::from_usize(*c));
            let normal = vertex_indices.map(|i| self.vertices[*i]).normal();
            self.faces.push(MeshFace {
                vertex_indices,
                normal,
            });
        }

        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Iterates the tessellated triangles as vertex index triples.
    pub fn triangle_indices(&self) -> impl Iterator<Item = Triangle<usize>> + '_ {
        self.faces
            .iter()
            .map(|face| face.vertex_indices.map(|i| i.index()))
    }
}
