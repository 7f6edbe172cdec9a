use ordered_float::OrderedFloat;

use super::Mesh;
use crate::geometry::{HitRecord, Ray};

impl Mesh {
    /// Nearest hit among all triangles of the mesh.
    /// Among exactly equal distances the triangle that comes first wins.
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        self.faces
            .iter()
            .filter_map(|face| {
                face.vertex_indices
                    .map(|i| self.vertices[*i])
                    .intersect_flat(&face.normal, ray)
            })
            .min_by_key(|hit| OrderedFloat(hit.t))
    }
}
