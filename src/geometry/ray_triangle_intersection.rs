use nalgebra::Unit;

use super::{HitRecord, Ray, Triangle, WorldPoint, WorldVector, ray_plane_intersection};

impl Triangle<WorldPoint> {
    /// Calculates ray intersection with the (one sided normal, two sided hit) flat triangle.
    /// `normal` must be the precomputed face normal of this triangle.
    ///
    /// Intersects the supporting plane first, then checks that the hit point lies on
    /// the inner side of all three edges.
    pub fn intersect_flat(&self, normal: &Unit<WorldVector>, ray: &Ray) -> Option<HitRecord> {
        let hit = ray_plane_intersection(ray, normal, &self[0])?;

        let starts = [self[0], self[1], self[2]];
        let inside = self
            .edges()
            .iter()
            .zip(starts.iter())
            .all(|(edge, start)| normal.dot(&edge.cross(&(hit.point - start))) >= 0.0);

        if inside { Some(hit) } else { None }
    }
}
