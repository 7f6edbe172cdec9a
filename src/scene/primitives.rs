use nalgebra::Unit;

use crate::geometry::{
    self, FloatType, HitRecord, Ray, T_THRESHOLD, WorldPoint, WorldVector, ray_plane_intersection,
};

#[derive(Clone, Debug)]
pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType) -> Sphere {
        Sphere { center, radius }
    }

    /// Geometric (perpendicular distance) solution.
    /// Prefers the near root; falls back to the far one when the ray starts inside.
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        let to_center = self.center - ray.origin;
        let t_axis = to_center.dot(&ray.direction);
        let center_distance_squared = to_center.norm_squared();
        let radius_squared = self.radius * self.radius;

        if t_axis < 0.0 && center_distance_squared > radius_squared {
            // Outside and looking away
            return None;
        }

        let d_squared = center_distance_squared - t_axis * t_axis;
        if d_squared > radius_squared {
            return None;
        }

        let half_chord = (radius_squared - d_squared).sqrt();
        let t_near = t_axis - half_chord;
        let t = if t_near >= T_THRESHOLD {
            t_near
        } else {
            t_axis + half_chord
        };

        let point = ray.point_at(t);
        HitRecord::checked(ray, t, Unit::new_normalize(point - self.center))
    }
}

#[derive(Clone, Debug)]
pub struct Plane {
    pub normal: Unit<WorldVector>,
    pub point: WorldPoint,
}

impl Plane {
    pub fn new(normal: WorldVector, point: WorldPoint) -> Plane {
        Plane {
            normal: Unit::new_normalize(normal),
            point,
        }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        ray_plane_intersection(ray, &self.normal, &self.point)
    }
}

/// Standalone triangle with its own copy of the vertices.
/// Mesh faces use vertex indices instead, see `Mesh`.
#[derive(Clone, Debug)]
pub struct Triangle {
    vertices: geometry::Triangle<WorldPoint>,
    normal: Unit<WorldVector>,
}

impl Triangle {
    pub fn new(a: WorldPoint, b: WorldPoint, c: WorldPoint) -> Triangle {
        let vertices = geometry::Triangle::new(a, b, c);
        Triangle {
            normal: vertices.normal(),
            vertices,
        }
    }

    pub fn vertices(&self) -> &geometry::Triangle<WorldPoint> {
        &self.vertices
    }

    pub fn normal(&self) -> Unit<WorldVector> {
        self.normal
    }

    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        self.vertices.intersect_flat(&self.normal, ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test::{PositiveFloatWrapper, UnitWorldVectorWrapper, WorldPointWrapper};
    use assert2::{assert, let_assert};
    use test_strategy::proptest;

    #[test]
    fn test_direct_hit_through_center() {
        let sphere = Sphere::new([1.0, 2.0, 3.0].into(), 1.0);
        let ray = Ray::new([1.0, 2.0, 0.0].into(), [0.0, 0.0, 1.0].into());

        let_assert!(Some(h) = sphere.intersect(&ray));
        assert!((h.t - 2.0).abs() < 1e-6);
        assert!((h.normal.into_inner() - WorldVector::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_grazing_hit() {
        let sphere = Sphere::new([1.0, 2.0, 3.0].into(), 1.0);
        let ray = Ray::new([2.0, 2.0, 0.0].into(), [0.0, 0.0, 1.0].into());

        let_assert!(Some(h) = sphere.intersect(&ray));
        assert!((h.t - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_narrow_miss() {
        let sphere = Sphere::new([1.0, 2.0, 3.0].into(), 1.0);
        let ray = Ray::new([2.0, 2.01, 0.0].into(), [0.0, 0.0, 1.0].into());
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_sphere_behind_ray() {
        let sphere = Sphere::new([0.0, 0.0, 5.0].into(), 1.0);
        let ray = Ray::new(WorldPoint::origin(), [0.0, 0.0, -1.0].into());
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_ray_leaving_surface_misses() {
        let sphere = Sphere::new(WorldPoint::origin(), 1.0);
        let ray = Ray::new([0.0, 0.0, 1.0].into(), [0.0, 1.0, 1.0].into());
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_near_root_within_threshold_takes_far_root() {
        // Origin just outside the surface, near hit closer than T_THRESHOLD
        let sphere = Sphere::new([0.0, 0.0, -2.0].into(), 1.0);
        let ray = Ray::new([0.0, 0.0, -0.98].into(), [0.0, 0.0, -1.0].into());
        assert!(T_THRESHOLD > 0.02);

        let_assert!(Some(h) = sphere.intersect(&ray));
        assert!((h.t - 2.02).abs() < 1e-4);
        assert!((h.normal.into_inner() - WorldVector::new(0.0, 0.0, -1.0)).norm() < 1e-4);
    }

    #[proptest]
    fn ray_from_center_hits_at_radius(
        center: WorldPointWrapper,
        radius: PositiveFloatWrapper,
        direction: UnitWorldVectorWrapper,
    ) {
        let sphere = Sphere::new(*center, *radius);
        let ray = Ray {
            origin: *center,
            direction: *direction,
        };

        let_assert!(Some(hit) = sphere.intersect(&ray));
        assert!((hit.t - *radius).abs() <= 1e-3 * (*radius).max(1.0));
        assert!((hit.normal.into_inner() - direction.into_inner()).norm() < 1e-3);
    }

    #[test]
    fn test_plane_hit_facing_camera() {
        let plane = Plane::new([0.0, 0.0, 1.0].into(), [0.0, 0.0, -5.0].into());
        let ray = Ray::new(WorldPoint::origin(), [0.0, 0.0, -1.0].into());

        let_assert!(Some(h) = plane.intersect(&ray));
        assert!((h.t - 5.0).abs() < 1e-6);
        assert!(h.normal.into_inner() == WorldVector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_plane_normal_is_not_flipped() {
        let plane = Plane::new([0.0, 1.0, 0.0].into(), [0.0, -1.0, 0.0].into());
        let ray = Ray::new([0.0, -3.0, 0.0].into(), [0.0, 1.0, 0.0].into());

        let_assert!(Some(h) = plane.intersect(&ray));
        assert!((h.t - 2.0).abs() < 1e-6);
        assert!(h.normal.into_inner() == WorldVector::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_plane_behind_ray() {
        let plane = Plane::new([0.0, 0.0, 1.0].into(), [0.0, 0.0, -5.0].into());
        let ray = Ray::new(WorldPoint::origin(), [0.0, 0.0, 1.0].into());
        assert!(plane.intersect(&ray).is_none());
    }

    #[proptest]
    fn parallel_ray_never_hits_plane(
        normal: UnitWorldVectorWrapper,
        point: WorldPointWrapper,
        origin: WorldPointWrapper,
        other: UnitWorldVectorWrapper,
    ) {
        let plane = Plane {
            normal: *normal,
            point: *point,
        };

        if let Some(direction) = Unit::try_new(normal.cross(other.as_ref()), 0.5) {
            let ray = Ray {
                origin: *origin,
                direction,
            };
            assert!(plane.intersect(&ray).is_none());
        }
    }

    #[test]
    fn test_triangle_keeps_face_normal() {
        let triangle = Triangle::new(
            [0.0, 0.0, 0.0].into(),
            [1.0, 0.0, 0.0].into(),
            [0.0, 1.0, 0.0].into(),
        );
        let hit_ray = Ray::new([0.25, 0.25, 1.0].into(), [0.0, 0.0, -1.0].into());
        let miss_ray = Ray::new([2.0, 2.0, 1.0].into(), [0.0, 0.0, -1.0].into());

        let_assert!(Some(h) = triangle.intersect(&hit_ray));
        assert!((h.t - 1.0).abs() < 1e-6);
        assert!(h.normal == triangle.normal());
        assert!(triangle.intersect(&miss_ray).is_none());
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        let triangle = Triangle::new(
            [0.0, 0.0, 0.0].into(),
            [1.0, 0.0, 0.0].into(),
            [2.0, 0.0, 0.0].into(),
        );
        let ray = Ray::new([0.5, 0.0, 1.0].into(), [0.0, 0.0, -1.0].into());
        assert!(triangle.intersect(&ray).is_none());
    }
}
