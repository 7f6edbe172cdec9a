mod ray_triangle_intersection;
mod triangle;

use nalgebra::{Point2, Point3, Unit, Vector2, Vector3};

pub use triangle::Triangle;

pub type FloatType = f32;

pub type ScreenPoint = Point2<u32>;
pub type ScreenSize = Vector2<u32>;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;

/// Linear RGB, nominally in 0-1 per channel.
pub type Color = Vector3<FloatType>;

pub const EPSILON: FloatType = 1e-6;

/// Hits closer than this along a ray are ignored.
/// Keeps rays that start on a surface from hitting that same surface (shadow acne).
pub const T_THRESHOLD: FloatType = 0.04;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    pub direction: Unit<WorldVector>,
}

impl Ray {
    /// Creates a new ray, normalizing the direction.
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray {
            origin,
            direction: Unit::new_normalize(direction),
        }
    }

    pub fn point_at(&self, t: FloatType) -> WorldPoint {
        self.origin + self.direction.as_ref() * t
    }
}

#[derive(Copy, Clone, Debug)]
pub struct HitRecord {
    /// Distance along the ray, always at least `T_THRESHOLD`
    pub t: FloatType,
    pub point: WorldPoint,
    pub normal: Unit<WorldVector>,
}

impl HitRecord {
    /// Builds a hit record from a ray parameter, rejecting values that are NaN, infinite
    /// or too close.
    pub fn checked(ray: &Ray, t: FloatType, normal: Unit<WorldVector>) -> Option<HitRecord> {
        if !t.is_finite() || t < T_THRESHOLD {
            return None;
        }

        Some(HitRecord {
            t,
            point: ray.point_at(t),
            normal,
        })
    }
}

/// Intersects a ray with the plane given by a normal and any point on it.
/// Rays (nearly) parallel to the plane never hit. The returned normal is always `normal`,
/// regardless of which side the ray comes from.
pub fn ray_plane_intersection(
    ray: &Ray,
    normal: &Unit<WorldVector>,
    point_on_plane: &WorldPoint,
) -> Option<HitRecord> {
    let normal_dot_direction = normal.dot(&ray.direction);
    if normal_dot_direction.abs() < EPSILON {
        return None;
    }

    let t = normal.dot(&(point_on_plane - ray.origin)) / normal_dot_direction;
    HitRecord::checked(ray, t, *normal)
}

#[cfg(test)]
pub mod test {
    use super::*;
    use assert2::assert;
    use proptest::prelude::*;

    /// Helper macro that creates a wrapper arnound a type that implemetns Deref and Arbitary
    macro_rules! arbitrary_wrapper {
        ( $wrapper_name:ident ( $type:ty ) -> $block:block ) => {
            #[derive(Copy, Clone, Debug)]
            pub struct $wrapper_name(pub $type);

            impl std::ops::Deref for $wrapper_name {
                type Target = $type;
                fn deref(&self) -> &$type {
                    &self.0
                }
            }

            impl Arbitrary for $wrapper_name {
                type Parameters = ();
                type Strategy = proptest::strategy::BoxedStrategy<Self>;
                fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
                    $block.prop_map(|x| $wrapper_name(x)).boxed()
                }
            }
        };
    }

    fn simple_float() -> BoxedStrategy<FloatType> {
        (-100_000i32..100_000i32)
            .prop_map(|n| n as FloatType * 1e-3)
            .boxed()
    }

    fn simple_positive_float() -> BoxedStrategy<FloatType> {
        (100u32..100_000u32)
            .prop_map(|n| n as FloatType * 1e-3)
            .boxed()
    }

    arbitrary_wrapper! {
        WorldPointWrapper(WorldPoint) -> {
            (simple_float(), simple_float(), simple_float())
                .prop_map(|coords| WorldPoint::new(coords.0, coords.1, coords.2))
        }
    }

    arbitrary_wrapper! {
        UnitWorldVectorWrapper(Unit<WorldVector>) -> {
            (simple_float(), simple_float(), simple_float())
                .prop_filter_map(
                    "vector is zero",
                    |coords| Unit::try_new(WorldVector::new(coords.0, coords.1, coords.2), 1e-3))
        }
    }

    arbitrary_wrapper! {
        PositiveFloatWrapper(FloatType) -> {
            simple_positive_float()
        }
    }

    #[test]
    fn ray_direction_is_normalized() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::new(3.0, 0.0, 4.0));
        assert!((ray.direction.norm() - 1.0).abs() < EPSILON);
        assert!((ray.point_at(5.0) - WorldPoint::new(3.0, 0.0, 4.0)).norm() < 1e-5);
    }

    #[test]
    fn checked_hit_rejects_nan_and_close_hits() {
        let ray = Ray::new(WorldPoint::origin(), WorldVector::z());
        let normal = -WorldVector::z_axis();

        assert!(HitRecord::checked(&ray, FloatType::NAN, normal).is_none());
        assert!(HitRecord::checked(&ray, T_THRESHOLD / 2.0, normal).is_none());
        assert!(HitRecord::checked(&ray, -1.0, normal).is_none());
        assert!(HitRecord::checked(&ray, FloatType::INFINITY, normal).is_none());

        let hit = HitRecord::checked(&ray, 2.0, normal).expect("Hit past the threshold is valid");
        assert!(hit.point == WorldPoint::new(0.0, 0.0, 2.0));
    }
}
