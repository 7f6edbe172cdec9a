mod light;
pub mod loading;
mod material;
mod mesh;
mod object;
mod primitives;

use ordered_float::OrderedFloat;

use crate::camera::Camera;
use crate::geometry::{HitRecord, Ray, WorldPoint};

pub use light::Light;
pub use material::Material;
pub use mesh::{Mesh, MeshError, ObjOpenError, VertexIdx};
pub use object::{Object, Shape};
pub use primitives::{Plane, Sphere, Triangle};

/// Everything needed to render an image.
/// Read only once rendering starts.
#[derive(Clone, Debug)]
pub struct Scene {
    pub camera: Camera,
    pub lights: Vec<Light>,
    pub objects: Vec<Object>,
}

impl Scene {
    pub fn new(camera: Camera) -> Scene {
        Scene {
            camera,
            lights: Vec::new(),
            objects: Vec::new(),
        }
    }
}

/// Finds the object with the smallest valid hit distance along the ray.
/// Among exactly equal distances the object that comes first wins.
pub fn nearest_hit<'a>(ray: &Ray, objects: &'a [Object]) -> Option<(&'a Object, HitRecord)> {
    objects
        .iter()
        .filter_map(|object| object.intersect(ray).map(|hit| (object, hit)))
        .min_by_key(|(_, hit)| OrderedFloat(hit.t))
}

/// Checks if any object lies strictly between the point and the light.
pub fn is_occluded(objects: &[Object], point: &WorldPoint, light_position: &WorldPoint) -> bool {
    objects
        .iter()
        .any(|object| object.is_blocking_segment(point, light_position))
}
