use std::sync::Arc;

use super::{Material, Mesh, Plane, Sphere, Triangle};
use crate::geometry::{HitRecord, Ray, WorldPoint};

#[derive(Clone, Debug)]
pub enum Shape {
    Sphere(Sphere),
    Plane(Plane),
    Triangle(Triangle),
    Mesh(Mesh),
}

impl Shape {
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        match self {
            Shape::Sphere(sphere) => sphere.intersect(ray),
            Shape::Plane(plane) => plane.intersect(ray),
            Shape::Triangle(triangle) => triangle.intersect(ray),
            Shape::Mesh(mesh) => mesh.intersect(ray),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Sphere(_) => "sphere",
            Shape::Plane(_) => "plane",
            Shape::Triangle(_) => "triangle",
            Shape::Mesh(_) => "mesh",
        }
    }
}

/// Renderable object: a shape and the material it is drawn with.
/// The material handle may be shared with other objects.
#[derive(Clone, Debug)]
pub struct Object {
    pub shape: Shape,
    material: Arc<Material>,
}

impl Object {
    pub fn new(shape: impl Into<Shape>, material: Arc<Material>) -> Object {
        Object {
            shape: shape.into(),
            material,
        }
    }

    /// Creates an object that reuses the material of `parent`.
    pub fn with_material_of(shape: impl Into<Shape>, parent: &Object) -> Object {
        Object::new(shape, parent.material_handle())
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_handle(&self) -> Arc<Material> {
        Arc::clone(&self.material)
    }

    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        self.shape.intersect(ray)
    }

    /// Returns true if this object lies strictly between the two points.
    pub fn is_blocking_segment(&self, a: &WorldPoint, b: &WorldPoint) -> bool {
        let segment = b - a;
        let ray = Ray::new(*a, segment);
        self.intersect(&ray)
            .is_some_and(|hit| hit.t < segment.norm())
    }
}

impl From<Sphere> for Shape {
    fn from(value: Sphere) -> Self {
        Shape::Sphere(value)
    }
}

impl From<Plane> for Shape {
    fn from(value: Plane) -> Self {
        Shape::Plane(value)
    }
}

impl From<Triangle> for Shape {
    fn from(value: Triangle) -> Self {
        Shape::Triangle(value)
    }
}

impl From<Mesh> for Shape {
    fn from(value: Mesh) -> Self {
        Shape::Mesh(value)
    }
}
