use std::ops::Index;

use nalgebra::Unit;

use super::{WorldPoint, WorldVector};

/// Three corners of a triangle.
/// Used both with points and with indices into a vertex arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Triangle<Point>([Point; 3]);

impl<Point> Triangle<Point> {
    pub fn new(a: Point, b: Point, c: Point) -> Triangle<Point> {
        Triangle([a, b, c])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.0.iter()
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> Triangle<Point2> {
        Triangle([f(&self[0]), f(&self[1]), f(&self[2])])
    }
}

impl<Point> Index<usize> for Triangle<Point> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Triangle<WorldPoint> {
    /// Returns the edge vectors going around the triangle: 0->1, 1->2, 2->0
    pub fn edges(&self) -> [WorldVector; 3] {
        [
            self[1] - self[0],
            self[2] - self[1],
            self[0] - self[2],
        ]
    }

    /// Returns the unit face normal, following the right hand rule over the vertex order.
    /// Degenerate triangles produce a NaN normal, which never passes intersection tests.
    pub fn normal(&self) -> Unit<WorldVector> {
        let e1 = self[1] - self[0];
        let e2 = self[2] - self[0];
        Unit::new_normalize(e1.cross(&e2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn normal_follows_winding() {
        let ccw = Triangle::new(
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 0.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        );
        let cw = Triangle::new(ccw[0], ccw[2], ccw[1]);

        assert!(ccw.normal().into_inner() == WorldVector::new(0.0, 0.0, 1.0));
        assert!(cw.normal().into_inner() == WorldVector::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn edges_close_the_loop() {
        let triangle = Triangle::new(
            WorldPoint::new(1.0, 2.0, 3.0),
            WorldPoint::new(-1.0, 0.5, 2.0),
            WorldPoint::new(4.0, -2.0, 0.0),
        );
        let [a, b, c] = triangle.edges();
        assert!((a + b + c).norm() < 1e-6);
    }

    #[test]
    fn map_indices_to_points() {
        let points = [
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(1.0, 0.0, 0.0),
            WorldPoint::new(0.0, 1.0, 0.0),
        ];
        let indices = Triangle::new(2usize, 0, 1);
        let mapped = indices.map(|i| points[*i]);
        assert!(mapped == Triangle::new(points[2], points[0], points[1]));
        assert!(indices.iter().copied().collect::<Vec<_>>() == vec![2, 0, 1]);
    }
}
