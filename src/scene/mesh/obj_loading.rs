use std::{fs, path::Path};

use thiserror::Error;
use wavefront_obj::obj::{ObjSet, Primitive};

use super::{Mesh, MeshError};
use crate::geometry::WorldPoint;

impl Mesh {
    /// Loads the first object of a Wavefront OBJ file.
    /// Only vertex positions and faces are used; everything else in the file is ignored.
    pub fn with_obj(p: impl AsRef<Path>) -> Result<Mesh, ObjOpenError> {
        let content = fs::read_to_string(p)?;
        Self::from_obj_source(content)
    }

    /// Polygon faces are fan tessellated around their first corner by `Mesh::new`.
    pub fn from_obj_source(source: impl Into<String>) -> Result<Mesh, ObjOpenError> {
        let source = source.into();
        let parsed = wavefront_obj::obj::parse(&source)?;
        let polygons = first_object_polygons(&source)?;
        Self::load_obj(parsed, polygons)
    }

    fn load_obj(obj: ObjSet, polygons: Vec<Vec<usize>>) -> Result<Mesh, ObjOpenError> {
        let object_count = obj.objects.len();
        let o = obj
            .objects
            .into_iter()
            .next()
            .ok_or(ObjOpenError::NoObject)?;
        if object_count > 1 {
            log::warn!(
                "OBJ contains {object_count} objects, only '{}' will be used",
                o.name
            );
        }

        // wavefront_obj triangulates on its own (around the last corner), so its
        // triangles only serve as a check that the face statements were read correctly.
        let parsed_triangles = o
            .geometry
            .iter()
            .flat_map(|geometry| &geometry.shapes)
            .filter(|shape| matches!(shape.primitive, Primitive::Triangle(..)))
            .count();
        let read_triangles: usize = polygons.iter().map(|polygon| polygon.len() - 2).sum();
        if parsed_triangles != read_triangles {
            return Err(ObjOpenError::FaceMismatch {
                parsed: parsed_triangles,
                read: read_triangles,
            });
        }

        let vertices = o
            .vertices
            .iter()
            .map(|v| WorldPoint::new(v.x as f32, v.y as f32, v.z as f32))
            .collect();

        let mesh = Mesh::new(vertices, polygons)?;
        log::info!(
            "Loaded OBJ object '{}': {} vertices, {} triangles",
            o.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        Ok(mesh)
    }
}

/// Reads the corner vertex indices (0-based) of the polygon faces of the first object,
/// in file order.
///
/// The first object ends at an `o` statement that follows any content, or at vertex data
/// that follows faces. Points and line faces are skipped with a warning.
fn first_object_polygons(source: &str) -> Result<Vec<Vec<usize>>, ObjOpenError> {
    let mut polygons = Vec::new();
    let mut seen_vertices = false;
    let mut seen_elements = false;

    for (line_index, line) in source.lines().enumerate() {
        let statement = line.split('#').next().unwrap_or_default();
        let mut tokens = statement.split_whitespace();

        match tokens.next() {
            Some("o") if seen_vertices || seen_elements => break,
            Some("v" | "vn" | "vt") => {
                if seen_elements {
                    break;
                }
                seen_vertices = true;
            }
            Some("l") => {
                seen_elements = true;
                log::warn!("Skipping line element (OBJ line {})", line_index + 1);
            }
            Some("f") => {
                seen_elements = true;
                let corners = tokens
                    .map(|corner| {
                        corner
                            .split('/')
                            .next()
                            .and_then(|index| index.parse::<usize>().ok())
                            .and_then(|index| index.checked_sub(1))
                            .ok_or(ObjOpenError::InvalidFace {
                                line: line_index + 1,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                if corners.len() < 3 {
                    log::warn!(
                        "Skipping face with {} corners (OBJ line {})",
                        corners.len(),
                        line_index + 1
                    );
                } else {
                    polygons.push(corners);
                }
            }
            _ => {}
        }
    }

    Ok(polygons)
}

#[derive(Debug, Error)]
pub enum ObjOpenError {
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseError(#[from] wavefront_obj::ParseError),

    #[error("File does not contain any object")]
    NoObject,

    #[error("Face vertex index is not a positive number (OBJ line {line})")]
    InvalidFace { line: usize },

    #[error("Faces read as {read} triangles, but the parser produced {parsed}")]
    FaceMismatch { parsed: usize, read: usize },

    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use assert2::{assert, let_assert};

    const QUAD_OBJ: &str = "\
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3
f 1 3 4
";

    #[test]
    fn load_quad() {
        let_assert!(Ok(mesh) = Mesh::from_obj_source(QUAD_OBJ));
        assert!(mesh.vertex_count() == 4);
        assert!(mesh.triangle_count() == 2);
        for triangle in mesh.triangle_indices() {
            assert!(triangle.iter().all(|i| *i < 4));
        }
    }

    const PENTAGON_OBJ: &str = "\
o pentagon
v 1.0 0.0 0.0
v 0.309 0.951 0.0
v -0.809 0.588 0.0
v -0.809 -0.588 0.0
v 0.309 -0.951 0.0
f 1 2 3 4 5
";

    #[test]
    fn polygons_fan_around_first_corner() {
        let quad_source = QUAD_OBJ.replace("f 1 2 3\nf 1 3 4", "f 1 2 3 4");
        let_assert!(Ok(quad) = Mesh::from_obj_source(quad_source));
        assert!(
            quad.triangle_indices().collect::<Vec<_>>()
                == vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)]
        );

        let_assert!(Ok(pentagon) = Mesh::from_obj_source(PENTAGON_OBJ));
        assert!(
            pentagon.triangle_indices().collect::<Vec<_>>()
                == vec![
                    Triangle::new(0, 1, 2),
                    Triangle::new(0, 2, 3),
                    Triangle::new(0, 3, 4),
                ]
        );
    }

    #[test]
    fn face_corners_with_normals_and_comments() {
        let source = "\
# square with a shared normal
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1 # quad
l 1 3
";
        let_assert!(Ok(mesh) = Mesh::from_obj_source(source));
        assert!(
            mesh.triangle_indices().collect::<Vec<_>>()
                == vec![Triangle::new(0, 1, 2), Triangle::new(0, 2, 3)]
        );
    }

    #[test]
    fn only_first_object_faces() {
        let source = format!("{PENTAGON_OBJ}o second\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 6 7 8\n");
        let_assert!(Ok(mesh) = Mesh::from_obj_source(source));
        assert!(mesh.vertex_count() == 5);
        assert!(mesh.triangle_count() == 3);
    }

    #[test]
    fn empty_source_fails() {
        assert!(Mesh::from_obj_source("").is_err());
    }

    #[test]
    fn missing_file() {
        let_assert!(
            Err(ObjOpenError::ReadError(_)) = Mesh::with_obj("this/file/does/not/exist.obj")
        );
    }
}
