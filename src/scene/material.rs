use std::sync::Arc;

use crate::geometry::{Color, FloatType};

/// Phong surface parameters.
/// Immutable once built; objects share one through `Arc<Material>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    ambient: Color,
    diffuse: Color,
    specular: Color,
    shininess: FloatType,
}

impl Material {
    pub fn new(ambient: Color, diffuse: Color, specular: Color, shininess: FloatType) -> Material {
        Material {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Wraps the material in a handle that can be handed out to derived objects.
    pub fn shared(self) -> Arc<Material> {
        Arc::new(self)
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    pub fn diffuse(&self) -> Color {
        self.diffuse
    }

    pub fn specular(&self) -> Color {
        self.specular
    }

    pub fn shininess(&self) -> FloatType {
        self.shininess
    }
}
