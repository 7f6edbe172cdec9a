use crate::geometry::{Color, WorldPoint};

/// Point light
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub position: WorldPoint,
    pub color: Color,
}

impl Light {
    pub fn new(position: WorldPoint, color: Color) -> Light {
        Light { position, color }
    }
}
