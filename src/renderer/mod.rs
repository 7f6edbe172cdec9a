mod machinery;
mod shading;
mod worker;

pub use crate::renderer::machinery::{Progress, RenderProgress, RenderStatus, render};
pub use crate::renderer::shading::{background, clamp_color, color_for_ray};
pub use crate::renderer::worker::color_to_image;

#[derive(Copy, Clone, Debug, Default)]
pub struct RenderSettings {
    /// Seed for the ray order shuffle, random if not set.
    pub shuffle_seed: Option<u64>,
}
