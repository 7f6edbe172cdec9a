mod camera;
pub mod geometry;
mod renderer;
pub mod scene;

pub use crate::renderer::{
    Progress, RenderProgress, RenderSettings, RenderStatus, background, clamp_color,
    color_for_ray, color_to_image, render,
};
pub use camera::{Camera, CameraRay};
pub use scene::Scene;
