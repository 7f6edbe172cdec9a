use std::thread;

use image::Rgb;

use crate::{
    camera::CameraRay,
    geometry::Color,
    renderer::{
        machinery::{Progress, RenderState},
        shading::color_for_ray,
    },
};

/// Body of the render thread.
/// Traces the camera rays in order, one ray per step, stopping at ray boundaries when
/// paused and quitting when cancelled.
pub(super) fn run<F: Fn(Progress)>(state: &RenderState, ray_finished_callback: F) {
    let total = state.rays.len();

    for camera_ray in &state.rays {
        if !state.checkpoint() {
            log::info!(
                "Render cancelled after {} of {} rays",
                state.finished_rays(),
                total
            );
            return;
        }

        render_ray(state, camera_ray);
        let finished = state.mark_ray_finished();
        (ray_finished_callback)(Progress { finished, total });

        // Give the controller a chance to grab the control lock
        thread::yield_now();
    }

    state.finish();
    log::info!("Render completed, {total} rays traced");
}

fn render_ray(state: &RenderState, camera_ray: &CameraRay) {
    let scene = &state.scene;
    let ray = scene.camera.ray(camera_ray);
    let color = color_for_ray(&ray, &scene.lights, &scene.objects);

    let position = scene.camera.pixel_position(camera_ray.pixel_index);
    state
        .image
        .lock()
        .expect("Poisoned lock!")
        .put_pixel(position.x, position.y, color_to_image(color));
}

/// Maps a 0-1 f32 rgb color to pixel type compatible with module image.
pub fn color_to_image(color: Color) -> Rgb<u8> {
    Rgb([
        (color.x * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.y * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.z * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn color_conversion() {
        assert!(color_to_image(Color::new(0.0, 0.5, 1.0)) == Rgb([0, 128, 255]));
        assert!(color_to_image(Color::new(-1.0, 2.0, 0.2)) == Rgb([0, 255, 51]));
    }
}
