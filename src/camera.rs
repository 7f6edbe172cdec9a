use assert2::assert;
use bon::bon;
use nalgebra::Unit;
use rand::seq::SliceRandom as _;

use crate::geometry::{FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector};

/// Pinhole camera looking down the negative Z axis, Y up.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    position: WorldPoint,

    /// Vertical field of view in radians
    fov_y: FloatType,
    focal_length: FloatType,
    /// Width / height
    aspect_ratio: FloatType,

    resolution: ScreenSize,
    /// Distance between pixel centers on the image plane
    pixel_pitch: FloatType,
}

/// Direction of a primary ray and the frame buffer pixel it colors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraRay {
    pub direction: Unit<WorldVector>,
    /// Row major index, top row first
    pub pixel_index: usize,
}

#[bon]
impl Camera {
    /// Image plane size is `2 * focal_length * tan(fov_y / 2)` high and `aspect_ratio` times
    /// that wide, one pixel per unit of length (rounded, at least one pixel).
    ///
    /// Panics if `fov_y` is not within (0, pi), or if focal length or aspect ratio is not positive.
    #[builder]
    pub fn new(
        position: WorldPoint,
        fov_y: FloatType,
        focal_length: FloatType,
        aspect_ratio: FloatType,
    ) -> Self {
        assert!(fov_y > 0.0);
        assert!(fov_y < std::f32::consts::PI);
        assert!(focal_length > 0.0);
        assert!(aspect_ratio > 0.0);

        let film_height = 2.0 * focal_length * (fov_y / 2.0).tan();
        let film_width = aspect_ratio * film_height;
        let resolution = ScreenSize::new(pixel_count(film_width), pixel_count(film_height));

        Camera {
            position,
            fov_y,
            focal_length,
            aspect_ratio,
            resolution,
            pixel_pitch: film_height / resolution.y as FloatType,
        }
    }
}

fn pixel_count(film_size: FloatType) -> u32 {
    (film_size.round() as u32).max(1)
}

impl Camera {
    pub fn get_resolution(&self) -> ScreenSize {
        self.resolution
    }

    pub fn pixel_count(&self) -> usize {
        self.resolution.x as usize * self.resolution.y as usize
    }

    pub fn position(&self) -> WorldPoint {
        self.position
    }

    pub fn fov_y(&self) -> FloatType {
        self.fov_y
    }

    pub fn focal_length(&self) -> FloatType {
        self.focal_length
    }

    pub fn aspect_ratio(&self) -> FloatType {
        self.aspect_ratio
    }

    /// One ray per pixel, through the pixel centers.
    /// Generated bottom scanline first, left to right.
    pub fn rays(&self) -> Vec<CameraRay> {
        let width = self.resolution.x;
        let height = self.resolution.y;
        let half_width = width as FloatType / 2.0;
        let half_height = height as FloatType / 2.0;

        (0..height)
            .flat_map(|row| (0..width).map(move |column| (row, column)))
            .map(|(row, column)| {
                let x = (column as FloatType + 0.5 - half_width) * self.pixel_pitch;
                let y = (row as FloatType + 0.5 - half_height) * self.pixel_pitch;
                CameraRay {
                    direction: Unit::new_normalize(WorldVector::new(x, y, -self.focal_length)),
                    pixel_index: ((height - row - 1) * width + column) as usize,
                }
            })
            .collect()
    }

    /// All rays in uniformly random order, so that a partial render covers the whole frame.
    pub fn shuffled_rays(&self, rng: &mut impl rand::Rng) -> Vec<CameraRay> {
        let mut rays = self.rays();
        rays.shuffle(rng);
        rays
    }

    pub fn ray(&self, camera_ray: &CameraRay) -> Ray {
        Ray {
            origin: self.position,
            direction: camera_ray.direction,
        }
    }

    /// Converts a frame buffer pixel index to image coordinates (top left origin).
    pub fn pixel_position(&self, pixel_index: usize) -> ScreenPoint {
        let width = self.resolution.x as usize;
        ScreenPoint::new((pixel_index % width) as u32, (pixel_index / width) as u32)
    }
}
