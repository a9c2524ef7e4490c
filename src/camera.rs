use crate::ray::Ray;
use crate::vector::Vector3;

pub struct Camera {
    pub pos: Vector3,
    pub right: Vector3,
    pub up: Vector3,
    pub forward: Vector3,
    pub fov_x: f32,
    pub width: u32,
    pub height: u32,
}

impl Camera {
    pub fn new() -> Camera {
        Camera {
            pos: Vector3::new_empty(),
            right: Vector3::new(1.0_f32, 0.0_f32, 0.0_f32),
            up: Vector3::new(0.0_f32, 1.0_f32, 0.0_f32),
            forward: Vector3::new(0.0_f32, 0.0_f32, 1.0_f32),
            fov_x: std::f32::consts::FRAC_PI_2,
            width: 0,
            height: 0,
        }
    }

    // Maps a raster position (fractional pixels, y growing downwards) to
    // a ray through the camera basis. The vertical tangent is derived
    // from the horizontal field of view and the aspect ratio.
    pub fn get_ray(&self, x: f32, y: f32) -> Ray {
        let tan_fov_x = (self.fov_x / 2.0_f32).tan();
        let tan_fov_y = tan_fov_x * self.height as f32 / self.width as f32;

        let nx = (2.0_f32 * x / self.width as f32 - 1.0_f32) * tan_fov_x;
        let ny = -1.0_f32 * (2.0_f32 * y / self.height as f32 - 1.0_f32) * tan_fov_y;

        Ray::new(
            self.pos,
            (nx * self.right) + (ny * self.up) + self.forward,
        )
    }
}
