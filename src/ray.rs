use crate::vector::Vector3;

// The origin is a bare Vector3, not a dedicated point type: every
// frame change in this renderer moves a ray by rotating both fields
// and translating only the origin, and the intersectors immediately
// feed both into the same componentwise algebra. `dir` is not
// required to be unit; the analytic solvers are parameterization
// aware, and `point_at` works in whatever scale `dir` carries.
pub struct Ray {
    pub origin: Vector3,
    pub dir: Vector3,
}

impl Ray {
    pub fn new(origin: Vector3, dir: Vector3) -> Ray {
        Ray {
            origin: origin,
            dir: dir,
        }
    }

    pub fn point_at(&self, t: f32) -> Vector3 {
        self.origin + (self.dir * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_at_scales_with_the_direction() {
        let r = Ray::new(
            Vector3::new(1.0_f32, 0.0_f32, 0.0_f32),
            Vector3::new(0.0_f32, 2.0_f32, 0.0_f32),
        );
        let p = r.point_at(3.0_f32);
        assert!((p.x() - 1.0_f32).abs() < 1e-6);
        assert!((p.y() - 6.0_f32).abs() < 1e-6);
        assert!((p.z() - 0.0_f32).abs() < 1e-6);
    }
}
