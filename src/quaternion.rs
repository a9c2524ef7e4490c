use crate::vector::Vector3;

use std::ops;

// A rotation stored as (v, w) with v the imaginary part. Rotating a
// vector p computes q * (p, 0) * conjugate(q) and keeps the imaginary
// part; for unit quaternions the conjugate is the inverse, so the
// reverse rotation conjugates first.
pub struct Quaternion {
    v: Vector3,
    w: f32,
}

impl Copy for Quaternion {}
impl Clone for Quaternion {
    fn clone(&self) -> Quaternion {
        *self
    }
}

impl Quaternion {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Quaternion {
        Quaternion {
            v: Vector3::new(x, y, z),
            w: w,
        }
    }

    pub fn identity() -> Quaternion {
        Quaternion {
            v: Vector3::new_empty(),
            w: 1.0_f32,
        }
    }

    fn pure(v: Vector3) -> Quaternion {
        Quaternion { v: v, w: 0.0_f32 }
    }

    pub fn conjugate(self) -> Quaternion {
        Quaternion {
            v: -self.v,
            w: self.w,
        }
    }

    pub fn normalized(self) -> Quaternion {
        let norm = (self.v.dot(self.v) + self.w * self.w).sqrt();
        Quaternion {
            v: self.v / norm,
            w: self.w / norm,
        }
    }

    pub fn rotate(self, p: Vector3) -> Vector3 {
        (self * Quaternion::pure(p) * self.conjugate()).v
    }

    pub fn inverse_rotate(self, p: Vector3) -> Vector3 {
        self.conjugate().rotate(p)
    }
}

impl ops::Mul for Quaternion {
    type Output = Quaternion;
    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion {
            v: (self.w * rhs.v) + (rhs.w * self.v) + self.v.cross(rhs.v),
            w: (self.w * rhs.w) - self.v.dot(rhs.v),
        }
    }
}
