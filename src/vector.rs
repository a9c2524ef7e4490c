use std::ops;

// One three-component type covers points, directions, normals and
// shape payloads alike. The frame transforms rescale and rotate all of
// them with the same componentwise arithmetic, and the scene format
// writes each as a bare float triple, so a separate point type would
// buy nothing but conversions. Components are immutable once built:
// reads go through accessors, writes only through construction.
pub struct Vector3 {
    x: f32,
    y: f32,
    z: f32,
}

// Plain data; the hot path passes these by value rather than chase
// references.
impl Copy for Vector3 {}
impl Clone for Vector3 {
    fn clone(&self) -> Vector3 {
        *self
    }
}

impl Vector3 {
    pub fn new_empty() -> Vector3 {
        Vector3::new(0.0_f32, 0.0_f32, 0.0_f32)
    }

    pub fn new(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3 { x: x, y: y, z: z }
    }

    pub fn x(&self) -> f32 {
        self.x
    }
    pub fn y(&self) -> f32 {
        self.y
    }
    pub fn z(&self) -> f32 {
        self.z
    }

    // Componentwise envelopes, as the bounding-box code wants them. A
    // NaN component loses against any real number here, which lets the
    // slab test treat an unconstrained axis as no constraint.
    pub fn min(v1: Vector3, v2: Vector3) -> Vector3 {
        Vector3::new(v1.x.min(v2.x), v1.y.min(v2.y), v1.z.min(v2.z))
    }

    pub fn max(v1: Vector3, v2: Vector3) -> Vector3 {
        Vector3::new(v1.x.max(v2.x), v1.y.max(v2.y), v1.z.max(v2.z))
    }

    pub fn dot(self, other: Vector3) -> f32 {
        (self.x * other.x) + (self.y * other.y) + (self.z * other.z)
    }

    pub fn squared_length(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.squared_length().sqrt()
    }

    pub fn normalized(self) -> Vector3 {
        self / self.length()
    }

    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3::new(
            (self.y * other.z) - (self.z * other.y),
            (self.z * other.x) - (self.x * other.z),
            (self.x * other.y) - (self.y * other.x),
        )
    }
}

impl ops::Add for Vector3 {
    type Output = Vector3;
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl ops::Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl ops::Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

// Componentwise product; used for payload algebra like the squared
// semi-axes of the ellipsoid normal.
impl ops::Mul for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl ops::Mul<f32> for Vector3 {
    type Output = Vector3;
    fn mul(self, rhs: f32) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl ops::Mul<Vector3> for f32 {
    type Output = Vector3;
    fn mul(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self * rhs.x, self * rhs.y, self * rhs.z)
    }
}

// Componentwise division rescales a ray into the unit frame of a slab
// or quadric; division by a zero component is deliberate and produces
// the infinities the solvers filter on.
impl ops::Div for Vector3 {
    type Output = Vector3;
    fn div(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

impl ops::Div<f32> for Vector3 {
    type Output = Vector3;
    fn div(self, rhs: f32) -> Vector3 {
        Vector3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

pub enum Axis {
    X,
    Y,
    Z,
}

impl Copy for Axis {}
impl Clone for Axis {
    fn clone(&self) -> Axis {
        *self
    }
}

impl ops::Index<Axis> for Vector3 {
    type Output = f32;
    fn index(&self, index: Axis) -> &f32 {
        match index {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vector3::new(1.0_f32, 0.0_f32, 0.0_f32);
        let y = Vector3::new(0.0_f32, 1.0_f32, 0.0_f32);
        let z = x.cross(y);
        assert!((z.x() - 0.0_f32).abs() < 1e-6);
        assert!((z.y() - 0.0_f32).abs() < 1e-6);
        assert!((z.z() - 1.0_f32).abs() < 1e-6);
    }

    #[test]
    fn componentwise_division() {
        let v = Vector3::new(2.0_f32, 9.0_f32, -4.0_f32) / Vector3::new(2.0_f32, 3.0_f32, 4.0_f32);
        assert!((v.x() - 1.0_f32).abs() < 1e-6);
        assert!((v.y() - 3.0_f32).abs() < 1e-6);
        assert!((v.z() + 1.0_f32).abs() < 1e-6);
    }

    #[test]
    fn division_by_zero_component_yields_infinity() {
        let v = Vector3::new(1.0_f32, -1.0_f32, 0.0_f32) / Vector3::new_empty();
        assert!(v.x() == std::f32::INFINITY);
        assert!(v.y() == std::f32::NEG_INFINITY);
        assert!(v.z().is_nan());
    }

    #[test]
    fn envelopes_ignore_nan_components() {
        let v = Vector3::min(
            Vector3::new(std::f32::NAN, 2.0_f32, 3.0_f32),
            Vector3::new(1.0_f32, std::f32::NAN, -3.0_f32),
        );
        assert!(v.x() == 1.0_f32);
        assert!(v.y() == 2.0_f32);
        assert!(v.z() == -3.0_f32);
    }

    #[test]
    fn normalized_has_unit_length() {
        let v = Vector3::new(3.0_f32, -4.0_f32, 12.0_f32).normalized();
        assert!((v.length() - 1.0_f32).abs() < 1e-6);
    }
}
