use crate::vector::Vector3;

use rand::rngs::SmallRng;
use rand::Rng;
use std::f32;

// Offset applied when restarting a ray from a surface, so the new ray
// does not immediately re-intersect the surface it left.
pub const EPS: f32 = 1e-4_f32;

// Plane hits beyond this distance are discarded. Keeps enormous
// ray parameters from feeding the integrator.
pub const T_FAR: f32 = 1e5_f32;

// Returned by a surface sampler's density query when the direction
// misses the surface entirely, so mixture weights never divide by zero.
pub const PDF_FLOOR: f32 = 1e-9_f32;

pub fn clamp(v: f32, min: f32, max: f32) -> f32 {
    if v > max {
        max
    } else if v < min {
        min
    } else {
        v
    }
}

pub fn uniform(rng: &mut SmallRng) -> f32 {
    rng.gen::<f32>()
}

// Box-Muller transform; one standard normal variate per call.
pub fn normal_random(rng: &mut SmallRng) -> f32 {
    let u1 = rng.gen::<f32>();
    let u2 = rng.gen::<f32>();
    (-2.0_f32 * (1.0_f32 - u1).ln()).sqrt() * (2.0_f32 * f32::consts::PI * u2).cos()
}

// Three standard normals, normalized: uniform over the unit sphere.
pub fn isotropic_unit_vector(rng: &mut SmallRng) -> Vector3 {
    Vector3::new(
        normal_random(rng),
        normal_random(rng),
        normal_random(rng),
    )
    .normalized()
}
