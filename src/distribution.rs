use crate::primitive::{Intersection, Primitive, Shape};
use crate::ray::Ray;
use crate::utils;
use crate::vector::Vector3;

use rand::rngs::SmallRng;
use std::f32;

// Direction sampling strategies for the diffuse bounce. Light-surface
// variants do not own their primitive; they hold an index into the
// immutable scene primitive array, which outlives every sampler.
pub enum Distribution {
    Cosine,
    BoxSurface { prim: usize },
    EllipsoidSurface { prim: usize },
}

impl Distribution {
    // Returns a unit direction leaving x. `n` is only consulted by the
    // cosine lobe.
    pub fn sample(
        &self,
        primitives: &[Primitive],
        rng: &mut SmallRng,
        x: Vector3,
        n: Vector3,
    ) -> Vector3 {
        match self {
            Distribution::Cosine => sample_cosine(rng, n),
            Distribution::BoxSurface { prim } => sample_box(&primitives[*prim], rng, x),
            Distribution::EllipsoidSurface { prim } => {
                sample_ellipsoid(&primitives[*prim], rng, x)
            }
        }
    }

    // Probability density of direction d with respect to solid angle.
    pub fn pdf(&self, primitives: &[Primitive], x: Vector3, n: Vector3, d: Vector3) -> f32 {
        match self {
            Distribution::Cosine => pdf_cosine(n, d),
            Distribution::BoxSurface { prim } => pdf_box(&primitives[*prim], x, d),
            Distribution::EllipsoidSurface { prim } => pdf_ellipsoid(&primitives[*prim], x, d),
        }
    }
}

fn sample_cosine(rng: &mut SmallRng, n: Vector3) -> Vector3 {
    let v = utils::isotropic_unit_vector(rng);
    let dir = v + n;
    // v can land almost exactly opposite n; fall back to the normal.
    if dir.length() < 1e-4_f32 {
        return n;
    }
    dir.normalized()
}

fn pdf_cosine(n: Vector3, d: Vector3) -> f32 {
    (d.dot(n) / f32::consts::PI).max(0.0_f32)
}

fn sample_box(prim: &Primitive, rng: &mut SmallRng, x: Vector3) -> Vector3 {
    let s = match prim.shape {
        Shape::Box { s } => s,
        _ => panic!("Box surface sampler was given a non-box primitive!"),
    };
    let w_x = s.x() * s.x();
    let w_y = s.y() * s.y();
    let w_z = s.z() * s.z();

    loop {
        let u = utils::uniform(rng) * (w_x + w_y + w_z);
        let side = if utils::uniform(rng) <= 0.5_f32 {
            1.0_f32
        } else {
            -1.0_f32
        };
        let c1 = (2.0_f32 * utils::uniform(rng) - 1.0_f32) * s.x();
        let c2 = (2.0_f32 * utils::uniform(rng) - 1.0_f32) * s.y();
        let c3 = (2.0_f32 * utils::uniform(rng) - 1.0_f32) * s.z();

        // Pick the face axis by weight, pin that coordinate to the face.
        let pnt = if u < w_x {
            Vector3::new(side * s.x(), c2, c3)
        } else if u < w_x + w_y {
            Vector3::new(c1, side * s.y(), c3)
        } else {
            Vector3::new(c1, c2, side * s.z())
        };

        let on_box = prim.rot.rotate(pnt) + prim.pos;
        let dir = (on_box - x).normalized();
        // The surface point is only useful if the ray from x actually
        // reaches the box; grazing picks can fail the solver.
        if prim.intersect(&Ray::new(x, dir)).is_some() {
            return dir;
        }
    }
}

// Face-uniform surface density converted to solid angle at the hit.
fn pdf_box_point(s: Vector3, dist2: f32, normal: Vector3, d: Vector3) -> f32 {
    let weight_total = s.x() * s.x() + s.y() * s.y() + s.z() * s.z();
    let p_area = 1.0_f32 / (2.0_f32 * 4.0_f32 * weight_total);
    p_area * dist2 / d.dot(normal).abs()
}

fn pdf_box(prim: &Primitive, x: Vector3, d: Vector3) -> f32 {
    let s = match prim.shape {
        Shape::Box { s } => s,
        _ => panic!("Box surface sampler was given a non-box primitive!"),
    };

    let (first, second) = surface_hits(prim, x, d);
    let first = match first {
        Some(i) => i,
        None => return utils::PDF_FLOOR,
    };

    let mut sum = pdf_box_point(s, (d * first.t).squared_length(), first.normal, d);
    match second {
        Some(i) => {
            sum += pdf_box_point(s, (d * i.t).squared_length(), i.normal, d);
        }
        None => {}
    }
    return sum;
}

fn sample_ellipsoid(prim: &Primitive, rng: &mut SmallRng, x: Vector3) -> Vector3 {
    let r = match prim.shape {
        Shape::Ellipsoid { r } => r,
        _ => panic!("Ellipsoid surface sampler was given a non-ellipsoid primitive!"),
    };

    loop {
        let k = utils::isotropic_unit_vector(rng);
        let on_ellipsoid = prim.rot.rotate(r * k) + prim.pos;
        let dir = (on_ellipsoid - x).normalized();
        if prim.intersect(&Ray::new(x, dir)).is_some() {
            return dir;
        }
    }
}

// Density of the sphere-stretch parameterization at surface point y,
// converted to solid angle. m is y pulled back onto the unit sphere.
fn pdf_ellipsoid_point(prim: &Primitive, r: Vector3, y: Vector3, normal: Vector3, d: Vector3, dist2: f32) -> f32 {
    let m = prim.rot.inverse_rotate(y - prim.pos) / r;
    let jacobian = Vector3::new(
        m.x() * r.y() * r.z(),
        r.x() * m.y() * r.z(),
        r.x() * r.y() * m.z(),
    )
    .length();
    let p_area = 1.0_f32 / (4.0_f32 * f32::consts::PI * jacobian);
    p_area * dist2 / d.dot(normal).abs()
}

fn pdf_ellipsoid(prim: &Primitive, x: Vector3, d: Vector3) -> f32 {
    let r = match prim.shape {
        Shape::Ellipsoid { r } => r,
        _ => panic!("Ellipsoid surface sampler was given a non-ellipsoid primitive!"),
    };

    let (first, second) = surface_hits(prim, x, d);
    let first = match first {
        Some(i) => i,
        None => return utils::PDF_FLOOR,
    };

    let mut sum = pdf_ellipsoid_point(
        prim,
        r,
        x + d * first.t,
        first.normal,
        d,
        (d * first.t).squared_length(),
    );
    match second {
        Some(i) => {
            sum += pdf_ellipsoid_point(prim, r, x + d * i.t, i.normal, d, (d * i.t).squared_length());
        }
        None => {}
    }
    return sum;
}

// A ray into a closed primitive meets its surface up to twice: once
// entering and once leaving. The second solve restarts just past the
// first hit and is reported in the original parameterization.
fn surface_hits(prim: &Primitive, x: Vector3, d: Vector3) -> (Option<Intersection>, Option<Intersection>) {
    let first = match prim.intersect(&Ray::new(x, d)) {
        Some(i) => i,
        None => return (None, None),
    };
    if first.t <= 1e-8_f32 {
        return (None, None);
    }

    let inner = x + d * (first.t + utils::EPS);
    let second = match prim.intersect(&Ray::new(inner, d)) {
        Some(i) => Some(Intersection {
            t: i.t + first.t + utils::EPS,
            normal: i.normal,
            interior: i.interior,
        }),
        None => None,
    };
    (Some(first), second)
}

// A 50/50 blend of the cosine lobe and the scene's light surfaces; with
// no lights, just the cosine lobe.
pub struct Mixture {
    components: Vec<Distribution>,
}

impl Mixture {
    pub fn new(components: Vec<Distribution>) -> Mixture {
        Mixture {
            components: components,
        }
    }

    pub fn sample(
        &self,
        primitives: &[Primitive],
        rng: &mut SmallRng,
        x: Vector3,
        n: Vector3,
    ) -> Vector3 {
        if self.components.is_empty() || utils::uniform(rng) <= 0.5_f32 {
            return Distribution::Cosine.sample(primitives, rng, x, n);
        }
        let count = self.components.len();
        let id = ((utils::uniform(rng) * count as f32) as usize).min(count - 1);
        self.components[id].sample(primitives, rng, x, n)
    }

    pub fn pdf(&self, primitives: &[Primitive], x: Vector3, n: Vector3, d: Vector3) -> f32 {
        let cosine = Distribution::Cosine.pdf(primitives, x, n, d);
        if self.components.is_empty() {
            return cosine;
        }
        let mut lights = 0.0_f32;
        for component in &self.components {
            lights += component.pdf(primitives, x, n, d);
        }
        lights /= self.components.len() as f32;
        0.5_f32 * cosine + 0.5_f32 * lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::color::RGB;
    use crate::primitive::Material;
    use crate::quaternion::Quaternion;

    use rand::SeedableRng;

    fn light(shape: Shape, pos: Vector3, rot: Quaternion) -> Primitive {
        Primitive {
            shape: shape,
            col: RGB::new(1.0_f32, 1.0_f32, 1.0_f32),
            emission: RGB::new(1.0_f32, 1.0_f32, 1.0_f32),
            pos: pos,
            rot: rot,
            material: Material::Diffuse,
            ior: 0.0_f32,
        }
    }

    // Monte-Carlo estimate of the solid-angle integral of a pdf: draw
    // uniform sphere directions and average pdf * 4pi.
    fn integrate_pdf<F: Fn(Vector3) -> f32>(rng: &mut SmallRng, pdf: F, samples: u32) -> f32 {
        let mut sum = 0.0_f64;
        for _ in 0..samples {
            let d = utils::isotropic_unit_vector(rng);
            sum += (pdf(d) * 4.0_f32 * f32::consts::PI) as f64;
        }
        (sum / samples as f64) as f32
    }

    #[test]
    fn cosine_pdf_integrates_to_one() {
        let mut rng = SmallRng::seed_from_u64(51);
        let n = Vector3::new(0.0_f32, 0.0_f32, 1.0_f32);
        let total = integrate_pdf(&mut rng, |d| pdf_cosine(n, d), 200_000);
        assert!((total - 1.0_f32).abs() < 0.02_f32);
    }

    #[test]
    fn cube_surface_pdf_integrates_to_one() {
        // Equal half-extents keep the face-uniform density consistent
        // with the weighted face pick, so the density must normalize.
        let half = std::f32::consts::FRAC_PI_4;
        let prim = light(
            Shape::Box {
                s: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
            },
            Vector3::new(0.0_f32, 1.0_f32, 5.0_f32),
            Quaternion::new(0.0_f32, half.sin(), 0.0_f32, half.cos()),
        );
        let primitives = vec![prim];
        let x = Vector3::new_empty();

        let mut rng = SmallRng::seed_from_u64(52);
        let total = integrate_pdf(
            &mut rng,
            |d| pdf_box(&primitives[0], x, d),
            400_000,
        );
        assert!((total - 1.0_f32).abs() < 0.02_f32);
    }

    #[test]
    fn ellipsoid_surface_pdf_integrates_to_one() {
        let prim = light(
            Shape::Ellipsoid {
                r: Vector3::new(0.5_f32, 1.0_f32, 1.5_f32),
            },
            Vector3::new(0.0_f32, 0.0_f32, 6.0_f32),
            Quaternion::new(0.1_f32, 0.3_f32, -0.2_f32, 0.9_f32).normalized(),
        );
        let primitives = vec![prim];
        let x = Vector3::new_empty();

        let mut rng = SmallRng::seed_from_u64(53);
        let total = integrate_pdf(
            &mut rng,
            |d| pdf_ellipsoid(&primitives[0], x, d),
            400_000,
        );
        assert!((total - 1.0_f32).abs() < 0.02_f32);
    }

    #[test]
    fn samples_always_have_positive_density() {
        let primitives = vec![
            light(
                Shape::Box {
                    s: Vector3::new(0.5_f32, 1.0_f32, 0.25_f32),
                },
                Vector3::new(2.0_f32, 3.0_f32, 4.0_f32),
                Quaternion::identity(),
            ),
            light(
                Shape::Ellipsoid {
                    r: Vector3::new(1.0_f32, 0.5_f32, 2.0_f32),
                },
                Vector3::new(-3.0_f32, 1.0_f32, 2.0_f32),
                Quaternion::identity(),
            ),
        ];
        let x = Vector3::new_empty();
        let n = Vector3::new(0.0_f32, 1.0_f32, 0.0_f32);
        let distributions = [
            Distribution::Cosine,
            Distribution::BoxSurface { prim: 0 },
            Distribution::EllipsoidSurface { prim: 1 },
        ];

        let mut rng = SmallRng::seed_from_u64(54);
        for distribution in distributions.iter() {
            for _ in 0..200 {
                let d = distribution.sample(&primitives, &mut rng, x, n);
                assert!((d.length() - 1.0_f32).abs() < 1e-4);
                assert!(distribution.pdf(&primitives, x, n, d) > 1e-6_f32);
            }
        }
    }

    #[test]
    fn surface_pdf_counts_entry_and_exit() {
        let prim = light(
            Shape::Box {
                s: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
            },
            Vector3::new(0.0_f32, 0.0_f32, 5.0_f32),
            Quaternion::identity(),
        );
        let x = Vector3::new_empty();
        let d = Vector3::new(0.0_f32, 0.0_f32, 1.0_f32);

        let (first, second) = surface_hits(&prim, x, d);
        let first = first.unwrap();
        let second = second.unwrap();
        assert!((first.t - 4.0_f32).abs() < 1e-3);
        assert!((second.t - 6.0_f32).abs() < 1e-3);
        assert!(!first.interior);
        assert!(second.interior);
    }

    #[test]
    fn missed_surface_returns_the_density_floor() {
        let prim = light(
            Shape::Ellipsoid {
                r: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
            },
            Vector3::new(0.0_f32, 0.0_f32, 5.0_f32),
            Quaternion::identity(),
        );
        let away = Vector3::new(0.0_f32, 0.0_f32, -1.0_f32);
        assert!(pdf_ellipsoid(&prim, Vector3::new_empty(), away) == utils::PDF_FLOOR);
    }

    #[test]
    fn mixture_blends_cosine_and_lights_evenly() {
        let primitives = vec![
            light(
                Shape::Box {
                    s: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
                },
                Vector3::new(0.0_f32, 0.0_f32, 5.0_f32),
                Quaternion::identity(),
            ),
            light(
                Shape::Ellipsoid {
                    r: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
                },
                Vector3::new(4.0_f32, 0.0_f32, 0.0_f32),
                Quaternion::identity(),
            ),
        ];
        let mixture = Mixture::new(vec![
            Distribution::BoxSurface { prim: 0 },
            Distribution::EllipsoidSurface { prim: 1 },
        ]);

        let x = Vector3::new_empty();
        let n = Vector3::new(0.0_f32, 0.0_f32, 1.0_f32);
        let d = Vector3::new(0.6_f32, 0.0_f32, 0.8_f32);

        let expected = 0.5_f32 * pdf_cosine(n, d)
            + 0.5_f32
                * (pdf_box(&primitives[0], x, d) + pdf_ellipsoid(&primitives[1], x, d))
                / 2.0_f32;
        let got = mixture.pdf(&primitives, x, n, d);
        assert!((got - expected).abs() < 1e-6);
    }

    #[test]
    fn empty_mixture_is_the_cosine_lobe() {
        let primitives: Vec<Primitive> = Vec::new();
        let mixture = Mixture::new(Vec::new());
        let x = Vector3::new_empty();
        let n = Vector3::new(0.0_f32, 1.0_f32, 0.0_f32);

        let mut rng = SmallRng::seed_from_u64(55);
        for _ in 0..100 {
            let d = utils::isotropic_unit_vector(&mut rng);
            assert!(mixture.pdf(&primitives, x, n, d) == pdf_cosine(n, d));
        }

        // Sampling with no lights must also stay in the upper hemisphere
        // (modulo the degenerate fallback).
        for _ in 0..100 {
            let d = mixture.sample(&primitives, &mut rng, x, n);
            assert!(d.dot(n) >= 0.0_f32);
        }
    }
}
