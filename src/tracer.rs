use crate::color::RGB;
use crate::primitive::{Intersection, Material};
use crate::ray::Ray;
use crate::scene::Scene;
use crate::utils;
use crate::vector::Vector3;

use rand::rngs::SmallRng;
use std::f32;

fn reflect(v: Vector3, n: Vector3) -> Vector3 {
    v - 2.0_f32 * v.dot(n) * n
}

fn schlick(cosine: f32, eta1: f32, eta2: f32) -> f32 {
    let mut r0 = (eta1 - eta2) / (eta1 + eta2);
    r0 = r0 * r0;
    r0 + (1.0_f32 - r0) * (1.0_f32 - cosine).powi(5)
}

// Closest hit across the whole scene: the unbounded planes are scanned
// linearly, everything else goes through the BVH. A tie goes to the
// plane, which sits lower in the primitive array.
fn intersect_scene(scene: &Scene, r: &Ray) -> Option<(usize, Intersection)> {
    let mut best: Option<(usize, Intersection)> = None;
    for (i, plane) in scene.primitives[..scene.finite_start].iter().enumerate() {
        match plane.intersect(r) {
            Some(isec) => match &best {
                Some((_, b)) => {
                    if isec.t < b.t {
                        best = Some((i, isec));
                    }
                }
                None => best = Some((i, isec)),
            },
            None => {}
        }
    }

    let closest = match &best {
        Some((_, b)) => b.t,
        None => f32::INFINITY,
    };
    match scene.bvh.intersect(&scene.primitives, r, closest) {
        Some((i, isec)) => {
            if isec.t < closest {
                return Some((i, isec));
            }
            best
        }
        None => best,
    }
}

// The recursive estimator. Every return adds the emission of whatever
// was hit; the material decides how the rest of the budgeted bounces
// are spent.
pub fn trace(scene: &Scene, r: &Ray, rng: &mut SmallRng, depth: u32) -> RGB {
    if depth == 0 {
        return RGB::black();
    }

    let (id, hit) = match intersect_scene(scene, r) {
        Some(found) => found,
        None => return scene.background,
    };
    let primitive = &scene.primitives[id];
    let p = r.point_at(hit.t);
    let n = hit.normal;

    let other = match primitive.material {
        Material::Diffuse => {
            let p_out = p + utils::EPS * n;
            let dir = scene.lights.sample(&scene.primitives, rng, p_out, n);
            if dir.dot(n) <= 0.0_f32 {
                // Sampled into the surface; only emission contributes.
                RGB::black()
            } else {
                let pw = scene.lights.pdf(&scene.primitives, p_out, n, dir);
                let l_in = trace(scene, &Ray::new(p_out, dir), rng, depth - 1);
                (primitive.col / f32::consts::PI) * l_in * dir.dot(n) / pw
            }
        }
        Material::Metallic => {
            let reflect_dir = reflect(r.dir.normalized(), n);
            primitive.col
                * trace(
                    scene,
                    &Ray::new(p + utils::EPS * reflect_dir, reflect_dir),
                    rng,
                    depth - 1,
                )
        }
        Material::Dielectric => {
            let (eta1, eta2) = if hit.interior {
                (primitive.ior, 1.0_f32)
            } else {
                (1.0_f32, primitive.ior)
            };

            let back = -r.dir.normalized();
            let mu = n.dot(back);
            let sin_theta2 = eta1 / eta2 * (1.0_f32 - mu * mu).sqrt();

            if sin_theta2.abs() > 1.0_f32 {
                // Total internal reflection.
                let reflect_dir = reflect(r.dir.normalized(), n);
                trace(
                    scene,
                    &Ray::new(p + utils::EPS * reflect_dir, reflect_dir),
                    rng,
                    depth - 1,
                )
            } else if utils::uniform(rng) < schlick(mu, eta1, eta2) {
                let reflect_dir = reflect(r.dir.normalized(), n);
                trace(
                    scene,
                    &Ray::new(p + utils::EPS * reflect_dir, reflect_dir),
                    rng,
                    depth - 1,
                )
            } else {
                let cos_theta2 = (1.0_f32 - sin_theta2 * sin_theta2).sqrt();
                let refract_dir =
                    (eta1 / eta2) * (-back) + (eta1 / eta2 * mu - cos_theta2) * n;
                let refracted = trace(
                    scene,
                    &Ray::new(p + utils::EPS * refract_dir, refract_dir),
                    rng,
                    depth - 1,
                );
                // Transmission picks up the tint only when entering.
                if hit.interior {
                    refracted
                } else {
                    primitive.col * refracted
                }
            }
        }
    };

    primitive.emission + other
}

// Jittered multi-sample mean over one pixel.
pub fn sample_pixel(scene: &Scene, x: u32, y: u32, rng: &mut SmallRng) -> RGB {
    let mut summary = RGB::black();
    for _ in 0..scene.samples {
        let fx = x as f32 + utils::uniform(rng);
        let fy = y as f32 + utils::uniform(rng);
        summary = summary + trace(scene, &scene.camera.get_ray(fx, fy), rng, scene.ray_depth);
    }
    summary / scene.samples as f32
}
