use crate::color::RGB;
use crate::quaternion::Quaternion;
use crate::ray::Ray;
use crate::utils;
use crate::vector::Vector3;

pub enum Material {
    Diffuse,
    Metallic,
    Dielectric,
}

impl Copy for Material {}
impl Clone for Material {
    fn clone(&self) -> Material {
        *self
    }
}

// NOTE: Shapes are a tagged sum rather than boxed trait objects so the
// intersector is a single branch over inline payloads. Every primitive
// fits in one cache-friendly record and the hot loop never chases a
// vtable pointer.
pub enum Shape {
    Plane { n: Vector3 },
    Box { s: Vector3 },
    Ellipsoid { r: Vector3 },
    Triangle { a: Vector3, b: Vector3, c: Vector3 },
}

impl Copy for Shape {}
impl Clone for Shape {
    fn clone(&self) -> Shape {
        *self
    }
}

pub struct Intersection {
    pub t: f32,
    pub normal: Vector3,
    pub interior: bool,
}

impl Copy for Intersection {}
impl Clone for Intersection {
    fn clone(&self) -> Intersection {
        *self
    }
}

pub struct Primitive {
    pub shape: Shape,
    pub col: RGB,
    pub emission: RGB,
    pub pos: Vector3,
    pub rot: Quaternion,
    pub material: Material,
    pub ior: f32,
}

impl Primitive {
    // All solvers run in the primitive's local frame: translate the ray
    // by -pos, rotate it by the inverse rotation, solve, then rotate the
    // resulting normal back out. Triangle vertices are stored in world
    // coordinates and loaded with pos = 0, rot = identity, so for them
    // the wrapper is a no-op unless a scene says otherwise.
    pub fn intersect(&self, r: &Ray) -> Option<Intersection> {
        let local = Ray::new(
            self.rot.inverse_rotate(r.origin - self.pos),
            self.rot.inverse_rotate(r.dir),
        );

        let isec = match self.shape {
            Shape::Plane { n } => intersect_plane(&local, n),
            Shape::Box { s } => {
                if !(s.x() > 0.0_f32 && s.y() > 0.0_f32 && s.z() > 0.0_f32) {
                    return None;
                }
                intersect_box(&local, s)
            }
            Shape::Ellipsoid { r } => {
                if !(r.x() > 0.0_f32 && r.y() > 0.0_f32 && r.z() > 0.0_f32) {
                    return None;
                }
                intersect_ellipsoid(&local, r)
            }
            Shape::Triangle { a, b, c } => intersect_triangle(&local, a, b, c),
        };

        match isec {
            Some(i) => Some(Intersection {
                t: i.t,
                normal: self.rot.rotate(i.normal),
                interior: i.interior,
            }),
            None => None,
        }
    }
}

// Solves against the plane through `anchor` with normal n. A parallel
// ray divides by zero and the resulting infinity (or NaN) fails the
// range check, so it counts as a miss without a special case.
fn plane_solve(o: Vector3, d: Vector3, n: Vector3, anchor: Vector3) -> Option<Intersection> {
    let denom = d.dot(n);
    let t = (anchor - o).dot(n) / denom;
    if !(t > 0.0_f32) || t > utils::T_FAR {
        return None;
    }
    if denom >= 0.0_f32 {
        // Normal points with the ray: we are behind the surface.
        Some(Intersection {
            t: t,
            normal: -n,
            interior: true,
        })
    } else {
        Some(Intersection {
            t: t,
            normal: n,
            interior: false,
        })
    }
}

fn intersect_plane(r: &Ray, n: Vector3) -> Option<Intersection> {
    if n.squared_length() == 0.0_f32 {
        return None;
    }
    plane_solve(r.origin, r.dir, n, Vector3::new_empty())
}

// Slab test against the box [-s, s]. Also reused for bounding boxes,
// so no positivity guard here: a flat slab (zero extent on an axis)
// still resolves because equal entry and exit parameters pass the
// ordering check and NaN components are skipped by min/max.
pub(crate) fn intersect_box(r: &Ray, s: Vector3) -> Option<Intersection> {
    let t1 = (-s - r.origin) / r.dir;
    let t2 = (s - r.origin) / r.dir;

    let lo = Vector3::min(t1, t2);
    let hi = Vector3::max(t1, t2);
    let t_min = lo.x().max(lo.y()).max(lo.z());
    let t_max = hi.x().min(hi.y()).min(hi.z());

    if !(t_min <= t_max) || t_max < 0.0_f32 {
        return None;
    }

    let interior = t_min < 0.0_f32;
    let t = if interior { t_max } else { t_min };

    let p = r.point_at(t);
    let mut normal = p / s;
    if interior {
        normal = -normal;
    }

    // Only the axis whose face was struck keeps its component.
    let ax = normal.x().abs();
    let ay = normal.y().abs();
    let az = normal.z().abs();
    let mx = ax.max(ay).max(az);
    normal = Vector3::new(
        if ax != mx { 0.0_f32 } else { normal.x() },
        if ay != mx { 0.0_f32 } else { normal.y() },
        if az != mx { 0.0_f32 } else { normal.z() },
    );

    Some(Intersection {
        t: t,
        normal: normal.normalized(),
        interior: interior,
    })
}

fn intersect_ellipsoid(ray: &Ray, r: Vector3) -> Option<Intersection> {
    let o = ray.origin / r;
    let d = ray.dir / r;

    let a = d.dot(d);
    let b = 2.0_f32 * o.dot(d);
    let c = o.dot(o) - 1.0_f32;

    // A tangent ray (discriminant exactly zero) counts as a miss.
    let discriminant = (b * b) - (4.0_f32 * a * c);
    if !(discriminant > 0.0_f32) {
        return None;
    }

    let sq = discriminant.sqrt();
    let mut x1 = (-b - sq) / (2.0_f32 * a);
    let mut x2 = (-b + sq) / (2.0_f32 * a);
    if x1 > x2 {
        std::mem::swap(&mut x1, &mut x2);
    }

    if !(x2 >= 0.0_f32) {
        return None;
    }

    let interior = x1 < 0.0_f32;
    let t = if interior { x2 } else { x1 };

    let p = ray.point_at(t);
    let normal = (p / (r * r)).normalized();

    Some(Intersection {
        t: t,
        normal: if interior { -normal } else { normal },
        interior: interior,
    })
}

fn intersect_triangle(r: &Ray, a: Vector3, b: Vector3, c: Vector3) -> Option<Intersection> {
    let n = (b - a).cross(c - a);
    if n.squared_length() == 0.0_f32 {
        return None;
    }
    let n = n.normalized();

    let isec = plane_solve(r.origin, r.dir, n, a)?;
    let p = r.point_at(isec.t);

    // The hit point must sit on the same side of all three edges as the
    // face normal says. Edges and vertices are inclusive.
    fn same_side(edge: Vector3, towards: Vector3, n: Vector3) -> bool {
        edge.cross(towards).dot(n) >= 0.0_f32
    }
    if same_side(b - a, p - a, n) && same_side(p - a, c - a, n) && same_side(c - b, p - b, n) {
        Some(isec)
    } else {
        None
    }
}
