use crate::primitive;
use crate::primitive::{Intersection, Primitive, Shape};
use crate::ray::Ray;
use crate::vector::{Axis, Vector3};

use std::cmp;
use std::f32;

// Axis Aligned Bounding Box
pub struct AABB {
    pub min: Vector3,
    pub max: Vector3,
}

impl Copy for AABB {}
impl Clone for AABB {
    fn clone(&self) -> AABB {
        *self
    }
}

impl AABB {
    fn new_empty() -> AABB {
        AABB {
            min: Vector3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Vector3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    fn union(box1: &AABB, box2: &AABB) -> AABB {
        AABB {
            min: Vector3::min(box1.min, box2.min),
            max: Vector3::max(box1.max, box2.max),
        }
    }

    fn union_point(box1: &AABB, point: Vector3) -> AABB {
        AABB {
            min: Vector3::min(box1.min, point),
            max: Vector3::max(box1.max, point),
        }
    }

    // World-space bounds of a primitive: take the local-frame box of the
    // shape, push all 8 corners through the rotation, then translate.
    // Triangle vertices are already world-space (pos = 0, rot = identity
    // in the canonical case), so their envelope passes through unchanged.
    pub fn of_primitive(prim: &Primitive) -> AABB {
        let local = match prim.shape {
            Shape::Box { s } => AABB {
                min: -s,
                max: s,
            },
            Shape::Ellipsoid { r } => AABB {
                min: -r,
                max: r,
            },
            Shape::Triangle { a, b, c } => AABB {
                min: Vector3::min(a, Vector3::min(b, c)),
                max: Vector3::max(a, Vector3::max(b, c)),
            },
            Shape::Plane { .. } => {
                panic!("Planes are unbounded and may not enter the BVH!")
            }
        };

        let mut out = AABB::new_empty();
        for mask in 0..8 {
            let corner = Vector3::new(
                if mask & 1 > 0 { local.max.x() } else { local.min.x() },
                if mask & 2 > 0 { local.max.y() } else { local.min.y() },
                if mask & 4 > 0 { local.max.z() } else { local.min.z() },
            );
            out = AABB::union_point(&out, prim.rot.rotate(corner));
        }
        out.min = out.min + prim.pos;
        out.max = out.max + prim.pos;
        return out;
    }

    fn surface_area(&self) -> f32 {
        let diagonal = self.max - self.min;
        2_f32
            * (diagonal.x() * diagonal.y()
                + diagonal.x() * diagonal.z()
                + diagonal.y() * diagonal.z())
    }

    // Treats the bounds as a centered box and reuses the primitive slab
    // test, which also reports the exit distance when the ray starts
    // inside.
    fn intersect(&self, r: &Ray) -> Option<f32> {
        let s = 0.5_f32 * (self.max - self.min);
        let center = 0.5_f32 * (self.max + self.min);
        match primitive::intersect_box(&Ray::new(r.origin - center, r.dir), s) {
            Some(isec) => Some(isec.t),
            None => None,
        }
    }
}

const SENTINEL: u32 = u32::MAX;

// Internal nodes carry both children; leaves carry neither and instead
// reference a contiguous run of the (reordered) primitive array.
struct Node {
    aabb: AABB,
    first_prim: u32,
    prim_count: u32,
    left: u32,
    right: u32,
}

// Bounding Volume Hierarchy over the finite primitives of a scene.
// Construction reorders the given range of the primitive array in place;
// every stored index is an absolute index into that array.
pub struct Bvh {
    nodes: Vec<Node>,
    root: u32,
}

impl Bvh {
    pub fn new_empty() -> Bvh {
        Bvh {
            nodes: Vec::new(),
            root: SENTINEL,
        }
    }

    pub fn build(primitives: &mut Vec<Primitive>, first: usize) -> Bvh {
        let last = primitives.len();
        let mut bvh = Bvh {
            nodes: Vec::with_capacity(last - first),
            root: SENTINEL,
        };
        if first < last {
            // Scratch space for the sweep, sized once for the widest node.
            let mut cut_costs = vec![0_f32; last - first];
            bvh.root = bvh.init_tree(primitives, first, last, &mut cut_costs);
        }
        return bvh;
    }

    fn init_tree(
        &mut self,
        primitives: &mut [Primitive],
        first: usize,
        last: usize,
        cut_costs: &mut Vec<f32>,
    ) -> u32 {
        let mut aabb = AABB::new_empty();
        for prim in &primitives[first..last] {
            aabb = AABB::union(&aabb, &AABB::of_primitive(prim));
        }

        self.nodes.push(Node {
            aabb: aabb,
            first_prim: first as u32,
            prim_count: (last - first) as u32,
            left: SENTINEL,
            right: SENTINEL,
        });
        let cur = (self.nodes.len() - 1) as u32;

        let n = last - first;
        if n == 1 {
            return cur;
        }

        // Sweep each axis: sort by primitive center, then score every cut
        // with prefix/suffix bound areas. SAH cost of a cut is
        // S_left * n_left + S_right * n_right.
        let mut best_cost = f32::INFINITY;
        let mut best_axis = Axis::X;
        let mut best_cut = 0_usize;
        for axis in [Axis::X, Axis::Y, Axis::Z].iter() {
            sort_by_center(&mut primitives[first..last], *axis);

            let mut prefix = AABB::of_primitive(&primitives[first]);
            for cut in 1..n {
                cut_costs[cut] = prefix.surface_area() * cut as f32;
                prefix = AABB::union(&prefix, &AABB::of_primitive(&primitives[first + cut]));
            }
            let mut suffix = AABB::new_empty();
            for cut in (1..n).rev() {
                suffix = AABB::union(&suffix, &AABB::of_primitive(&primitives[first + cut]));
                cut_costs[cut] += suffix.surface_area() * (n - cut) as f32;
            }

            for cut in 1..n {
                if cut_costs[cut] < best_cost {
                    best_cost = cut_costs[cut];
                    best_axis = *axis;
                    best_cut = cut;
                }
            }
        }

        // Splitting has to beat leaving the whole range in one leaf.
        let leaf_cost = self.nodes[cur as usize].aabb.surface_area() * n as f32;
        if best_cost >= leaf_cost {
            return cur;
        }

        // The slice is currently ordered by the last axis swept, so
        // restore the winning order before cutting.
        sort_by_center(&mut primitives[first..last], best_axis);
        let cut = first + best_cut;

        let left = self.init_tree(primitives, first, cut, cut_costs);
        let right = self.init_tree(primitives, cut, last, cut_costs);
        self.nodes[cur as usize].left = left;
        self.nodes[cur as usize].right = right;
        return cur;
    }

    // Closest hit within the finite set, or None. `closest` carries the
    // best distance found so far (from the plane scan, typically) so
    // whole subtrees further away than that are pruned.
    pub fn intersect(
        &self,
        primitives: &[Primitive],
        r: &Ray,
        closest: f32,
    ) -> Option<(usize, Intersection)> {
        if self.root == SENTINEL {
            return None;
        }
        self.intersect_node(primitives, r, closest, self.root)
    }

    fn intersect_node(
        &self,
        primitives: &[Primitive],
        r: &Ray,
        mut closest: f32,
        v: u32,
    ) -> Option<(usize, Intersection)> {
        let node = &self.nodes[v as usize];

        let t_box = match node.aabb.intersect(r) {
            Some(t) => t,
            None => return None,
        };
        if t_box > closest {
            return None;
        }

        if node.left == SENTINEL {
            let mut best: Option<(usize, Intersection)> = None;
            for i in node.first_prim..(node.first_prim + node.prim_count) {
                match primitives[i as usize].intersect(r) {
                    Some(isec) => match &best {
                        Some((_, b)) => {
                            if isec.t < b.t {
                                best = Some((i as usize, isec));
                            }
                        }
                        None => best = Some((i as usize, isec)),
                    },
                    None => {}
                }
            }
            return best;
        }

        let mut best = self.intersect_node(primitives, r, closest, node.left);
        match &best {
            Some((_, b)) => closest = b.t,
            None => {}
        }
        match self.intersect_node(primitives, r, closest, node.right) {
            Some((i, isec)) => match &best {
                Some((_, b)) => {
                    if isec.t < b.t {
                        best = Some((i, isec));
                    }
                }
                None => best = Some((i, isec)),
            },
            None => {}
        }
        return best;
    }
}

fn sort_by_center(primitives: &mut [Primitive], axis: Axis) {
    primitives.sort_by(|a, b| {
        let a_c = a.pos[axis];
        let b_c = b.pos[axis];
        if a_c < b_c {
            cmp::Ordering::Less
        } else if a_c > b_c {
            cmp::Ordering::Greater
        } else {
            cmp::Ordering::Equal
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::color::RGB;
    use crate::primitive::Material;
    use crate::quaternion::Quaternion;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_ellipsoid(rng: &mut SmallRng) -> Primitive {
        Primitive {
            shape: Shape::Ellipsoid {
                r: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
            },
            col: RGB::new(1.0_f32, 1.0_f32, 1.0_f32),
            emission: RGB::black(),
            pos: Vector3::new(
                rng.gen::<f32>() * 20.0_f32 - 10.0_f32,
                rng.gen::<f32>() * 20.0_f32 - 10.0_f32,
                rng.gen::<f32>() * 20.0_f32 - 10.0_f32,
            ),
            rot: Quaternion::identity(),
            material: Material::Diffuse,
            ior: 0.0_f32,
        }
    }

    fn brute_force(primitives: &[Primitive], r: &Ray) -> Option<(usize, Intersection)> {
        let mut best: Option<(usize, Intersection)> = None;
        for (i, prim) in primitives.iter().enumerate() {
            match prim.intersect(r) {
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
        best
    }

    #[test]
    fn traversal_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(41);
        let mut primitives = Vec::new();
        for _ in 0..1000 {
            primitives.push(random_ellipsoid(&mut rng));
        }
        let bvh = Bvh::build(&mut primitives, 0);

        for _ in 0..100 {
            // Aim from outside the cloud towards a point inside it.
            let origin = crate::utils::isotropic_unit_vector(&mut rng) * 30.0_f32;
            let target = Vector3::new(
                rng.gen::<f32>() * 20.0_f32 - 10.0_f32,
                rng.gen::<f32>() * 20.0_f32 - 10.0_f32,
                rng.gen::<f32>() * 20.0_f32 - 10.0_f32,
            );
            let r = Ray::new(origin, (target - origin).normalized());

            let expected = brute_force(&primitives, &r);
            let found = bvh.intersect(&primitives, &r, f32::INFINITY);
            match (expected, found) {
                (Some((want_id, want)), Some((got_id, got))) => {
                    assert_eq!(want_id, got_id);
                    assert!((want.t - got.t).abs() < 1e-5);
                }
                (None, None) => {}
                _ => panic!("BVH and brute force disagree on whether the ray hits"),
            }
        }
    }

    #[test]
    fn node_bounds_contain_their_primitives() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut primitives = Vec::new();
        for _ in 0..200 {
            primitives.push(random_ellipsoid(&mut rng));
        }
        let bvh = Bvh::build(&mut primitives, 0);

        for node in &bvh.nodes {
            for i in node.first_prim..(node.first_prim + node.prim_count) {
                let prim_box = AABB::of_primitive(&primitives[i as usize]);
                assert!(node.aabb.min.x() <= prim_box.min.x() + 1e-4);
                assert!(node.aabb.min.y() <= prim_box.min.y() + 1e-4);
                assert!(node.aabb.min.z() <= prim_box.min.z() + 1e-4);
                assert!(node.aabb.max.x() >= prim_box.max.x() - 1e-4);
                assert!(node.aabb.max.y() >= prim_box.max.y() - 1e-4);
                assert!(node.aabb.max.z() >= prim_box.max.z() - 1e-4);
            }
        }
    }

    #[test]
    fn empty_tree_reports_no_hits() {
        let mut primitives = Vec::new();
        let bvh = Bvh::build(&mut primitives, 0);
        let r = Ray::new(
            Vector3::new_empty(),
            Vector3::new(0.0_f32, 0.0_f32, 1.0_f32),
        );
        assert!(bvh.intersect(&primitives, &r, f32::INFINITY).is_none());
    }

    #[test]
    fn single_primitive_becomes_a_leaf() {
        let mut rng = SmallRng::seed_from_u64(43);
        let mut primitives = vec![random_ellipsoid(&mut rng)];
        primitives[0].pos = Vector3::new(0.0_f32, 0.0_f32, 5.0_f32);
        let bvh = Bvh::build(&mut primitives, 0);
        assert_eq!(bvh.nodes.len(), 1);

        let r = Ray::new(
            Vector3::new_empty(),
            Vector3::new(0.0_f32, 0.0_f32, 1.0_f32),
        );
        let (id, isec) = bvh.intersect(&primitives, &r, f32::INFINITY).unwrap();
        assert_eq!(id, 0);
        assert!((isec.t - 4.0_f32).abs() < 1e-5);
    }

    #[test]
    fn rotated_primitives_get_enclosing_bounds() {
        let half = std::f32::consts::FRAC_PI_4;
        let prim = Primitive {
            shape: Shape::Box {
                s: Vector3::new(1.0_f32, 1.0_f32, 1.0_f32),
            },
            col: RGB::new(1.0_f32, 1.0_f32, 1.0_f32),
            emission: RGB::black(),
            pos: Vector3::new(3.0_f32, 0.0_f32, 0.0_f32),
            rot: Quaternion::new(0.0_f32, 0.0_f32, half.sin(), half.cos()),
            material: Material::Diffuse,
            ior: 0.0_f32,
        };
        let aabb = AABB::of_primitive(&prim);
        // A cube rotated 45 degrees about z widens to sqrt(2) in x and y.
        let sqrt2 = 2.0_f32.sqrt();
        assert!((aabb.min.x() - (3.0_f32 - sqrt2)).abs() < 1e-4);
        assert!((aabb.max.x() - (3.0_f32 + sqrt2)).abs() < 1e-4);
        assert!((aabb.min.z() + 1.0_f32).abs() < 1e-4);
        assert!((aabb.max.z() - 1.0_f32).abs() < 1e-4);
    }
}
