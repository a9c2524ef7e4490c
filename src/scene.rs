use crate::aggregate::Bvh;
use crate::camera::Camera;
use crate::color::RGB;
use crate::distribution::{Distribution, Mixture};
use crate::primitive::{Material, Primitive, Shape};
use crate::quaternion::Quaternion;
use crate::vector::Vector3;

use std::{convert, fs, io, mem, path, str};

pub struct Scene {
    pub background: RGB,
    pub camera: Camera,
    // After init: planes first, finite primitives after finite_start.
    pub primitives: Vec<Primitive>,
    pub finite_start: usize,
    pub bvh: Bvh,
    pub lights: Mixture,
    pub ray_depth: u32,
    pub samples: u32,
}

// Package together I/O errors and local validation errors to be
// returned from the loading functions.
#[derive(Debug)]
pub enum LoadError {
    IoError(io::Error),
    LocalError(String),
}
impl convert::From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::IoError(err)
    }
}

pub fn load_file(file_path: &path::Path) -> Result<Scene, LoadError> {
    let data = fs::read_to_string(file_path)?;
    load(&data)
}

// Parses the line-oriented scene description. Commands the loader does
// not recognize are reported on stderr and skipped; a malformed payload
// drops only its own line. The single fatal condition is an unusable
// image size, since there would be nothing to render into.
pub fn load(data: &str) -> Result<Scene, LoadError> {
    let mut scene = Scene {
        background: RGB::black(),
        camera: Camera::new(),
        primitives: Vec::new(),
        finite_start: 0,
        bvh: Bvh::new_empty(),
        lights: Mixture::new(Vec::new()),
        ray_depth: 1,
        samples: 1,
    };

    let mut lines = data.lines();
    // A command that terminates a primitive block belongs to the outer
    // scope and is handled on the next pass.
    let mut pending: Option<String> = None;
    loop {
        let line = match pending.take() {
            Some(l) => l,
            None => match lines.next() {
                Some(l) => l.to_string(),
                None => break,
            },
        };
        let mut tokens = line.split_whitespace();
        let command = match tokens.next() {
            Some(c) => c,
            None => continue,
        };
        let args: Vec<&str> = tokens.collect();

        match command {
            "DIMENSIONS" => match parse_pair_u32(&args) {
                Ok((w, h)) => {
                    scene.camera.width = w;
                    scene.camera.height = h;
                }
                Err(e) => eprintln!("DIMENSIONS: {}", e),
            },
            "BG_COLOR" => match parse_color(&args) {
                Ok(c) => scene.background = c,
                Err(e) => eprintln!("BG_COLOR: {}", e),
            },
            "CAMERA_POSITION" => match parse_vector(&args) {
                Ok(v) => scene.camera.pos = v,
                Err(e) => eprintln!("CAMERA_POSITION: {}", e),
            },
            "CAMERA_RIGHT" => match parse_vector(&args) {
                Ok(v) => scene.camera.right = v,
                Err(e) => eprintln!("CAMERA_RIGHT: {}", e),
            },
            "CAMERA_UP" => match parse_vector(&args) {
                Ok(v) => scene.camera.up = v,
                Err(e) => eprintln!("CAMERA_UP: {}", e),
            },
            "CAMERA_FORWARD" => match parse_vector(&args) {
                Ok(v) => scene.camera.forward = v,
                Err(e) => eprintln!("CAMERA_FORWARD: {}", e),
            },
            "CAMERA_FOV_X" => match parse_single_f32(&args) {
                Ok(f) => scene.camera.fov_x = f,
                Err(e) => eprintln!("CAMERA_FOV_X: {}", e),
            },
            "RAY_DEPTH" => match parse_single_u32(&args) {
                Ok(d) => scene.ray_depth = d,
                Err(e) => eprintln!("RAY_DEPTH: {}", e),
            },
            "SAMPLES" => match parse_single_u32(&args) {
                Ok(s) => scene.samples = s,
                Err(e) => eprintln!("SAMPLES: {}", e),
            },
            "NEW_PRIMITIVE" => {
                let (primitive, terminator) = load_primitive(&mut lines);
                match primitive {
                    Some(p) => scene.primitives.push(p),
                    None => {}
                }
                pending = terminator;
            }
            _ => eprintln!("unexpected command({})", command),
        }
    }

    if scene.camera.width == 0 || scene.camera.height == 0 {
        return Err(LoadError::LocalError(String::from(
            "Scene is missing usable DIMENSIONS.",
        )));
    }
    Ok(scene)
}

// Reads commands for one primitive block. The block ends at a blank
// line, at the end of input, or at a command that belongs to the outer
// scope; in the last case the full line is handed back for re-dispatch.
fn load_primitive(lines: &mut str::Lines) -> (Option<Primitive>, Option<String>) {
    let mut shape: Option<Shape> = None;
    let mut col = RGB::black();
    let mut emission = RGB::black();
    let mut pos = Vector3::new_empty();
    let mut rot = Quaternion::identity();
    let mut material = Material::Diffuse;
    let mut ior = 0.0_f32;

    let mut terminator: Option<String> = None;
    loop {
        let line = match lines.next() {
            Some(l) => l,
            None => break,
        };
        let mut tokens = line.split_whitespace();
        let command = match tokens.next() {
            Some(c) => c,
            None => break,
        };
        let args: Vec<&str> = tokens.collect();

        match command {
            "PLANE" => match parse_vector(&args) {
                Ok(n) => {
                    // Store a unit normal; a zero vector is left for the
                    // intersector to refuse.
                    let n = if n.squared_length() > 0.0_f32 {
                        n.normalized()
                    } else {
                        n
                    };
                    shape = Some(Shape::Plane { n: n });
                }
                Err(e) => eprintln!("PLANE: {}", e),
            },
            "BOX" => match parse_vector(&args) {
                Ok(s) => shape = Some(Shape::Box { s: s }),
                Err(e) => eprintln!("BOX: {}", e),
            },
            "ELLIPSOID" => match parse_vector(&args) {
                Ok(r) => shape = Some(Shape::Ellipsoid { r: r }),
                Err(e) => eprintln!("ELLIPSOID: {}", e),
            },
            "TRIANGLE" => match parse_floats(&args, 9) {
                Ok(f) => {
                    shape = Some(Shape::Triangle {
                        a: Vector3::new(f[0], f[1], f[2]),
                        b: Vector3::new(f[3], f[4], f[5]),
                        c: Vector3::new(f[6], f[7], f[8]),
                    })
                }
                Err(e) => eprintln!("TRIANGLE: {}", e),
            },
            "POSITION" => match parse_vector(&args) {
                Ok(v) => pos = v,
                Err(e) => eprintln!("POSITION: {}", e),
            },
            "ROTATION" => match parse_floats(&args, 4) {
                Ok(f) => rot = Quaternion::new(f[0], f[1], f[2], f[3]).normalized(),
                Err(e) => eprintln!("ROTATION: {}", e),
            },
            "COLOR" => match parse_color(&args) {
                Ok(c) => col = c,
                Err(e) => eprintln!("COLOR: {}", e),
            },
            "EMISSION" => match parse_color(&args) {
                Ok(c) => emission = c,
                Err(e) => eprintln!("EMISSION: {}", e),
            },
            "METALLIC" => material = Material::Metallic,
            "DIELECTRIC" => material = Material::Dielectric,
            "IOR" => match parse_single_f32(&args) {
                Ok(f) => ior = f,
                Err(e) => eprintln!("IOR: {}", e),
            },
            _ => {
                terminator = Some(line.to_string());
                break;
            }
        }
    }

    let primitive = match shape {
        Some(shape) => Some(Primitive {
            shape: shape,
            col: col,
            emission: emission,
            pos: pos,
            rot: rot,
            material: material,
            ior: ior,
        }),
        None => {
            eprintln!("unexpected primitive block without a shape command");
            None
        }
    };
    (primitive, terminator)
}

fn parse_floats(args: &[&str], count: usize) -> Result<Vec<f32>, String> {
    if args.len() < count {
        return Err(format!(
            "expected {} numeric fields, found {}",
            count,
            args.len()
        ));
    }
    let mut out = Vec::with_capacity(count);
    for arg in &args[..count] {
        match arg.parse::<f32>() {
            Ok(f) => out.push(f),
            Err(_) => return Err(format!("bad numeric field '{}'", arg)),
        }
    }
    Ok(out)
}

fn parse_vector(args: &[&str]) -> Result<Vector3, String> {
    let f = parse_floats(args, 3)?;
    Ok(Vector3::new(f[0], f[1], f[2]))
}

fn parse_color(args: &[&str]) -> Result<RGB, String> {
    let f = parse_floats(args, 3)?;
    Ok(RGB::new(f[0], f[1], f[2]))
}

fn parse_single_f32(args: &[&str]) -> Result<f32, String> {
    let f = parse_floats(args, 1)?;
    Ok(f[0])
}

fn parse_single_u32(args: &[&str]) -> Result<u32, String> {
    if args.is_empty() {
        return Err(String::from("expected an integer field, found none"));
    }
    match args[0].parse::<u32>() {
        Ok(v) => Ok(v),
        Err(_) => Err(format!("bad integer field '{}'", args[0])),
    }
}

fn parse_pair_u32(args: &[&str]) -> Result<(u32, u32), String> {
    if args.len() < 2 {
        return Err(format!(
            "expected 2 integer fields, found {}",
            args.len()
        ));
    }
    let first = match args[0].parse::<u32>() {
        Ok(v) => v,
        Err(_) => return Err(format!("bad integer field '{}'", args[0])),
    };
    let second = match args[1].parse::<u32>() {
        Ok(v) => v,
        Err(_) => return Err(format!("bad integer field '{}'", args[1])),
    };
    Ok((first, second))
}

impl Scene {
    // Called once after load: partitions the primitive array so the
    // unbounded planes sit in front of the finite primitives, builds the
    // BVH over the finite tail (which reorders it), and only then
    // collects the emissive surfaces into the sampling mixture so the
    // stored indices stay valid.
    pub fn init(&mut self) {
        let primitives = mem::replace(&mut self.primitives, Vec::new());
        let (planes, finite): (Vec<Primitive>, Vec<Primitive>) =
            primitives.into_iter().partition(|p| match p.shape {
                Shape::Plane { .. } => true,
                _ => false,
            });
        self.finite_start = planes.len();
        self.primitives = planes;
        self.primitives.extend(finite);

        self.bvh = Bvh::build(&mut self.primitives, self.finite_start);

        let mut components = Vec::new();
        for (i, primitive) in self.primitives.iter().enumerate() {
            if !(primitive.emission.r() > 0.0_f32
                || primitive.emission.g() > 0.0_f32
                || primitive.emission.b() > 0.0_f32)
            {
                continue;
            }
            match primitive.shape {
                Shape::Box { .. } => components.push(Distribution::BoxSurface { prim: i }),
                Shape::Ellipsoid { .. } => {
                    components.push(Distribution::EllipsoidSurface { prim: i })
                }
                // Planes and triangles emit but are never sampled.
                _ => {}
            }
        }
        self.lights = Mixture::new(components);
    }
}
