// Local modules
mod aggregate;
mod camera;
mod color;
mod distribution;
mod primitive;
mod progress;
mod quaternion;
mod ray;
mod scene;
mod tracer;
mod utils;
mod vector;

// External/std libraries for main
use clap::{App, Arg};
use image::png::PNGEncoder;
use image::ColorType;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::{fs::OpenOptions, io, io::Write, path, process, sync::Mutex, time::Instant};

// Use statements for local modules
use crate::color::RGB;
use crate::progress::Progress;

fn main() {
    // Define command line args
    let matches = App::new("Pathtracer")
        .arg(
            Arg::with_name("thread-count")
                .short("t")
                .long("thread-count")
                .value_name("THREAD_COUNT")
                .help("Number of threads to use while tracing")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("IN_SCENE_FILE")
                .help("The scene specification to render")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OUT_FILEPATH")
                .help("The relative filepath to write the output image to")
                .required(true)
                .index(2),
        )
        .get_matches();

    // Grab a stamp for the start of the run
    let program_start = Instant::now();

    // Size the rayon pool if a thread count was requested, otherwise
    // leave it to detect the machine.
    match matches.value_of("thread-count") {
        Some(count) => {
            let num_threads = count
                .parse::<usize>()
                .expect("thread-count requires a valid positive integer");
            if num_threads == 0 {
                panic!("Need a thread count greater than zero");
            }
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .expect("Failed to size the rendering thread pool");
        }
        None => {}
    }

    // Read and prepare the scene
    let scene_path = path::Path::new(matches.value_of("IN_SCENE_FILE").unwrap());
    let mut scene = match scene::load_file(scene_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scene spec: {:?}", e);
            process::exit(1);
        }
    };
    scene.init();

    // Create the output file according to input path
    let out_path = matches.value_of("OUT_FILEPATH").unwrap();
    let mut out_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(out_path)
        .expect("Failed to create new file");

    let width = scene.camera.width;
    let height = scene.camera.height;

    // Trace every pixel in parallel. Pixels are independent tasks over
    // an immutable scene; each owns an RNG seeded by its own index so
    // the render is reproducible whatever the thread count.
    let mut colors = vec![RGB::black(); (width * height) as usize];
    let progress_tracker = Mutex::new(Progress::new(width as u64 * height as u64, 20_u32));
    {
        let scene_ref = &scene;
        let progress_ref = &progress_tracker;
        colors.par_iter_mut().enumerate().for_each(|(idx, out)| {
            let x = idx as u32 % width;
            let y = idx as u32 / width;
            let mut rng = SmallRng::seed_from_u64(idx as u64);
            *out = tracer::sample_pixel(scene_ref, x, y, &mut rng);
            progress_ref
                .lock()
                .expect("A render thread failed to report progress.")
                .update(1);
        });
    }
    progress_tracker.lock().unwrap().done();

    // Tone map, gamma correct and quantize in one serial pass, then
    // encode. PPM is the native format; a .png extension switches to
    // the png encoder.
    let data = color::finalize(&colors);
    let write_result = if out_path.to_lowercase().ends_with(".png") {
        match PNGEncoder::new(out_file).encode(&data, width, height, ColorType::RGB(8)) {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        }
    } else {
        write_ppm(&mut out_file, width, height, &data)
    };

    match write_result {
        Ok(()) => println!(
            "Success! Took {} seconds",
            program_start.elapsed().as_secs_f64()
        ),
        Err(e) => {
            eprintln!("Failed to write the output image: {}", e);
            process::exit(1);
        }
    }
}

// Binary PPM: a tiny text header, then rows of raw RGB bytes, top row
// first.
fn write_ppm<W: Write>(out: &mut W, width: u32, height: u32, data: &[u8]) -> io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    out.write_all(data)?;
    Ok(())
}
