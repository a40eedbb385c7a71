//! `pbrt` — the command-line driver (spec §5, §6): loads a configuration
//! tree, builds the scene, schedules BPT or raycast pixel samples across a
//! rayon thread pool, merges per-thread films, and saves the result.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use clap::Parser;

use core::arena::VertexArena;
use core::bpt::driver::{render_pixel, BptConfig, TerminationMode};
use core::film::Film;
use core::gbsdf::{Gbsdf, GbsdfQuery, TransportDirection};
use core::interaction::SurfaceGeometry;
use core::ray::Ray;
use core::sampler::Sampler;
use core::scene::Scene;
use core::vec::{Point2f, Vec3f};
use io::build::{BuiltScene, RenderSettings};
use samplers::IndependentSampler;

/// Bidirectional path tracing core — renders a scene described by a
/// configuration file to Radiance HDR or OpenEXR.
#[derive(Parser, Debug)]
#[command(name = "pbrt", version, about)]
struct Cli {
    /// Path to the scene configuration file (TOML)
    config: String,

    /// Number of worker threads (0 = all logical cores, overrides the
    /// configuration file's `renderer.num_threads`)
    #[arg(long)]
    threads: Option<u32>,

    /// Output image path (overrides the configuration file's `film.output`)
    #[arg(long)]
    out: Option<String>,

    /// Sampler seed (overrides the configuration file's `renderer.sampler.seed`)
    #[arg(long)]
    seed: Option<u32>,

    #[arg(long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Warn
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    let built = match io::load(&cli.config) {
        Ok(built) => built,
        Err(err) => return report_load_error(&err),
    };

    match render_and_save(built, &cli) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            log::error!("render failed: {err}");
            ExitCode::from(3)
        }
    }
}

fn report_load_error(err: &io::error::LoadError) -> ExitCode {
    log::error!("{err}");
    match err {
        io::error::LoadError::Config(_) | io::error::LoadError::Toml(_) => ExitCode::from(1),
        io::error::LoadError::Asset(_) => ExitCode::from(2),
        io::error::LoadError::Reference(_) | io::error::LoadError::Build(_) => ExitCode::from(1),
    }
}

fn render_and_save(built: BuiltScene, cli: &Cli) -> anyhow::Result<()> {
    let BuiltScene {
        scene,
        mut film,
        output_path,
        image_type,
        renderer,
    } = built;

    let out_path = cli.out.clone().unwrap_or(output_path);

    match renderer {
        RenderSettings::Bpt {
            config,
            num_samples,
            num_threads,
            samples_per_block: _,
            seed,
        } => {
            let threads = cli.threads.unwrap_or(num_threads);
            let seed = cli.seed.unwrap_or(seed);
            run_bpt(&scene, &mut film, &config, num_samples, threads, seed)?;
        }
        RenderSettings::Raycast { num_threads } => {
            let threads = cli.threads.unwrap_or(num_threads);
            run_raycast(&scene, &mut film, threads)?;
        }
    }

    let rgb = film.to_rgb();
    io::image_io::save(&out_path, film.width, film.height, &rgb, image_type)?;
    scene.warnings.report();
    log::info!("wrote {out_path}");
    Ok(())
}

fn thread_pool(num_threads: u32) -> anyhow::Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(num_threads as usize).build()?)
}

/// Runs BPT across every pixel, one `Film` per worker thread, merged with a
/// single-writer reduction once every thread's block of pixels is done
/// (spec §5: no atomics on the per-sample hot path).
fn run_bpt(scene: &Scene, film: &mut Film, config: &BptConfig, num_samples: u64, num_threads: u32, seed: u32) -> anyhow::Result<()> {
    let pool = thread_pool(num_threads)?;
    let width = film.width;
    let height = film.height;
    let cancel = AtomicBool::new(false);
    let progress = AtomicU64::new(0);
    let total_pixels = (width as u64) * (height as u64);
    let start = Instant::now();

    let merged: Film = pool.install(|| {
        use rayon::prelude::*;
        (0..height)
            .into_par_iter()
            .map(|y| {
                let mut local = Film::new(width, height);
                let arena = VertexArena::new();
                for x in 0..width {
                    let pixel_seed = seed.wrapping_add(y.wrapping_mul(width).wrapping_add(x));
                    let mut sampler = IndependentSampler::new(pixel_seed);
                    render_pixel(
                        scene,
                        &mut sampler,
                        &arena,
                        x,
                        y,
                        width,
                        height,
                        config,
                        TerminationMode::Samples(num_samples),
                        &cancel,
                        &mut local,
                    );
                    let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 4096 == 0 {
                        log::debug!("{done}/{total_pixels} pixels, {:.1}s elapsed", start.elapsed().as_secs_f64());
                    }
                }
                local
            })
            .reduce(
                || Film::new(width, height),
                |mut a, b| {
                    a.merge(&b);
                    a
                },
            )
    });

    film.merge(&merged);
    Ok(())
}

/// A minimal debug renderer (spec §8 scenario 1): white where the eye ray
/// hits geometry, black on a miss. No lighting, no sampling.
fn run_raycast(scene: &Scene, film: &mut Film, num_threads: u32) -> anyhow::Result<()> {
    let pool = thread_pool(num_threads)?;
    let width = film.width;
    let height = film.height;

    let camera = match scene.main_camera().camera {
        Some(dir) => dir,
        None => anyhow::bail!("main camera primitive has no camera GBSDF"),
    };

    let merged: Film = pool.install(|| {
        use rayon::prelude::*;
        (0..height)
            .into_par_iter()
            .map(|y| {
                let mut local = Film::new(width, height);
                let mut sampler = IndependentSampler::new(0);
                for x in 0..width {
                    let raster = Point2f::new((x as f32 + 0.5) / width as f32, (y as f32 + 0.5) / height as f32);
                    let mut ray = match camera_ray(&camera, raster, &mut sampler) {
                        Some(r) => r,
                        None => continue,
                    };
                    let color = if scene.intersect(&mut ray).is_some() {
                        Vec3f::splat(1.0)
                    } else {
                        Vec3f::splat(0.0)
                    };
                    local.add_weighted(x, y, color, 1.0);
                }
                local
            })
            .reduce(
                || Film::new(width, height),
                |mut a, b| {
                    a.merge(&b);
                    a
                },
            )
    });

    film.merge(&merged);
    Ok(())
}

/// Builds the primary ray out of `camera` for a raster point: a degenerate
/// (zero-area) surface frame oriented along the optical axis, queried the
/// same way a BPT eye subpath queries its first vertex (spec §4.5.1).
fn camera_ray(camera: &Gbsdf, raster: Point2f, sampler: &mut dyn Sampler) -> Option<Ray> {
    let (origin, _pdf) = camera.sample_camera_position(Point2f::new(0.5, 0.5));
    let forward = camera.camera_forward();
    let q = GbsdfQuery {
        geom: SurfaceGeometry::degenerate_at(origin, forward),
        wi: Vec3f::splat(0.0),
        transport: TransportDirection::EyeToLight,
        raster_hint: Some(raster),
    };
    let sample = camera.sample_direction(&q, sampler)?;
    Some(Ray::new(origin, sample.wo))
}
