//! The per-pixel-sample rendering driver (spec §4.5.4): sample one light
//! subpath and one eye subpath, enumerate every valid `(s, t)` full-path
//! combination, and splat each technique's weighted contribution into the
//! calling thread's film. Multi-threaded scheduling over pixels/blocks and
//! the termination-mode check against wall-clock time live in the `pbrt`
//! binary's render driver, which owns the thread pool (spec §5); this
//! module only owns the part that is the same regardless of how many
//! threads call it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::arena::VertexArena;
use crate::bpt::{fullpath, mis, subpath};
use crate::film::Film;
use crate::gbsdf::TransportDirection;
use crate::pbrt::Float;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::vec::{Point2f, Vec3f};

/// Renderer-level knobs from the `bpt` config tree (spec §6).
#[derive(Copy, Clone, Debug)]
pub struct BptConfig {
    pub rr_depth: u32,
    pub max_vertices: u32,
    /// `1.0` = balance heuristic, `2.0` = power heuristic (default).
    pub mis_beta: Float,
    /// Whether the camera offers a finite-PDF `t = 0` (light tracing)
    /// technique. `false` for every camera this engine implements (spec
    /// §4.5.2); kept as a field rather than a hardcoded constant so a
    /// future non-delta camera model does not need to touch this module.
    pub light_tracing_enabled: bool,
}

impl Default for BptConfig {
    fn default() -> Self {
        Self {
            rr_depth: 5,
            max_vertices: 16,
            mis_beta: 2.0,
            light_tracing_enabled: false,
        }
    }
}

/// One pixel-sample iteration (spec §4.5.4, steps 1-4 folded into this
/// call; step 5, film accumulation, happens as each technique is weighted).
/// `arena` must be reset by the caller immediately before this call and
/// never touched mid-sample; no vertex produced here may outlive the next
/// reset.
pub fn render_sample(scene: &Scene, sampler: &mut dyn Sampler, arena: &VertexArena, raster: Point2f, config: &BptConfig, film: &mut Film) {
    let light_path = subpath::sample_subpath(TransportDirection::LightToEye, scene, sampler, arena, raster, config.rr_depth, config.max_vertices);
    let eye_path = subpath::sample_subpath(TransportDirection::EyeToLight, scene, sampler, arena, raster, config.rr_depth, config.max_vertices);

    let s_max = light_path.len();
    let t_max = eye_path.len();

    for s in 0..=s_max {
        for t in 1..=t_max {
            if s + t < 2 {
                continue;
            }
            let light_slice = &light_path.vertices[..s];
            let eye_slice = &eye_path.vertices[..t];

            let sample = fullpath::assemble_path(scene, light_slice, eye_slice, s, t, raster);
            if sample.contribution == Vec3f::splat(0.0) {
                continue;
            }

            let light_endpoint_pdf_override = if s == 0 {
                eye_slice.last().and_then(|v| v.primitive_index).and_then(|pi| scene.light_endpoint_pdf(pi))
            } else {
                None
            };

            let w = mis::mis_weight(light_slice, eye_slice, s, t, config.mis_beta, light_endpoint_pdf_override, config.light_tracing_enabled);
            if w <= 0.0 {
                scene.warnings.record_zero_pdf_mis();
                continue;
            }

            film.add_sample(sample.raster, sample.contribution * w);
        }
    }
}

/// How long a render keeps drawing pixel samples (spec §6 `renderer.type
/// bpt`'s `num_samples`, and the `Time` termination mode of §4.5.4).
#[derive(Copy, Clone, Debug)]
pub enum TerminationMode {
    Samples(u64),
    Time(Duration),
}

/// Runs pixel samples for one pixel of a `width × height` film into `film`,
/// jittering the raster position within the pixel's unit footprint on every
/// sample. Checks `cancel` between samples (never mid-sample, per spec
/// §4.5.4's cancellation rule) and stops early if it is set or the `Time`
/// budget has elapsed.
pub fn render_pixel(
    scene: &Scene,
    sampler: &mut dyn Sampler,
    arena: &VertexArena,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    config: &BptConfig,
    termination: TerminationMode,
    cancel: &AtomicBool,
    film: &mut Film,
) {
    let start = Instant::now();
    let mut sample_index: u64 = 0;
    loop {
        match termination {
            TerminationMode::Samples(n) => {
                if sample_index >= n {
                    break;
                }
            }
            TerminationMode::Time(budget) => {
                if start.elapsed() >= budget {
                    break;
                }
            }
        }
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let jitter = sampler.next_vec2();
        let raster = Point2f::new((x as Float + jitter.x) / width as Float, (y as Float + jitter.y) / height as Float);

        arena.reset();
        render_sample(scene, sampler, arena, raster, config, film);

        sample_index += 1;
    }
}
