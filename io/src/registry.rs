//! The component registry (spec §4.9, §9 "Thread-local singletons"): a
//! `HashMap<String, fn(...) -> ...>` keyed by the config tree's `type`
//! string, a plain-value stand-in for a dynamic-library component lookup.
//! Registries are built once in `io::build` and never touched again — no
//! global/static state.

use rustc_hash::FxHashMap;

use core::error::ConfigError;
use core::gbsdf::Gbsdf;
use core::pbrt::Float;
use core::vec::Vec3f;

/// Extracted camera parameters; combined with a scene node's world transform
/// and its referenced film's dimensions in `crate::build` to produce a
/// `cameras::Camera`.
#[derive(Copy, Clone, Debug)]
pub enum CameraParams {
    Perspective { fov_y_degrees: Float },
    ThinLens { fov_y_degrees: Float, lens_radius: Float, focal_distance: Float },
}

pub struct Registry<T> {
    constructors: FxHashMap<String, fn(&toml::Table) -> Result<T, ConfigError>>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    fn register(&mut self, kind: &str, f: fn(&toml::Table) -> Result<T, ConfigError>) {
        self.constructors.insert(kind.to_string(), f);
    }

    /// Looks up `kind` and invokes its constructor over `params`, or reports
    /// an unknown-type config error naming `category` (spec §7.1).
    pub fn build(&self, kind: &str, params: &toml::Table, category: &'static str) -> Result<T, ConfigError> {
        let ctor = self
            .constructors
            .get(kind)
            .ok_or_else(|| ConfigError::UnknownType(kind.to_string(), category))?;
        ctor(params)
    }
}

fn required_float(params: &toml::Table, field: &str) -> Result<Float, ConfigError> {
    params
        .get(field)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        .map(|v| v as Float)
        .ok_or_else(|| ConfigError::MissingField(field.to_string()))
}

fn optional_float(params: &toml::Table, field: &str, default: Float) -> Float {
    params
        .get(field)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        .map(|v| v as Float)
        .unwrap_or(default)
}

fn required_vec3(params: &toml::Table, field: &str) -> Result<Vec3f, ConfigError> {
    let arr = params.get(field).and_then(|v| v.as_array()).ok_or_else(|| ConfigError::MissingField(field.to_string()))?;
    if arr.len() != 3 {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value: format!("{arr:?}"),
        });
    }
    let get = |i: usize| -> Result<Float, ConfigError> {
        arr[i]
            .as_float()
            .or_else(|| arr[i].as_integer().map(|v| v as f64))
            .map(|v| v as Float)
            .ok_or_else(|| ConfigError::OutOfRange {
                field: field.to_string(),
                value: format!("{:?}", arr[i]),
            })
    };
    Ok(Vec3f::new(get(0)?, get(1)?, get(2)?))
}

fn optional_bool(params: &toml::Table, field: &str, default: bool) -> bool {
    params.get(field).and_then(|v| v.as_bool()).unwrap_or(default)
}

pub fn bsdf_registry() -> Registry<Gbsdf> {
    let mut r = Registry::new();
    r.register("diffuse", |p| Ok(materials::diffuse(required_vec3(p, "albedo")?)));
    r.register("mirror", |p| Ok(materials::mirror(required_vec3(p, "albedo")?)));
    r.register("dielectric", |p| Ok(materials::dielectric(required_float(p, "eta")?)));
    r.register("glass", |p| Ok(materials::glass(required_float(p, "eta")?)));
    r.register("glossy", |p| Ok(materials::glossy(required_vec3(p, "albedo")?, required_float(p, "exponent")?)));
    r.register("all", |p| Ok(materials::all(required_vec3(p, "albedo")?, required_float(p, "eta")?)));
    r
}

/// Radiance and the two-sided flag for an `area` light; `environment`
/// lights are out of scope (spec §9).
pub fn light_registry() -> Registry<(Vec3f, bool)> {
    let mut r = Registry::new();
    r.register("area", |p| Ok((required_vec3(p, "luminance")?, optional_bool(p, "two_sided", false))));
    r
}

pub fn camera_registry() -> Registry<CameraParams> {
    let mut r = Registry::new();
    r.register("perspective", |p| {
        Ok(CameraParams::Perspective {
            fov_y_degrees: required_float(p, "fovy")?,
        })
    });
    r.register("thinlens", |p| {
        Ok(CameraParams::ThinLens {
            fov_y_degrees: required_float(p, "fovy")?,
            lens_radius: optional_float(p, "aperture", 0.0),
            focal_distance: optional_float(p, "focus", 1.0),
        })
    });
    r
}
