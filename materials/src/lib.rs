//! Surface BSDF construction: one thin builder per spec §6 `materials.type`,
//! each producing the matching [`core::gbsdf::Gbsdf`] variant so the `io`
//! crate's component registry never has to know the GBSDF enum's internal
//! shape.

use core::gbsdf::surface::{All, Diffuse};
use core::gbsdf::specular::{Dielectric, Glass, Mirror};
use core::gbsdf::glossy::Glossy;
use core::gbsdf::Gbsdf;
use core::pbrt::Float;
use core::vec::Vec3f;

pub fn diffuse(albedo: Vec3f) -> Gbsdf {
    Gbsdf::Diffuse(Diffuse { albedo })
}

pub fn mirror(albedo: Vec3f) -> Gbsdf {
    Gbsdf::Mirror(Mirror { albedo })
}

/// A smooth dielectric coat that only reflects (spec §6 `materials.type
/// dielectric`); `eta` is the relative index of refraction of the interface.
pub fn dielectric(eta: Float) -> Gbsdf {
    Gbsdf::Dielectric(Dielectric { eta })
}

/// Full smooth glass: reflects or refracts by Fresnel weight (spec §6
/// `materials.type glass`).
pub fn glass(eta: Float) -> Gbsdf {
    Gbsdf::Glass(Glass { eta })
}

/// A Phong specular lobe of sharpness `exponent` about the mirror direction.
pub fn glossy(albedo: Vec3f, exponent: Float) -> Gbsdf {
    Gbsdf::Glossy(Glossy { albedo, exponent })
}

/// A diffuse substrate under a Fresnel-weighted specular coat (spec §6
/// `materials.type all`, pbrt's "plastic").
pub fn all(albedo: Vec3f, eta: Float) -> Gbsdf {
    Gbsdf::All(All { albedo, eta })
}
