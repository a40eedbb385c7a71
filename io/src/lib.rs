//! Configuration parsing, scene building, the component registry, and image
//! I/O (spec §4.9, §6, §7) — everything between a TOML file on disk and a
//! `core::scene::Scene` ready to render.

pub mod build;
pub mod config;
pub mod error;
pub mod image_io;
pub mod obj;
pub mod registry;

use error::LoadError;

/// Reads `path`, parses it as a configuration tree, and lowers it into a
/// built scene (spec §7: steps 1-4, "parse configuration" through "build
/// acceleration structure").
pub fn load(path: &str) -> Result<build::BuiltScene, LoadError> {
    let source = std::fs::read_to_string(path).map_err(core::error::AssetError::Io)?;
    let tree = config::parse(&source)?;
    build::build(&tree)
}
