//! The `io` crate's own error type: a thin `thiserror` wrapper that folds
//! every `core` error kind plus TOML parse failures into one type the
//! `pbrt` binary can match on to pick an exit code (spec §7).

use thiserror::Error;

use core::error::{AssetError, BuildError, ConfigError, ReferenceError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
