//! Error kinds surfaced by the core engine (spec §7). Categories 1-4 are
//! fatal and propagate to the driver; category 5 (numeric warnings) is
//! logged and handled locally — it is not an [`std::error::Error`] at all,
//! see [`crate::film::WarningCounters`].

use thiserror::Error;

/// A malformed configuration tree: missing field, unknown type name,
/// out-of-range numeric.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("unknown type name `{0}` for `{1}`")]
    UnknownType(String, &'static str),
    #[error("value for `{field}` out of range: {value}")]
    OutOfRange { field: String, value: String },
    #[error("malformed configuration tree: {0}")]
    Malformed(String),
}

/// File not found, unparseable mesh, unsupported image format.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset file not found: {0}")]
    NotFound(String),
    #[error("could not parse mesh `{name}`: {reason}")]
    MeshParse { name: String, reason: String },
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A scene node references a named asset that was never declared, or was
/// declared under the wrong category (spec §7.3).
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("scene node references undeclared {category} `{name}`")]
    Undeclared { category: &'static str, name: String },
    #[error("`{name}` is declared as a {actual}, but is referenced as a {expected}")]
    WrongCategory {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// The accelerator cannot build: empty scene, invalid primitive index.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("scene has no main camera")]
    NoCamera,
    #[error("more than one main camera declared")]
    MultipleCameras,
    #[error("primitive index {0} out of range")]
    InvalidPrimitiveIndex(u32),
}

/// The output image could not be written; the last known film content is
/// retained (spec §7.6).
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("failed to write image to `{path}`: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported output image type: {0}")]
    UnsupportedType(String),
}
