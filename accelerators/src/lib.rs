//! QBVH acceleration structure (spec §4.2): a fanout-4 bounding-volume
//! hierarchy built by SAH binning, implementing [`core::accel::Accelerator`].

pub mod qbvh;

pub use qbvh::{LeafMode, Qbvh};
