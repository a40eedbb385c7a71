//! Bidirectional path tracing: subpath construction, full-path assembly and
//! its unweighted contribution, the O(n) multiple-importance-sampling
//! weight recurrence, and the per-pixel-sample rendering driver (spec
//! §4.5).

pub mod driver;
pub mod fullpath;
pub mod mis;
pub mod subpath;
