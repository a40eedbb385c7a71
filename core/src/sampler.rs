//! The sampler abstraction consumed by the BPT core (spec §4.4). Concrete
//! samplers (`independent`, `rewindable`) live in the `samplers` crate;
//! everything here only needs to know the shape of the interface.

use crate::pbrt::Float;
use crate::vec::Point2f;

/// A source of independent uniform variates. Samplers are value types: each
/// render thread clones its own before use, so there is never hidden mutable
/// sharing across threads (spec §4.4, §5). `Clone` is deliberately not a
/// supertrait here — it would make `Sampler` unusable as `dyn Sampler` on the
/// BPT hot path, since `Clone::clone` returns `Self` by value. Concrete
/// samplers still derive `Clone` themselves; only the per-thread setup code
/// in the `samplers` crate needs it, and that code is generic over the
/// concrete type rather than going through the trait object.
pub trait Sampler {
    fn next(&mut self) -> Float;
    fn next_uint(&mut self) -> u32;
    fn next_vec2(&mut self) -> Point2f {
        Point2f::new(self.next(), self.next())
    }
    fn set_seed(&mut self, seed: u32);
}

/// A sampler that additionally supports rewinding to a previous sample
/// index. Invariant: after `rewind(i)`, the next `k` outputs equal the
/// outputs that originally appeared at positions `i..i+k` (spec §4.4).
/// Required as a type by the driver even though the workflows that exercise
/// it (PSSMLT-style mutation) are out of scope here.
pub trait RewindableSampler: Sampler {
    fn rewind(&mut self, index: u64);
    fn sample_index(&self) -> u64;
}
