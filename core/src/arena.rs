//! The per-thread vertex arena (spec §4.4, §9 "Arena-vs-references"). A
//! thin wrapper over `bumpalo::Bump`: allocation is a pointer bump, and
//! `reset()` reclaims everything in one operation without running any
//! per-vertex destructor (`BptVertex` is plain `Copy` data, so that's sound).

use bumpalo::Bump;

use crate::vertex::BptVertex;

/// Fixed-block object pool tuned to hand out [`BptVertex`]s. One per render
/// thread; reset at the start of every pixel-sample iteration, never mid
/// sample (spec §4.4).
pub struct VertexArena {
    bump: Bump,
}

impl VertexArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Allocates `v` in the arena and returns a reference tied to this
    /// arena's lifetime.
    #[inline]
    pub fn alloc_vertex(&self, v: BptVertex) -> &mut BptVertex {
        self.bump.alloc(v)
    }

    /// Reclaims every vertex allocated since the last reset. A pointer-bump
    /// rewind: no individual vertex is dropped (`BptVertex` has no `Drop`
    /// impl to run).
    #[inline]
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    /// Bytes currently allocated from the underlying chunk(s); exposed for
    /// diagnostics only.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for VertexArena {
    fn default() -> Self {
        Self::new()
    }
}
