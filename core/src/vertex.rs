//! BPT path vertices and subpaths (spec §3).

use crate::gbsdf::TransportDirection;
use crate::interaction::SurfaceGeometry;
use crate::pbrt::Float;
use crate::pdf::PdfEval;
use crate::vec::Vec3f;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexType {
    Endpoint,
    IntermediatePoint,
}

/// A single vertex on a light or eye subpath. Plain `Copy` data — no
/// lifetimes, no ownership of anything else — so the arena can hand out
/// bare `&mut BptVertex` without threading a lifetime parameter through the
/// rest of the BPT core (spec §9 "Arena-vs-references": "vertices store
/// stable indices into scene-owned vectors, which is the simpler
/// translation"). Back-references to a vertex's BSDF/light/camera role are
/// folded into one `primitive_index`, since in this design all three live
/// on the same [`crate::primitive::Primitive`].
#[derive(Copy, Clone, Debug)]
pub struct BptVertex {
    pub vertex_type: VertexType,
    pub geom: SurfaceGeometry,
    /// Area-measure PDF of this vertex's position; only meaningful at an
    /// endpoint (spec §3).
    pub pdf_position: PdfEval,
    /// Index into `Scene::primitives`, meaningful at every vertex: the
    /// BSDF at an intermediate vertex, or the emitter/camera at an
    /// endpoint.
    pub primitive_index: Option<u32>,
    /// Accumulated `f_s / p_{σ⊥}` throughput ratio along the subpath up to
    /// and including this vertex (`α` in spec §4.5.2).
    pub weight: Vec3f,
    /// Directional PDFs for both transport directions, indexed by
    /// `TransportDirection as usize`: one is the sampling PDF used to
    /// extend the subpath, the other the adjoint PDF pre-computed at
    /// non-specular vertices for the O(n) MIS ratio recurrence (spec
    /// §4.5.1e).
    pub pdf_direction: [PdfEval; 2],
    pub pdf_rr: Float,
    pub transport_dir: TransportDirection,
    /// `true` for a vertex whose *incoming* scattering event (the one that
    /// produced `wo` from this vertex) was a Dirac delta — used by the MIS
    /// ratio recurrence to fold a specular factor into the adjacent ratio
    /// rather than treating it as a finite area-measure density (spec
    /// §4.5.3).
    pub specular: bool,
    /// Incoming direction, world space (meaningless at an endpoint).
    pub wi: Vec3f,
    /// Outgoing direction sampled from this vertex, world space.
    pub wo: Vec3f,
}

impl BptVertex {
    #[inline]
    pub fn is_endpoint(&self) -> bool {
        self.vertex_type == VertexType::Endpoint
    }

    #[inline]
    pub fn pdf_direction_for(&self, dir: TransportDirection) -> PdfEval {
        self.pdf_direction[dir as usize]
    }
}

/// An ordered sequence of vertices originating at an emitter (light
/// subpath) or the sensor (eye subpath), plus the transport direction they
/// were sampled in (spec §3). Vertex `0` is always the endpoint.
pub struct Subpath<'a> {
    pub vertices: Vec<&'a BptVertex>,
    pub transport: TransportDirection,
}

impl<'a> Subpath<'a> {
    pub fn new(transport: TransportDirection) -> Self {
        Self {
            vertices: Vec::new(),
            transport,
        }
    }

    #[inline]
    pub fn push(&mut self, v: &'a BptVertex) {
        self.vertices.push(v);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn endpoint(&self) -> Option<&'a BptVertex> {
        self.vertices.first().copied()
    }
}
