//! QBVH: a fanout-4 bounding-volume hierarchy built by SAH binning (spec
//! §4.2), over a reorderable triangle index array, generalized from a
//! binary split to the depth-parity 4-ary scheme spec §4.2.1 calls for, and
//! from a fixed midpoint split to SAH binning.

use core::aabb::Aabb;
use core::accel::{AccelHit, Accelerator, BuildTriangle};
use core::error::BuildError;
use core::pbrt::Float;
use core::ray::Ray;
use core::triaccel::{QuadTriangle, TriAccel};
use core::vec::Vec3f;

const NUM_BINS: usize = 12;

/// Leaves pack triangles four-at-a-time into SIMD-friendly [`QuadTriangle`]
/// lanes, or store contiguous scalar [`TriAccel`] records (spec §4.2
/// "Leaf payload modes").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LeafMode {
    Quad,
    Scalar,
}

/// One 128-byte interior-or-mixed QBVH node: four child bounds in
/// structure-of-arrays layout, plus four child descriptors. `counts[i] ==
/// 0` means `children[i]` is another node index; `counts[i] > 0` means
/// `children[i]` is a leaf payload offset and `counts[i]` the triangle
/// count at that leaf (spec §4.2).
#[derive(Copy, Clone, Debug)]
struct QbvhNode {
    bounds_min: [[Float; 4]; 3],
    bounds_max: [[Float; 4]; 3],
    children: [u32; 4],
    counts: [u32; 4],
}

impl QbvhNode {
    const EMPTY_SLOT: QbvhNode = QbvhNode {
        bounds_min: [[Float::INFINITY; 4]; 3],
        bounds_max: [[Float::NEG_INFINITY; 4]; 3],
        children: [0; 4],
        counts: [0; 4],
    };

    fn set_slot_bounds(&mut self, slot: usize, b: &Aabb) {
        for axis in 0..3 {
            self.bounds_min[axis][slot] = b.min[axis];
            self.bounds_max[axis][slot] = b.max[axis];
        }
    }
}

/// A scene triangle plus its precomputed centroid and world-space AABB,
/// reordered in place during the build; carries the triangle data itself
/// rather than an index, since the QBVH is rebuilt from scratch on every
/// `Accelerator::build` call.
#[derive(Clone, Copy)]
struct Ref {
    tri: BuildTriangle,
    centroid: Vec3f,
    bounds: Aabb,
}

pub struct Qbvh {
    mode: LeafMode,
    max_leaf_triangles: usize,
    nodes: Vec<QbvhNode>,
    quad_leaves: Vec<QuadTriangle>,
    scalar_tris: Vec<TriAccel>,
    scalar_refs: Vec<(u32, u32)>,
    empty: bool,
    build_total: usize,
    build_placed: usize,
}

impl Qbvh {
    pub fn new(mode: LeafMode) -> Self {
        let max_leaf_triangles = match mode {
            LeafMode::Quad => 4,
            LeafMode::Scalar => 16,
        };
        Self {
            mode,
            max_leaf_triangles,
            nodes: Vec::new(),
            quad_leaves: Vec::new(),
            scalar_tris: Vec::new(),
            scalar_refs: Vec::new(),
            empty: true,
            build_total: 0,
            build_placed: 0,
        }
    }

    /// Reports build progress as a monotonic `(fraction, done)` pair (spec
    /// §4.2.1): `fraction` is the share of input triangles assigned to a
    /// leaf so far, which only ever grows as `place_leaf` consumes more of
    /// the input.
    fn emit_build_progress(&self, done: bool) {
        let fraction = if self.build_total == 0 { 1.0 } else { self.build_placed as f64 / self.build_total as f64 };
        log::debug!("qbvh build: {}/{} triangles placed ({:.1}%, done={done})", self.build_placed, self.build_total, fraction * 100.0);
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn bounds_of(refs: &[Ref]) -> Aabb {
        refs.iter().fold(Aabb::EMPTY, |acc, r| acc.union(&r.bounds))
    }

    fn centroid_bounds_of(refs: &[Ref]) -> Aabb {
        refs.iter().fold(Aabb::EMPTY, |acc, r| acc.union_point(r.centroid))
    }

    /// Surface-area-heuristic binned split (spec §4.2.1): 12 bins along the
    /// centroid bound's longest axis, 11 candidate split planes, cost =
    /// `count_L * area_L + count_R * area_R`. Returns `None` if no split
    /// improves on the unsplit leaf cost or the centroid bound is
    /// degenerate along every axis.
    fn best_split(refs: &[Ref]) -> Option<(usize, Float)> {
        let cb = Self::centroid_bounds_of(refs);
        let mut best: Option<(usize, Float, Float)> = None; // (axis, split_plane, cost)

        for axis in 0..3 {
            let lo = cb.min[axis];
            let hi = cb.max[axis];
            let extent = hi - lo;
            if extent <= 0.0 {
                continue;
            }

            let mut bin_count = [0u32; NUM_BINS];
            let mut bin_bounds = [Aabb::EMPTY; NUM_BINS];
            for r in refs {
                let mut b = (((r.centroid[axis] - lo) / extent) * NUM_BINS as Float) as usize;
                if b >= NUM_BINS {
                    b = NUM_BINS - 1;
                }
                bin_count[b] += 1;
                bin_bounds[b] = bin_bounds[b].union(&r.bounds);
            }

            // Prefix (left) and suffix (right) sweeps over the 11 internal
            // boundaries between 12 bins.
            let mut left_count = [0u32; NUM_BINS];
            let mut left_area = [0.0 as Float; NUM_BINS];
            let mut running = Aabb::EMPTY;
            let mut running_count = 0u32;
            for i in 0..NUM_BINS {
                running = running.union(&bin_bounds[i]);
                running_count += bin_count[i];
                left_count[i] = running_count;
                left_area[i] = running.surface_area();
            }

            let mut right_count = [0u32; NUM_BINS];
            let mut right_area = [0.0 as Float; NUM_BINS];
            let mut running = Aabb::EMPTY;
            let mut running_count = 0u32;
            for i in (0..NUM_BINS).rev() {
                running = running.union(&bin_bounds[i]);
                running_count += bin_count[i];
                right_count[i] = running_count;
                right_area[i] = running.surface_area();
            }

            for split in 0..NUM_BINS - 1 {
                let cl = left_count[split];
                let cr = right_count[split + 1];
                if cl == 0 || cr == 0 {
                    continue;
                }
                let cost = cl as Float * left_area[split] + cr as Float * right_area[split + 1];
                let plane = lo + extent * (split + 1) as Float / NUM_BINS as Float;
                if best.map_or(true, |(_, _, c)| cost < c) {
                    best = Some((axis, plane, cost));
                }
            }
        }

        best.map(|(axis, plane, _cost)| (axis, plane))
    }

    /// Partitions `refs` in place around `(axis, plane)`, returning the
    /// index of the first element assigned to the right side.
    fn partition(refs: &mut [Ref], axis: usize, plane: Float) -> usize {
        let mut a = 0usize;
        let mut b = refs.len();
        while a < b {
            if refs[a].centroid[axis] < plane {
                a += 1;
            } else {
                b -= 1;
                refs.swap(a, b);
            }
        }
        a
    }

    /// Splits `refs` into two groups via SAH, falling back to an even
    /// median split if SAH finds no improving plane (degenerate centroid
    /// bound on every axis, or all centroids coincide on the chosen axis).
    fn split_group(refs: &mut [Ref]) -> usize {
        if let Some((axis, plane)) = Self::best_split(refs) {
            let mid = Self::partition(refs, axis, plane);
            if mid > 0 && mid < refs.len() {
                return mid;
            }
        }
        refs.len() / 2
    }

    /// Builds one QBVH node (even-depth entry point): splits `refs` in two
    /// via SAH, then fills each half into slots `{0,1}` / `{2,3}` via
    /// [`Qbvh::fill_slot_pair`] (spec §4.2.1's depth-parity scheme — the
    /// mutual recursion between this function and `fill_slot_pair` *is*
    /// the parity, rather than a depth counter threaded through both).
    fn build_node(&mut self, refs: &mut [Ref]) -> usize {
        let node_idx = self.nodes.len();
        self.nodes.push(QbvhNode::EMPTY_SLOT);

        let mid = Self::split_group(refs);
        let (left, right) = refs.split_at_mut(mid);
        self.fill_slot_pair(node_idx, 0, left);
        self.fill_slot_pair(node_idx, 2, right);
        node_idx
    }

    /// Odd-depth step: splits `refs` into two sub-groups and writes them
    /// into slots `slot_base` and `slot_base + 1` of the already-allocated
    /// node `node_idx`, recursing into `build_node` for any sub-group that
    /// does not collapse to a leaf.
    fn fill_slot_pair(&mut self, node_idx: usize, slot_base: usize, refs: &mut [Ref]) {
        if refs.len() <= self.max_leaf_triangles || refs.len() <= 1 {
            self.place_leaf(node_idx, slot_base, refs);
            return;
        }

        let mid = Self::split_group(refs);
        if mid == 0 || mid == refs.len() {
            self.place_leaf(node_idx, slot_base, refs);
            return;
        }
        let (left, right) = refs.split_at_mut(mid);
        self.place_group(node_idx, slot_base, left);
        self.place_group(node_idx, slot_base + 1, right);
    }

    /// Places `refs` into a single child slot, either as a leaf (small
    /// enough) or by recursing into a fresh node.
    fn place_group(&mut self, node_idx: usize, slot: usize, refs: &mut [Ref]) {
        if refs.len() <= self.max_leaf_triangles {
            self.place_leaf(node_idx, slot, refs);
        } else {
            let bounds = Self::bounds_of(refs);
            let child_idx = self.build_node(refs);
            self.nodes[node_idx].set_slot_bounds(slot, &bounds);
            self.nodes[node_idx].children[slot] = child_idx as u32;
            self.nodes[node_idx].counts[slot] = 0;
        }
    }

    fn place_leaf(&mut self, node_idx: usize, slot: usize, refs: &[Ref]) {
        let bounds = Self::bounds_of(refs);
        self.nodes[node_idx].set_slot_bounds(slot, &bounds);
        if refs.is_empty() {
            self.nodes[node_idx].children[slot] = 0;
            self.nodes[node_idx].counts[slot] = 0;
            return;
        }

        self.build_placed += refs.len();
        self.emit_build_progress(self.build_placed >= self.build_total);

        match self.mode {
            LeafMode::Quad => {
                let start = self.quad_leaves.len() as u32;
                for chunk in refs.chunks(4) {
                    let packed: Vec<([Vec3f; 3], u32, u32)> = chunk.iter().map(|r| (r.tri.positions, r.tri.primitive_index, r.tri.face_index)).collect();
                    self.quad_leaves.push(QuadTriangle::load(&packed));
                }
                self.nodes[node_idx].children[slot] = start;
                self.nodes[node_idx].counts[slot] = refs.len() as u32;
            }
            LeafMode::Scalar => {
                let start = self.scalar_tris.len() as u32;
                for r in refs {
                    let [p0, p1, p2] = r.tri.positions;
                    self.scalar_tris.push(TriAccel::load(p0, p1, p2));
                    self.scalar_refs.push((r.tri.primitive_index, r.tri.face_index));
                }
                self.nodes[node_idx].children[slot] = start;
                self.nodes[node_idx].counts[slot] = refs.len() as u32;
            }
        }
    }

    fn intersect_leaf(&self, ray: &mut Ray, start: u32, count: u32) -> Option<AccelHit> {
        let mut best: Option<AccelHit> = None;
        match self.mode {
            LeafMode::Quad => {
                let num_quads = ((count + 3) / 4) as usize;
                for q in &self.quad_leaves[start as usize..start as usize + num_quads] {
                    if let Some((lane, b1, b2, t)) = q.intersect(ray) {
                        ray.max_t = t;
                        let (prim, face) = q.refs[lane];
                        best = Some(AccelHit {
                            primitive_index: prim,
                            face_index: face,
                            b1,
                            b2,
                            t,
                        });
                    }
                }
            }
            LeafMode::Scalar => {
                for i in 0..count as usize {
                    let tri = &self.scalar_tris[start as usize + i];
                    if let Some((u, v, t)) = tri.intersect(ray, ray.min_t, ray.max_t) {
                        ray.max_t = t;
                        let (prim, face) = self.scalar_refs[start as usize + i];
                        best = Some(AccelHit {
                            primitive_index: prim,
                            face_index: face,
                            b1: u,
                            b2: v,
                            t,
                        });
                    }
                }
            }
        }
        best
    }

    fn intersect_p_leaf(&self, ray: &Ray, start: u32, count: u32) -> bool {
        match self.mode {
            LeafMode::Quad => {
                let num_quads = ((count + 3) / 4) as usize;
                let shadow = *ray;
                self.quad_leaves[start as usize..start as usize + num_quads].iter().any(|q| q.intersect(&shadow).is_some())
            }
            LeafMode::Scalar => (0..count as usize).any(|i| self.scalar_tris[start as usize + i].intersect(ray, ray.min_t, ray.max_t).is_some()),
        }
    }
}

impl Accelerator for Qbvh {
    fn build(&mut self, triangles: Vec<BuildTriangle>) -> Result<(), BuildError> {
        self.nodes.clear();
        self.quad_leaves.clear();
        self.scalar_tris.clear();
        self.scalar_refs.clear();
        self.build_placed = 0;
        self.build_total = triangles.len();

        if triangles.is_empty() {
            self.empty = true;
            self.emit_build_progress(true);
            return Ok(());
        }
        self.empty = false;
        self.emit_build_progress(false);

        let mut refs: Vec<Ref> = triangles
            .into_iter()
            .map(|tri| {
                let bounds = Aabb::from_point(tri.positions[0]).union_point(tri.positions[1]).union_point(tri.positions[2]);
                let centroid = (tri.positions[0] + tri.positions[1] + tri.positions[2]) / 3.0;
                Ref { tri, centroid, bounds }
            })
            .collect();

        self.build_node(&mut refs);
        Ok(())
    }

    fn intersect(&self, ray: &mut Ray) -> Option<AccelHit> {
        if self.empty {
            return None;
        }
        let mut stack = [0u32; 64];
        let mut sp = 0usize;
        stack[sp] = 0;
        sp += 1;
        let mut best: Option<AccelHit> = None;

        while sp > 0 {
            sp -= 1;
            let node = &self.nodes[stack[sp] as usize];
            for slot in 0..4 {
                let b = Aabb::new(
                    Vec3f::new(node.bounds_min[0][slot], node.bounds_min[1][slot], node.bounds_min[2][slot]),
                    Vec3f::new(node.bounds_max[0][slot], node.bounds_max[1][slot], node.bounds_max[2][slot]),
                );
                if b.min.x > b.max.x {
                    continue; // empty slot
                }
                if b.intersect_ray(ray).is_none() {
                    continue;
                }
                if node.counts[slot] == 0 {
                    stack[sp] = node.children[slot];
                    sp += 1;
                } else if let Some(hit) = self.intersect_leaf(ray, node.children[slot], node.counts[slot]) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        if self.empty {
            return false;
        }
        let mut stack = [0u32; 64];
        let mut sp = 0usize;
        stack[sp] = 0;
        sp += 1;

        while sp > 0 {
            sp -= 1;
            let node = &self.nodes[stack[sp] as usize];
            for slot in 0..4 {
                let b = Aabb::new(
                    Vec3f::new(node.bounds_min[0][slot], node.bounds_min[1][slot], node.bounds_min[2][slot]),
                    Vec3f::new(node.bounds_max[0][slot], node.bounds_max[1][slot], node.bounds_max[2][slot]),
                );
                if b.min.x > b.max.x {
                    continue;
                }
                if b.intersect_ray(ray).is_none() {
                    continue;
                }
                if node.counts[slot] == 0 {
                    stack[sp] = node.children[slot];
                    sp += 1;
                } else if self.intersect_p_leaf(ray, node.children[slot], node.counts[slot]) {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_at(z: Float) -> BuildTriangle {
        BuildTriangle {
            positions: [Vec3f::new(-1.0, -1.0, z), Vec3f::new(1.0, -1.0, z), Vec3f::new(0.0, 1.0, z)],
            primitive_index: 0,
            face_index: z as u32,
        }
    }

    #[test]
    fn empty_build_never_hits() {
        let mut q = Qbvh::new(LeafMode::Quad);
        q.build(vec![]).unwrap();
        let mut ray = Ray::with_range(Vec3f::new(0.0, 0.0, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
        assert!(q.intersect(&mut ray).is_none());
        assert!(!q.intersect_p(&Ray::with_range(Vec3f::new(0.0, 0.0, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0)));
    }

    #[test]
    fn single_triangle_is_hit() {
        for mode in [LeafMode::Quad, LeafMode::Scalar] {
            let mut q = Qbvh::new(mode);
            q.build(vec![triangle_at(0.0)]).unwrap();
            let mut ray = Ray::with_range(Vec3f::new(0.0, -0.33, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
            let hit = q.intersect(&mut ray).expect("expected a hit");
            assert!((hit.t - 5.0).abs() < 1e-3);
        }
    }

    #[test]
    fn nearest_of_many_triangles_wins() {
        let triangles: Vec<BuildTriangle> = (0..37).map(|i| triangle_at(i as Float)).collect();
        for mode in [LeafMode::Quad, LeafMode::Scalar] {
            let mut q = Qbvh::new(mode);
            q.build(triangles.clone()).unwrap();
            let mut ray = Ray::with_range(Vec3f::new(0.0, -0.33, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 1000.0);
            let hit = q.intersect(&mut ray).expect("expected a hit");
            assert!((hit.t - 5.0).abs() < 1e-3, "expected nearest triangle at t=5, got {}", hit.t);
        }
    }

    #[test]
    fn ray_missing_every_triangle_reports_no_hit() {
        let triangles: Vec<BuildTriangle> = (0..10).map(|i| triangle_at(i as Float)).collect();
        let mut q = Qbvh::new(LeafMode::Quad);
        q.build(triangles).unwrap();
        let mut ray = Ray::with_range(Vec3f::new(50.0, 50.0, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 100.0);
        assert!(q.intersect(&mut ray).is_none());
    }

    #[test]
    fn shadow_ray_is_occluded_by_an_intervening_triangle() {
        let triangles = vec![triangle_at(0.0), triangle_at(5.0)];
        let mut q = Qbvh::new(LeafMode::Quad);
        q.build(triangles).unwrap();
        let shadow = Ray::with_range(Vec3f::new(0.0, -0.33, -5.0), Vec3f::new(0.0, 0.0, 1.0), 0.0, 10.0);
        assert!(q.intersect_p(&shadow));
    }

    #[test]
    fn build_is_deterministic_across_repeated_builds() {
        let triangles: Vec<BuildTriangle> = (0..53).map(|i| triangle_at(i as Float * 0.5)).collect();
        let mut a = Qbvh::new(LeafMode::Quad);
        a.build(triangles.clone()).unwrap();
        let mut b = Qbvh::new(LeafMode::Quad);
        b.build(triangles).unwrap();
        assert_eq!(a.node_count(), b.node_count());
        for (na, nb) in a.nodes.iter().zip(b.nodes.iter()) {
            assert_eq!(na.children, nb.children);
            assert_eq!(na.counts, nb.counts);
        }
    }
}
