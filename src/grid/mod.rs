//! The shared grid contract.
//!
//! Every backend stores the same logical content — a `(state, attribute)`
//! pair per voxel — behind one trait. The trait carries the coordinate
//! system, the traversal/query engine and the bulk-mutation operations as
//! provided methods so a backend only has to supply cell access, and may
//! override any of them with a layout-aware fast path.

use crate::common::{Aabb, IVec3, Vec3};
use crate::voxel::{Query, VoxelData, VoxelState};

pub mod block;
pub mod checked;
pub mod dense;
pub mod indexed;
pub mod octree;

/// Immutable geometry of a grid: voxel counts and world resolution.
///
/// `voxel_size` is the x/z resolution, `slice_height` the y resolution;
/// they may differ (anisotropic lattice). Dimensions are fixed at
/// construction — a different size means a new grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub voxel_size: f64,
    pub slice_height: f64,
}

impl GridShape {
    pub fn new(width: i32, height: i32, depth: i32, voxel_size: f64, slice_height: f64) -> Self {
        debug_assert!(width >= 1 && height >= 1 && depth >= 1);
        debug_assert!(voxel_size > 0.0 && slice_height > 0.0);
        Self {
            width,
            height,
            depth,
            voxel_size,
            slice_height,
        }
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// World position to the voxel containing it. Pure floor transform,
    /// no range check.
    #[inline]
    pub fn grid_coords(&self, wx: f64, wy: f64, wz: f64) -> IVec3 {
        IVec3::new(
            (wx / self.voxel_size).floor() as i32,
            (wy / self.slice_height).floor() as i32,
            (wz / self.voxel_size).floor() as i32,
        )
    }

    /// Center of a voxel in world coordinates. Round-trips through
    /// `grid_coords` for any in-range integer coordinate.
    #[inline]
    pub fn world_coords(&self, x: i32, y: i32, z: i32) -> Vec3 {
        Vec3::new(
            x as f64 * self.voxel_size + self.voxel_size * 0.5,
            y as f64 * self.slice_height + self.slice_height * 0.5,
            z as f64 * self.voxel_size + self.voxel_size * 0.5,
        )
    }

    /// World-space bounds: min is the origin, max is dimension times
    /// resolution per axis.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(
                self.width as f64 * self.voxel_size,
                self.height as f64 * self.slice_height,
                self.depth as f64 * self.voxel_size,
            ),
        )
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height && z >= 0 && z < self.depth
    }
}

/// Voxels needed to cover `extent` world units at `step` per voxel,
/// ceiling rule plus one guard voxel. Used by the dense, octree and
/// material-indexed world-extent constructors.
#[inline]
pub(crate) fn covering_voxels_ceil(extent: f64, step: f64) -> i32 {
    (extent / step).ceil() as i32 + 1
}

/// Voxels needed to cover `extent` world units at `step` per voxel,
/// truncating rule plus one. Used by the block-decomposed world-extent
/// constructor.
#[inline]
pub(crate) fn covering_voxels_floor(extent: f64, step: f64) -> i32 {
    (extent / step).floor() as i32 + 1
}

/// The storage contract every backend implements.
///
/// Coordinates are voxel-space integers unless the method name carries a
/// `_world` suffix; world overloads floor-map through the shape first.
/// Bare backends do not validate coordinates — out-of-range access is
/// unspecified (the packed backends panic on the slice bound, the octree
/// may address padding cells). Wrap a grid in
/// [`checked::RangeChecked`] for validated access.
pub trait AttributeGrid: Clone {
    /// The grid's immutable geometry.
    fn shape(&self) -> &GridShape;

    /// Width of this backend's representable attribute field, in bits.
    /// Stored attributes are the assigned value modulo `2^attribute_bits()`.
    fn attribute_bits(&self) -> u32;

    /// Read one voxel. Never-written coordinates read `(Outside, 0)`.
    fn get_data(&self, x: i32, y: i32, z: i32) -> VoxelData;

    /// Write state and attribute together, observable as a single change.
    fn set_data(&mut self, x: i32, y: i32, z: i32, state: VoxelState, attribute: u64);

    /// A fresh, fully default-initialized grid of the same concrete backend
    /// (carrying over backend parameters such as block order), never
    /// aliasing this one.
    fn create_empty(
        &self,
        width: i32,
        height: i32,
        depth: i32,
        voxel_size: f64,
        slice_height: f64,
    ) -> Self;

    // --- Cell accessors -------------------------------------------------

    #[inline]
    fn get_state(&self, x: i32, y: i32, z: i32) -> VoxelState {
        self.get_data(x, y, z).state
    }

    /// Write only the state; the attribute is left untouched.
    #[inline]
    fn set_state(&mut self, x: i32, y: i32, z: i32, state: VoxelState) {
        let att = self.get_data(x, y, z).attribute;
        self.set_data(x, y, z, state, att);
    }

    #[inline]
    fn get_attribute(&self, x: i32, y: i32, z: i32) -> u64 {
        self.get_data(x, y, z).attribute
    }

    /// Write only the attribute; the state is left untouched. Values wider
    /// than the attribute field wrap silently.
    #[inline]
    fn set_attribute(&mut self, x: i32, y: i32, z: i32, attribute: u64) {
        let state = self.get_data(x, y, z).state;
        self.set_data(x, y, z, state, attribute);
    }

    // --- World-coordinate overloads -------------------------------------

    #[inline]
    fn get_data_world(&self, wx: f64, wy: f64, wz: f64) -> VoxelData {
        let c = self.grid_coords(wx, wy, wz);
        self.get_data(c.x, c.y, c.z)
    }

    #[inline]
    fn set_data_world(&mut self, wx: f64, wy: f64, wz: f64, state: VoxelState, attribute: u64) {
        let c = self.grid_coords(wx, wy, wz);
        self.set_data(c.x, c.y, c.z, state, attribute);
    }

    #[inline]
    fn get_state_world(&self, wx: f64, wy: f64, wz: f64) -> VoxelState {
        let c = self.grid_coords(wx, wy, wz);
        self.get_state(c.x, c.y, c.z)
    }

    #[inline]
    fn set_state_world(&mut self, wx: f64, wy: f64, wz: f64, state: VoxelState) {
        let c = self.grid_coords(wx, wy, wz);
        self.set_state(c.x, c.y, c.z, state);
    }

    #[inline]
    fn get_attribute_world(&self, wx: f64, wy: f64, wz: f64) -> u64 {
        let c = self.grid_coords(wx, wy, wz);
        self.get_attribute(c.x, c.y, c.z)
    }

    #[inline]
    fn set_attribute_world(&mut self, wx: f64, wy: f64, wz: f64, attribute: u64) {
        let c = self.grid_coords(wx, wy, wz);
        self.set_attribute(c.x, c.y, c.z, attribute);
    }

    // --- Geometry -------------------------------------------------------

    #[inline]
    fn width(&self) -> i32 {
        self.shape().width
    }

    #[inline]
    fn height(&self) -> i32 {
        self.shape().height
    }

    #[inline]
    fn depth(&self) -> i32 {
        self.shape().depth
    }

    #[inline]
    fn voxel_size(&self) -> f64 {
        self.shape().voxel_size
    }

    #[inline]
    fn slice_height(&self) -> f64 {
        self.shape().slice_height
    }

    #[inline]
    fn voxel_count(&self) -> usize {
        self.shape().voxel_count()
    }

    #[inline]
    fn grid_coords(&self, wx: f64, wy: f64, wz: f64) -> IVec3 {
        self.shape().grid_coords(wx, wy, wz)
    }

    #[inline]
    fn world_coords(&self, x: i32, y: i32, z: i32) -> Vec3 {
        self.shape().world_coords(x, y, z)
    }

    #[inline]
    fn grid_bounds(&self) -> Aabb {
        self.shape().bounds()
    }

    #[inline]
    fn inside_grid(&self, x: i32, y: i32, z: i32) -> bool {
        self.shape().contains(x, y, z)
    }

    #[inline]
    fn inside_grid_world(&self, wx: f64, wy: f64, wz: f64) -> bool {
        let c = self.grid_coords(wx, wy, wz);
        self.inside_grid(c.x, c.y, c.z)
    }

    // --- Traversal / query ----------------------------------------------

    /// Visit every voxel matching `query`, once each, in y-then-x-then-z
    /// scan order. The order is identical for every backend regardless of
    /// internal layout.
    fn find<Q, F>(&self, query: Q, mut f: F)
    where
        Q: Into<Query>,
        F: FnMut(i32, i32, i32, VoxelData),
    {
        let q = query.into();
        let shape = *self.shape();
        for y in 0..shape.height {
            for x in 0..shape.width {
                for z in 0..shape.depth {
                    let vd = self.get_data(x, y, z);
                    if q.matches(&vd) {
                        f(x, y, z, vd);
                    }
                }
            }
        }
    }

    /// Like [`find`](Self::find), but stops the instant the visitor
    /// returns `false`; later matches are never visited.
    fn find_interruptible<Q, F>(&self, query: Q, mut f: F)
    where
        Q: Into<Query>,
        F: FnMut(i32, i32, i32, VoxelData) -> bool,
    {
        let q = query.into();
        let shape = *self.shape();
        for y in 0..shape.height {
            for x in 0..shape.width {
                for z in 0..shape.depth {
                    let vd = self.get_data(x, y, z);
                    if q.matches(&vd) && !f(x, y, z, vd) {
                        return;
                    }
                }
            }
        }
    }

    /// Visit matching voxels restricted to an inclusive coordinate box.
    /// Coordinates are assumed in range.
    fn find_in_region<Q, F>(&self, query: Q, min: IVec3, max: IVec3, mut f: F)
    where
        Q: Into<Query>,
        F: FnMut(i32, i32, i32, VoxelData),
    {
        let q = query.into();
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                for z in min.z..=max.z {
                    let vd = self.get_data(x, y, z);
                    if q.matches(&vd) {
                        f(x, y, z, vd);
                    }
                }
            }
        }
    }

    /// Exact number of voxels matching `query`, without invoking a
    /// visitor. Agrees with the exhaustive [`find`](Self::find) count.
    fn find_count<Q: Into<Query>>(&self, query: Q) -> usize {
        let q = query.into();
        if let Query::Class(crate::voxel::VoxelClass::All) = q {
            return self.voxel_count();
        }
        let shape = *self.shape();
        let mut count = 0;
        for y in 0..shape.height {
            for x in 0..shape.width {
                for z in 0..shape.depth {
                    if q.matches(&self.get_data(x, y, z)) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    // --- Bulk mutation --------------------------------------------------

    /// Give every voxel whose stored attribute is in `old_values` the
    /// attribute `new_value` (wrapped to this backend's width). States are
    /// untouched; values with no matching voxel and an empty `old_values`
    /// are no-ops.
    fn reassign_attribute(&mut self, old_values: &[u64], new_value: u64) {
        if old_values.is_empty() {
            return;
        }
        let shape = *self.shape();
        for y in 0..shape.height {
            for x in 0..shape.width {
                for z in 0..shape.depth {
                    let att = self.get_attribute(x, y, z);
                    if old_values.contains(&att) {
                        self.set_attribute(x, y, z, new_value);
                    }
                }
            }
        }
    }

    /// Reset every voxel carrying `value` to attribute 0. Equivalent to
    /// `reassign_attribute(&[value], 0)`; states are untouched.
    fn remove_attribute(&mut self, value: u64) {
        self.reassign_attribute(&[value], 0);
    }

    // --- Diagnostics ----------------------------------------------------

    /// Render one y-slice as rows of state bits, for debugging.
    fn slice_to_string(&self, y: i32) -> String {
        let shape = *self.shape();
        let mut out = String::new();
        for z in (0..shape.depth).rev() {
            for x in 0..shape.width {
                out.push_str(&format!("{} ", self.get_state(x, y, z).bits()));
            }
            out.push('\n');
        }
        out
    }
}

/// Compare the logical content of two grids cell-by-cell.
///
/// True iff dimensions match and every coordinate (written or not) reads
/// the same `(state, attribute)` from both. World resolutions are not
/// compared — this is a content comparison across backends.
pub fn logical_eq<A: AttributeGrid, B: AttributeGrid>(a: &A, b: &B) -> bool {
    let (sa, sb) = (a.shape(), b.shape());
    if sa.width != sb.width || sa.height != sb.height || sa.depth != sb.depth {
        return false;
    }
    for y in 0..sa.height {
        for x in 0..sa.width {
            for z in 0..sa.depth {
                if a.get_data(x, y, z) != b.get_data(x, y, z) {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::block::BlockGrid;
    use super::dense::DenseGrid;
    use super::indexed::IndexedGrid;
    use super::octree::OctreeGrid;
    use super::*;
    use crate::voxel::VoxelClass;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn never_written_reads_empty() {
        let g: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        assert_eq!(g.get_data(1, 2, 3), VoxelData::EMPTY);
        assert_eq!(g.get_state(0, 0, 0), VoxelState::Outside);
        assert_eq!(g.get_attribute(3, 3, 3), 0);
    }

    #[test]
    fn mixed_writes_on_a_10x9x8_grid() {
        let mut g: DenseGrid = DenseGrid::new(10, 9, 8, 0.001, 0.001);
        g.set_data(0, 0, 0, VoxelState::Outside, 2);
        g.set_data(9, 8, 7, VoxelState::Exterior, 1);
        g.set_data(5, 0, 7, VoxelState::Interior, 0);

        assert_eq!(g.get_state(2, 2, 2), VoxelState::Outside);
        assert_eq!(g.get_state(9, 8, 7), VoxelState::Exterior);
        assert_eq!(g.get_attribute(9, 8, 7), 1);
        assert_eq!(g.get_state(5, 0, 7), VoxelState::Interior);
        assert_eq!(g.get_attribute(0, 0, 0), 2);
    }

    #[test]
    fn find_count_all_is_volume() {
        let g: DenseGrid = DenseGrid::new(10, 9, 8, 1.0, 1.0);
        assert_eq!(g.find_count(VoxelClass::All), 10 * 9 * 8);
    }

    #[test]
    fn class_counts_partition_the_grid() {
        let mut g: DenseGrid = DenseGrid::new(6, 5, 4, 1.0, 1.0);
        g.set_state(0, 0, 0, VoxelState::Interior);
        g.set_state(1, 0, 0, VoxelState::Exterior);
        g.set_state(5, 4, 3, VoxelState::Interior);

        let all = g.find_count(VoxelClass::All);
        let marked = g.find_count(VoxelClass::Marked);
        let outside = g.find_count(VoxelClass::Outside);
        assert_eq!(marked + outside, all);
        assert_eq!(marked, 3);

        let ext = g.find_count(VoxelClass::Exterior);
        let int = g.find_count(VoxelClass::Interior);
        let ins = g.find_count(VoxelClass::Inside);
        assert_eq!(ext + int + ins + outside, all);
    }

    #[test]
    fn exhaustive_find_visits_each_match_once() {
        let mut g: DenseGrid = DenseGrid::new(5, 5, 5, 1.0, 1.0);
        let targets = [(0, 0, 0), (4, 4, 4), (2, 3, 1), (1, 1, 1)];
        for &(x, y, z) in &targets {
            g.set_data(x, y, z, VoxelState::Inside, 9);
        }

        let mut seen = std::collections::HashSet::new();
        g.find(VoxelClass::Inside, |x, y, z, vd| {
            assert_eq!(vd.attribute, 9);
            assert!(seen.insert((x, y, z)), "visited twice: {x} {y} {z}");
        });
        assert_eq!(seen.len(), targets.len());
    }

    #[test]
    fn interruptible_find_halts_early() {
        let mut g: DenseGrid = DenseGrid::new(8, 8, 8, 1.0, 1.0);
        for i in 0..8 {
            g.set_state(i, 0, 0, VoxelState::Inside);
        }
        let total = g.find_count(VoxelClass::Inside);

        let mut visited = 0;
        g.find_interruptible(VoxelClass::Inside, |_, _, _, _| {
            visited += 1;
            visited < 3
        });
        assert_eq!(visited, 3);
        assert!(visited < total);
    }

    #[test]
    fn attribute_count_is_state_independent() {
        let mut g: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        // Attribute set while state stays Outside still counts.
        g.set_attribute(1, 1, 1, 7);
        g.set_data(2, 2, 2, VoxelState::Inside, 7);
        assert_eq!(g.find_count(7u64), 2);

        // Attribute 0 matches all unwritten voxels too.
        assert_eq!(g.find_count(0u64), g.voxel_count() - 2);
    }

    #[test]
    fn class_attribute_conjunction() {
        let mut g: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        g.set_data(0, 0, 0, VoxelState::Inside, 5);
        g.set_data(1, 0, 0, VoxelState::Outside, 5);
        assert_eq!(g.find_count(Query::ClassAttribute(VoxelClass::Marked, 5)), 1);
        assert_eq!(g.find_count(5u64), 2);
    }

    #[test]
    fn reassign_attribute_moves_counts() {
        let mut g: DenseGrid = DenseGrid::new(6, 6, 6, 1.0, 1.0);
        for i in 0..4 {
            g.set_data(i, 0, 0, VoxelState::Inside, 10);
        }
        for i in 0..3 {
            g.set_data(i, 1, 0, VoxelState::Interior, 11);
        }
        g.set_data(0, 2, 0, VoxelState::Exterior, 12);

        let prior = g.find_count(10u64) + g.find_count(11u64) + g.find_count(12u64);
        let before_new = g.find_count(20u64);
        g.reassign_attribute(&[10, 11, 12], 20);

        assert_eq!(g.find_count(10u64), 0);
        assert_eq!(g.find_count(11u64), 0);
        assert_eq!(g.find_count(12u64), 0);
        assert_eq!(g.find_count(20u64), before_new + prior);
        // States untouched.
        assert_eq!(g.get_state(0, 1, 0), VoxelState::Interior);
        assert_eq!(g.get_state(0, 2, 0), VoxelState::Exterior);
    }

    #[test]
    fn reassign_of_absent_values_is_noop() {
        let mut g: DenseGrid = DenseGrid::new(3, 3, 3, 1.0, 1.0);
        g.set_data(0, 0, 0, VoxelState::Inside, 1);
        let before = g.clone();
        g.reassign_attribute(&[40, 41], 5);
        g.reassign_attribute(&[], 5);
        assert!(logical_eq(&g, &before));
    }

    #[test]
    fn remove_attribute_zeroes_but_keeps_state() {
        let mut g: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        g.set_data(1, 2, 3, VoxelState::Interior, 13);
        g.set_data(0, 0, 0, VoxelState::Inside, 13);
        g.remove_attribute(13);

        assert_eq!(g.find_count(13u64), 0);
        assert_eq!(g.get_attribute(1, 2, 3), 0);
        assert_eq!(g.get_state(1, 2, 3), VoxelState::Interior);
        assert_eq!(g.get_state(0, 0, 0), VoxelState::Inside);
    }

    #[test]
    fn world_grid_round_trip() {
        let g: DenseGrid = DenseGrid::new(12, 7, 9, 0.002, 0.0005);
        for y in 0..7 {
            for x in 0..12 {
                for z in 0..9 {
                    let w = g.world_coords(x, y, z);
                    assert_eq!(g.grid_coords(w.x, w.y, w.z), IVec3::new(x, y, z));
                }
            }
        }
    }

    #[test]
    fn grid_bounds_cover_all_voxels() {
        let g: DenseGrid = DenseGrid::new(10, 4, 6, 0.1, 0.2);
        let bb = g.grid_bounds();
        assert_eq!(bb.min, Vec3::new(0.0, 0.0, 0.0));
        assert!((bb.max.x - 1.0).abs() < 1e-12);
        assert!((bb.max.y - 0.8).abs() < 1e-12);
        assert!((bb.max.z - 0.6).abs() < 1e-12);
        let center = g.world_coords(9, 3, 5);
        assert!(bb.contains_point(&center));
    }

    #[test]
    fn world_overloads_hit_the_same_voxel() {
        let mut g: DenseGrid = DenseGrid::new(8, 8, 8, 0.5, 0.25);
        let w = g.world_coords(3, 4, 5);
        g.set_data_world(w.x, w.y, w.z, VoxelState::Inside, 6);
        assert_eq!(g.get_data(3, 4, 5), VoxelData::new(VoxelState::Inside, 6));
        assert_eq!(g.get_state_world(w.x, w.y, w.z), VoxelState::Inside);
        assert_eq!(g.get_attribute_world(w.x, w.y, w.z), 6);

        g.set_state_world(w.x, w.y, w.z, VoxelState::Exterior);
        g.set_attribute_world(w.x, w.y, w.z, 7);
        assert_eq!(g.get_data(3, 4, 5), VoxelData::new(VoxelState::Exterior, 7));
    }

    #[test]
    fn find_in_region_respects_the_box() {
        let mut g: DenseGrid = DenseGrid::new(6, 6, 6, 1.0, 1.0);
        g.set_state(0, 0, 0, VoxelState::Inside);
        g.set_state(3, 3, 3, VoxelState::Inside);
        g.set_state(5, 5, 5, VoxelState::Inside);

        let mut hits = Vec::new();
        g.find_in_region(
            VoxelClass::Inside,
            IVec3::new(1, 1, 1),
            IVec3::new(4, 4, 4),
            |x, y, z, _| hits.push((x, y, z)),
        );
        assert_eq!(hits, vec![(3, 3, 3)]);
    }

    #[test]
    fn create_empty_is_fresh_and_clone_is_deep() {
        let mut g: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        g.set_data(1, 1, 1, VoxelState::Inside, 3);

        let empty = g.create_empty(4, 4, 4, 1.0, 1.0);
        assert_eq!(empty.find_count(VoxelClass::Marked), 0);

        let mut copy = g.clone();
        copy.set_data(1, 1, 1, VoxelState::Outside, 0);
        assert_eq!(g.get_data(1, 1, 1), VoxelData::new(VoxelState::Inside, 3));
    }

    #[test]
    fn enumeration_order_is_backend_independent() {
        let mut dense: DenseGrid = DenseGrid::new(6, 6, 6, 1.0, 1.0);
        let mut octree: OctreeGrid = OctreeGrid::new(6, 6, 6, 1.0, 1.0);
        let mut block: BlockGrid = BlockGrid::new(6, 6, 6, 1.0, 1.0);
        for (x, y, z) in [(0, 0, 0), (5, 5, 5), (2, 1, 4), (3, 3, 3)] {
            dense.set_state(x, y, z, VoxelState::Inside);
            octree.set_state(x, y, z, VoxelState::Inside);
            block.set_state(x, y, z, VoxelState::Inside);
        }

        let mut a = Vec::new();
        dense.find(VoxelClass::Inside, |x, y, z, _| a.push((x, y, z)));
        let mut b = Vec::new();
        octree.find(VoxelClass::Inside, |x, y, z, _| b.push((x, y, z)));
        let mut c = Vec::new();
        block.find(VoxelClass::Inside, |x, y, z, _| c.push((x, y, z)));
        assert_eq!(a, b);
        assert_eq!(a, c);
        // Scan order is y, then x, then z.
        assert_eq!(a[0], (0, 0, 0));
        assert_eq!(a[1], (2, 1, 4));
    }

    #[test]
    fn randomized_backends_stay_equivalent() {
        init_logger();
        let mut dense: DenseGrid = DenseGrid::new(16, 12, 10, 1.0, 1.0);
        let mut block: BlockGrid = BlockGrid::with_block_order(16, 12, 10, 1.0, 1.0, 3);
        let mut octree: OctreeGrid<u8> = OctreeGrid::new(16, 12, 10, 1.0, 1.0);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..600 {
            let (x, y, z) = (
                rng.gen_range(0..16),
                rng.gen_range(0..12),
                rng.gen_range(0..10),
            );
            let state = VoxelState::from_bits(rng.gen_range(0..4));
            let att = rng.gen_range(0..64u64);
            dense.set_data(x, y, z, state, att);
            block.set_data(x, y, z, state, att);
            octree.set_data(x, y, z, state, att);
        }

        assert!(logical_eq(&dense, &block));
        assert!(logical_eq(&dense, &octree));
        for vc in [VoxelClass::Marked, VoxelClass::Interior, VoxelClass::Outside] {
            assert_eq!(dense.find_count(vc), block.find_count(vc));
            assert_eq!(dense.find_count(vc), octree.find_count(vc));
        }
        for att in 0..8u64 {
            assert_eq!(dense.find_count(att), octree.find_count(att));
        }
    }

    #[test]
    fn indexed_matches_dense_within_table_capacity() {
        let mut dense: DenseGrid<u64> = DenseGrid::new(8, 8, 8, 1.0, 1.0);
        let mut indexed = IndexedGrid::new(8, 8, 8, 1.0, 1.0);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..300 {
            let (x, y, z) = (
                rng.gen_range(0..8),
                rng.gen_range(0..8),
                rng.gen_range(0..8),
            );
            let state = VoxelState::from_bits(rng.gen_range(0..4));
            // Far beyond any packed field, but only 10 distinct values.
            let att = 1_000_000 + rng.gen_range(0..10u64);
            dense.set_data(x, y, z, state, att);
            indexed.set_data(x, y, z, state, att);
        }

        assert!(logical_eq(&dense, &indexed));
    }

    #[test]
    fn logical_eq_rejects_size_and_content_mismatch() {
        let a: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        let b: DenseGrid = DenseGrid::new(4, 4, 5, 1.0, 1.0);
        assert!(!logical_eq(&a, &b));

        let mut c: DenseGrid = DenseGrid::new(4, 4, 4, 1.0, 1.0);
        c.set_attribute(0, 0, 0, 1);
        assert!(!logical_eq(&a, &c));
    }

    #[test]
    fn slice_to_string_renders_states() {
        let mut g: DenseGrid = DenseGrid::new(2, 1, 2, 1.0, 1.0);
        g.set_state(0, 0, 0, VoxelState::Interior);
        let s = g.slice_to_string(0);
        assert!(s.contains('2'));
        assert_eq!(s.lines().count(), 2);
    }
}
