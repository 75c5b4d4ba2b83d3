//! Block-decomposed backend: voxels grouped into cubical blocks so that
//! access patterns touching nearby voxels stay within one small dense
//! buffer.
//!
//! All addressing is power-of-two shift/mask arithmetic. A voxel
//! coordinate splits into a block coordinate (high bits) and a coordinate
//! inside the block (low bits); each half is flattened row-major by
//! `coord_to_index`. The composite map is a bijection, exercised
//! exhaustively by the tests.

use log::trace;

use crate::common::IVec3;
use crate::config::GridConfig;
use crate::grid::{covering_voxels_floor, AttributeGrid, GridShape};
use crate::voxel::word::GridWord;
use crate::voxel::{VoxelData, VoxelState};

pub const DEFAULT_BLOCK_ORDER: u32 = 4;

/// Order of the next power of two: the smallest `k` with `2^k >= n`.
/// Exact powers of two map to their own exponent.
pub fn nextpow2(n: i32) -> u32 {
    let mut p2: i64 = 1;
    let mut k = 0;
    while p2 < n as i64 {
        p2 <<= 1;
        k += 1;
    }
    k
}

/// Row-major index inside a box whose axis `i` has side `2^orders[i]`:
/// `x + y * 2^orders[0] + z * 2^(orders[0] + orders[1])`.
#[inline]
pub fn coord_to_index(c: IVec3, orders: [u32; 3]) -> usize {
    (c.x as usize) + ((c.y as usize) << orders[0]) + ((c.z as usize) << (orders[0] + orders[1]))
}

/// Exact inverse of [`coord_to_index`] for the same orders.
#[inline]
pub fn index_to_coord(index: usize, orders: [u32; 3]) -> IVec3 {
    let x = index & ((1 << orders[0]) - 1);
    let y = (index >> orders[0]) & ((1 << orders[1]) - 1);
    let z = index >> (orders[0] + orders[1]);
    IVec3::new(x as i32, y as i32, z as i32)
}

/// Cache-blocked grid. Blocks allocate lazily on first write; a missing
/// block reads as untouched space.
///
/// The requested block order is clamped per axis so a block never exceeds
/// the grid on that axis; the block grid itself is padded per axis to the
/// next power of two of its block count, so `total_blocks` may exceed the
/// minimum needed.
#[derive(Debug, Clone)]
pub struct BlockGrid<W: GridWord = u8> {
    shape: GridShape,
    /// Requested order, kept for `create_empty`.
    block_order: u32,
    /// Per-axis clamped block orders.
    block_orders: [u32; 3],
    /// Per-axis orders of the grid measured in blocks.
    grid_orders: [u32; 3],
    blocks: Vec<Option<Box<[W]>>>,
}

impl<W: GridWord> BlockGrid<W> {
    pub fn new(width: i32, height: i32, depth: i32, voxel_size: f64, slice_height: f64) -> Self {
        Self::with_block_order(
            width,
            height,
            depth,
            voxel_size,
            slice_height,
            DEFAULT_BLOCK_ORDER,
        )
    }

    pub fn with_block_order(
        width: i32,
        height: i32,
        depth: i32,
        voxel_size: f64,
        slice_height: f64,
        block_order: u32,
    ) -> Self {
        let shape = GridShape::new(width, height, depth, voxel_size, slice_height);
        let dims = [width, height, depth];

        let mut block_orders = [0u32; 3];
        let mut grid_orders = [0u32; 3];
        for i in 0..3 {
            block_orders[i] = block_order.min(nextpow2(dims[i]));
            let side = 1i32 << block_orders[i];
            let blocks_needed = (dims[i] + side - 1) >> block_orders[i];
            grid_orders[i] = nextpow2(blocks_needed);
        }

        let total = 1usize << (grid_orders[0] + grid_orders[1] + grid_orders[2]);
        Self {
            shape,
            block_order,
            block_orders,
            grid_orders,
            blocks: vec![None; total],
        }
    }

    /// Size the grid to cover a world-space extent. This backend truncates
    /// each axis and adds one voxel.
    pub fn from_extent(
        world_width: f64,
        world_height: f64,
        world_depth: f64,
        voxel_size: f64,
        slice_height: f64,
        block_order: u32,
    ) -> Self {
        Self::with_block_order(
            covering_voxels_floor(world_width, voxel_size),
            covering_voxels_floor(world_height, slice_height),
            covering_voxels_floor(world_depth, voxel_size),
            voxel_size,
            slice_height,
            block_order,
        )
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::with_block_order(
            config.width,
            config.height,
            config.depth,
            config.voxel_size,
            config.slice_height,
            config.block_order,
        )
    }

    // --- Index arithmetic -----------------------------------------------

    #[inline]
    pub fn block_coord(&self, x: i32, y: i32, z: i32) -> IVec3 {
        IVec3::new(
            x >> self.block_orders[0],
            y >> self.block_orders[1],
            z >> self.block_orders[2],
        )
    }

    #[inline]
    pub fn voxel_in_block(&self, x: i32, y: i32, z: i32) -> IVec3 {
        IVec3::new(
            x & ((1 << self.block_orders[0]) - 1),
            y & ((1 << self.block_orders[1]) - 1),
            z & ((1 << self.block_orders[2]) - 1),
        )
    }

    /// Flat index of the block containing a voxel coordinate.
    #[inline]
    pub fn block_index(&self, x: i32, y: i32, z: i32) -> usize {
        coord_to_index(self.block_coord(x, y, z), self.grid_orders)
    }

    /// Flat index of a voxel inside its block.
    #[inline]
    pub fn local_index(&self, x: i32, y: i32, z: i32) -> usize {
        coord_to_index(self.voxel_in_block(x, y, z), self.block_orders)
    }

    /// Rebuild the voxel coordinate from a (block, local) index pair.
    /// Inverse of `block_index`/`local_index` for every in-range voxel.
    pub fn voxel_coord(&self, block_index: usize, local_index: usize) -> IVec3 {
        let bc = index_to_coord(block_index, self.grid_orders);
        let vc = index_to_coord(local_index, self.block_orders);
        IVec3::new(
            (bc.x << self.block_orders[0]) | vc.x,
            (bc.y << self.block_orders[1]) | vc.y,
            (bc.z << self.block_orders[2]) | vc.z,
        )
    }

    // --- Introspection --------------------------------------------------

    /// Per-axis block side in voxels.
    pub fn block_size_in_voxels(&self) -> IVec3 {
        IVec3::new(
            1 << self.block_orders[0],
            1 << self.block_orders[1],
            1 << self.block_orders[2],
        )
    }

    /// Per-axis block count (padded to a power of two).
    pub fn grid_size_in_blocks(&self) -> IVec3 {
        IVec3::new(
            1 << self.grid_orders[0],
            1 << self.grid_orders[1],
            1 << self.grid_orders[2],
        )
    }

    pub fn total_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Blocks that have been materialized by a write.
    pub fn allocated_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    #[inline]
    fn block_volume(&self) -> usize {
        1 << (self.block_orders[0] + self.block_orders[1] + self.block_orders[2])
    }

    fn ensure_block(&mut self, block_index: usize) -> &mut [W] {
        let volume = self.block_volume();
        if self.blocks[block_index].is_none() {
            trace!("allocating block {block_index} ({volume} voxels)");
        }
        self.blocks[block_index]
            .get_or_insert_with(|| vec![W::default(); volume].into_boxed_slice())
    }
}

impl<W: GridWord> AttributeGrid for BlockGrid<W> {
    fn shape(&self) -> &GridShape {
        &self.shape
    }

    fn attribute_bits(&self) -> u32 {
        W::ATTR_BITS
    }

    #[inline]
    fn get_data(&self, x: i32, y: i32, z: i32) -> VoxelData {
        debug_assert!(self.shape.contains(x, y, z));
        match &self.blocks[self.block_index(x, y, z)] {
            Some(block) => block[self.local_index(x, y, z)].unpack(),
            None => VoxelData::EMPTY,
        }
    }

    #[inline]
    fn set_data(&mut self, x: i32, y: i32, z: i32, state: VoxelState, attribute: u64) {
        debug_assert!(self.shape.contains(x, y, z));
        let (bid, lid) = (self.block_index(x, y, z), self.local_index(x, y, z));
        self.ensure_block(bid)[lid] = W::pack(state, attribute);
    }

    #[inline]
    fn set_state(&mut self, x: i32, y: i32, z: i32, state: VoxelState) {
        let (bid, lid) = (self.block_index(x, y, z), self.local_index(x, y, z));
        let block = self.ensure_block(bid);
        block[lid] = block[lid].with_state(state);
    }

    #[inline]
    fn set_attribute(&mut self, x: i32, y: i32, z: i32, attribute: u64) {
        let (bid, lid) = (self.block_index(x, y, z), self.local_index(x, y, z));
        let block = self.ensure_block(bid);
        block[lid] = block[lid].with_attribute(attribute);
    }

    fn create_empty(
        &self,
        width: i32,
        height: i32,
        depth: i32,
        voxel_size: f64,
        slice_height: f64,
    ) -> Self {
        Self::with_block_order(
            width,
            height,
            depth,
            voxel_size,
            slice_height,
            self.block_order,
        )
    }
}
