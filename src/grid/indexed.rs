//! Material-indexed backend: voxels store a compact table index instead of
//! the attribute itself.
//!
//! A 64-slot table maps each live index to its full u64 attribute value;
//! slot 0 is pinned to attribute 0 (the untouched default), leaving up to
//! 63 simultaneously distinct non-zero values. In exchange, per-voxel
//! storage is one byte regardless of attribute magnitude, and bulk
//! attribute mutation rewrites table slots in O(distinct values) instead
//! of scanning every voxel.

use log::debug;

use crate::config::GridConfig;
use crate::grid::{covering_voxels_ceil, AttributeGrid, GridShape};
use crate::voxel::{VoxelData, VoxelState};

const TABLE_SLOTS: usize = 64;
const SLOT_MASK: u8 = (TABLE_SLOTS - 1) as u8;

/// Attribute-indirection grid.
///
/// The external contract is identical to the direct-encoding backends; the
/// full u64 attribute domain is representable (no wrap), but at most 63
/// distinct non-zero values may be live at once. Exceeding that panics —
/// table slots are identities, not magnitudes, so wrapping would corrupt
/// unrelated voxels.
#[derive(Debug, Clone)]
pub struct IndexedGrid {
    shape: GridShape,
    /// Per voxel: state in the top 2 bits, table slot in the low 6.
    data: Vec<u8>,
    /// Slot -> attribute value. Slot 0 pinned to 0.
    table: [u64; TABLE_SLOTS],
    /// Live voxel count per slot. Slot 0 is untracked (it is the default
    /// for the whole grid).
    refs: [u32; TABLE_SLOTS],
}

impl IndexedGrid {
    pub fn new(width: i32, height: i32, depth: i32, voxel_size: f64, slice_height: f64) -> Self {
        let shape = GridShape::new(width, height, depth, voxel_size, slice_height);
        let data = vec![0u8; shape.voxel_count()];
        Self {
            shape,
            data,
            table: [0; TABLE_SLOTS],
            refs: [0; TABLE_SLOTS],
        }
    }

    /// Size the grid to cover a world-space extent (`ceil` plus one guard
    /// voxel per axis, as the dense backend does).
    pub fn from_extent(
        world_width: f64,
        world_height: f64,
        world_depth: f64,
        voxel_size: f64,
        slice_height: f64,
    ) -> Self {
        Self::new(
            covering_voxels_ceil(world_width, voxel_size),
            covering_voxels_ceil(world_height, slice_height),
            covering_voxels_ceil(world_depth, voxel_size),
            voxel_size,
            slice_height,
        )
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(
            config.width,
            config.height,
            config.depth,
            config.voxel_size,
            config.slice_height,
        )
    }

    /// Number of distinct non-zero attribute values currently referenced.
    pub fn distinct_attributes(&self) -> usize {
        let mut values: Vec<u64> = (1..TABLE_SLOTS)
            .filter(|&s| self.refs[s] > 0 && self.table[s] != 0)
            .map(|s| self.table[s])
            .collect();
        values.sort_unstable();
        values.dedup();
        values.len()
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(self.shape.contains(x, y, z));
        let slice = self.shape.width as usize * self.shape.depth as usize;
        y as usize * slice + x as usize * self.shape.depth as usize + z as usize
    }

    /// Slot holding `value`, allocating a free slot if needed.
    fn slot_for_value(&mut self, value: u64) -> usize {
        if value == 0 {
            return 0;
        }
        for s in 1..TABLE_SLOTS {
            if self.refs[s] > 0 && self.table[s] == value {
                return s;
            }
        }
        for s in 1..TABLE_SLOTS {
            if self.refs[s] == 0 {
                debug!("table slot {s} -> attribute {value}");
                self.table[s] = value;
                return s;
            }
        }
        panic!("IndexedGrid holds at most 63 simultaneously distinct non-zero attribute values");
    }

    fn put(&mut self, idx: usize, state: VoxelState, value: u64) {
        let old_slot = (self.data[idx] & SLOT_MASK) as usize;
        if self.table[old_slot] == value {
            self.data[idx] = (state.bits() << 6) | old_slot as u8;
            return;
        }
        if old_slot != 0 {
            self.refs[old_slot] -= 1;
        }
        let new_slot = self.slot_for_value(value);
        if new_slot != 0 {
            self.refs[new_slot] += 1;
        }
        self.data[idx] = (state.bits() << 6) | new_slot as u8;
    }
}

impl AttributeGrid for IndexedGrid {
    fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// The table carries full u64 values; assignment never wraps.
    fn attribute_bits(&self) -> u32 {
        64
    }

    #[inline]
    fn get_data(&self, x: i32, y: i32, z: i32) -> VoxelData {
        let w = self.data[self.index(x, y, z)];
        VoxelData::new(
            VoxelState::from_bits(w >> 6),
            self.table[(w & SLOT_MASK) as usize],
        )
    }

    fn set_data(&mut self, x: i32, y: i32, z: i32, state: VoxelState, attribute: u64) {
        let idx = self.index(x, y, z);
        self.put(idx, state, attribute);
    }

    #[inline]
    fn set_state(&mut self, x: i32, y: i32, z: i32, state: VoxelState) {
        let idx = self.index(x, y, z);
        self.data[idx] = (state.bits() << 6) | (self.data[idx] & SLOT_MASK);
    }

    fn set_attribute(&mut self, x: i32, y: i32, z: i32, attribute: u64) {
        let idx = self.index(x, y, z);
        let state = VoxelState::from_bits(self.data[idx] >> 6);
        self.put(idx, state, attribute);
    }

    /// Table-level reassignment: live slots holding an old value are
    /// rewritten in place, touching no voxel words. Only a reassignment
    /// away from attribute 0 has to scan, because slot 0 is pinned.
    fn reassign_attribute(&mut self, old_values: &[u64], new_value: u64) {
        if old_values.is_empty() {
            return;
        }
        for s in 1..TABLE_SLOTS {
            if self.refs[s] > 0 && old_values.contains(&self.table[s]) {
                self.table[s] = new_value;
            }
        }
        if old_values.contains(&0) && new_value != 0 {
            for idx in 0..self.data.len() {
                if self.data[idx] & SLOT_MASK == 0 {
                    let state = VoxelState::from_bits(self.data[idx] >> 6);
                    self.put(idx, state, new_value);
                }
            }
        }
    }

    fn create_empty(
        &self,
        width: i32,
        height: i32,
        depth: i32,
        voxel_size: f64,
        slice_height: f64,
    ) -> Self {
        Self::new(width, height, depth, voxel_size, slice_height)
    }
}
