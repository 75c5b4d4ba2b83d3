//! Flat-array backend: one packed word per voxel, O(1) everything.

use crate::config::GridConfig;
use crate::grid::{covering_voxels_ceil, AttributeGrid, GridShape};
use crate::voxel::word::GridWord;
use crate::voxel::{VoxelData, VoxelState};

/// Dense grid: a single contiguous buffer of `width * height * depth`
/// packed words, indexed slice-major (`y`, then `x`, then `z`).
///
/// No sparsity — memory is always voxel count times word width. The word
/// type picks the attribute width: `DenseGrid<u8>` carries 6-bit
/// attributes, `DenseGrid<u16>` 14, `DenseGrid<u32>` 30, `DenseGrid<u64>` 62.
#[derive(Debug, Clone)]
pub struct DenseGrid<W: GridWord = u8> {
    shape: GridShape,
    data: Vec<W>,
}

impl<W: GridWord> DenseGrid<W> {
    pub fn new(width: i32, height: i32, depth: i32, voxel_size: f64, slice_height: f64) -> Self {
        let shape = GridShape::new(width, height, depth, voxel_size, slice_height);
        let data = vec![W::default(); shape.voxel_count()];
        Self { shape, data }
    }

    /// Size the grid to cover a world-space extent. This backend rounds
    /// each axis up (`ceil`) and adds one guard voxel.
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

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(self.shape.contains(x, y, z));
        let slice = self.shape.width as usize * self.shape.depth as usize;
        y as usize * slice + x as usize * self.shape.depth as usize + z as usize
    }

    /// The backing words, for consumers that walk storage directly.
    pub fn raw_words(&self) -> &[W] {
        &self.data
    }

    /// The backing buffer as raw bytes, for zero-copy export.
    pub fn raw_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl<W: GridWord> AttributeGrid for DenseGrid<W> {
    fn shape(&self) -> &GridShape {
        &self.shape
    }

    fn attribute_bits(&self) -> u32 {
        W::ATTR_BITS
    }

    #[inline]
    fn get_data(&self, x: i32, y: i32, z: i32) -> VoxelData {
        self.data[self.index(x, y, z)].unpack()
    }

    #[inline]
    fn set_data(&mut self, x: i32, y: i32, z: i32, state: VoxelState, attribute: u64) {
        let idx = self.index(x, y, z);
        self.data[idx] = W::pack(state, attribute);
    }

    #[inline]
    fn get_state(&self, x: i32, y: i32, z: i32) -> VoxelState {
        self.data[self.index(x, y, z)].state()
    }

    #[inline]
    fn set_state(&mut self, x: i32, y: i32, z: i32, state: VoxelState) {
        let idx = self.index(x, y, z);
        self.data[idx] = self.data[idx].with_state(state);
    }

    #[inline]
    fn get_attribute(&self, x: i32, y: i32, z: i32) -> u64 {
        self.data[self.index(x, y, z)].attribute()
    }

    #[inline]
    fn set_attribute(&mut self, x: i32, y: i32, z: i32, attribute: u64) {
        let idx = self.index(x, y, z);
        self.data[idx] = self.data[idx].with_attribute(attribute);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::VoxelClass;

    #[test]
    fn set_get_round_trip_with_wrap() {
        let mut g: DenseGrid = DenseGrid::new(5, 5, 5, 1.0, 1.0);
        g.set_data(1, 2, 3, VoxelState::Interior, 70);
        // 6-bit field: 70 mod 64 == 6
        assert_eq!(g.get_state(1, 2, 3), VoxelState::Interior);
        assert_eq!(g.get_attribute(1, 2, 3), 70 % 64);
    }

    #[test]
    fn state_and_attribute_are_independent() {
        let mut g: DenseGrid = DenseGrid::new(3, 3, 3, 1.0, 1.0);
        g.set_data(0, 0, 0, VoxelState::Exterior, 21);
        g.set_state(0, 0, 0, VoxelState::Interior);
        assert_eq!(g.get_attribute(0, 0, 0), 21);
        g.set_attribute(0, 0, 0, 40);
        assert_eq!(g.get_state(0, 0, 0), VoxelState::Interior);
    }

    #[test]
    fn wider_words_widen_the_attribute_field() {
        let mut g: DenseGrid<u16> = DenseGrid::new(2, 2, 2, 1.0, 1.0);
        g.set_data(0, 0, 0, VoxelState::Inside, 9000);
        assert_eq!(g.get_attribute(0, 0, 0), 9000);
        assert_eq!(g.attribute_bits(), 14);

        let mut g: DenseGrid<u32> = DenseGrid::new(2, 2, 2, 1.0, 1.0);
        g.set_data(0, 0, 0, VoxelState::Inside, 1 << 29);
        assert_eq!(g.get_attribute(0, 0, 0), 1 << 29);
    }

    #[test]
    fn from_extent_covers_with_ceil_plus_one() {
        // ceil(10.2) + 1 = 12
        let g: DenseGrid = DenseGrid::from_extent(10.2, 5.25, 8.0, 1.0, 0.5);
        assert_eq!(g.width(), 12);
        // ceil(5.25 / 0.5) + 1 = 12
        assert_eq!(g.height(), 12);
        // 8.0 divides exactly; only the guard voxel is added
        assert_eq!(g.depth(), 9);
        assert!(g.grid_bounds().max.x >= 10.2);
    }

    #[test]
    fn from_config_uses_configured_shape() {
        let cfg = GridConfig {
            width: 7,
            height: 3,
            depth: 5,
            ..GridConfig::default()
        };
        let g: DenseGrid = DenseGrid::from_config(&cfg);
        assert_eq!((g.width(), g.height(), g.depth()), (7, 3, 5));
        assert_eq!(g.find_count(VoxelClass::All), 7 * 3 * 5);
    }

    #[test]
    fn raw_bytes_expose_packed_words() {
        let mut g: DenseGrid = DenseGrid::new(2, 1, 1, 1.0, 1.0);
        g.set_data(1, 0, 0, VoxelState::Exterior, 3);
        let bytes = g.raw_bytes();
        assert_eq!(bytes.len(), 2);
        assert_eq!(bytes[1], (1 << 6) | 3);

        let mut g16: DenseGrid<u16> = DenseGrid::new(2, 1, 1, 1.0, 1.0);
        g16.set_data(0, 0, 0, VoxelState::Inside, 1);
        assert_eq!(g16.raw_bytes().len(), 4);
        assert_eq!(g16.raw_words()[0], u16::pack(VoxelState::Inside, 1));
    }

    #[test]
    fn linear_index_is_slice_major() {
        let g: DenseGrid = DenseGrid::new(4, 3, 5, 1.0, 1.0);
        // y * (w*d) + x * d + z
        assert_eq!(g.index(0, 0, 0), 0);
        assert_eq!(g.index(0, 0, 1), 1);
        assert_eq!(g.index(1, 0, 0), 5);
        assert_eq!(g.index(0, 1, 0), 20);
        assert_eq!(g.index(3, 2, 4), 2 * 20 + 3 * 5 + 4);
    }
}
