//! Construction parameters shared by all backends.

use serde::{Deserialize, Serialize};

/// Grid construction parameters, set once before building a backend.
///
/// Every backend has a `from_config` constructor taking this struct; the
/// dimensions are voxel counts, the resolutions are world units per voxel.
/// A grid's shape is immutable — a different size means a new grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Voxel count along x.
    pub width: i32,
    /// Voxel count along y.
    pub height: i32,
    /// Voxel count along z.
    pub depth: i32,
    /// Horizontal (x/z) voxel resolution in world units.
    pub voxel_size: f64,
    /// Vertical (y) voxel resolution in world units. May differ from
    /// `voxel_size` for anisotropic lattices.
    pub slice_height: f64,
    /// log2 of the block side for the block-decomposed backend. Ignored by
    /// the other backends.
    pub block_order: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            depth: 64,
            // 0.1 mm, a common print resolution
            voxel_size: 0.1e-3,
            slice_height: 0.1e-3,
            block_order: 4,
        }
    }
}
