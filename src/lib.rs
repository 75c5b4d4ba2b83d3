//! voxstore: voxel attribute-grid storage engine for solid-geometry tooling.
//!
//! Architecture:
//! - Packed word codec (voxel module): state and attribute share one fixed-width word
//! - Dense flat-array backend (grid::dense) for O(1) access on small grids
//! - Block-decomposed backend (grid::block) for cache-local access on large grids
//! - Sparse collapsing octree (grid::octree) for mostly-uniform content
//! - Material-indexed backend (grid::indexed) bounding distinct attribute count
//! - One shared contract (grid::AttributeGrid): traversal, queries, bulk mutation
//!   and the world/grid coordinate system, identical across every backend
//! - Range-checking decorator (grid::checked) for a validated surface
//!
//! Geometry is rasterized into a fixed-size lattice at construction time and
//! mutated voxel-by-voxel for the grid's lifetime; a different size means a
//! new grid.

pub mod common;
pub mod config;
pub mod grid;
pub mod voxel;

pub use common::{Aabb, IVec3, Vec3};
pub use config::GridConfig;
pub use grid::block::BlockGrid;
pub use grid::checked::{GridError, RangeChecked};
pub use grid::dense::DenseGrid;
pub use grid::indexed::IndexedGrid;
pub use grid::octree::OctreeGrid;
pub use grid::{logical_eq, AttributeGrid, GridShape};
pub use voxel::word::GridWord;
pub use voxel::{Query, VoxelClass, VoxelData, VoxelState};
