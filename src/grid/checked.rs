//! Bounds-checking decorator: validates every coordinate before touching
//! the wrapped grid.
//!
//! Bare backends trade safety for speed and do not validate coordinates;
//! wrapping one in [`RangeChecked`] buys a fully validated surface at the
//! cost of a `Result` on every call. On violation the wrapped grid is
//! guaranteed untouched.

use log::warn;
use thiserror::Error;

use crate::common::{Aabb, IVec3, Vec3};
use crate::grid::AttributeGrid;
use crate::voxel::{Query, VoxelData, VoxelState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("voxel coordinate ({x}, {y}, {z}) outside grid {width}x{height}x{depth}")]
    OutOfBounds {
        x: i32,
        y: i32,
        z: i32,
        width: i32,
        height: i32,
        depth: i32,
    },
    #[error("world coordinate ({x}, {y}, {z}) outside grid bounds")]
    WorldOutOfBounds { x: f64, y: f64, z: f64 },
    #[error("no grid attached to the range-checking wrapper")]
    MissingGrid,
}

/// Validating façade over any backend.
///
/// Holds a non-owning mutable borrow of the wrapped grid, so it cannot
/// outlive it. A wrapper without a grid (`detached`) fails every
/// delegating call with [`GridError::MissingGrid`].
///
/// Voxel coordinates must satisfy `0 <= c < dim` per axis. World
/// coordinates are valid when the voxel they floor-map to is in range,
/// which accepts the grid's half-open world extent.
pub struct RangeChecked<'a, G> {
    grid: Option<&'a mut G>,
}

impl<'a, G: AttributeGrid> RangeChecked<'a, G> {
    pub fn new(grid: &'a mut G) -> Self {
        Self { grid: Some(grid) }
    }

    /// A wrapper with no grid behind it.
    pub fn detached() -> Self {
        Self { grid: None }
    }

    pub fn attach(&mut self, grid: &'a mut G) {
        self.grid = Some(grid);
    }

    pub fn detach(&mut self) {
        self.grid = None;
    }

    fn inner(&self) -> Result<&G, GridError> {
        self.grid.as_deref().ok_or(GridError::MissingGrid)
    }

    fn inner_mut(&mut self) -> Result<&mut G, GridError> {
        self.grid.as_deref_mut().ok_or(GridError::MissingGrid)
    }

    fn check(grid: &G, x: i32, y: i32, z: i32) -> Result<(), GridError> {
        if grid.inside_grid(x, y, z) {
            Ok(())
        } else {
            warn!("rejected out-of-range voxel coordinate ({x}, {y}, {z})");
            Err(GridError::OutOfBounds {
                x,
                y,
                z,
                width: grid.width(),
                height: grid.height(),
                depth: grid.depth(),
            })
        }
    }

    fn check_world(grid: &G, wx: f64, wy: f64, wz: f64) -> Result<IVec3, GridError> {
        let c = grid.grid_coords(wx, wy, wz);
        if grid.inside_grid(c.x, c.y, c.z) {
            Ok(c)
        } else {
            warn!("rejected out-of-range world coordinate ({wx}, {wy}, {wz})");
            Err(GridError::WorldOutOfBounds {
                x: wx,
                y: wy,
                z: wz,
            })
        }
    }

    // --- Validated cell access ------------------------------------------

    pub fn get_data(&self, x: i32, y: i32, z: i32) -> Result<VoxelData, GridError> {
        let grid = self.inner()?;
        Self::check(grid, x, y, z)?;
        Ok(grid.get_data(x, y, z))
    }

    pub fn set_data(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        state: VoxelState,
        attribute: u64,
    ) -> Result<(), GridError> {
        let grid = self.inner_mut()?;
        Self::check(grid, x, y, z)?;
        grid.set_data(x, y, z, state, attribute);
        Ok(())
    }

    pub fn get_state(&self, x: i32, y: i32, z: i32) -> Result<VoxelState, GridError> {
        let grid = self.inner()?;
        Self::check(grid, x, y, z)?;
        Ok(grid.get_state(x, y, z))
    }

    pub fn set_state(&mut self, x: i32, y: i32, z: i32, state: VoxelState) -> Result<(), GridError> {
        let grid = self.inner_mut()?;
        Self::check(grid, x, y, z)?;
        grid.set_state(x, y, z, state);
        Ok(())
    }

    pub fn get_attribute(&self, x: i32, y: i32, z: i32) -> Result<u64, GridError> {
        let grid = self.inner()?;
        Self::check(grid, x, y, z)?;
        Ok(grid.get_attribute(x, y, z))
    }

    pub fn set_attribute(&mut self, x: i32, y: i32, z: i32, attribute: u64) -> Result<(), GridError> {
        let grid = self.inner_mut()?;
        Self::check(grid, x, y, z)?;
        grid.set_attribute(x, y, z, attribute);
        Ok(())
    }

    // --- Validated world-coordinate access ------------------------------

    pub fn get_data_world(&self, wx: f64, wy: f64, wz: f64) -> Result<VoxelData, GridError> {
        let grid = self.inner()?;
        let c = Self::check_world(grid, wx, wy, wz)?;
        Ok(grid.get_data(c.x, c.y, c.z))
    }

    pub fn set_data_world(
        &mut self,
        wx: f64,
        wy: f64,
        wz: f64,
        state: VoxelState,
        attribute: u64,
    ) -> Result<(), GridError> {
        let grid = self.inner_mut()?;
        let c = Self::check_world(grid, wx, wy, wz)?;
        grid.set_data(c.x, c.y, c.z, state, attribute);
        Ok(())
    }

    pub fn get_state_world(&self, wx: f64, wy: f64, wz: f64) -> Result<VoxelState, GridError> {
        let grid = self.inner()?;
        let c = Self::check_world(grid, wx, wy, wz)?;
        Ok(grid.get_state(c.x, c.y, c.z))
    }

    pub fn set_state_world(
        &mut self,
        wx: f64,
        wy: f64,
        wz: f64,
        state: VoxelState,
    ) -> Result<(), GridError> {
        let grid = self.inner_mut()?;
        let c = Self::check_world(grid, wx, wy, wz)?;
        grid.set_state(c.x, c.y, c.z, state);
        Ok(())
    }

    pub fn get_attribute_world(&self, wx: f64, wy: f64, wz: f64) -> Result<u64, GridError> {
        let grid = self.inner()?;
        let c = Self::check_world(grid, wx, wy, wz)?;
        Ok(grid.get_attribute(c.x, c.y, c.z))
    }

    pub fn set_attribute_world(
        &mut self,
        wx: f64,
        wy: f64,
        wz: f64,
        attribute: u64,
    ) -> Result<(), GridError> {
        let grid = self.inner_mut()?;
        let c = Self::check_world(grid, wx, wy, wz)?;
        grid.set_attribute(c.x, c.y, c.z, attribute);
        Ok(())
    }

    // --- Delegated queries and bulk ops ---------------------------------

    pub fn find<Q, F>(&self, query: Q, f: F) -> Result<(), GridError>
    where
        Q: Into<Query>,
        F: FnMut(i32, i32, i32, VoxelData),
    {
        self.inner()?.find(query, f);
        Ok(())
    }

    pub fn find_interruptible<Q, F>(&self, query: Q, f: F) -> Result<(), GridError>
    where
        Q: Into<Query>,
        F: FnMut(i32, i32, i32, VoxelData) -> bool,
    {
        self.inner()?.find_interruptible(query, f);
        Ok(())
    }

    pub fn find_count<Q: Into<Query>>(&self, query: Q) -> Result<usize, GridError> {
        Ok(self.inner()?.find_count(query))
    }

    pub fn reassign_attribute(
        &mut self,
        old_values: &[u64],
        new_value: u64,
    ) -> Result<(), GridError> {
        self.inner_mut()?.reassign_attribute(old_values, new_value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, value: u64) -> Result<(), GridError> {
        self.inner_mut()?.remove_attribute(value);
        Ok(())
    }

    pub fn create_empty(
        &self,
        width: i32,
        height: i32,
        depth: i32,
        voxel_size: f64,
        slice_height: f64,
    ) -> Result<G, GridError> {
        Ok(self
            .inner()?
            .create_empty(width, height, depth, voxel_size, slice_height))
    }

    // --- Delegated geometry ---------------------------------------------

    pub fn width(&self) -> Result<i32, GridError> {
        Ok(self.inner()?.width())
    }

    pub fn height(&self) -> Result<i32, GridError> {
        Ok(self.inner()?.height())
    }

    pub fn depth(&self) -> Result<i32, GridError> {
        Ok(self.inner()?.depth())
    }

    pub fn voxel_size(&self) -> Result<f64, GridError> {
        Ok(self.inner()?.voxel_size())
    }

    pub fn slice_height(&self) -> Result<f64, GridError> {
        Ok(self.inner()?.slice_height())
    }

    pub fn grid_coords(&self, wx: f64, wy: f64, wz: f64) -> Result<IVec3, GridError> {
        Ok(self.inner()?.grid_coords(wx, wy, wz))
    }

    pub fn world_coords(&self, x: i32, y: i32, z: i32) -> Result<Vec3, GridError> {
        let grid = self.inner()?;
        Self::check(grid, x, y, z)?;
        Ok(grid.world_coords(x, y, z))
    }

    pub fn grid_bounds(&self) -> Result<Aabb, GridError> {
        Ok(self.inner()?.grid_bounds())
    }
}
