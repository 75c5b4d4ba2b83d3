//! Per-voxel value model: state classification, query classes and the
//! (state, attribute) pair every backend stores.

use serde::{Deserialize, Serialize};

pub mod word;

/// Classification of a single voxel.
///
/// Two families are in use: solid-geometry grids distinguish
/// `Outside`/`Interior`/`Exterior`, binary occupancy grids use only
/// `Outside`/`Inside`. All four values fit the 2-bit state field of the
/// packed word codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoxelState {
    /// Not part of any object. The default for never-written voxels.
    Outside = 0,
    /// On the surface of an object.
    Exterior = 1,
    /// Strictly inside an object.
    Interior = 2,
    /// Part of an object, surface/interior not distinguished.
    Inside = 3,
}

impl VoxelState {
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => VoxelState::Outside,
            1 => VoxelState::Exterior,
            2 => VoxelState::Interior,
            _ => VoxelState::Inside,
        }
    }

    /// Marked means part of some object, i.e. any state other than `Outside`.
    #[inline]
    pub const fn is_marked(self) -> bool {
        !matches!(self, VoxelState::Outside)
    }
}

impl Default for VoxelState {
    fn default() -> Self {
        VoxelState::Outside
    }
}

/// Query-time aggregate over voxel states, used only for filtering and
/// counting. `All` and `Marked` have no stored counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoxelClass {
    All,
    /// Any state other than `Outside`.
    Marked,
    Outside,
    Exterior,
    Interior,
    Inside,
}

impl VoxelClass {
    #[inline]
    pub fn matches(self, state: VoxelState) -> bool {
        match self {
            VoxelClass::All => true,
            VoxelClass::Marked => state.is_marked(),
            VoxelClass::Outside => state == VoxelState::Outside,
            VoxelClass::Exterior => state == VoxelState::Exterior,
            VoxelClass::Interior => state == VoxelState::Interior,
            VoxelClass::Inside => state == VoxelState::Inside,
        }
    }
}

/// The full logical value of one voxel.
///
/// The attribute ("material") is carried as u64 regardless of the backend's
/// physical width; backends wrap stored values to their own width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoxelData {
    pub state: VoxelState,
    pub attribute: u64,
}

impl VoxelData {
    pub const fn new(state: VoxelState, attribute: u64) -> Self {
        Self { state, attribute }
    }

    /// Value read back from any never-written coordinate.
    pub const EMPTY: Self = Self {
        state: VoxelState::Outside,
        attribute: 0,
    };
}

/// Traversal/count predicate: a voxel class, an attribute value, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Class(VoxelClass),
    Attribute(u64),
    ClassAttribute(VoxelClass, u64),
}

impl Query {
    #[inline]
    pub fn matches(&self, data: &VoxelData) -> bool {
        match *self {
            Query::Class(vc) => vc.matches(data.state),
            Query::Attribute(att) => data.attribute == att,
            Query::ClassAttribute(vc, att) => vc.matches(data.state) && data.attribute == att,
        }
    }
}

impl From<VoxelClass> for Query {
    fn from(vc: VoxelClass) -> Self {
        Query::Class(vc)
    }
}

impl From<u64> for Query {
    fn from(attribute: u64) -> Self {
        Query::Attribute(attribute)
    }
}
