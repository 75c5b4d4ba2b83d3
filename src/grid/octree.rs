//! Sparse collapsing octree backend.
//!
//! The root covers a power-of-two cube sized to the largest grid axis. A
//! node is either a leaf carrying one packed value for its whole subtree,
//! or an internal node with exactly eight children splitting on the cube
//! midpoint. Uniform regions therefore cost one node no matter their size.
//!
//! Nodes live in a flat arena addressed by `NodeId` with a free list for
//! reuse; parent links are not stored — the descent records its path and
//! the collapse walks it back up.

use log::trace;

use crate::config::GridConfig;
use crate::grid::block::nextpow2;
use crate::grid::{covering_voxels_ceil, AttributeGrid, GridShape};
use crate::voxel::word::GridWord;
use crate::voxel::{VoxelData, VoxelState};

/// Index into the octree's node arena.
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node<W> {
    /// One value for the node's entire cube.
    Leaf(W),
    /// Eight children, octant index bit 0 = x, bit 1 = y, bit 2 = z.
    Internal([NodeId; 8]),
}

/// Sparse collapsing octree grid.
///
/// Writes split leaves on the way down and re-merge uniform sibling groups
/// on the way back up, so the tree always holds the minimal shape for its
/// content. An untouched grid is a single leaf.
#[derive(Debug, Clone)]
pub struct OctreeGrid<W: GridWord = u64> {
    shape: GridShape,
    /// Side of the root cube: next power of two >= max(width, height, depth).
    root_size: i32,
    nodes: Vec<Node<W>>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl<W: GridWord> OctreeGrid<W> {
    pub fn new(width: i32, height: i32, depth: i32, voxel_size: f64, slice_height: f64) -> Self {
        let shape = GridShape::new(width, height, depth, voxel_size, slice_height);
        let root_size = 1i32 << nextpow2(width.max(height).max(depth));
        Self {
            shape,
            root_size,
            nodes: vec![Node::Leaf(W::default())],
            free: Vec::new(),
            root: 0,
        }
    }

    /// Size the grid to cover a world-space extent. This backend rounds
    /// each axis up (`ceil`) and adds one guard voxel; the root cube then
    /// expands to the next power of two.
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

    /// Total materialized nodes. Strictly decreases whenever a write
    /// completes a uniform eight-child group and triggers a collapse.
    pub fn cell_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Side of the root cube in voxels.
    pub fn root_size(&self) -> i32 {
        self.root_size
    }

    fn alloc(&mut self, node: Node<W>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = node;
                id
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as NodeId
            }
        }
    }

    /// Turn a leaf into an internal node with eight children carrying the
    /// old value.
    fn split(&mut self, id: NodeId, value: W) {
        let mut children = [0 as NodeId; 8];
        for child in children.iter_mut() {
            *child = self.alloc(Node::Leaf(value));
        }
        self.nodes[id as usize] = Node::Internal(children);
    }

    /// Replace an internal node whose eight children are identical leaves
    /// with a single leaf. Returns false if the children are not uniform.
    fn try_collapse(&mut self, id: NodeId) -> bool {
        let Node::Internal(children) = self.nodes[id as usize] else {
            return false;
        };
        let first = match self.nodes[children[0] as usize] {
            Node::Leaf(w) => w,
            Node::Internal(_) => return false,
        };
        for &c in &children[1..] {
            match self.nodes[c as usize] {
                Node::Leaf(w) if w == first => {}
                _ => return false,
            }
        }
        for &c in &children {
            self.free.push(c);
        }
        self.nodes[id as usize] = Node::Leaf(first);
        trace!("collapsed node {id}, {} cells live", self.cell_count());
        true
    }
}

impl<W: GridWord> AttributeGrid for OctreeGrid<W> {
    fn shape(&self) -> &GridShape {
        &self.shape
    }

    fn attribute_bits(&self) -> u32 {
        W::ATTR_BITS
    }

    fn get_data(&self, x: i32, y: i32, z: i32) -> VoxelData {
        let (mut ox, mut oy, mut oz) = (0, 0, 0);
        let mut size = self.root_size;
        let mut id = self.root;
        loop {
            match self.nodes[id as usize] {
                Node::Leaf(w) => return w.unpack(),
                Node::Internal(children) => {
                    let half = size >> 1;
                    let mut oct = 0;
                    if x >= ox + half {
                        oct |= 1;
                        ox += half;
                    }
                    if y >= oy + half {
                        oct |= 2;
                        oy += half;
                    }
                    if z >= oz + half {
                        oct |= 4;
                        oz += half;
                    }
                    id = children[oct];
                    size = half;
                }
            }
        }
    }

    fn set_data(&mut self, x: i32, y: i32, z: i32, state: VoxelState, attribute: u64) {
        let target = W::pack(state, attribute);
        let (mut ox, mut oy, mut oz) = (0, 0, 0);
        let mut size = self.root_size;
        let mut id = self.root;
        // Internal ancestors of the written voxel, root first.
        let mut path: Vec<NodeId> = Vec::new();

        loop {
            match self.nodes[id as usize] {
                Node::Leaf(w) => {
                    if w == target {
                        // The covering region already has this value.
                        break;
                    }
                    if size == 1 {
                        self.nodes[id as usize] = Node::Leaf(target);
                        break;
                    }
                    self.split(id, w);
                    // Re-enter the loop: the node is now internal.
                }
                Node::Internal(children) => {
                    path.push(id);
                    let half = size >> 1;
                    let mut oct = 0;
                    if x >= ox + half {
                        oct |= 1;
                        ox += half;
                    }
                    if y >= oy + half {
                        oct |= 2;
                        oy += half;
                    }
                    if z >= oz + half {
                        oct |= 4;
                        oz += half;
                    }
                    id = children[oct];
                    size = half;
                }
            }
        }

        // Merge uniform sibling groups bottom-up; stop at the first level
        // that stays mixed.
        for &ancestor in path.iter().rev() {
            if !self.try_collapse(ancestor) {
                break;
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
