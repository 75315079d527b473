//! QuantumSet chain
//!
//! The storage layout data structure: a chain of fixed-capacity index nodes,
//! each holding an array of lazily-allocated data quanta. The original
//! singly-linked list is kept as an append-only arena (`Vec` of nodes);
//! node-to-node "next" is simply the next index, which preserves
//! O(node_index) traversal while ownership stays single and structural.
//!
//! ## Sparsity
//! Holes are legal everywhere: a node may exist with its slot array
//! unallocated, and an allocated slot array may hold empty slots. Readers
//! treat any missing piece within the device's logical size as absent data,
//! never as an error.

mod node;

pub use node::QsetNode;

use tracing::trace;

use crate::error::{Result, StoreError};
use crate::geometry::Geometry;

// =============================================================================
// Offset Decomposition
// =============================================================================

/// Where a linear byte offset lands in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the chain node
    pub node: usize,

    /// Slot index within the node
    pub slot: usize,

    /// Byte offset within the quantum
    pub byte: usize,
}

impl Position {
    /// Decompose a linear offset under the given geometry.
    ///
    /// Uses the *current* geometry of the caller's device: a region written
    /// under one geometry and read under another decodes to a different
    /// position. That is a documented hazard of live geometry changes, not
    /// something this layer papers over.
    pub fn decompose(offset: u64, geometry: Geometry) -> Self {
        let itemsize = geometry.itemsize() as u64;
        let quantum = geometry.quantum as u64;
        let rest = offset % itemsize;
        Self {
            node: (offset / itemsize) as usize,
            slot: (rest / quantum) as usize,
            byte: (rest % quantum) as usize,
        }
    }
}

// =============================================================================
// Chain
// =============================================================================

/// The append-only arena of chain nodes owned by one device
#[derive(Default)]
pub struct QuantumChain {
    nodes: Vec<QsetNode>,
}

impl QuantumChain {
    /// Create an empty chain (nothing allocated)
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes currently in the chain
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no nodes at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Read-only access to a node, if it exists
    pub fn node(&self, index: usize) -> Option<&QsetNode> {
        self.nodes.get(index)
    }

    /// The last node in the chain, if any
    pub fn tail(&self) -> Option<&QsetNode> {
        self.nodes.last()
    }

    /// Iterate over the nodes in chain order
    pub fn iter(&self) -> impl Iterator<Item = &QsetNode> {
        self.nodes.iter()
    }

    /// Walk to the node at `index`, appending empty nodes on demand.
    ///
    /// Newly appended nodes have their slot array unallocated; every quantum
    /// under them is implicitly absent. On allocation failure the nodes
    /// appended so far stay in place — unallocated slots are valid holes, so
    /// partial growth is safe and is not rolled back.
    pub fn follow(&mut self, index: usize) -> Result<&mut QsetNode> {
        // A node count of index + 1 can exceed usize under degenerate
        // geometry; that chain can never be allocated, so report exhaustion
        let needed = index.checked_add(1).ok_or(StoreError::OutOfMemory)?;
        if needed > self.nodes.len() {
            let missing = needed - self.nodes.len();
            self.nodes
                .try_reserve(missing)
                .map_err(|_| StoreError::OutOfMemory)?;
            for _ in 0..missing {
                self.nodes.push(QsetNode::new());
            }
            trace!(appended = missing, chain_len = self.nodes.len(), "chain grown");
        }
        // Just ensured above
        Ok(&mut self.nodes[index])
    }

    /// Drop every node, slot array, and quantum in the chain
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
