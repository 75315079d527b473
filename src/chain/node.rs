//! Chain node: one index block of quantum slots

use tracing::trace;

use crate::error::{Result, StoreError};

/// Allocate a zero-filled quantum buffer, reporting failure instead of
/// aborting the process.
fn alloc_quantum(len: usize) -> Result<Box<[u8]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| StoreError::OutOfMemory)?;
    buf.resize(len, 0);
    Ok(buf.into_boxed_slice())
}

/// One index block in the chain
///
/// The slot array is allocated as a whole on the first write that lands in
/// this node, sized to the device's qset *at that moment*. Once allocated,
/// its length never changes: nodes created under different qset values
/// coexist in one chain, and `slot_count()`, not the device's current qset,
/// is authoritative when indexing this node.
#[derive(Debug)]
pub struct QsetNode {
    slots: Option<Vec<Option<Box<[u8]>>>>,
}

impl QsetNode {
    /// Create a node with no slot array (all quanta implicitly absent)
    pub fn new() -> Self {
        Self { slots: None }
    }

    /// Whether the slot array has been allocated
    pub fn has_slots(&self) -> bool {
        self.slots.is_some()
    }

    /// This node's recorded slot count (0 if the array is unallocated)
    pub fn slot_count(&self) -> usize {
        self.slots.as_ref().map_or(0, Vec::len)
    }

    /// Allocate the slot array if absent, sized to `qset`, all slots empty.
    ///
    /// A no-op if the array already exists; the recorded capacity of an
    /// existing node is never resized.
    pub fn ensure_slots(&mut self, qset: usize) -> Result<()> {
        if self.slots.is_none() {
            let mut slots = Vec::new();
            slots.try_reserve_exact(qset).map_err(|_| StoreError::OutOfMemory)?;
            slots.resize_with(qset, || None);
            self.slots = Some(slots);
            trace!(qset, "slot array allocated");
        }
        Ok(())
    }

    /// Read-only view of a slot's quantum, `None` for any kind of hole
    /// (unallocated array, out-of-range slot, or empty slot).
    pub fn quantum(&self, slot: usize) -> Option<&[u8]> {
        self.slots
            .as_ref()?
            .get(slot)?
            .as_deref()
    }

    /// Mutable access to a slot's quantum, allocating a zero-filled buffer
    /// of `quantum_size` bytes if the slot is empty.
    ///
    /// Fails with an invalid-argument error if `slot` is at or beyond this
    /// node's recorded slot count (a live qset change can make the current
    /// decomposition address slots an older node never had), and with an
    /// out-of-memory error if the buffer allocation fails.
    pub fn quantum_mut(&mut self, slot: usize, quantum_size: usize) -> Result<&mut [u8]> {
        let slots = self.slots.as_mut().ok_or_else(|| {
            StoreError::InvalidArgument("slot array not allocated".to_string())
        })?;
        let count = slots.len();
        let entry = slots.get_mut(slot).ok_or_else(|| {
            StoreError::InvalidArgument(format!("slot {slot} exceeds node capacity {count}"))
        })?;
        match entry {
            Some(quantum) => Ok(&mut **quantum),
            empty => {
                trace!(slot, quantum_size, "quantum allocated");
                Ok(&mut **empty.insert(alloc_quantum(quantum_size)?))
            }
        }
    }

    /// Iterate over (slot index, quantum) pairs for occupied slots only
    pub fn occupied_slots(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.slots
            .iter()
            .flat_map(|slots| slots.iter().enumerate())
            .filter_map(|(i, q)| q.as_deref().map(|q| (i, q)))
    }
}

impl Default for QsetNode {
    fn default() -> Self {
        Self::new()
    }
}
