//! Device: one logical storage unit
//!
//! Holds the per-instance state (current geometry, logical size, the chain)
//! behind a single exclusive guard. Every read, write, and trim takes the
//! guard for its full duration, from decomposition through the size update,
//! and the RAII guard releases it on every exit path, including errors.
//!
//! ## Concurrency Model
//!
//! - One guard per device; operations on different devices never contend.
//! - Guard acquisition may block. The interruptible variants poll with a
//!   timed try-lock and bail out with a distinct `Interrupted` error when
//!   the caller's cancel flag is raised; cancellation is never masked as
//!   success, and the caller retries the whole call.
//! - Once the guard is held there are no further suspension points.
//!
//! ## Single-Quantum Bound
//!
//! A single read or write transfers at most one quantum's worth of
//! contiguous bytes. Callers wanting more reissue with the advanced offset.
//! This bounds per-call guard hold time and buffer exposure regardless of
//! request size.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::chain::{Position, QuantumChain};
use crate::error::{Result, StoreError};
use crate::geometry::{Geometry, GeometryDefaults};
use crate::transfer::{TransferIn, TransferOut};

/// Poll interval for interruptible guard acquisition
const GUARD_POLL: Duration = Duration::from_millis(1);

// =============================================================================
// Cancellation
// =============================================================================

/// Shared flag that cancels an in-progress guard wait
///
/// Clones share the same flag. Raising it makes every interruptible
/// acquisition currently waiting (or subsequently attempted) fail with
/// [`StoreError::Interrupted`].
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// =============================================================================
// Device
// =============================================================================

/// Guarded per-device state
pub(crate) struct DeviceState {
    /// Quantum size this device currently decomposes offsets with
    pub(crate) quantum: usize,

    /// Slot count used when allocating new slot arrays
    pub(crate) qset: usize,

    /// Logical length in bytes; sole authority for how far reads may see
    pub(crate) size: u64,

    /// The storage structure
    pub(crate) chain: QuantumChain,
}

/// One logical storage unit
pub struct Device {
    index: usize,
    state: Mutex<DeviceState>,
    defaults: GeometryDefaults,
}

impl Device {
    /// Create an empty device with geometry snapshotted from the defaults
    pub(crate) fn new(index: usize, defaults: GeometryDefaults) -> Self {
        let geo = defaults.snapshot();
        Self {
            index,
            state: Mutex::new(DeviceState {
                quantum: geo.quantum,
                qset: geo.qset,
                size: 0,
                chain: QuantumChain::new(),
            }),
            defaults,
        }
    }

    /// Device index within its store (diagnostics only)
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock()
    }

    /// Acquire the guard, failing with `Interrupted` if `cancel` is raised
    /// while waiting. A flag raised before the attempt also interrupts, so
    /// cancellation is deterministic even when the guard is free.
    fn lock_interruptible(&self, cancel: &CancelFlag) -> Result<MutexGuard<'_, DeviceState>> {
        loop {
            if cancel.is_raised() {
                return Err(StoreError::Interrupted);
            }
            if let Some(guard) = self.state.try_lock_for(GUARD_POLL) {
                return Ok(guard);
            }
        }
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Read at most one quantum's worth of bytes starting at `offset`.
    ///
    /// Returns the number of bytes transferred: 0 at or past end-of-data,
    /// and 0 for a hole (a node, slot array, or quantum that was never
    /// allocated within the valid size range) — holes are legal structure
    /// state, not errors.
    pub fn read_at(&self, offset: u64, out: &mut impl TransferOut) -> Result<usize> {
        let state = self.lock();
        Self::read_locked(&state, offset, out)
    }

    /// Like [`read_at`](Self::read_at), but the guard wait can be cancelled
    pub fn read_at_interruptible(
        &self,
        offset: u64,
        out: &mut impl TransferOut,
        cancel: &CancelFlag,
    ) -> Result<usize> {
        let state = self.lock_interruptible(cancel)?;
        Self::read_locked(&state, offset, out)
    }

    fn read_locked(state: &DeviceState, offset: u64, out: &mut impl TransferOut) -> Result<usize> {
        if offset >= state.size || out.is_empty() {
            return Ok(0);
        }

        // Clamp to end-of-data, then decompose under the current geometry
        let mut count = (out.len() as u64).min(state.size - offset) as usize;
        let geo = Geometry {
            quantum: state.quantum,
            qset: state.qset,
        };
        let pos = Position::decompose(offset, geo);

        // Any missing piece inside the size range is a hole: report
        // end-of-data for this call, let the caller reissue past it.
        let Some(node) = state.chain.node(pos.node) else {
            return Ok(0);
        };
        let Some(quantum) = node.quantum(pos.slot) else {
            return Ok(0);
        };
        // A quantum allocated under an older, smaller geometry may not
        // reach the decomposed byte offset at all
        if pos.byte >= quantum.len() {
            return Ok(0);
        }

        // One quantum per call, and never past the buffer actually allocated
        count = count.min(geo.quantum - pos.byte).min(quantum.len() - pos.byte);

        out.copy_from(&quantum[pos.byte..pos.byte + count])
            .map_err(|_| StoreError::AccessFault)?;
        Ok(count)
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Write at most one quantum's worth of bytes starting at `offset`,
    /// allocating nodes, slot arrays, and quanta on demand.
    ///
    /// Returns the number of bytes transferred and raises the device size
    /// to `offset + transferred` if that is a new high-water mark. A copy
    /// fault aborts the transfer but leaves any freshly allocated quantum
    /// in place; an allocated-but-unwritten quantum is a valid hole.
    pub fn write_at(&self, offset: u64, data: &impl TransferIn) -> Result<usize> {
        let mut state = self.lock();
        Self::write_locked(&mut state, offset, data)
    }

    /// Like [`write_at`](Self::write_at), but the guard wait can be cancelled
    pub fn write_at_interruptible(
        &self,
        offset: u64,
        data: &impl TransferIn,
        cancel: &CancelFlag,
    ) -> Result<usize> {
        let mut state = self.lock_interruptible(cancel)?;
        Self::write_locked(&mut state, offset, data)
    }

    fn write_locked(
        state: &mut DeviceState,
        offset: u64,
        data: &impl TransferIn,
    ) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let geo = Geometry {
            quantum: state.quantum,
            qset: state.qset,
        };
        let pos = Position::decompose(offset, geo);

        let node = state.chain.follow(pos.node)?;
        node.ensure_slots(geo.qset)?;
        let quantum = node.quantum_mut(pos.slot, geo.quantum)?;

        if pos.byte >= quantum.len() {
            return Err(StoreError::InvalidArgument(format!(
                "offset {offset} lands past the {}-byte quantum allocated for this slot",
                quantum.len()
            )));
        }

        // One quantum per call
        let count = data.len().min(quantum.len() - pos.byte);
        data.copy_to(&mut quantum[pos.byte..pos.byte + count])
            .map_err(|_| StoreError::AccessFault)?;

        let end = offset + count as u64;
        if end > state.size {
            state.size = end;
        }
        Ok(count)
    }

    // =========================================================================
    // Trim
    // =========================================================================

    /// Empty out the device: free the whole chain, zero the size, and
    /// re-snapshot geometry from the current global defaults.
    ///
    /// Idempotent, and the only path by which a device's geometry changes
    /// after creation.
    pub fn trim(&self) {
        let mut state = self.lock();
        self.trim_locked(&mut state);
    }

    pub(crate) fn trim_locked(&self, state: &mut DeviceState) {
        state.chain.clear();
        state.size = 0;
        let geo = self.defaults.snapshot();
        state.quantum = geo.quantum;
        state.qset = geo.qset;
        debug!(
            device = self.index,
            quantum = geo.quantum,
            qset = geo.qset,
            "device trimmed"
        );
    }

    // =========================================================================
    // Accessors (for testing and diagnostics)
    // =========================================================================

    /// Current logical size in bytes
    pub fn size(&self) -> u64 {
        self.lock().size
    }

    /// Geometry this device currently addresses with
    pub fn geometry(&self) -> Geometry {
        let state = self.lock();
        Geometry {
            quantum: state.quantum,
            qset: state.qset,
        }
    }

    /// Number of chain nodes currently allocated
    pub fn node_count(&self) -> usize {
        self.lock().chain.len()
    }
}
