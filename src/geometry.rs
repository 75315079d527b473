//! Global geometry defaults
//!
//! The two process-wide tunables (default quantum size, default qset size)
//! behind their own lock, separate from any per-device guard.
//!
//! ## Mutation discipline
//! - The control plane is the single mutation entry point.
//! - Readers (device creation, trim) take a consistent snapshot.
//! - Changing a default never retouches an existing device; a device picks
//!   up new defaults only at creation or at trim-triggered reset.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::{Config, DEFAULT_QSET, DEFAULT_QUANTUM};

/// A consistent (quantum, qset) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Size in bytes of one data quantum
    pub quantum: usize,

    /// Number of quantum slots per chain node
    pub qset: usize,
}

impl Geometry {
    /// Bytes addressed by one full chain node
    pub fn itemsize(&self) -> usize {
        self.quantum * self.qset
    }
}

/// Which of the two geometry parameters a control command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryParam {
    Quantum,
    Qset,
}

/// Shared handle to the store-wide geometry defaults
///
/// Cloning the handle shares the same underlying state (devices hold a clone
/// so trim can re-read the defaults).
#[derive(Clone)]
pub struct GeometryDefaults {
    inner: Arc<Mutex<Geometry>>,
}

impl GeometryDefaults {
    /// Create defaults seeded from a config
    pub fn new(config: &Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Geometry {
                quantum: config.quantum,
                qset: config.qset,
            })),
        }
    }

    /// Take a consistent snapshot of both parameters
    pub fn snapshot(&self) -> Geometry {
        *self.inner.lock()
    }

    /// Hold the defaults lock across a compound read-then-write (exchange
    /// semantics on the control plane)
    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, Geometry> {
        self.inner.lock()
    }

    /// Read one parameter
    pub fn get(&self, param: GeometryParam) -> usize {
        let geo = self.inner.lock();
        match param {
            GeometryParam::Quantum => geo.quantum,
            GeometryParam::Qset => geo.qset,
        }
    }

    /// Install a new value for one parameter
    pub fn set(&self, param: GeometryParam, value: usize) {
        let mut geo = self.inner.lock();
        match param {
            GeometryParam::Quantum => geo.quantum = value,
            GeometryParam::Qset => geo.qset = value,
        }
    }

    /// Install a new value and return the previous one, atomically with
    /// respect to concurrent control-plane calls
    pub fn swap(&self, param: GeometryParam, value: usize) -> usize {
        let mut geo = self.inner.lock();
        let slot = match param {
            GeometryParam::Quantum => &mut geo.quantum,
            GeometryParam::Qset => &mut geo.qset,
        };
        std::mem::replace(slot, value)
    }

    /// Restore both parameters to the compiled-in defaults
    pub fn reset(&self) {
        let mut geo = self.inner.lock();
        geo.quantum = DEFAULT_QUANTUM;
        geo.qset = DEFAULT_QSET;
    }
}
