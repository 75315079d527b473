//! # quantastore
//!
//! A sparse, lazily-allocated in-memory byte store addressed like a
//! random-access file:
//! - Reads and writes at arbitrary offsets, one quantum per call
//! - Storage grows on demand as writes extend past the current allocation
//! - Holes (never-written ranges) read back as absent data, not errors
//! - Runtime-tunable geometry (quantum/qset) through a control plane
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store                                 │
//! │        (device array + geometry defaults + control)          │
//! └────────┬──────────────────────────────────┬─────────────────┘
//!          │                                  │
//!          ▼                                  ▼
//!   ┌─────────────┐                   ┌──────────────┐
//!   │DeviceHandle │                   │ ControlPlane │
//!   │ (pos, seek) │                   │ (get/set/..) │
//!   └──────┬──────┘                   └──────┬───────┘
//!          │                                 │
//!          ▼                                 ▼
//!   ┌─────────────┐                   ┌──────────────┐
//!   │   Device    │                   │  Geometry    │
//!   │  (guarded)  │◄── trim snapshot ─│  Defaults    │
//!   └──────┬──────┘                   └──────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │QuantumChain │
//!   │ (node arena)│
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod geometry;
pub mod chain;
pub mod transfer;
pub mod device;
pub mod handle;
pub mod protocol;
pub mod introspect;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use device::{CancelFlag, Device};
pub use error::{Result, StoreError};
pub use geometry::{Geometry, GeometryParam};
pub use handle::{DeviceHandle, OpenMode, Whence};
pub use protocol::{Caller, ControlCommand, ControlPlane, ControlReply};
pub use store::Store;
pub use transfer::{TransferIn, TransferOut, ValueCell, ValuePort};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of quantastore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
