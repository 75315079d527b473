//! Control plane
//!
//! The command protocol for inspecting and mutating the two store-wide
//! geometry defaults (quantum size, qset size).
//!
//! Commands arrive as numeric opcodes: a family magic byte plus a bounded
//! command number ([`command`]). Dispatch, privilege gating, and the
//! get/set/tell/query/exchange/shift semantics live in [`control`].

pub mod command;
pub mod control;

pub use command::{ControlCommand, COMMAND_MAGIC, MAX_COMMAND_NR};
pub use control::{Caller, ControlPlane, ControlReply};
