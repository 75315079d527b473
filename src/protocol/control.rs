//! Control-plane dispatch
//!
//! Routes validated commands to the geometry defaults, gating every
//! mutating command on the caller's admin capability. The defaults' own
//! lock (distinct from any device guard) makes exchange and shift atomic
//! with respect to concurrent control calls.

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::geometry::{GeometryDefaults, GeometryParam};
use crate::transfer::ValuePort;

use super::ControlCommand;

// =============================================================================
// Caller Identity
// =============================================================================

/// Explicit caller capability, checked once per mutating command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    admin: bool,
}

impl Caller {
    /// A caller holding the admin capability
    pub fn admin() -> Self {
        Self { admin: true }
    }

    /// A caller without it
    pub fn unprivileged() -> Self {
        Self { admin: false }
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

// =============================================================================
// Replies
// =============================================================================

/// Outcome of a control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    /// Command completed; any output went through the caller's buffer
    Done,

    /// Command completed and this value is the call's own result
    /// (QUERY returns the current default, SHIFT the previous one)
    Value(usize),
}

// =============================================================================
// Dispatch
// =============================================================================

/// The control plane for one store's geometry defaults
pub struct ControlPlane {
    defaults: GeometryDefaults,
}

impl ControlPlane {
    pub(crate) fn new(defaults: GeometryDefaults) -> Self {
        Self { defaults }
    }

    /// Parse a raw opcode and dispatch it
    pub fn dispatch_opcode(
        &self,
        caller: &Caller,
        opcode: u32,
        value: Option<usize>,
        port: Option<&mut dyn ValuePort>,
    ) -> Result<ControlReply> {
        let command = ControlCommand::parse(opcode)?;
        self.dispatch(caller, command, value, port)
    }

    /// Dispatch a validated command.
    ///
    /// `value` is the direct argument for TELL/SHIFT; `port` is the caller
    /// buffer for SET/GET/EXCHANGE. A missing required argument is an
    /// invalid-argument error. The privilege check happens before any side
    /// effect, including buffer reads.
    pub fn dispatch(
        &self,
        caller: &Caller,
        command: ControlCommand,
        value: Option<usize>,
        port: Option<&mut dyn ValuePort>,
    ) -> Result<ControlReply> {
        if command.privileged() && !caller.is_admin() {
            warn!(?command, "control command rejected: caller lacks admin capability");
            return Err(StoreError::PermissionDenied);
        }

        match command {
            ControlCommand::Reset => {
                self.defaults.reset();
                debug!("geometry defaults reset to compiled-in values");
                Ok(ControlReply::Done)
            }

            ControlCommand::SetQuantum | ControlCommand::SetQset => {
                let param = Self::param_of(command);
                let new = Self::require_port(port)?.read()?;
                Self::validate(param, new)?;
                self.defaults.set(param, new);
                debug!(?param, new, "default installed");
                Ok(ControlReply::Done)
            }

            ControlCommand::TellQuantum | ControlCommand::TellQset => {
                let param = Self::param_of(command);
                let new = Self::require_value(value)?;
                Self::validate(param, new)?;
                self.defaults.set(param, new);
                debug!(?param, new, "default installed");
                Ok(ControlReply::Done)
            }

            ControlCommand::GetQuantum | ControlCommand::GetQset => {
                let param = Self::param_of(command);
                let current = self.defaults.get(param);
                Self::require_port(port)?.write(current)?;
                Ok(ControlReply::Done)
            }

            ControlCommand::QueryQuantum | ControlCommand::QueryQset => {
                let param = Self::param_of(command);
                Ok(ControlReply::Value(self.defaults.get(param)))
            }

            ControlCommand::ExchangeQuantum | ControlCommand::ExchangeQset => {
                let param = Self::param_of(command);
                let port = Self::require_port(port)?;
                // The whole read-then-write-back-then-install sequence runs
                // under the defaults lock so concurrent control calls
                // serialize
                let mut geo = self.defaults.lock();
                let slot = match param {
                    GeometryParam::Quantum => &mut geo.quantum,
                    GeometryParam::Qset => &mut geo.qset,
                };
                let new = port.read()?;
                Self::validate(param, new)?;
                port.write(*slot)?;
                *slot = new;
                debug!(?param, new, "default exchanged");
                Ok(ControlReply::Done)
            }

            ControlCommand::ShiftQuantum | ControlCommand::ShiftQset => {
                let param = Self::param_of(command);
                let new = Self::require_value(value)?;
                Self::validate(param, new)?;
                let old = self.defaults.swap(param, new);
                debug!(?param, new, old, "default shifted");
                Ok(ControlReply::Value(old))
            }
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn param_of(command: ControlCommand) -> GeometryParam {
        // Reset is handled before this is called
        match command.param() {
            Some(param) => param,
            None => GeometryParam::Quantum,
        }
    }

    fn require_port(port: Option<&mut dyn ValuePort>) -> Result<&mut dyn ValuePort> {
        port.ok_or_else(|| {
            StoreError::InvalidArgument("command requires a value buffer".to_string())
        })
    }

    fn require_value(value: Option<usize>) -> Result<usize> {
        value.ok_or_else(|| {
            StoreError::InvalidArgument("command requires a direct value".to_string())
        })
    }

    fn validate(param: GeometryParam, value: usize) -> Result<()> {
        if value == 0 {
            return Err(StoreError::InvalidArgument(format!(
                "{param:?} must be positive"
            )));
        }
        Ok(())
    }
}
