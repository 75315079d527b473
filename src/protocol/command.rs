//! Control command definitions
//!
//! Opcodes carry a family magic byte in bits 8..16 and a command number in
//! bits 0..8. Anything with the wrong magic or a number above
//! [`MAX_COMMAND_NR`] is rejected as unsupported before dispatch rather
//! than crashing.

use crate::error::{Result, StoreError};
use crate::geometry::GeometryParam;

/// Family magic byte identifying quantastore control opcodes
pub const COMMAND_MAGIC: u8 = b'q';

/// Highest valid command number
pub const MAX_COMMAND_NR: u8 = 12;

/// Control command types
///
/// Per-parameter operations come in pairs (quantum, then qset) in the
/// original numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlCommand {
    /// Restore both defaults to the compiled-in values
    Reset = 0,

    /// Install a new default from the caller's buffer
    SetQuantum = 1,
    SetQset = 2,

    /// Install a new default passed directly as the argument
    TellQuantum = 3,
    TellQset = 4,

    /// Return the current default through the caller's buffer
    GetQuantum = 5,
    GetQset = 6,

    /// Return the current default as the call's own result
    QueryQuantum = 7,
    QueryQset = 8,

    /// Read the caller's buffer, write the old default back to it, then
    /// install the read value
    ExchangeQuantum = 9,
    ExchangeQset = 10,

    /// Install the direct argument and return the old default as the result
    ShiftQuantum = 11,
    ShiftQset = 12,
}

impl ControlCommand {
    /// The wire opcode for this command
    pub fn opcode(&self) -> u32 {
        ((COMMAND_MAGIC as u32) << 8) | (*self as u32)
    }

    /// Parse and validate a wire opcode
    pub fn parse(opcode: u32) -> Result<Self> {
        let unsupported = StoreError::NotSupported { opcode };
        if (opcode >> 8) != COMMAND_MAGIC as u32 {
            return Err(unsupported);
        }
        let nr = (opcode & 0xff) as u8;
        if nr > MAX_COMMAND_NR {
            return Err(unsupported);
        }
        Ok(match nr {
            0 => Self::Reset,
            1 => Self::SetQuantum,
            2 => Self::SetQset,
            3 => Self::TellQuantum,
            4 => Self::TellQset,
            5 => Self::GetQuantum,
            6 => Self::GetQset,
            7 => Self::QueryQuantum,
            8 => Self::QueryQset,
            9 => Self::ExchangeQuantum,
            10 => Self::ExchangeQset,
            11 => Self::ShiftQuantum,
            12 => Self::ShiftQset,
            _ => return Err(unsupported),
        })
    }

    /// Which geometry parameter the command targets (None for Reset)
    pub fn param(&self) -> Option<GeometryParam> {
        match self {
            Self::Reset => None,
            Self::SetQuantum
            | Self::TellQuantum
            | Self::GetQuantum
            | Self::QueryQuantum
            | Self::ExchangeQuantum
            | Self::ShiftQuantum => Some(GeometryParam::Quantum),
            Self::SetQset
            | Self::TellQset
            | Self::GetQset
            | Self::QueryQset
            | Self::ExchangeQset
            | Self::ShiftQset => Some(GeometryParam::Qset),
        }
    }

    /// Whether the command mutates a default and therefore needs the admin
    /// capability. RESET and the read-only commands are open to everyone.
    pub fn privileged(&self) -> bool {
        !matches!(
            self,
            Self::Reset
                | Self::GetQuantum
                | Self::GetQset
                | Self::QueryQuantum
                | Self::QueryQset
        )
    }
}
