//! Open-device handles
//!
//! A [`DeviceHandle`] is what the open collaborator hands to a client: the
//! shared device plus a private position cursor. Reads and writes run at the
//! cursor and advance it by the bytes actually transferred; seek moves it
//! without touching the storage structure. Several handles on the same
//! device coexist, each with its own cursor; the device guard serializes
//! the actual transfers.

use std::sync::Arc;

use crate::device::{CancelFlag, Device};
use crate::error::{Result, StoreError};
use crate::transfer::{TransferIn, TransferOut};

/// Access intent declared at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    /// Write-only opens truncate: the device is trimmed before first use
    WriteOnly,
    ReadWrite,
}

impl OpenMode {
    pub fn readable(&self) -> bool {
        matches!(self, OpenMode::ReadOnly | OpenMode::ReadWrite)
    }

    pub fn writable(&self) -> bool {
        matches!(self, OpenMode::WriteOnly | OpenMode::ReadWrite)
    }
}

/// Origin for a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset from the start
    Set,
    /// Relative to the current position
    Cur,
    /// Relative to the device's current size
    End,
}

/// A device plus a private position cursor
pub struct DeviceHandle {
    device: Arc<Device>,
    mode: OpenMode,
    pos: u64,
}

impl DeviceHandle {
    /// Open a handle. A write-only open trims the device first.
    pub(crate) fn open(device: Arc<Device>, mode: OpenMode) -> Self {
        if mode == OpenMode::WriteOnly {
            device.trim();
        }
        Self {
            device,
            mode,
            pos: 0,
        }
    }

    /// The handle's current position
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// The underlying device
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Read at the cursor, advancing it by the transferred count.
    ///
    /// Transfers at most one quantum per call; 0 means end-of-data or a
    /// hole at the cursor.
    pub fn read(&mut self, out: &mut impl TransferOut) -> Result<usize> {
        if !self.mode.readable() {
            return Err(StoreError::InvalidArgument(
                "handle opened write-only".to_string(),
            ));
        }
        let n = self.device.read_at(self.pos, out)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Write at the cursor, advancing it by the transferred count
    pub fn write(&mut self, data: &impl TransferIn) -> Result<usize> {
        if !self.mode.writable() {
            return Err(StoreError::InvalidArgument(
                "handle opened read-only".to_string(),
            ));
        }
        let n = self.device.write_at(self.pos, data)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Read with a cancellable guard wait
    pub fn read_interruptible(
        &mut self,
        out: &mut impl TransferOut,
        cancel: &CancelFlag,
    ) -> Result<usize> {
        if !self.mode.readable() {
            return Err(StoreError::InvalidArgument(
                "handle opened write-only".to_string(),
            ));
        }
        let n = self.device.read_at_interruptible(self.pos, out, cancel)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Write with a cancellable guard wait
    pub fn write_interruptible(
        &mut self,
        data: &impl TransferIn,
        cancel: &CancelFlag,
    ) -> Result<usize> {
        if !self.mode.writable() {
            return Err(StoreError::InvalidArgument(
                "handle opened read-only".to_string(),
            ));
        }
        let n = self.device.write_at_interruptible(self.pos, data, cancel)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Move the cursor. Never touches the storage structure; a result that
    /// would be negative is rejected.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => self.pos as i64,
            Whence::End => self.device.size() as i64,
        };
        let target = base
            .checked_add(offset)
            .ok_or_else(|| StoreError::InvalidArgument("seek position overflow".to_string()))?;
        if target < 0 {
            return Err(StoreError::InvalidArgument(format!(
                "seek to negative position {target}"
            )));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }

    /// Close the handle. A no-op in the core contract; present so the
    /// lifecycle reads like the collaborator's open/release pair.
    pub fn release(self) {}
}
