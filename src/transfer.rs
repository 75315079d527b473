//! Caller-boundary buffer transfer
//!
//! The read/write engine never touches caller memory directly: bytes cross
//! the boundary through these traits, and an implementation is allowed to
//! fail mid-copy (the engine reports that as an access fault and aborts only
//! the in-progress transfer).
//!
//! Plain slices get blanket implementations that cannot fault, so in-process
//! callers just pass `&[u8]` / `&mut [u8]`.

use crate::error::Result;

/// Source of bytes for a write: caller memory the engine copies *from*
pub trait TransferIn {
    /// Total bytes the caller is offering
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the first `dst.len()` offered bytes into `dst`.
    ///
    /// `dst` is never longer than `len()`; the engine clamps first.
    fn copy_to(&self, dst: &mut [u8]) -> Result<()>;
}

/// Destination of bytes for a read: caller memory the engine copies *into*
pub trait TransferOut {
    /// Total bytes the caller can accept
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `src` into the front of the caller's buffer.
    ///
    /// `src` is never longer than `len()`; the engine clamps first.
    fn copy_from(&mut self, src: &[u8]) -> Result<()>;
}

impl TransferIn for &[u8] {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn copy_to(&self, dst: &mut [u8]) -> Result<()> {
        dst.copy_from_slice(&self[..dst.len()]);
        Ok(())
    }
}

impl TransferOut for &mut [u8] {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn copy_from(&mut self, src: &[u8]) -> Result<()> {
        self[..src.len()].copy_from_slice(src);
        Ok(())
    }
}

/// In/out cell for a single control-plane value.
///
/// Models the by-buffer parameter of SET/GET/EXCHANGE commands; like the
/// byte-transfer traits, either direction may fault.
pub trait ValuePort {
    /// Read the caller-supplied value
    fn read(&self) -> Result<usize>;

    /// Write a value back to the caller
    fn write(&mut self, value: usize) -> Result<()>;
}

/// The trivial in-process value cell
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValueCell(pub usize);

impl ValuePort for ValueCell {
    fn read(&self) -> Result<usize> {
        Ok(self.0)
    }

    fn write(&mut self, value: usize) -> Result<()> {
        self.0 = value;
        Ok(())
    }
}
