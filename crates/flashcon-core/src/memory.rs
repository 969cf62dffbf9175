//! Access to target RAM
//!
//! `flash read`, `flash write` and `dump` name RAM by raw address. The
//! console does not own that memory; it asks a [`TargetMemory`] to turn an
//! address range into a byte slice.

use crate::error::{Error, Result};

/// Resolves RAM address ranges to byte slices
pub trait TargetMemory {
    /// Borrow `len` bytes starting at `addr`
    fn bytes(&self, addr: usize, len: usize) -> Result<&[u8]>;

    /// Mutably borrow `len` bytes starting at `addr`
    fn bytes_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]>;
}

impl<M: TargetMemory + ?Sized> TargetMemory for &mut M {
    fn bytes(&self, addr: usize, len: usize) -> Result<&[u8]> {
        (**self).bytes(addr, len)
    }

    fn bytes_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        (**self).bytes_mut(addr, len)
    }
}

/// Direct access to the address space the console runs in
///
/// Every address is dereferenced as-is. This is how the console reaches RAM
/// on the target itself.
///
/// Address 0 is never accessible, even on targets that map RAM there: a
/// slice cannot start at the null pointer. Ranges that wrap past the top of
/// the address space are refused too. Both fail with
/// [`Error::MemoryOutOfBounds`]; an empty range always succeeds.
#[derive(Debug)]
pub struct RawMemory {
    _private: (),
}

impl RawMemory {
    /// Create a raw memory accessor
    ///
    /// # Safety
    ///
    /// Every range later passed to [`TargetMemory::bytes`] or
    /// [`TargetMemory::bytes_mut`] must be valid, readable (and for
    /// `bytes_mut` writable) memory that nothing else accesses while the
    /// returned slice is alive.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn check(addr: usize, len: usize) -> Result<()> {
        if addr == 0 || addr.checked_add(len).is_none() {
            return Err(Error::MemoryOutOfBounds { addr, len });
        }
        Ok(())
    }
}

impl TargetMemory for RawMemory {
    fn bytes(&self, addr: usize, len: usize) -> Result<&[u8]> {
        if len == 0 {
            return Ok(&[]);
        }
        Self::check(addr, len)?;
        // SAFETY: the caller of `RawMemory::new` vouched for every range
        Ok(unsafe { core::slice::from_raw_parts(addr as *const u8, len) })
    }

    fn bytes_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        if len == 0 {
            return Ok(&mut []);
        }
        Self::check(addr, len)?;
        // SAFETY: the caller of `RawMemory::new` vouched for every range
        Ok(unsafe { core::slice::from_raw_parts_mut(addr as *mut u8, len) })
    }
}
