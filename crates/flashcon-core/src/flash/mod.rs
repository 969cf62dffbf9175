//! Flash driver interface and flash commands
//!
//! The console does not program flash itself. It drives a [`FlashDriver`]
//! supplied by the board support code and only adds argument handling,
//! chunking and output on top.

mod operation;

pub use operation::FlashOperation;

use core::ops::Range;

use crate::error::Result;

/// Raw flash driver primitives
///
/// All operations use 32-bit addresses. Calls block until the hardware is
/// done; erase and program may take a long time on real parts.
pub trait FlashDriver {
    /// Bring the flash controller up
    ///
    /// Called before every flash command.
    fn init(&mut self) -> Result<()>;

    /// Size of one erase block in bytes
    fn erase_block_size(&self) -> u32;

    /// Read `buf.len()` bytes starting at `addr`
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Program `data` starting at `addr`
    ///
    /// The target range should be erased first.
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Erase every block that intersects `[addr, addr + len)`
    ///
    /// Unaligned ranges erase more than was asked for; see [`erase_span`].
    fn erase(&mut self, addr: u32, len: u32) -> Result<()>;
}

impl<D: FlashDriver + ?Sized> FlashDriver for &mut D {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn erase_block_size(&self) -> u32 {
        (**self).erase_block_size()
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        (**self).write(addr, data)
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        (**self).erase(addr, len)
    }
}

/// Byte range actually erased for a request of `len` bytes at `addr`
///
/// The start is rounded down and the end rounded up to `block_size`. The
/// range is returned as `u64` because the rounded end of the last block can
/// be 4 GiB. An empty request erases nothing.
pub fn erase_span(addr: u32, len: u32, block_size: u32) -> Range<u64> {
    if len == 0 {
        return addr as u64..addr as u64;
    }

    let block = block_size.max(1) as u64;
    let start = addr as u64 / block * block;
    let end = (addr as u64 + len as u64).div_ceil(block) * block;
    start..end
}
