//! Emulated NOR flash

use alloc::vec;
use alloc::vec::Vec;

use flashcon_core::error::{Error, Result};
use flashcon_core::flash::{erase_span, FlashDriver};
use log::trace;

/// The erased value for flash memory (all bits set)
const ERASED_VALUE: u8 = 0xFF;

/// Configuration for the simulated flash
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Flash size in bytes
    pub size: u32,
    /// Size of one erase block
    pub erase_block_size: u32,
}

/// Driver calls to fail on purpose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    /// `init` reports an error
    pub init: bool,
    /// `read` reports an error
    pub read: bool,
    /// `write` reports an error
    pub write: bool,
    /// `erase` reports an error
    pub erase: bool,
}

/// A recorded driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOp {
    /// `init` was called
    Init,
    /// Bytes were read
    Read {
        /// First address
        addr: u32,
        /// Number of bytes
        len: u32,
    },
    /// Bytes were programmed
    Write {
        /// First address
        addr: u32,
        /// Number of bytes
        len: u32,
    },
    /// One erase block was erased
    EraseBlock {
        /// Block start address
        addr: u32,
    },
}

/// Simulated flash chip
///
/// Emulates a NOR flash part in memory: erased bytes read `0xFF`,
/// programming can only clear bits, and erase works on whole blocks.
pub struct SimFlash {
    config: SimConfig,
    data: Vec<u8>,
    faults: Faults,
    ops: Vec<FlashOp>,
}

impl SimFlash {
    /// Create a new erased flash with the given configuration
    pub fn new(config: SimConfig) -> Self {
        let data = vec![ERASED_VALUE; config.size as usize];
        Self {
            config,
            data,
            faults: Faults::default(),
            ops: Vec::new(),
        }
    }

    /// Create a flash with pre-filled data
    pub fn with_data(config: SimConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the fault switches
    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    /// Driver calls seen so far
    pub fn ops(&self) -> &[FlashOp] {
        &self.ops
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        let end = addr as u64 + len as u64;
        if end > self.data.len() as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }
}

impl FlashDriver for SimFlash {
    fn init(&mut self) -> Result<()> {
        self.ops.push(FlashOp::Init);
        if self.faults.init {
            return Err(Error::InitFailed);
        }
        Ok(())
    }

    fn erase_block_size(&self) -> u32 {
        self.config.erase_block_size
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.ops.push(FlashOp::Read {
            addr,
            len: buf.len() as u32,
        });
        if self.faults.read {
            return Err(Error::ReadError);
        }
        self.check_range(addr, buf.len())?;

        let addr = addr as usize;
        buf.copy_from_slice(&self.data[addr..addr + buf.len()]);
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.ops.push(FlashOp::Write {
            addr,
            len: data.len() as u32,
        });
        if self.faults.write {
            return Err(Error::WriteError);
        }
        self.check_range(addr, data.len())?;

        // Flash programming: can only change 1 -> 0
        let addr = addr as usize;
        for (i, &byte) in data.iter().enumerate() {
            self.data[addr + i] &= byte;
        }
        Ok(())
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        let block = self.config.erase_block_size.max(1) as u64;
        let span = erase_span(addr, len, block as u32);
        if span.end > self.data.len() as u64 {
            return Err(Error::AddressOutOfBounds);
        }

        let mut block_addr = span.start;
        while block_addr < span.end {
            if self.faults.erase {
                return Err(Error::EraseError {
                    addr: block_addr as u32,
                });
            }
            trace!("erasing block 0x{:08x}", block_addr);
            self.ops.push(FlashOp::EraseBlock {
                addr: block_addr as u32,
            });
            let start = block_addr as usize;
            let end = (block_addr + block) as usize;
            self.data[start..end].fill(ERASED_VALUE);
            block_addr += block;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_flash() -> SimFlash {
        SimFlash::new(SimConfig {
            size: 0x4000,
            erase_block_size: 0x1000,
        })
    }

    #[test]
    fn test_starts_erased() {
        let flash = small_flash();
        assert!(flash.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_read_write() {
        let mut flash = small_flash();
        let data = [0x12, 0x34, 0x56, 0x78];
        flash.write(0x1000, &data).unwrap();

        let mut buf = [0u8; 4];
        flash.read(0x1000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_write_only_clears_bits() {
        let mut flash = small_flash();
        flash.write(0, &[0xF0]).unwrap();
        flash.write(0, &[0x0F]).unwrap();
        assert_eq!(flash.data()[0], 0x00);
    }

    #[test]
    fn test_unaligned_erase_takes_whole_block() {
        let mut flash = SimFlash::with_data(
            SimConfig {
                size: 0x4000,
                erase_block_size: 0x1000,
            },
            &[0u8; 0x4000],
        );

        flash.erase(0x1001, 0x10).unwrap();

        assert_eq!(flash.ops(), [FlashOp::EraseBlock { addr: 0x1000 }]);
        assert!(flash.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
        assert!(flash.data()[..0x1000].iter().all(|&b| b == 0x00));
        assert!(flash.data()[0x2000..].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_erase_across_blocks() {
        let mut flash = small_flash();
        flash.erase(0x0800, 0x1000).unwrap();
        assert_eq!(
            flash.ops(),
            [
                FlashOp::EraseBlock { addr: 0x0000 },
                FlashOp::EraseBlock { addr: 0x1000 }
            ]
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let mut flash = small_flash();
        let mut buf = [0u8; 16];
        assert_eq!(flash.read(0x3FF8, &mut buf), Err(Error::AddressOutOfBounds));
        assert_eq!(flash.write(0x4000, &[0]), Err(Error::AddressOutOfBounds));
        assert_eq!(flash.erase(0x3000, 0x1001), Err(Error::AddressOutOfBounds));
    }

    #[test]
    fn test_fault_injection() {
        let mut flash = small_flash();
        flash.faults_mut().init = true;
        flash.faults_mut().erase = true;
        assert_eq!(flash.init(), Err(Error::InitFailed));
        assert_eq!(
            flash.erase(0x2000, 1),
            Err(Error::EraseError { addr: 0x2000 })
        );
    }
}
