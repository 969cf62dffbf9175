//! Emulated target RAM

use alloc::vec;
use alloc::vec::Vec;

use flashcon_core::error::{Error, Result};
use flashcon_core::memory::TargetMemory;

/// One contiguous RAM region
#[derive(Debug, Clone)]
struct Region {
    base: usize,
    data: Vec<u8>,
}

impl Region {
    /// Offset of `[addr, addr + len)` inside this region, if it fits
    fn offset(&self, addr: usize, len: usize) -> Option<usize> {
        let off = addr.checked_sub(self.base)?;
        let end = off.checked_add(len)?;
        (end <= self.data.len()).then_some(off)
    }
}

/// Sparse RAM made of separate regions
///
/// An access must fall entirely inside one region.
#[derive(Debug, Clone, Default)]
pub struct SimMemory {
    regions: Vec<Region>,
}

impl SimMemory {
    /// Create memory without any regions
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zero-filled region of `size` bytes at `base`
    pub fn with_region(mut self, base: usize, size: usize) -> Self {
        self.add_region(base, size);
        self
    }

    /// Add a zero-filled region of `size` bytes at `base`
    pub fn add_region(&mut self, base: usize, size: usize) {
        self.regions.push(Region {
            base,
            data: vec![0u8; size],
        });
    }

    /// Number of regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn find(&self, addr: usize, len: usize) -> Result<(usize, usize)> {
        self.regions
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.offset(addr, len).map(|off| (i, off)))
            .ok_or(Error::MemoryOutOfBounds { addr, len })
    }
}

impl TargetMemory for SimMemory {
    fn bytes(&self, addr: usize, len: usize) -> Result<&[u8]> {
        let (i, off) = self.find(addr, len)?;
        Ok(&self.regions[i].data[off..off + len])
    }

    fn bytes_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        let (i, off) = self.find(addr, len)?;
        Ok(&mut self.regions[i].data[off..off + len])
    }
}
