//! `flash` command parsing and execution

use core::fmt::{self, Write};

use log::{debug, warn};

use super::{erase_span, FlashDriver};
use crate::command::Tokens;
use crate::error::{Error, ParseError, Result};
use crate::hexdump;
use crate::memory::TargetMemory;

/// One parsed `flash <verb> ...` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOperation {
    /// Copy `len` bytes from flash into RAM
    Read {
        /// Flash source address
        flash_addr: u32,
        /// Number of bytes
        len: u32,
        /// RAM destination address
        ram_addr: usize,
    },
    /// Program `len` bytes from RAM into flash
    Write {
        /// Flash destination address
        flash_addr: u32,
        /// Number of bytes
        len: u32,
        /// RAM source address
        ram_addr: usize,
    },
    /// Erase every block touching the range
    Erase {
        /// First address to erase
        start_addr: u32,
        /// Number of bytes
        len: u32,
    },
    /// Print flash contents as a hex dump
    Dump {
        /// Flash address of the first byte
        flash_addr: u32,
        /// Number of bytes
        len: u32,
    },
}

impl FlashOperation {
    /// Parse the arguments following `flash`
    ///
    /// Arguments are strictly positional. Returns `UnknownVerb` if the first
    /// token is not one of read/write/erase/dump.
    pub fn parse(tokens: &mut Tokens<'_>) -> core::result::Result<Self, ParseError> {
        let verb = tokens.expect("operation")?;
        let op = match verb {
            "read" | "write" => {
                let flash_addr = tokens.number("flash address")?;
                let len = tokens.number("length")?;
                let ram_addr = tokens.word("RAM address")?;
                if ram_addr.checked_add(len as usize).is_none() {
                    return Err(ParseError::RangeOverflow);
                }
                if verb == "read" {
                    Self::Read {
                        flash_addr,
                        len,
                        ram_addr,
                    }
                } else {
                    Self::Write {
                        flash_addr,
                        len,
                        ram_addr,
                    }
                }
            }
            "erase" => Self::Erase {
                start_addr: tokens.number("start address")?,
                len: tokens.number("length")?,
            },
            "dump" => Self::Dump {
                flash_addr: tokens.number("flash address")?,
                len: tokens.number("length")?,
            },
            _ => return Err(ParseError::UnknownVerb),
        };

        let (addr, len) = op.flash_range();
        if addr.checked_add(len).is_none() {
            return Err(ParseError::RangeOverflow);
        }
        Ok(op)
    }

    /// Command verb, for messages
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
            Self::Erase { .. } => "erase",
            Self::Dump { .. } => "dump",
        }
    }

    /// Flash address and length touched by this operation
    pub fn flash_range(&self) -> (u32, u32) {
        match *self {
            Self::Read {
                flash_addr, len, ..
            }
            | Self::Write {
                flash_addr, len, ..
            }
            | Self::Dump { flash_addr, len } => (flash_addr, len),
            Self::Erase { start_addr, len } => (start_addr, len),
        }
    }

    /// Run the operation against `flash`
    ///
    /// The driver is initialized first; nothing else happens if that fails.
    /// Dumps go through `scratch` one chunk at a time and stop at the first
    /// failed read, leaving the rows already printed in place. Failures are
    /// reported on `out` and returned.
    pub fn execute<F, M, W>(
        &self,
        flash: &mut F,
        memory: &mut M,
        scratch: &mut [u8],
        out: &mut W,
    ) -> Result<()>
    where
        F: FlashDriver + ?Sized,
        M: TargetMemory + ?Sized,
        W: Write + ?Sized,
    {
        if let Err(e) = flash.init() {
            warn!("flash init failed: {}", e);
            let _ = writeln!(out, "flash init failed: {}", e);
            return Err(e);
        }

        let result = match *self {
            Self::Read {
                flash_addr,
                len,
                ram_addr,
            } => {
                debug!("flash read 0x{:08x}+0x{:x} -> 0x{:08x}", flash_addr, len, ram_addr);
                memory
                    .bytes_mut(ram_addr, len as usize)
                    .and_then(|dst| flash.read(flash_addr, dst))
            }
            Self::Write {
                flash_addr,
                len,
                ram_addr,
            } => {
                debug!("flash write 0x{:08x}+0x{:x} <- 0x{:08x}", flash_addr, len, ram_addr);
                memory
                    .bytes(ram_addr, len as usize)
                    .and_then(|src| flash.write(flash_addr, src))
            }
            Self::Erase { start_addr, len } => {
                let span = erase_span(start_addr, len, flash.erase_block_size());
                debug!(
                    "flash erase 0x{:08x}+0x{:x} covers 0x{:08x}..0x{:08x}",
                    start_addr, len, span.start, span.end
                );
                flash.erase(start_addr, len)
            }
            Self::Dump { flash_addr, len } => dump(flash, flash_addr, len, scratch, out),
        };

        if let Err(e) = result {
            warn!("flash {} failed: {}", self.verb(), e);
            let _ = writeln!(out, "flash {} failed: {}", self.verb(), e);
        }
        result
    }
}

impl fmt::Display for FlashOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Read {
                flash_addr,
                len,
                ram_addr,
            }
            | Self::Write {
                flash_addr,
                len,
                ram_addr,
            } => write!(
                f,
                "flash {} 0x{:08x} 0x{:x} 0x{:08x}",
                self.verb(),
                flash_addr,
                len,
                ram_addr
            ),
            Self::Erase { start_addr, len } => {
                write!(f, "flash erase 0x{:08x} 0x{:x}", start_addr, len)
            }
            Self::Dump { flash_addr, len } => {
                write!(f, "flash dump 0x{:08x} 0x{:x}", flash_addr, len)
            }
        }
    }
}

/// Read and print `len` bytes of flash, one scratch buffer at a time
fn dump<F, W>(flash: &mut F, flash_addr: u32, len: u32, scratch: &mut [u8], out: &mut W) -> Result<()>
where
    F: FlashDriver + ?Sized,
    W: Write + ?Sized,
{
    if scratch.is_empty() {
        return Err(Error::BufferTooSmall);
    }

    let mut addr = flash_addr;
    let mut remaining = len as usize;
    while remaining > 0 {
        let chunk = remaining.min(scratch.len());
        let buf = &mut scratch[..chunk];
        flash.read(addr, buf)?;
        let _ = hexdump::render(addr as usize, buf, out);

        addr = addr.wrapping_add(chunk as u32);
        remaining -= chunk;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tokenize;

    /// Mock flash driver that records every call
    struct MockFlash {
        memory: Vec<u8>,
        block_size: u32,
        fail_init: bool,
        /// Reads at or beyond this address fail
        fail_read_from: Option<u32>,
        calls: Vec<String>,
    }

    impl MockFlash {
        fn new(size: usize) -> Self {
            Self {
                memory: (0..size).map(|i| i as u8).collect(),
                block_size: 0x1000,
                fail_init: false,
                fail_read_from: None,
                calls: Vec::new(),
            }
        }
    }

    impl FlashDriver for MockFlash {
        fn init(&mut self) -> Result<()> {
            self.calls.push("init".to_string());
            if self.fail_init {
                return Err(Error::InitFailed);
            }
            Ok(())
        }

        fn erase_block_size(&self) -> u32 {
            self.block_size
        }

        fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
            self.calls.push(format!("read {:x} {:x}", addr, buf.len()));
            if self.fail_read_from.is_some_and(|limit| addr >= limit) {
                return Err(Error::ReadError);
            }
            let addr = addr as usize;
            buf.copy_from_slice(&self.memory[addr..addr + buf.len()]);
            Ok(())
        }

        fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
            self.calls.push(format!("write {:x} {:x}", addr, data.len()));
            let addr = addr as usize;
            self.memory[addr..addr + data.len()].copy_from_slice(data);
            Ok(())
        }

        fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
            self.calls.push(format!("erase {:x} {:x}", addr, len));
            Ok(())
        }
    }

    /// RAM window starting at a fixed base address
    struct Ram {
        base: usize,
        data: Vec<u8>,
    }

    impl TargetMemory for Ram {
        fn bytes(&self, addr: usize, len: usize) -> Result<&[u8]> {
            let off = addr
                .checked_sub(self.base)
                .filter(|off| off + len <= self.data.len())
                .ok_or(Error::MemoryOutOfBounds { addr, len })?;
            Ok(&self.data[off..off + len])
        }

        fn bytes_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
            let off = addr
                .checked_sub(self.base)
                .filter(|off| off + len <= self.data.len())
                .ok_or(Error::MemoryOutOfBounds { addr, len })?;
            Ok(&mut self.data[off..off + len])
        }
    }

    fn parse(line: &str) -> core::result::Result<FlashOperation, ParseError> {
        let mut tokens = tokenize(line);
        FlashOperation::parse(&mut tokens)
    }

    #[test]
    fn test_parse_all_verbs() {
        assert_eq!(
            parse("read 0x1000 16 0x20000000"),
            Ok(FlashOperation::Read {
                flash_addr: 0x1000,
                len: 16,
                ram_addr: 0x2000_0000
            })
        );
        assert_eq!(
            parse("write 4096 0x10 536870912"),
            Ok(FlashOperation::Write {
                flash_addr: 0x1000,
                len: 0x10,
                ram_addr: 0x2000_0000
            })
        );
        assert_eq!(
            parse("erase 0x1001 0x10"),
            Ok(FlashOperation::Erase {
                start_addr: 0x1001,
                len: 0x10
            })
        );
        assert_eq!(
            parse("dump 0x1000 32"),
            Ok(FlashOperation::Dump {
                flash_addr: 0x1000,
                len: 32
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(ParseError::MissingToken { what: "operation" }));
        assert_eq!(parse("program 0 0"), Err(ParseError::UnknownVerb));
        assert_eq!(
            parse("read 0x1000 16"),
            Err(ParseError::MissingToken { what: "RAM address" })
        );
        assert_eq!(
            parse("erase zero 16"),
            Err(ParseError::InvalidNumber {
                what: "start address"
            })
        );
        assert_eq!(parse("dump 0xFFFFFFF0 0x20"), Err(ParseError::RangeOverflow));
    }

    #[test]
    fn test_init_failure_skips_read() {
        let mut flash = MockFlash::new(0x100);
        flash.fail_init = true;
        let mut ram = Ram {
            base: 0x2000_0000,
            data: vec![0xAA; 16],
        };
        let mut out = String::new();
        let op = parse("read 0 16 0x20000000").unwrap();

        let result = op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out);

        assert_eq!(result, Err(Error::InitFailed));
        assert_eq!(flash.calls, ["init"]);
        assert!(ram.data.iter().all(|&b| b == 0xAA));
        assert!(out.contains("flash init failed"));
    }

    #[test]
    fn test_read_into_ram() {
        let mut flash = MockFlash::new(0x100);
        let mut ram = Ram {
            base: 0x2000_0000,
            data: vec![0; 8],
        };
        let mut out = String::new();
        let op = parse("read 0x10 4 0x20000002").unwrap();

        op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out).unwrap();

        assert_eq!(ram.data, [0, 0, 0x10, 0x11, 0x12, 0x13, 0, 0]);
        assert_eq!(flash.calls, ["init", "read 10 4"]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_from_ram() {
        let mut flash = MockFlash::new(0x100);
        let mut ram = Ram {
            base: 0x100,
            data: vec![0xDE, 0xAD, 0xBE, 0xEF],
        };
        let mut out = String::new();
        let op = parse("write 0x80 4 0x100").unwrap();

        op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out).unwrap();

        assert_eq!(&flash.memory[0x80..0x84], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_unmapped_ram_reports_error() {
        let mut flash = MockFlash::new(0x100);
        let mut ram = Ram {
            base: 0x100,
            data: vec![0; 4],
        };
        let mut out = String::new();
        let op = parse("read 0 16 0x100").unwrap();

        let result = op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out);

        assert_eq!(
            result,
            Err(Error::MemoryOutOfBounds {
                addr: 0x100,
                len: 16
            })
        );
        assert_eq!(flash.calls, ["init"]);
        assert!(out.starts_with("flash read failed"));
    }

    #[test]
    fn test_erase_passes_request_through() {
        let mut flash = MockFlash::new(0x100);
        let mut ram = Ram {
            base: 0,
            data: Vec::new(),
        };
        let mut out = String::new();
        let op = parse("erase 0x1001 0x10").unwrap();

        op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out).unwrap();

        assert_eq!(flash.calls, ["init", "erase 1001 10"]);
    }

    #[test]
    fn test_dump_is_chunked() {
        let mut flash = MockFlash::new(0x400);
        let mut ram = Ram {
            base: 0,
            data: Vec::new(),
        };
        let mut out = String::new();
        let op = parse("dump 0x10 0x220").unwrap();

        op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out).unwrap();

        assert_eq!(
            flash.calls,
            ["init", "read 10 100", "read 110 100", "read 210 20"]
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 0x22);
        assert!(lines[0].starts_with("00000010: 10 11"));
        assert!(lines[16].starts_with("00000110: 10 11"));
        assert!(lines[0x21].starts_with("00000220: 20 21"));
    }

    #[test]
    fn test_dump_stops_on_read_error() {
        let mut flash = MockFlash::new(0x400);
        flash.fail_read_from = Some(0x100);
        let mut ram = Ram {
            base: 0,
            data: Vec::new(),
        };
        let mut out = String::new();
        let op = parse("dump 0 0x300").unwrap();

        let result = op.execute(&mut flash, &mut ram, &mut [0u8; 256], &mut out);

        assert_eq!(result, Err(Error::ReadError));
        assert_eq!(flash.calls, ["init", "read 0 100", "read 100 100"]);
        assert_eq!(out.lines().filter(|l| l.contains(" : ")).count(), 16);
        assert!(out.ends_with("flash dump failed: read operation failed\n"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let op = FlashOperation::Write {
            flash_addr: 0x4000,
            len: 0x20,
            ram_addr: 0x2000_0000,
        };
        let text = format!("{}", op);
        let mut tokens = tokenize(&text);
        assert_eq!(tokens.next(), Some("flash"));
        assert_eq!(FlashOperation::parse(&mut tokens), Ok(op));
    }
}
