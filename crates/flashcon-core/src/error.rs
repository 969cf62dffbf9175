//! Error types for flashcon-core
//!
//! This module provides a no_std compatible error type shared by the line
//! editor, the command parser and the flash handlers.

use core::fmt;

/// Details about why a command line could not be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A required token was not present
    MissingToken {
        /// Name of the missing argument
        what: &'static str,
    },
    /// A numeric token had no digits or overflowed its integer type
    InvalidNumber {
        /// Name of the malformed argument
        what: &'static str,
    },
    /// `flash` was followed by a verb that is not read/write/erase/dump
    UnknownVerb,
    /// Address plus length does not fit the address space
    RangeOverflow,
    /// The line contained bytes that are not valid UTF-8
    InvalidEncoding,
}

/// Console error type - no_std compatible and Copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Command line could not be parsed
    Parse(ParseError),

    // Flash driver errors
    /// Flash driver initialization failed
    InitFailed,
    /// Read operation failed
    ReadError,
    /// Write/program operation failed
    WriteError,
    /// Erase operation failed
    EraseError {
        /// Address of the block that failed to erase
        addr: u32,
    },
    /// Address is beyond the flash size
    AddressOutOfBounds,
    /// Provided buffer is too small for the operation
    BufferTooSmall,

    // Target memory errors
    /// RAM range is not backed by memory
    MemoryOutOfBounds {
        /// First address of the rejected range
        addr: usize,
        /// Length of the rejected range
        len: usize,
    },

    // I/O errors
    /// Character source or sink reported an error
    IoError,
    /// Character source has no more input
    EndOfInput,
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken { what } => write!(f, "missing {}", what),
            Self::InvalidNumber { what } => write!(f, "invalid number for {}", what),
            Self::UnknownVerb => write!(f, "unknown flash operation"),
            Self::RangeOverflow => write!(f, "address range overflows"),
            Self::InvalidEncoding => write!(f, "line is not valid text"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{}", e),
            Self::InitFailed => write!(f, "flash initialization failed"),
            Self::ReadError => write!(f, "read operation failed"),
            Self::WriteError => write!(f, "write operation failed"),
            Self::EraseError { addr } => {
                write!(f, "erase failed at address 0x{:08x}", addr)
            }
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::MemoryOutOfBounds { addr, len } => write!(
                f,
                "no memory at 0x{:08x}..0x{:08x}",
                addr,
                addr.saturating_add(*len)
            ),
            Self::IoError => write!(f, "I/O error"),
            Self::EndOfInput => write!(f, "end of input"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
