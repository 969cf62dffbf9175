//! Host-side error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading the target description
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target description is not valid TOML for this tool
    #[error("invalid target description: {0}")]
    Parse(#[from] toml::de::Error),

    /// Flash size and erase block size do not fit together
    #[error("flash size 0x{size:x} is not a multiple of erase block size 0x{block:x}")]
    Geometry { size: u32, block: u32 },

    /// Erase block size is zero
    #[error("erase block size must not be zero")]
    ZeroEraseBlock,

    /// The flash image is larger than the flash
    #[error("image {path} is {len} bytes, flash is only {size} bytes")]
    ImageTooLarge { path: PathBuf, len: usize, size: u32 },

    /// A RAM region is empty, starts at address 0 or wraps the address space
    #[error("invalid RAM region at 0x{base:x} (size 0x{size:x})")]
    RamRegion { base: usize, size: usize },
}

/// Errors that end the program
#[derive(Debug, Error)]
pub enum HostError {
    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Local file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The console stopped for a reason other than end of input
    #[error("console stopped: {0}")]
    Console(#[from] flashcon_core::Error),
}

/// UART error carried through `embedded-io`
#[derive(Debug, Error)]
#[error(transparent)]
pub struct PortError(#[from] pub std::io::Error);

impl embedded_io::Error for PortError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        use std::io::ErrorKind as Io;

        match self.0.kind() {
            Io::NotFound => ErrorKind::NotFound,
            Io::PermissionDenied => ErrorKind::PermissionDenied,
            Io::BrokenPipe => ErrorKind::BrokenPipe,
            Io::InvalidInput => ErrorKind::InvalidInput,
            Io::InvalidData => ErrorKind::InvalidData,
            Io::TimedOut => ErrorKind::TimedOut,
            Io::Interrupted => ErrorKind::Interrupted,
            Io::Unsupported => ErrorKind::Unsupported,
            Io::OutOfMemory => ErrorKind::OutOfMemory,
            _ => ErrorKind::Other,
        }
    }
}
