//! Target description file and settings resolution
//!
//! The target is described by an optional TOML file:
//!
//! ```toml
//! [uart]
//! baud = 19200
//!
//! [flash]
//! size = "0x100000"
//! erase_block_size = "4 KiB"
//! image = "fw.bin"
//!
//! [[ram]]
//! base = "0x20000000"
//! size = "0x10000"
//! ```
//!
//! Command line flags override values from the file. Anything left unset
//! falls back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use flashcon_sim::{SimConfig, SimFlash, SimMemory};
use log::{debug, info};
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::ConfigError;

/// Baud rate used when neither the file nor the command line sets one
pub const DEFAULT_BAUD: u32 = 19200;
/// Default flash size (1 MiB)
pub const DEFAULT_FLASH_SIZE: u32 = 1024 * 1024;
/// Default erase block size (4 KiB)
pub const DEFAULT_ERASE_BLOCK: u32 = 4096;
/// Base of the default RAM region
pub const DEFAULT_RAM_BASE: usize = 0x2000_0000;
/// Size of the default RAM region (64 KiB)
pub const DEFAULT_RAM_SIZE: usize = 64 * 1024;

/// Target description file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetFile {
    uart: UartSection,
    flash: FlashSection,
    ram: Vec<RamSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct UartSection {
    #[serde(deserialize_with = "deserialize_opt_u32")]
    baud: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FlashSection {
    #[serde(deserialize_with = "deserialize_opt_u32")]
    size: Option<u32>,
    #[serde(deserialize_with = "deserialize_opt_u32")]
    erase_block_size: Option<u32>,
    image: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RamSection {
    #[serde(deserialize_with = "deserialize_usize")]
    base: usize,
    #[serde(deserialize_with = "deserialize_usize")]
    size: usize,
}

/// A number written as an integer or as a string
#[derive(Deserialize)]
#[serde(untagged)]
enum HexOrInt {
    Int(u64),
    Str(String),
}

impl HexOrInt {
    fn value(self) -> Result<u64, String> {
        match self {
            Self::Int(n) => Ok(n),
            Self::Str(s) => parse_number(&s),
        }
    }
}

/// Deserialize an optional u32 that can be hex (0x...), decimal or a size
fn deserialize_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<HexOrInt>::deserialize(deserializer)?
        .map(|v| {
            let n = v.value()?;
            u32::try_from(n).map_err(|_| format!("value 0x{:x} does not fit in 32 bits", n))
        })
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Deserialize an address or size that can be hex (0x...), decimal or a size
fn deserialize_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = HexOrInt::deserialize(deserializer)?
        .value()
        .map_err(serde::de::Error::custom)?;
    usize::try_from(n).map_err(|_| serde::de::Error::custom("value does not fit in an address"))
}

/// Parse a number that can be hex (0x...), decimal, or a size like "64 KiB"
fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e));
    }
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }

    let s_lower = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s_lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s_lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else {
        return Err(format!("invalid number: {}", s));
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {}", s))
}

impl TargetFile {
    /// Load a target description from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_toml_str(&content)?;
        debug!("loaded target description {}", path.display());
        Ok(file)
    }

    /// Parse a target description
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// One RAM region of the simulated target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamRegion {
    pub base: usize,
    pub size: usize,
}

/// Effective settings after merging file, flags and defaults
#[derive(Debug, Clone)]
pub struct Settings {
    /// Serial device, or `None` for stdin/stdout
    pub port: Option<String>,
    pub baud: u32,
    pub flash: SimConfig,
    pub image: Option<PathBuf>,
    pub save_image: Option<PathBuf>,
    pub ram: Vec<RamRegion>,
}

impl Settings {
    /// Merge command line flags over the (optional) target file
    pub fn resolve(cli: &Cli, file: Option<TargetFile>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let flash = SimConfig {
            size: cli
                .flash_size
                .or(file.flash.size)
                .unwrap_or(DEFAULT_FLASH_SIZE),
            erase_block_size: cli
                .erase_size
                .or(file.flash.erase_block_size)
                .unwrap_or(DEFAULT_ERASE_BLOCK),
        };
        if flash.erase_block_size == 0 {
            return Err(ConfigError::ZeroEraseBlock);
        }
        if flash.size % flash.erase_block_size != 0 {
            return Err(ConfigError::Geometry {
                size: flash.size,
                block: flash.erase_block_size,
            });
        }

        let mut ram: Vec<RamRegion> = file
            .ram
            .iter()
            .map(|r| RamRegion {
                base: r.base,
                size: r.size,
            })
            .collect();
        if ram.is_empty() {
            ram.push(RamRegion {
                base: DEFAULT_RAM_BASE,
                size: DEFAULT_RAM_SIZE,
            });
        }
        for r in &ram {
            // address 0 is never reachable on a real target
            if r.base == 0 || r.size == 0 || r.base.checked_add(r.size).is_none() {
                return Err(ConfigError::RamRegion {
                    base: r.base,
                    size: r.size,
                });
            }
        }

        Ok(Self {
            port: cli.port.clone(),
            baud: cli.baud.or(file.uart.baud).unwrap_or(DEFAULT_BAUD),
            flash,
            image: cli.image.clone().or(file.flash.image),
            save_image: cli.save_image.clone(),
            ram,
        })
    }

    /// Create the simulated flash, loading the image if one is set
    pub fn build_flash(&self) -> Result<SimFlash, ConfigError> {
        let Some(path) = &self.image else {
            return Ok(SimFlash::new(self.flash.clone()));
        };

        let data = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        if data.len() > self.flash.size as usize {
            return Err(ConfigError::ImageTooLarge {
                path: path.clone(),
                len: data.len(),
                size: self.flash.size,
            });
        }

        info!("Loaded {} bytes from {}", data.len(), path.display());
        Ok(SimFlash::with_data(self.flash.clone(), &data))
    }

    /// Create the simulated RAM
    pub fn build_memory(&self) -> SimMemory {
        self.ram
            .iter()
            .fold(SimMemory::new(), |mem, r| mem.with_region(r.base, r.size))
    }
}
