//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser, Debug)]
#[command(name = "flashcon")]
#[command(author, version, about = "Serial debug console for target flash and RAM", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Target description file (TOML format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Serial device to serve the console on (stdin/stdout if not given)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Initial baud rate [default: 19200]
    #[arg(short, long, value_parser = parse_hex_u32)]
    pub baud: Option<u32>,

    /// Initial flash contents
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Write the final flash contents to this file on exit
    #[arg(long)]
    pub save_image: Option<PathBuf>,

    /// Flash size in bytes (hex with 0x prefix or decimal)
    #[arg(long, value_parser = parse_hex_u32)]
    pub flash_size: Option<u32>,

    /// Erase block size in bytes (hex with 0x prefix or decimal)
    #[arg(long, value_parser = parse_hex_u32)]
    pub erase_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("0X10"), Ok(0x10));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
        assert!(parse_hex_u32("").is_err());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "flashcon",
            "-vv",
            "--port",
            "/dev/ttyUSB0",
            "--baud",
            "115200",
            "--flash-size",
            "0x200000",
            "--erase-size",
            "0x10000",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.baud, Some(115200));
        assert_eq!(cli.flash_size, Some(0x20_0000));
        assert_eq!(cli.erase_size, Some(0x1_0000));
        assert!(cli.config.is_none());
        assert!(cli.image.is_none());
    }

    #[test]
    fn test_bad_number_rejected() {
        assert!(Cli::try_parse_from(["flashcon", "--baud", "fast"]).is_err());
    }
}
