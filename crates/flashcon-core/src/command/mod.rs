//! Command table and dispatch
//!
//! The first token of a line selects a command by exact, case-sensitive
//! match. Anything that is not in [`COMMANDS`] asks for the help listing.

mod tokenizer;

pub use tokenizer::{tokenize, Tokens};

use core::fmt::{self, Write};

use crate::error::ParseError;
use crate::flash::FlashOperation;

/// A fully parsed command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `flash <verb> ...`
    Flash(FlashOperation),
    /// `dump <addr> <len>` on live memory
    Dump {
        /// First address to print
        addr: usize,
        /// Number of bytes
        len: usize,
    },
    /// `uart <baud>`
    Uart {
        /// New baud rate
        baud: u32,
    },
    /// Print the command summary
    Help,
}

/// Command descriptor
pub struct CommandDescriptor {
    /// First token that selects the command
    pub name: &'static str,
    /// Parser for the remaining tokens
    pub parse: fn(&mut Tokens<'_>) -> Result<Command, ParseError>,
}

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "flash",
        parse: parse_flash,
    },
    CommandDescriptor {
        name: "dump",
        parse: parse_dump,
    },
    CommandDescriptor {
        name: "uart",
        parse: parse_uart,
    },
];

impl Command {
    /// Parse one line
    ///
    /// Returns `Ok(None)` for a line without tokens.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut tokens = tokenize(line);
        let Some(name) = tokens.next() else {
            return Ok(None);
        };

        match COMMANDS.iter().find(|c| c.name == name) {
            Some(desc) => (desc.parse)(&mut tokens).map(Some),
            None => Ok(Some(Self::Help)),
        }
    }
}

fn parse_flash(tokens: &mut Tokens<'_>) -> Result<Command, ParseError> {
    match FlashOperation::parse(tokens) {
        Ok(op) => Ok(Command::Flash(op)),
        Err(ParseError::UnknownVerb) => Ok(Command::Help),
        Err(e) => Err(e),
    }
}

fn parse_dump(tokens: &mut Tokens<'_>) -> Result<Command, ParseError> {
    let addr = tokens.word("address")?;
    let len = tokens.word("length")?;
    if addr.checked_add(len).is_none() {
        return Err(ParseError::RangeOverflow);
    }
    Ok(Command::Dump { addr, len })
}

fn parse_uart(tokens: &mut Tokens<'_>) -> Result<Command, ParseError> {
    let baud = tokens.number("baud rate")?;
    Ok(Command::Uart { baud })
}

/// Print the command summary
///
/// `erase_block_size` is quoted in the warning about unaligned erases.
pub fn write_help<W: Write + ?Sized>(out: &mut W, erase_block_size: u32) -> fmt::Result {
    writeln!(out, "Available commands:")?;
    writeln!(out, "flash read <flash addr> <len> <RAM addr>")?;
    writeln!(out, "  copy <len> bytes from <flash addr> to <RAM addr>")?;
    writeln!(out)?;
    writeln!(out, "flash write <flash addr> <len> <RAM addr>")?;
    writeln!(out, "  write <len> bytes from <RAM addr> to <flash addr>")?;
    writeln!(out)?;
    writeln!(out, "flash erase <start addr> <len>")?;
    writeln!(out, "  erase flash from the eraseblock containing <start addr>")?;
    writeln!(out, "  to the eraseblock containing <start addr> + <len>")?;
    writeln!(out, "  WARNING: unless <start addr> and <len> are aligned to")?;
    writeln!(out, "  0x{:x}, this will erase more than you think!", erase_block_size)?;
    writeln!(out)?;
    writeln!(out, "flash dump <addr> <len>")?;
    writeln!(out, "  print hexdump of length <len> from flash at <addr>")?;
    writeln!(out)?;
    writeln!(out, "uart <speed>")?;
    writeln!(out, "  set UART to <speed>")?;
    writeln!(out)?;
    writeln!(out, "dump <addr> <len>")?;
    writeln!(out, "  print hexdump of length <len> from memory at <addr>")?;
    writeln!(out, "  address 0 is never accessible")?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_all_commands() {
        for name in ["flash", "dump", "uart"] {
            assert!(
                COMMANDS.iter().any(|c| c.name == name),
                "Command '{}' should be in registry",
                name
            );
        }
    }

    #[test]
    fn test_empty_line_is_ignored() {
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse(" \t "), Ok(None));
    }

    #[test]
    fn test_unknown_command_asks_for_help() {
        assert_eq!(Command::parse("reboot now"), Ok(Some(Command::Help)));
        assert_eq!(Command::parse("FLASH dump 0 1"), Ok(Some(Command::Help)));
        assert_eq!(Command::parse("help"), Ok(Some(Command::Help)));
    }

    #[test]
    fn test_unknown_flash_verb_asks_for_help() {
        assert_eq!(Command::parse("flash program 0 1"), Ok(Some(Command::Help)));
    }

    #[test]
    fn test_flash_command() {
        assert_eq!(
            Command::parse("flash dump 0x1000 32"),
            Ok(Some(Command::Flash(FlashOperation::Dump {
                flash_addr: 0x1000,
                len: 32
            })))
        );
        assert_eq!(
            Command::parse("flash"),
            Err(ParseError::MissingToken { what: "operation" })
        );
    }

    #[test]
    fn test_dump_command() {
        assert_eq!(
            Command::parse("dump 0x2000 40"),
            Ok(Some(Command::Dump {
                addr: 0x2000,
                len: 40
            }))
        );
        assert_eq!(
            Command::parse("dump 0x2000"),
            Err(ParseError::MissingToken { what: "length" })
        );
        assert_eq!(
            Command::parse(&format!("dump {} 2", usize::MAX)),
            Err(ParseError::RangeOverflow)
        );
    }

    #[test]
    fn test_uart_command() {
        assert_eq!(
            Command::parse("uart 115200"),
            Ok(Some(Command::Uart { baud: 115200 }))
        );
        assert_eq!(
            Command::parse("uart fast"),
            Err(ParseError::InvalidNumber { what: "baud rate" })
        );
    }

    #[test]
    fn test_help_mentions_erase_size() {
        let mut out = String::new();
        write_help(&mut out, 0x1000).unwrap();
        assert!(out.starts_with("Available commands:\n"));
        assert!(out.contains("0x1000, this will erase more than you think!"));
        assert!(out.contains("dump <addr> <len>"));
        assert!(out.contains("address 0 is never accessible"));
        assert!(out.contains("uart <speed>"));
    }
}
