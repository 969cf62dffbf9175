//! Console main loop
//!
//! [`Console`] owns the terminal, the line reader and the scratch buffer
//! used by flash dumps, and runs one prompt/read/execute cycle per
//! [`Console::poll`]. Command failures are reported to the operator and
//! never end the loop; only the UART can do that, by running dry or by
//! failing a read or write.

use core::fmt::Write;

use log::{debug, info, warn};

use crate::command::{write_help, Command};
use crate::error::{Error, ParseError, Result};
use crate::flash::FlashDriver;
use crate::hexdump;
use crate::line::{LineReader, LINE_CAPACITY};
use crate::memory::TargetMemory;
use crate::terminal::{Terminal, Uart};

/// Flash dumps are read in chunks of this many bytes
pub const SCRATCH_SIZE: usize = 256;

/// Printed before every line is read
pub const PROMPT: &str = ">";

/// Printed once at start-up
pub const BANNER: &str = "flashcon debug tool ready.";

/// What one poll cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The line was empty
    Idle,
    /// The command ran to completion
    Done(Command),
    /// The line was rejected or the command failed
    Failed(Error),
}

/// Interactive flash/memory console
pub struct Console<U, F, M> {
    term: Terminal<U>,
    reader: LineReader<LINE_CAPACITY>,
    scratch: [u8; SCRATCH_SIZE],
    flash: F,
    memory: M,
}

impl<U: Uart, F: FlashDriver, M: TargetMemory> Console<U, F, M> {
    /// Create a console on `uart` driving `flash` and `memory`
    pub fn new(uart: U, flash: F, memory: M) -> Self {
        Self {
            term: Terminal::new(uart),
            reader: LineReader::new(),
            scratch: [0u8; SCRATCH_SIZE],
            flash,
            memory,
        }
    }

    /// Get a reference to the terminal
    pub fn terminal(&self) -> &Terminal<U> {
        &self.term
    }

    /// Get a reference to the flash driver
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Get a mutable reference to the flash driver
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Get a reference to the target memory
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Get a mutable reference to the target memory
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Take the console apart
    pub fn into_parts(self) -> (U, F, M) {
        (self.term.into_inner(), self.flash, self.memory)
    }

    /// Print the start-up banner
    pub fn banner(&mut self) {
        let _ = writeln!(self.term, "{}", BANNER);
    }

    /// Prompt, read one line and execute it
    ///
    /// Returns an error only if the UART fails or its input runs dry. Output
    /// lost while echoing or executing is reported after the line is done.
    pub fn poll(&mut self) -> Result<Outcome> {
        let _ = write!(self.term, "{}", PROMPT);
        self.term.flush()?;
        self.term.check_output()?;

        let mut line = [0u8; LINE_CAPACITY];
        let len = self.reader.read(&mut self.term, &mut line)?;

        let outcome = self.execute_line(&line[..len]);
        self.term.check_output()?;
        Ok(outcome)
    }

    /// Poll until the UART ends or fails, returning the reason
    pub fn run(&mut self) -> Error {
        loop {
            if let Err(e) = self.poll() {
                info!("console stopped: {}", e);
                return e;
            }
        }
    }

    /// Parse and execute one completed line
    pub fn execute_line(&mut self, line: &[u8]) -> Outcome {
        let parsed = core::str::from_utf8(line)
            .map_err(|_| ParseError::InvalidEncoding)
            .and_then(Command::parse);

        match parsed {
            Ok(None) => Outcome::Idle,
            Ok(Some(cmd)) => {
                debug!("dispatching {:?}", cmd);
                match self.execute(cmd) {
                    Ok(()) => Outcome::Done(cmd),
                    Err(e) => Outcome::Failed(e),
                }
            }
            Err(e) => {
                warn!("command aborted: {}", e);
                let _ = writeln!(self.term, "error: {}", e);
                self.help();
                Outcome::Failed(Error::Parse(e))
            }
        }
    }

    /// Execute a parsed command
    pub fn execute(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Flash(op) => {
                op.execute(&mut self.flash, &mut self.memory, &mut self.scratch, &mut self.term)
            }
            Command::Dump { addr, len } => match self.memory.bytes(addr, len) {
                Ok(bytes) => {
                    let _ = hexdump::render(addr, bytes, &mut self.term);
                    Ok(())
                }
                Err(e) => {
                    warn!("dump failed: {}", e);
                    let _ = writeln!(self.term, "dump failed: {}", e);
                    Err(e)
                }
            },
            Command::Uart { baud } => {
                info!("switching uart to {} baud", baud);
                let _ = writeln!(self.term, "\nswitching to {}", baud);
                self.term.flush()?;
                if let Err(e) = self.term.reinit(baud) {
                    warn!("uart reinit failed: {}", e);
                    let _ = writeln!(self.term, "uart reinit failed: {}", e);
                    return Err(e);
                }
                Ok(())
            }
            Command::Help => {
                self.help();
                Ok(())
            }
        }
    }

    fn help(&mut self) {
        let block = self.flash.erase_block_size();
        let _ = write_help(&mut self.term, block);
    }
}
