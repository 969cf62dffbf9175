//! Character-level terminal on top of a UART
//!
//! The console talks to the operator one byte at a time. [`Terminal`] wraps
//! a [`Uart`] and adds the output newline translation the console relies on:
//! a `\r` is emitted before every `\n` unless the previous byte already was
//! `\r`. Input bytes are passed through untranslated.

use core::fmt;

use embedded_io::{Error as _, Read, Write};
use log::error;

use crate::error::{Error, Result};

/// Serial port the console runs on
///
/// Reads block until at least one byte is available; a read of zero bytes
/// means the input has ended (host builds only, a real UART never ends).
pub trait Uart: Read + Write {
    /// Reconfigure the port for a new baud rate
    fn reinit(&mut self, baud: u32) -> Result<()>;
}

/// Blocking single-byte input
pub trait CharSource {
    /// Wait for the next input byte
    fn get_char(&mut self) -> Result<u8>;
}

/// Blocking single-byte output
pub trait CharSink {
    /// Emit one byte
    fn put_char(&mut self, byte: u8);
}

/// Line-discipline wrapper around a [`Uart`]
///
/// Byte output cannot fail from the caller's point of view. A failed write
/// is logged once and remembered until [`Terminal::check_output`] picks it
/// up, so a dead output line is noticed even when the failing write was an
/// echo.
pub struct Terminal<U> {
    uart: U,
    cr_sent: bool,
    /// A write failed during the current `write_str` call
    write_failed: bool,
    /// A write failed since the last `check_output`
    output_lost: bool,
}

impl<U: Uart> Terminal<U> {
    /// Wrap a UART
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            cr_sent: false,
            write_failed: false,
            output_lost: false,
        }
    }

    /// Get a reference to the underlying UART
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Unwrap the terminal, returning the UART
    pub fn into_inner(self) -> U {
        self.uart
    }

    /// Push buffered output to the wire
    pub fn flush(&mut self) -> Result<()> {
        self.uart.flush().map_err(|e| {
            error!("uart flush failed: {:?}", e.kind());
            Error::IoError
        })
    }

    /// Reconfigure the UART baud rate
    pub fn reinit(&mut self, baud: u32) -> Result<()> {
        self.uart.reinit(baud)
    }

    /// Report output lost since the last call
    pub fn check_output(&mut self) -> Result<()> {
        if core::mem::take(&mut self.output_lost) {
            return Err(Error::IoError);
        }
        Ok(())
    }

    fn put_raw(&mut self, byte: u8) {
        if let Err(e) = self.uart.write_all(&[byte]) {
            if !self.output_lost {
                error!("uart write failed: {:?}", e.kind());
            }
            self.write_failed = true;
            self.output_lost = true;
        }
    }
}

impl<U: Uart> CharSource for Terminal<U> {
    fn get_char(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(0) => Err(Error::EndOfInput),
            Ok(_) => Ok(byte[0]),
            Err(e) => {
                error!("uart read failed: {:?}", e.kind());
                Err(Error::IoError)
            }
        }
    }
}

impl<U: Uart> CharSink for Terminal<U> {
    fn put_char(&mut self, byte: u8) {
        if byte == b'\n' && !self.cr_sent {
            self.put_raw(b'\r');
        }
        self.cr_sent = byte == b'\r';
        self.put_raw(byte);
    }
}

impl<U: Uart> fmt::Write for Terminal<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_failed = false;
        for byte in s.bytes() {
            self.put_char(byte);
        }
        if self.write_failed {
            return Err(fmt::Error);
        }
        Ok(())
    }
}
