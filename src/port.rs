//! Host UART backends
//!
//! The console can be served either on the process's own stdin/stdout or on
//! a serial device, so a real terminal program can talk to it.

use std::io::{self, Read as _, Write as _};
use std::time::Duration;

use flashcon_core::terminal::Uart;
use log::{error, info};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::PortError;

/// Console on stdin/stdout
///
/// Input lines end in LF on a host terminal, so LF is handed to the console
/// as CR. Baud changes have nothing to act on and are only logged.
pub struct StdioPort {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl StdioPort {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Default for StdioPort {
    fn default() -> Self {
        Self::new()
    }
}

/// Map host line endings to the console terminator
fn map_newlines(buf: &mut [u8]) {
    for b in buf.iter_mut().filter(|b| **b == b'\n') {
        *b = b'\r';
    }
}

impl embedded_io::ErrorType for StdioPort {
    type Error = PortError;
}

impl embedded_io::Read for StdioPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PortError> {
        loop {
            match self.stdin.read(buf) {
                Ok(n) => {
                    map_newlines(&mut buf[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl embedded_io::Write for StdioPort {
    fn write(&mut self, buf: &[u8]) -> Result<usize, PortError> {
        Ok(self.stdout.write(buf)?)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        Ok(self.stdout.flush()?)
    }
}

impl Uart for StdioPort {
    fn reinit(&mut self, baud: u32) -> flashcon_core::Result<()> {
        info!("stdio console ignores baud change to {}", baud);
        Ok(())
    }
}

/// Console on a serial device
pub struct SerialUart {
    port: Box<dyn SerialPort>,
}

impl SerialUart {
    /// Open a serial port at the given baud rate, 8N1 without flow control
    pub fn open(device: &str, baud: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(device, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_secs(1))
            .open()?;

        info!("Opened serial port {} at {} baud", device, baud);

        Ok(Self { port })
    }
}

impl embedded_io::ErrorType for SerialUart {
    type Error = PortError;
}

impl embedded_io::Read for SerialUart {
    /// Block until at least one byte arrives
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PortError> {
        loop {
            match self.port.read(buf) {
                Ok(n) => return Ok(n),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl embedded_io::Write for SerialUart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, PortError> {
        Ok(self.port.write(buf)?)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        Ok(self.port.flush()?)
    }
}

impl Uart for SerialUart {
    fn reinit(&mut self, baud: u32) -> flashcon_core::Result<()> {
        self.port.set_baud_rate(baud).map_err(|e| {
            error!("failed to set baud rate {}: {}", baud, e);
            flashcon_core::Error::IoError
        })?;
        info!("serial port now at {} baud", baud);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_newlines() {
        let mut buf = *b"dump 0 1\nuart 9600\r\n";
        map_newlines(&mut buf);
        assert_eq!(&buf, b"dump 0 1\ruart 9600\r\r");
    }
}
