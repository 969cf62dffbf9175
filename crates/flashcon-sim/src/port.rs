//! Scripted UART

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_io::{ErrorType, Read, Write};
use flashcon_core::error::{Error, Result};
use flashcon_core::terminal::Uart;

/// UART fed from an input script, capturing everything written
///
/// Reads return 0 (end of input) once the script is used up.
#[derive(Debug, Default)]
pub struct ScriptedPort {
    input: VecDeque<u8>,
    output: Vec<u8>,
    bauds: Vec<u32>,
    fail_reinit: bool,
}

impl ScriptedPort {
    /// Create a port that will deliver `input`
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Bytes still waiting to be read
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    /// Everything written so far, as text
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Baud rates requested through `reinit`
    pub fn bauds(&self) -> &[u32] {
        &self.bauds
    }

    /// Make `reinit` fail
    pub fn set_fail_reinit(&mut self, fail: bool) {
        self.fail_reinit = fail;
    }
}

impl ErrorType for ScriptedPort {
    type Error = Infallible;
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Infallible> {
        let mut n = 0;
        while n < buf.len() {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Infallible> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> core::result::Result<(), Infallible> {
        Ok(())
    }
}

impl Uart for ScriptedPort {
    fn reinit(&mut self, baud: u32) -> Result<()> {
        self.bauds.push(baud);
        if self.fail_reinit {
            return Err(Error::IoError);
        }
        Ok(())
    }
}
