//! Ring-buffer line editor
//!
//! [`LineBuffer`] collects one input line in a fixed ring of `N` slots and
//! applies the classic terminal editing keys as bytes arrive, echoing each
//! edit back to the operator. One slot is always kept free so that a full
//! buffer can be told apart from an empty one: at most `N - 1` characters
//! fit in a line.
//!
//! [`LineReader`] pulls bytes from a [`CharSource`] into the buffer until a
//! carriage return completes the line, then hands the line out.

use log::{debug, trace};

use crate::error::Result;
use crate::terminal::{CharSink, CharSource};

/// Default number of ring slots (126 usable characters)
pub const LINE_CAPACITY: usize = 127;

/// Line terminator
const CR: u8 = b'\r';
/// Backspace (^H)
const BS: u8 = 0x08;
/// Delete
const DEL: u8 = 0x7F;
/// ^W - erase word
const ERASE_WORD: u8 = 0x17;
/// ^U - erase line
const ERASE_LINE: u8 = 0x15;
/// Terminal bell
const BEL: u8 = 0x07;

/// Bytes that may go into a line
fn is_printable(byte: u8) -> bool {
    byte == b'\t' || (0x20..0x7F).contains(&byte)
}

/// Why a byte was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No free slot left for another character
    BufferFull,
    /// A completed line is waiting to be drained
    LinePending,
    /// Control or non-ASCII byte that is not an editing key
    NotPrintable,
}

/// Outcome of feeding one byte to the line buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// Byte consumed, line still in progress
    Pending,
    /// Terminator seen, the line can be drained
    LineReady,
    /// Byte ignored
    Rejected(Rejection),
}

/// Fixed-capacity ring buffer holding one input line
#[derive(Debug, Clone)]
pub struct LineBuffer<const N: usize = LINE_CAPACITY> {
    buf: [u8; N],
    start: usize,
    end: usize,
    /// Terminator marker: set once CR is seen, cleared when drained
    ready: bool,
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineBuffer<N> {
    /// Create an empty buffer
    ///
    /// `N` must be at least 2.
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            start: 0,
            end: 0,
            ready: false,
        }
    }

    /// Number of characters currently held
    pub fn len(&self) -> usize {
        (self.end + N - self.start) % N
    }

    /// Check if the buffer holds no characters
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if another character would be rejected
    pub fn is_full(&self) -> bool {
        self.len() == N - 1
    }

    /// Check if a completed line is waiting to be drained
    pub fn has_line(&self) -> bool {
        self.ready
    }

    /// Current `(start, end)` ring positions
    pub fn cursors(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Iterate over the held characters in order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len()).map(move |i| self.buf[(self.start + i) % N])
    }

    #[inline]
    fn next_idx(i: usize) -> usize {
        (i + 1) % N
    }

    #[inline]
    fn prev_idx(i: usize) -> usize {
        (i + N - 1) % N
    }

    /// Apply one input byte
    ///
    /// Editing keys act on the end of the line; every change is echoed to
    /// `echo`. A BEL is echoed instead when backspacing an empty line,
    /// typing into a full one, or sending a control byte that is not an
    /// editing key (escape sequences, NUL, bytes above 0x7E). TAB is kept.
    pub fn feed<S: CharSink + ?Sized>(&mut self, byte: u8, echo: &mut S) -> LineEvent {
        if self.ready {
            return LineEvent::Rejected(Rejection::LinePending);
        }

        match byte {
            CR => {
                self.ready = true;
                echo.put_char(b'\r');
                echo.put_char(b'\n');
                return LineEvent::LineReady;
            }
            BS | DEL => {
                if self.is_empty() {
                    echo.put_char(BEL);
                } else {
                    self.back_up(echo);
                }
            }
            ERASE_WORD => {
                while !self.is_empty() && !self.buf[Self::prev_idx(self.end)].is_ascii_whitespace() {
                    self.back_up(echo);
                }
            }
            ERASE_LINE => {
                while !self.is_empty() {
                    self.back_up(echo);
                }
            }
            _ if !is_printable(byte) => {
                echo.put_char(BEL);
                return LineEvent::Rejected(Rejection::NotPrintable);
            }
            _ => {
                if self.is_full() {
                    echo.put_char(BEL);
                    return LineEvent::Rejected(Rejection::BufferFull);
                }
                self.buf[self.end] = byte;
                self.end = Self::next_idx(self.end);
                echo.put_char(byte);
            }
        }

        LineEvent::Pending
    }

    /// Retract the last character and erase it on screen
    fn back_up<S: CharSink + ?Sized>(&mut self, echo: &mut S) {
        self.end = Self::prev_idx(self.end);
        echo.put_char(BS);
        echo.put_char(b' ');
        echo.put_char(BS);
    }

    /// Move the completed line into `out`
    ///
    /// Returns the number of bytes copied. If `out` is shorter than the
    /// line, the rest stays pending for the next call. Returns 0 when no
    /// completed line is waiting.
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        if !self.ready {
            return 0;
        }

        let mut copied = 0;
        while !self.is_empty() && copied < out.len() {
            out[copied] = self.buf[self.start];
            self.start = Self::next_idx(self.start);
            copied += 1;
        }

        if self.is_empty() {
            self.ready = false;
        }
        copied
    }
}

/// Pulls completed lines out of a character source
#[derive(Debug, Clone, Default)]
pub struct LineReader<const N: usize = LINE_CAPACITY> {
    buffer: LineBuffer<N>,
}

impl<const N: usize> LineReader<N> {
    /// Create a reader with an empty line buffer
    pub const fn new() -> Self {
        Self {
            buffer: LineBuffer::new(),
        }
    }

    /// Read the next line into `out`
    ///
    /// A line that is still (partly) pending is handed out first without
    /// touching the source. Otherwise bytes are pulled from `port` and
    /// edited until a terminator arrives. Returns the number of bytes
    /// written to `out`; the terminator itself is not included.
    pub fn read<T: CharSource + CharSink>(&mut self, port: &mut T, out: &mut [u8]) -> Result<usize> {
        if !self.buffer.has_line() {
            loop {
                let byte = port.get_char()?;
                match self.buffer.feed(byte, port) {
                    LineEvent::LineReady => break,
                    LineEvent::Rejected(reason) => trace!("input byte 0x{:02x} rejected: {:?}", byte, reason),
                    LineEvent::Pending => {}
                }
            }
            debug!("line complete ({} bytes)", self.buffer.len());
        }

        Ok(self.buffer.drain(out))
    }
}
