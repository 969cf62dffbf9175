//! Hex dump rendering
//!
//! Rows hold 16 bytes:
//!
//! ```text
//! 00001000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f : 00
//! ```
//!
//! The trailing column is the XOR of the row's bytes. It is only printed for
//! complete rows; a short final row ends after its last byte and its partial
//! XOR is dropped, so a dump whose length is not a multiple of 16 has no
//! checksum on its last line.

use core::fmt;

/// Bytes per row
pub const ROW_LEN: usize = 16;

/// XOR of all bytes in `row`
pub fn row_checksum(row: &[u8]) -> u8 {
    row.iter().fold(0, |acc, b| acc ^ b)
}

/// Incremental hex dump of one contiguous byte range
#[derive(Debug, Clone)]
pub struct HexDump {
    base: usize,
    emitted: usize,
    xor: u8,
}

impl HexDump {
    /// Start a dump whose first byte lives at `base`
    pub fn new(base: usize) -> Self {
        Self {
            base,
            emitted: 0,
            xor: 0,
        }
    }

    /// Bytes emitted in the current row (0-15)
    pub fn row_fill(&self) -> usize {
        self.emitted % ROW_LEN
    }

    /// Emit one byte, opening or closing a row as needed
    pub fn push<W: fmt::Write + ?Sized>(&mut self, byte: u8, out: &mut W) -> fmt::Result {
        if self.row_fill() == 0 {
            write!(out, "{:08x}:", self.base.wrapping_add(self.emitted))?;
        }

        write!(out, " {:02x}", byte)?;
        self.xor ^= byte;
        self.emitted += 1;

        if self.row_fill() == 0 {
            writeln!(out, " : {:02x}", self.xor)?;
            self.xor = 0;
        }
        Ok(())
    }

    /// Terminate a trailing partial row (without checksum)
    pub fn finish<W: fmt::Write + ?Sized>(self, out: &mut W) -> fmt::Result {
        if self.row_fill() != 0 {
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Render `bytes` as hex dump rows starting at address `base`
pub fn render<W: fmt::Write + ?Sized>(base: usize, bytes: &[u8], out: &mut W) -> fmt::Result {
    let mut dump = HexDump::new(base);
    for &byte in bytes {
        dump.push(byte, out)?;
    }
    dump.finish(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_string(base: usize, bytes: &[u8]) -> String {
        let mut s = String::new();
        render(base, bytes, &mut s).unwrap();
        s
    }

    #[test]
    fn test_two_full_rows() {
        let bytes: Vec<u8> = (0x00..0x20).collect();
        let text = render_string(0, &bytes);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "00000000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f : 00"
        );
        assert_eq!(
            lines[1],
            "00000010: 10 11 12 13 14 15 16 17 18 19 1a 1b 1c 1d 1e 1f : 00"
        );
        assert_eq!(row_checksum(&bytes[..16]), 0x00);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_checksum_column() {
        let mut row = [0u8; 16];
        row[0] = 0xA5;
        row[15] = 0x0F;
        let text = render_string(0x1000, &row);
        assert_eq!(
            text,
            "00001000: a5 00 00 00 00 00 00 00 00 00 00 00 00 00 00 0f : aa\n"
        );
    }

    #[test]
    fn test_partial_row_has_no_checksum() {
        let bytes = [0xFFu8; 40];
        let text = render_string(0x2000, &bytes);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("00002000:") && lines[0].ends_with(" : 00"));
        assert!(lines[1].starts_with("00002010:") && lines[1].ends_with(" : 00"));
        assert_eq!(lines[2], "00002020: ff ff ff ff ff ff ff ff");
    }

    #[test]
    fn test_empty_range_renders_nothing() {
        assert_eq!(render_string(0x40, &[]), "");
    }

    #[test]
    fn test_state_resets_per_call() {
        let mut text = String::new();
        render(0, &[1, 2, 3], &mut text).unwrap();
        render(0x10, &[0x10; 16], &mut text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "00000000: 01 02 03");
        assert!(lines[1].starts_with("00000010: 10"));
        assert!(lines[1].ends_with(" : 00"));
    }
}
