//! Numeric argument parsing
//!
//! Console arguments are decimal or `0x`-prefixed hexadecimal. Parsing stops
//! at the first character that is not a digit of the selected radix, so
//! `"0x100,"` reads as `0x100`. At least one digit is required.

use crate::error::ParseError;

/// Parse the leading unsigned integer of `s`
///
/// Returns `None` if `s` has no leading digits or the value overflows.
pub fn parse_u64(s: &str) -> Option<u64> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };

    let mut value: u64 = 0;
    let mut seen = 0usize;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else {
            break;
        };
        value = value.checked_mul(radix as u64)?.checked_add(d as u64)?;
        seen += 1;
    }

    (seen > 0).then_some(value)
}

/// Parse a 32-bit flash address or length
pub fn parse_u32(s: &str, what: &'static str) -> Result<u32, ParseError> {
    parse_u64(s)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(ParseError::InvalidNumber { what })
}

/// Parse a machine-word RAM address or length
pub fn parse_usize(s: &str, what: &'static str) -> Result<usize, ParseError> {
    parse_u64(s)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or(ParseError::InvalidNumber { what })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_and_hex() {
        assert_eq!(parse_u64("32"), Some(32));
        assert_eq!(parse_u64("0x1000"), Some(0x1000));
        assert_eq!(parse_u64("0XfF"), Some(0xFF));
        assert_eq!(parse_u64("0"), Some(0));
    }

    #[test]
    fn test_leading_zero_is_decimal() {
        assert_eq!(parse_u64("010"), Some(10));
    }

    #[test]
    fn test_trailing_garbage_tolerated() {
        assert_eq!(parse_u64("12abc"), Some(12));
        assert_eq!(parse_u64("0x20zz"), Some(0x20));
    }

    #[test]
    fn test_no_digits_rejected() {
        assert_eq!(parse_u64(""), None);
        assert_eq!(parse_u64("abc"), None);
        assert_eq!(parse_u64("0x"), None);
        assert_eq!(parse_u64("-1"), None);
    }

    #[test]
    fn test_overflow_rejected() {
        assert_eq!(parse_u64("18446744073709551616"), None);
        assert_eq!(
            parse_u32("0x100000000", "len"),
            Err(ParseError::InvalidNumber { what: "len" })
        );
        assert_eq!(parse_u32("0xFFFFFFFF", "len"), Ok(u32::MAX));
    }
}
