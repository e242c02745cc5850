pub mod expgolomb;
pub mod extgolomb;
pub mod unary;

use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DataUnit, UNIT_BITS};

pub use expgolomb::ParameterizedExpGolombCoder;
pub use extgolomb::ExtendedGolombCoder;
pub use unary::UnaryCoder;

/// Variable-length integer codec over a stream of 32-bit units.
///
/// Bit offsets are big-endian within a word: bit 0 is the MSB of word 0.
/// Encoded values are strictly positive.
pub trait Coder: Send + Sync {
    /// Number of bits the code for `value` occupies. Total on value >= 1.
    fn bit_length(&self, value: u32) -> u32;

    /// Write the code for `value` starting at bit `tail_bits`.
    /// On success advances `tail_bits` and returns true. Returns false,
    /// leaving `tail_bits` and the buffer beyond it untouched, when
    /// `tail_bits + bit_length(value) > cap_bits`.
    fn append(&self, value: u32, buf: &mut [DataUnit], cap_bits: u32, tail_bits: &mut u32) -> bool;

    /// Read one code starting at `cur_bits`. On success stores the decoded
    /// value and advances `cur_bits`. Returns false iff `cur_bits == end_bits`.
    fn get(&self, value: &mut u32, buf: &[DataUnit], end_bits: u32, cur_bits: &mut u32) -> bool;

    /// Direct bit probe at `start_bits + target - 1`.
    /// Meaningful for the unary coder only; everything else reports false.
    fn find(&self, _target: u32, _buf: &[DataUnit], _end_bits: u32, _start_bits: u32) -> bool {
        false
    }

    /// Whether `find` resolves membership with a direct bit test
    fn has_direct_find(&self) -> bool {
        false
    }

    /// Textual form, re-parsable by `parse_coder`
    fn description(&self) -> String;
}

#[inline]
fn word_index(bit: u32) -> usize {
    (bit / UNIT_BITS) as usize
}

#[inline]
fn bit_mask(bit: u32) -> DataUnit {
    1u32 << (UNIT_BITS - 1 - (bit & (UNIT_BITS - 1)))
}

#[inline]
pub(crate) fn set_bit(buf: &mut [DataUnit], bit: u32) {
    buf[word_index(bit)] |= bit_mask(bit);
}

#[inline]
pub(crate) fn clear_bit(buf: &mut [DataUnit], bit: u32) {
    buf[word_index(bit)] &= !bit_mask(bit);
}

#[inline]
pub(crate) fn test_bit(buf: &[DataUnit], bit: u32) -> bool {
    buf[word_index(bit)] & bit_mask(bit) != 0
}

/// Write the low `width` bits of `value`, most significant first
pub(crate) fn write_bits(buf: &mut [DataUnit], at: u32, value: u32, width: u32) {
    for i in 0..width {
        if (value >> (width - 1 - i)) & 1 != 0 {
            set_bit(buf, at + i);
        } else {
            clear_bit(buf, at + i);
        }
    }
}

/// Read `width` bits starting at `at`, most significant first
pub(crate) fn read_bits(buf: &[DataUnit], at: u32, width: u32) -> u32 {
    let mut value = 0u32;
    for i in 0..width {
        value <<= 1;
        if test_bit(buf, at + i) {
            value |= 1;
        }
    }
    value
}

/// Concatenate a bit-aligned sub-stream onto another buffer.
/// Used when packed location areas are copied into larger areas or flushed
/// into overflow pages.
pub fn move_bits(
    src: &[DataUnit],
    src_start_bits: u32,
    copy_bits: u32,
    dst_start_bits: u32,
    dst: &mut [DataUnit],
) {
    for i in 0..copy_bits {
        if test_bit(src, src_start_bits + i) {
            set_bit(dst, dst_start_bits + i);
        } else {
            clear_bit(dst, dst_start_bits + i);
        }
    }
}

#[inline]
pub(crate) fn floor_log2(value: u32) -> u32 {
    debug_assert!(value >= 1);
    31 - value.leading_zeros()
}

/// One whitespace-padded decimal field of a parameter description.
/// Returns None when the field is empty (parameters may be omitted).
pub(crate) fn parse_int_field(input: &str) -> Result<Option<i64>> {
    use nom::{IResult, Parser, character::complete::{digit1, multispace0}, combinator::opt, sequence::delimited};

    let res: IResult<&str, Option<&str>> =
        delimited(multispace0, opt(digit1), multispace0).parse(input);
    match res {
        Ok((rest, digits)) if rest.is_empty() => match digits {
            Some(d) => d.parse::<i64>().map(Some).map_err(|_| {
                Error::new(
                    ErrorKind::InvalidCoderParameterDescription,
                    format!("parameter '{}' out of range", input),
                )
            }),
            None => Ok(None),
        },
        _ => Err(Error::new(
            ErrorKind::InvalidCoderParameterDescription,
            format!("parameter '{}' is not a decimal integer", input),
        )),
    }
}

/// Build a coder from its textual description.
///
/// "PEG:2"    parameterized Exp-Golomb, lambda = 2
/// "EXG:1:5"  extended Golomb, lambda = 1, factor = 5
/// "UNA"      unary
/// "2"        bare number is parameterized Exp-Golomb
pub fn parse_coder(description: &str) -> Result<Arc<dyn Coder>> {
    let trimmed = description.trim();
    if let Some(rest) = trimmed.strip_prefix("PEG:") {
        return Ok(Arc::new(ParameterizedExpGolombCoder::parse(rest)?));
    }
    if let Some(rest) = trimmed.strip_prefix("EXG:") {
        return Ok(Arc::new(ExtendedGolombCoder::parse(rest)?));
    }
    if trimmed == "UNA" {
        return Ok(Arc::new(UnaryCoder::new()));
    }
    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Ok(Arc::new(ParameterizedExpGolombCoder::parse(trimmed)?));
    }
    Err(Error::new(
        ErrorKind::InvalidCoderParameterDescription,
        format!("unknown coder description '{}'", description),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_helpers() {
        let mut buf = vec![0u32; 2];
        set_bit(&mut buf, 0);
        assert_eq!(buf[0], 0x8000_0000);
        set_bit(&mut buf, 31);
        assert_eq!(buf[0], 0x8000_0001);
        set_bit(&mut buf, 32);
        assert_eq!(buf[1], 0x8000_0000);
        assert!(test_bit(&buf, 0));
        assert!(!test_bit(&buf, 1));
        clear_bit(&mut buf, 0);
        assert!(!test_bit(&buf, 0));
    }

    #[test]
    fn test_write_read_bits() {
        let mut buf = vec![0u32; 2];
        write_bits(&mut buf, 3, 0b10110, 5);
        assert_eq!(read_bits(&buf, 3, 5), 0b10110);

        // crossing a word boundary
        write_bits(&mut buf, 28, 0b110101, 6);
        assert_eq!(read_bits(&buf, 28, 6), 0b110101);
    }

    #[test]
    fn test_move_bits() {
        let mut src = vec![0u32; 2];
        write_bits(&mut src, 5, 0b1011011, 7);
        let mut dst = vec![0u32; 2];
        move_bits(&src, 5, 7, 30, &mut dst);
        assert_eq!(read_bits(&dst, 30, 7), 0b1011011);
    }

    #[test]
    fn test_parse_coder_descriptions() {
        assert_eq!(parse_coder("PEG:2").unwrap().description(), "PEG:2");
        assert_eq!(parse_coder("EXG:1:5").unwrap().description(), "EXG:1:5");
        assert_eq!(parse_coder("UNA").unwrap().description(), "UNA");
        assert_eq!(parse_coder(" 3 ").unwrap().description(), "PEG:3");
        assert!(parse_coder("bogus").is_err());
    }
}
