//! Fixed-length dump of a decimal value whose unsigned byte order equals
//! decimal order, so dumped keys compare with plain memcmp.
//!
//! Every limb is emitted big-endian in just enough bytes for its digit
//! count; the sign bit of the leading emission flips, and negative values
//! complement every byte. The tail pads to a 4-byte boundary with the sign
//! mask.

use crate::core::error::{Error, ErrorKind, Result};
use crate::decimal::Decimal;
use crate::decimal::digits::{DIGIT_PER_UNIT, DigitUnit, POWERS10, round_up};

/// Bytes needed for a partial limb of n digits
const DIG2BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];

const UNIT_BYTES: usize = 4;

fn four_bytes_round_up(byte_num: usize) -> usize {
    (byte_num + 3) / 4 * 4
}

/// Big-endian emission of the low `bytes` bytes
fn n_byte_dump(dest: &mut [u8], unit: u32, bytes: usize) {
    debug_assert!((1..=4).contains(&bytes));
    for i in 0..bytes {
        dest[i] = (unit >> (8 * (bytes - 1 - i))) as u8;
    }
}

/// Big-endian read of `bytes` bytes
fn n_byte_set_dumped(source: &[u8], bytes: usize) -> u32 {
    debug_assert!((1..=4).contains(&bytes));
    let mut result = 0u32;
    for &byte in &source[..bytes] {
        result = (result << 8) | byte as u32;
    }
    result
}

fn byte_mask(bytes: usize) -> u32 {
    if bytes == 4 { u32::MAX } else { (1u32 << (bytes * 8)) - 1 }
}

impl Decimal {
    /// Payload bytes before padding, from the declared type alone
    pub fn real_dump_size(precision: i32, scale: i32) -> usize {
        debug_assert!(scale >= 0 && precision > 0 && scale <= precision);
        let integer_units = ((precision - scale) / DIGIT_PER_UNIT) as usize;
        let fraction_units = (scale / DIGIT_PER_UNIT) as usize;
        let integer_head = ((precision - scale) % DIGIT_PER_UNIT) as usize;
        let fraction_tail = (scale % DIGIT_PER_UNIT) as usize;

        integer_units * UNIT_BYTES
            + DIG2BYTES[integer_head]
            + fraction_units * UNIT_BYTES
            + DIG2BYTES[fraction_tail]
    }

    /// Dumped size, padded to a 4-byte multiple
    pub fn dump_size_by(precision: i32, scale: i32) -> usize {
        four_bytes_round_up(Self::real_dump_size(precision, scale))
    }

    pub fn dump_size(&self) -> usize {
        Self::dump_size_by(self.precision, self.scale)
    }

    /// Dump into the sort-preserving byte form
    pub fn dump_value(&self) -> Vec<u8> {
        debug_assert!(self.precision >= self.scale);

        let mask: u32 = if self.value.is_negative() { u32::MAX } else { 0 };
        let dump_size = self.dump_size();
        let mut out = vec![mask as u8; dump_size];

        let integer_head = ((self.precision - self.scale) % DIGIT_PER_UNIT) as usize;
        let fraction_tail = (self.scale % DIGIT_PER_UNIT) as usize;

        let unit_count =
            (round_up(self.precision - self.scale) + round_up(self.scale)) as usize;
        debug_assert!(unit_count <= self.value.unit_len());
        let units = &self.value.units()[..unit_count];

        let mut highest: u32 = 0x8000_0000;
        let mut write = 0usize;
        let mut at = 0usize;

        if integer_head > 0 {
            let bytes = DIG2BYTES[integer_head];
            let mut unit = units[at] as u32;
            at += 1;
            let head_bit = highest >> ((UNIT_BYTES - bytes) * 8);
            unit ^= head_bit;
            unit ^= mask;
            n_byte_dump(&mut out[write..], unit, bytes);
            write += bytes;
            highest = 0;
        }

        while at + 1 < unit_count {
            let mut unit = units[at] as u32;
            at += 1;
            unit ^= highest;
            unit ^= mask;
            n_byte_dump(&mut out[write..], unit, UNIT_BYTES);
            write += UNIT_BYTES;
            highest = 0;
        }

        if at < unit_count {
            let mut unit = units[at] as u32;
            if fraction_tail > 0 {
                unit /= POWERS10[DIGIT_PER_UNIT as usize - fraction_tail] as u32;
                let bytes = DIG2BYTES[fraction_tail];
                if highest != 0 {
                    unit ^= highest >> ((UNIT_BYTES - bytes) * 8);
                }
                unit ^= mask;
                n_byte_dump(&mut out[write..], unit, bytes);
            } else {
                unit ^= highest;
                unit ^= mask;
                n_byte_dump(&mut out[write..], unit, UNIT_BYTES);
            }
        }

        out
    }

    /// Rebuild the value from its dumped form. The input must be exactly
    /// the dumped size of the declared type.
    pub fn set_dumped_value(&mut self, data: &[u8]) -> Result<usize> {
        let dump_size = self.dump_size();
        if data.len() != dump_size {
            return Err(Error::new(
                ErrorKind::BadArgument,
                format!("dumped decimal is {} bytes, type wants {}", data.len(), dump_size),
            ));
        }

        let integer_head = ((self.precision - self.scale) % DIGIT_PER_UNIT) as usize;
        let fraction_tail = (self.scale % DIGIT_PER_UNIT) as usize;
        let unit_count =
            (round_up(self.precision - self.scale) + round_up(self.scale)) as usize;

        let current_len = self.value.unit_len();
        self.value.reset_units(current_len.max(unit_count));

        let mut highest: u32 = 0x8000_0000;
        let mut mask: u32 = 0;
        let mut read = 0usize;
        let mut at = 0usize;

        if integer_head > 0 {
            let bytes = DIG2BYTES[integer_head];
            let mut unit = n_byte_set_dumped(&data[read..], bytes);
            read += bytes;

            let head_bit = highest >> ((UNIT_BYTES - bytes) * 8);
            mask = if unit & head_bit != 0 { 0 } else { u32::MAX };
            unit ^= mask;
            unit ^= head_bit;
            unit &= byte_mask(bytes);

            self.value.units_mut()[at] = unit as DigitUnit;
            at += 1;
            highest = 0;
        }

        while at + 1 < unit_count {
            let mut unit = n_byte_set_dumped(&data[read..], UNIT_BYTES);
            read += UNIT_BYTES;
            if highest != 0 {
                mask = if unit & highest != 0 { 0 } else { u32::MAX };
            }
            unit ^= mask;
            unit ^= highest;
            self.value.units_mut()[at] = unit as DigitUnit;
            at += 1;
            highest = 0;
        }

        if at < unit_count {
            let unit = if fraction_tail > 0 {
                let bytes = DIG2BYTES[fraction_tail];
                let mut unit = n_byte_set_dumped(&data[read..], bytes);
                if highest != 0 {
                    let head_bit = highest >> ((UNIT_BYTES - bytes) * 8);
                    mask = if unit & head_bit != 0 { 0 } else { u32::MAX };
                    unit ^= head_bit;
                }
                unit ^= mask;
                unit &= byte_mask(bytes);
                unit * POWERS10[DIGIT_PER_UNIT as usize - fraction_tail] as u32
            } else {
                let mut unit = n_byte_set_dumped(&data[read..], UNIT_BYTES);
                if highest != 0 {
                    mask = if unit & highest != 0 { 0 } else { u32::MAX };
                }
                unit ^= mask;
                unit ^= highest;
                unit
            };
            self.value.units_mut()[at] = unit as DigitUnit;
        }

        self.value.set_sign(mask != 0);
        Ok(dump_size)
    }
}
