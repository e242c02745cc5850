use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// One base-10^9 digit group
pub type DigitUnit = i32;

/// Decimal digits per unit
pub const DIGIT_PER_UNIT: i32 = 9;

pub const DIGIT_BASE: DigitUnit = 1_000_000_000;
pub const DIGIT_MAX: DigitUnit = DIGIT_BASE - 1;

pub const POWERS10: [DigitUnit; 10] = [
    1, 10, 100, 1000, 10_000, 100_000, 1_000_000, 10_000_000, 100_000_000, 1_000_000_000,
];

/// Largest fraction tail per partial digit count (9, 99, ... left aligned)
pub const FRACTION_MAX: [DigitUnit; 8] = [
    900_000_000, 990_000_000, 999_000_000, 999_900_000,
    999_990_000, 999_999_000, 999_999_900, 999_999_990,
];

/// Units needed for a digit count
pub fn round_up(digit_num: i32) -> i32 {
    (digit_num + DIGIT_PER_UNIT - 1) / DIGIT_PER_UNIT
}

/// Add with single carry in base 10^9
fn sub_add(dec1: DigitUnit, dec2: DigitUnit, carry: &mut DigitUnit) -> DigitUnit {
    let mut tmp = dec1 + dec2 + *carry;
    *carry = if tmp >= DIGIT_BASE { 1 } else { 0 };
    if *carry > 0 {
        tmp -= DIGIT_BASE;
    }
    tmp
}

/// Subtract with single borrow in base 10^9
fn sub_sub(dec1: DigitUnit, dec2: DigitUnit, carry: &mut DigitUnit) -> DigitUnit {
    let mut tmp = dec1 - dec2 - *carry;
    *carry = if tmp < 0 { 1 } else { 0 };
    if *carry > 0 {
        tmp += DIGIT_BASE;
    }
    tmp
}

/// Arithmetic operation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOperation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

/// Sign-and-magnitude decimal value over base-10^9 units.
///
/// The unit vector holds ceil(integer/9) integer units (most significant
/// first, the top one possibly partial) followed by ceil(fraction/9)
/// fraction units; the last fraction unit is left aligned, padded with
/// zeros on the right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digits {
    integer_len: i32,   // digits of the integer part
    fraction_len: i32,  // digits of the fraction part
    negative: bool,
    units: Vec<DigitUnit>,
}

impl Default for Digits {
    fn default() -> Self {
        Self::new()
    }
}

impl Digits {
    pub fn new() -> Self {
        Digits { integer_len: 0, fraction_len: 0, negative: false, units: Vec::new() }
    }

    pub fn integer(&self) -> i32 {
        self.integer_len
    }

    pub fn fraction(&self) -> i32 {
        self.fraction_len
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn units(&self) -> &[DigitUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [DigitUnit] {
        &mut self.units
    }

    pub fn unit_len(&self) -> usize {
        self.units.len()
    }

    pub fn set_integer(&mut self, integer_len: i32) {
        self.integer_len = integer_len;
    }

    pub fn set_fraction(&mut self, fraction_len: i32) {
        self.fraction_len = if fraction_len < 0 { 0 } else { fraction_len };
    }

    /// Resize the unit vector to the given length, all zero
    pub fn reset_units(&mut self, size: usize) {
        self.units.clear();
        self.units.resize(size, 0);
    }

    pub fn set_range(&mut self, integer_len: i32, fraction_len: i32) {
        self.set_integer(integer_len);
        self.set_fraction(fraction_len);
        self.reset_units((round_up(integer_len) + round_up(fraction_len)) as usize);
    }

    /// Set the sign; an all-zero magnitude is always positive
    pub fn set_sign(&mut self, negative: bool) {
        self.negative = negative;
        if self.negative && self.units.iter().all(|&u| u == 0) {
            self.negative = false;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.units.iter().all(|&u| u == 0)
    }

    pub fn make_zero(&mut self, integer_len: i32, fraction_len: i32) {
        self.integer_len = integer_len;
        self.fraction_len = fraction_len;
        if integer_len == 0 && fraction_len == 0 {
            self.integer_len = 1;
        }
        self.negative = false;
        self.reset_units((round_up(self.integer_len) + round_up(self.fraction_len)) as usize);
    }

    /// All nines for the given digit counts
    pub fn set_to_max(&mut self, integer_len: i32, fraction_len: i32) {
        debug_assert!(integer_len >= 0 && fraction_len >= 0);
        self.reset_units((round_up(integer_len) + round_up(fraction_len)) as usize);
        self.negative = false;
        self.integer_len = integer_len;
        self.fraction_len = fraction_len;

        let mut at = 0usize;
        let mut int_rest = integer_len;
        if int_rest > 0 {
            let first_digits = int_rest % DIGIT_PER_UNIT;
            if first_digits > 0 {
                self.units[at] = POWERS10[first_digits as usize] - 1; // 9, 99, 999 ...
                at += 1;
            }
            int_rest /= DIGIT_PER_UNIT;
            while int_rest > 0 {
                self.units[at] = DIGIT_MAX;
                at += 1;
                int_rest -= 1;
            }
        }

        let mut frac_rest = fraction_len;
        if frac_rest > 0 {
            let last_digits = fraction_len % DIGIT_PER_UNIT;
            frac_rest /= DIGIT_PER_UNIT;
            while frac_rest > 0 {
                self.units[at] = DIGIT_MAX;
                at += 1;
                frac_rest -= 1;
            }
            if last_digits > 0 {
                self.units[at] = FRACTION_MAX[last_digits as usize - 1];
            }
        }
    }

    /// Unit offset past the leading zeroes and the significant integer
    /// digit count left over
    pub fn remove_leading_zeroes(&self) -> (usize, i32) {
        let mut int_len = self.integer_len;
        let mut offset = 0usize;
        if int_len > 0 {
            let mut removed = ((int_len - 1) % DIGIT_PER_UNIT) + 1;
            while int_len > 0 && self.units[offset] == 0 {
                int_len -= removed;
                removed = DIGIT_PER_UNIT;
                offset += 1;
            }
        }
        if int_len > 0 {
            let mut r = (int_len - 1) % DIGIT_PER_UNIT;
            while self.units[offset] < POWERS10[r as usize] {
                int_len -= 1;
                r -= 1;
            }
            debug_assert!(int_len > 0);
        } else {
            int_len = 0;
        }
        (offset, int_len)
    }

    /// Units the result of an operation needs
    pub fn calculate_result_size(&self, other: &Digits, operation: DataOperation) -> usize {
        let size = match operation {
            DataOperation::Addition | DataOperation::Subtraction => {
                round_up(self.integer_len.max(other.integer_len) + 1)
                    + round_up(self.fraction_len.max(other.fraction_len))
            }
            DataOperation::Multiplication => {
                round_up(self.integer_len + other.integer_len)
                    + round_up(self.fraction_len)
                    + round_up(other.fraction_len)
            }
            DataOperation::Division => {
                round_up(self.integer_len + other.fraction_len)
                    + round_up(self.fraction_len + other.integer_len + 1)
            }
        };
        size as usize
    }

    /// Magnitude comparison; signs are the caller's business
    pub fn do_compare(&self, other: &Digits) -> i32 {
        debug_assert!(!self.units.is_empty());
        debug_assert!(!other.units.is_empty());

        let mut int1 = round_up(self.integer_len);
        let mut int2 = round_up(other.integer_len);
        let mut frac1 = round_up(self.fraction_len);
        let mut frac2 = round_up(other.fraction_len);

        let mut i1 = 0usize;
        let mut i2 = 0usize;

        // the longer integer wins at the first non-zero surplus unit
        while int1 > int2 {
            if self.units[i1] == 0 {
                i1 += 1;
                int1 -= 1;
            } else {
                return 1;
            }
        }
        while int2 > int1 {
            if other.units[i2] == 0 {
                i2 += 1;
                int2 -= 1;
            } else {
                return -1;
            }
        }
        debug_assert_eq!(int1, int2);

        while int1 > 0 {
            if self.units[i1] == other.units[i2] {
                i1 += 1;
                i2 += 1;
                int1 -= 1;
            } else {
                return if self.units[i1] > other.units[i2] { 1 } else { -1 };
            }
        }

        // integer parts equal; compare the fraction overlap
        let mut overlap = frac1.min(frac2);
        while overlap > 0 {
            if self.units[i1] == other.units[i2] {
                i1 += 1;
                i2 += 1;
                overlap -= 1;
                frac1 -= 1;
                frac2 -= 1;
            } else {
                return if self.units[i1] > other.units[i2] { 1 } else { -1 };
            }
        }
        while frac1 > 0 {
            if self.units[i1] == 0 {
                i1 += 1;
                frac1 -= 1;
            } else {
                return 1;
            }
        }
        while frac2 > 0 {
            if other.units[i2] == 0 {
                i2 += 1;
                frac2 -= 1;
            } else {
                return -1;
            }
        }
        0
    }

    /// Sum of two same-sign values into this pre-sized buffer. False when
    /// even the integer part cannot fit; fraction overflow truncates.
    pub fn do_add(&mut self, dec1: &Digits, dec2: &Digits) -> bool {
        debug_assert!(!dec1.units.is_empty());
        debug_assert!(!dec2.units.is_empty());

        let mut int1 = round_up(dec1.integer_len);
        let mut int2 = round_up(dec2.integer_len);
        let mut int_result = int1.max(int2);

        let mut frac1 = round_up(dec1.fraction_len);
        let mut frac2 = round_up(dec2.fraction_len);
        let mut frac_result = frac1.max(frac2);

        // an extra leading unit when the top units may carry out
        let first_unit = if int1 > int2 {
            dec1.units[0]
        } else if int2 > int1 {
            dec2.units[0]
        } else {
            dec1.units[0] + dec2.units[0]
        };
        if first_unit > DIGIT_MAX - 1 {
            int_result += 1;
            self.units[0] = 0;
        }

        let buffer_len = self.units.len() as i32;
        if int_result + frac_result > buffer_len {
            if int_result > buffer_len {
                return false;
            }
            frac_result = buffer_len - int_result;
        }

        self.fraction_len = dec1.fraction_len.max(dec2.fraction_len);
        self.integer_len = int_result * DIGIT_PER_UNIT;
        if self.fraction_len > frac_result * DIGIT_PER_UNIT {
            self.fraction_len = frac_result * DIGIT_PER_UNIT;
        }
        frac1 = frac1.min(frac_result);
        frac2 = frac2.min(frac_result);
        int1 = int1.min(int_result);
        int2 = int2.min(int_result);

        // three regions: the longer fraction tail alone, the overlap, and
        // the longer integer head alone
        let (big, big_int, big_frac, small, small_int, small_frac) = if frac1 > frac2 {
            (dec1, int1, frac1, dec2, int2, frac2)
        } else {
            (dec2, int2, frac2, dec1, int1, frac1)
        };

        let mut w = (int_result + frac_result) as usize;
        let mut p1 = (big_int + big_frac) as usize;
        let stop1 = (big_int + small_frac) as usize;
        while p1 > stop1 {
            w -= 1;
            p1 -= 1;
            self.units[w] = big.units[p1];
        }

        let mut p2 = (small_int + small_frac) as usize;
        let stop2 = if big_int > small_int { (big_int - small_int) as usize } else { 0 };
        let mut carry = 0;
        while p1 > stop2 {
            w -= 1;
            p1 -= 1;
            p2 -= 1;
            self.units[w] = sub_add(big.units[p1], small.units[p2], &mut carry);
        }

        let (long_op, mut p3) = if int1 > int2 {
            (dec1, (int1 - int2) as usize)
        } else {
            (dec2, (int2 - int1) as usize)
        };
        while p3 > 0 {
            w -= 1;
            p3 -= 1;
            self.units[w] = sub_add(long_op.units[p3], 0, &mut carry);
        }

        if carry > 0 {
            w -= 1;
            self.units[w] = 1;
        }

        self.set_sign(dec1.negative);
        true
    }

    /// Absolute difference of two same-sign values; the sign flips when
    /// the second magnitude is larger.
    pub fn do_sub(&mut self, dec1: &Digits, dec2: &Digits) -> bool {
        debug_assert!(!dec1.units.is_empty());
        debug_assert!(!dec2.units.is_empty());
        debug_assert!(!self.units.is_empty());

        let mut negative = dec1.negative;
        let bigger = dec1.do_compare(dec2);

        let (op1, op2) = if bigger == -1 {
            negative = !negative;
            (dec2, dec1)
        } else if bigger == 0 {
            self.make_zero(1, dec1.fraction_len.max(dec2.fraction_len));
            return true;
        } else {
            (dec1, dec2)
        };

        let mut int1 = round_up(op1.integer_len);
        let mut int2 = round_up(op2.integer_len);
        let mut frac1 = round_up(op1.fraction_len);
        let mut frac2 = round_up(op2.fraction_len);
        let int_len = int1.max(int2);
        let mut frac_len = frac1.max(frac2);

        // strip leading zero units of both magnitudes
        let mut s1 = 0usize;
        while s1 < int1 as usize && op1.units[s1] == 0 {
            s1 += 1;
        }
        int1 -= s1 as i32;
        let mut s2 = 0usize;
        while s2 < int2 as usize && op2.units[s2] == 0 {
            s2 += 1;
        }
        int2 -= s2 as i32;

        let buffer_len = self.units.len() as i32;
        if int1 + frac_len > buffer_len {
            if int1 > buffer_len {
                return false;
            }
            frac_len = buffer_len - int1;
        }

        self.fraction_len = op1.fraction_len.max(op2.fraction_len);
        self.integer_len = int_len * DIGIT_PER_UNIT;
        if self.fraction_len > frac_len * DIGIT_PER_UNIT {
            self.fraction_len = frac_len * DIGIT_PER_UNIT;
        }
        frac1 = frac1.min(frac_len);
        frac2 = frac2.min(frac_len);
        int2 = int2.min(int1);

        let mut w = (int_len + frac_len) as usize;
        let mut carry = 0;

        // region 1: the longer fraction tail
        let mut p1 = s1 + (int1 + frac1) as usize;
        let mut p2 = s2 + (int2 + frac2) as usize;
        let mut frac_fill = frac_len;
        if frac1 > frac2 {
            let stop1 = s1 + (int1 + frac2) as usize;
            while frac_fill > frac1 {
                w -= 1;
                self.units[w] = 0;
                frac_fill -= 1;
            }
            while p1 > stop1 {
                w -= 1;
                p1 -= 1;
                self.units[w] = op1.units[p1];
            }
        } else {
            let stop2 = s2 + (int2 + frac1) as usize;
            while frac_fill > frac2 {
                w -= 1;
                self.units[w] = 0;
                frac_fill -= 1;
            }
            while p2 > stop2 {
                w -= 1;
                p2 -= 1;
                self.units[w] = sub_sub(0, op2.units[p2], &mut carry);
            }
        }

        // region 2: the overlap down to the subtrahend's head
        while p2 > s2 {
            w -= 1;
            p1 -= 1;
            p2 -= 1;
            self.units[w] = sub_sub(op1.units[p1], op2.units[p2], &mut carry);
        }

        // region 3: the minuend's remaining head, borrow first
        while carry > 0 && p1 > s1 {
            w -= 1;
            p1 -= 1;
            self.units[w] = sub_sub(op1.units[p1], 0, &mut carry);
        }
        while p1 > s1 {
            w -= 1;
            p1 -= 1;
            self.units[w] = op1.units[p1];
        }

        while w > 0 {
            w -= 1;
            self.units[w] = 0;
        }

        self.set_sign(negative);
        true
    }

    /// Schoolbook product with 64-bit intermediates. Excess digits drop
    /// from the fraction side; an integer-side carry past the buffer is an
    /// overflow error.
    pub fn do_mul(&mut self, dec1: &Digits, dec2: &Digits) -> Result<bool> {
        let mut int1 = round_up(dec1.integer_len);
        let mut int2 = round_up(dec2.integer_len);
        let mut frac1 = round_up(dec1.fraction_len);
        let mut frac2 = round_up(dec2.fraction_len);
        let int_len = round_up(dec1.integer_len + dec2.integer_len);
        let mut frac_len = frac1 + frac2;

        let buffer_len = self.units.len() as i32;
        debug_assert!(buffer_len > 0);

        let mut adjusted_int = int_len;
        let mut adjusted_frac = frac_len;

        let mut truncated = false;
        if int_len + frac_len > buffer_len {
            if int_len > buffer_len {
                return Ok(false);
            }
            frac_len = buffer_len - int_len;
            truncated = true;
        }

        self.fraction_len = dec1.fraction_len + dec2.fraction_len;
        self.integer_len = int_len * DIGIT_PER_UNIT;

        if truncated {
            if self.fraction_len > frac_len * DIGIT_PER_UNIT {
                self.fraction_len = frac_len * DIGIT_PER_UNIT;
            }
            if self.integer_len > int_len * DIGIT_PER_UNIT {
                self.integer_len = int_len * DIGIT_PER_UNIT;
            }

            // shrink the read windows to what still lands in the buffer
            if adjusted_int > int_len {
                adjusted_int -= int_len;
                adjusted_frac = adjusted_int >> 1;
                int1 -= adjusted_frac;
                int2 -= adjusted_int - adjusted_frac;
                frac1 = 0;
                frac2 = 0;
            } else {
                adjusted_frac -= frac_len;
                adjusted_int = adjusted_frac >> 1;
                frac1 -= adjusted_int;
                frac2 -= adjusted_frac - adjusted_int;
            }
        }

        for unit in self.units.iter_mut() {
            *unit = 0;
        }

        let len1 = (int1 + frac1) as usize;
        let len2 = (int2 + frac2) as usize;
        let write_base = (int_len + frac_len) as usize;

        let mut i1 = len1;
        let mut start = write_base;
        while i1 > 0 {
            i1 -= 1;
            start -= 1;

            let mut carry: i64 = 0;
            let mut w = start as isize;
            let mut i2 = len2;
            while i2 > 0 {
                i2 -= 1;
                let two = dec1.units[i1] as i64 * dec2.units[i2] as i64;
                let high = two / DIGIT_BASE as i64;
                let low = two - high * DIGIT_BASE as i64;

                let mut tmp = self.units[w as usize] as i64 + low + carry;
                carry = if tmp >= DIGIT_BASE as i64 { 1 } else { 0 };
                if carry > 0 {
                    tmp -= DIGIT_BASE as i64;
                }
                if tmp >= DIGIT_BASE as i64 {
                    tmp -= DIGIT_BASE as i64;
                    carry += 1;
                }
                self.units[w as usize] = tmp as DigitUnit;
                carry += high;
                w -= 1;
            }

            while carry > 0 {
                if w < 0 {
                    return Err(Error::new(
                        ErrorKind::NumericValueOutOfRange,
                        "multiplication overflows the integer part".to_string(),
                    ));
                }
                let mut tmp = self.units[w as usize] as i64 + carry;
                carry = if tmp >= DIGIT_BASE as i64 { 1 } else { 0 };
                if carry > 0 {
                    tmp -= DIGIT_BASE as i64;
                }
                self.units[w as usize] = tmp as DigitUnit;
                w -= 1;
            }
        }

        // a zero product of oppositely signed operands is plain zero
        if dec1.negative != dec2.negative {
            let significant = &self.units[..write_base];
            if significant.iter().all(|&u| u == 0) {
                let fraction_len = self.fraction_len;
                self.make_zero(1, fraction_len);
                return Ok(true);
            }
        }

        // slide out whole leading zero units
        let mut lead = 0usize;
        let mut moved = (int_len + round_up(self.fraction_len)) as usize;
        while self.units[lead] == 0 && self.integer_len > DIGIT_PER_UNIT {
            lead += 1;
            self.integer_len -= DIGIT_PER_UNIT;
            moved -= 1;
        }
        if lead > 0 {
            for k in 0..moved {
                self.units[k] = self.units[k + lead];
            }
            for k in moved..moved + lead {
                self.units[k] = 0;
            }
        }

        self.set_sign(dec1.negative != dec2.negative);
        Ok(true)
    }

    /// Long division over base-10^9 units. The normalization factor applies
    /// to the guess only, not to a divisor copy.
    pub fn do_div(&mut self, dec1: &Digits, dec2: &Digits) -> Result<bool> {
        let frac_digits1 = round_up(dec1.fraction_len) * DIGIT_PER_UNIT;
        let mut prec1 = dec1.integer_len + frac_digits1;
        let frac_digits2 = round_up(dec2.fraction_len) * DIGIT_PER_UNIT;
        let mut prec2 = dec2.integer_len + frac_digits2;

        let buffer_len = self.units.len();
        debug_assert!(buffer_len > 0);

        // strip the divisor's leading zeroes, unit-wise then digit-wise
        let mut i2 = 0usize;
        let mut removed = ((prec2 - 1) % DIGIT_PER_UNIT) + 1;
        while prec2 > 0 && dec2.units[i2] == 0 {
            prec2 -= removed;
            removed = DIGIT_PER_UNIT;
            i2 += 1;
        }
        if prec2 <= 0 {
            return Err(Error::new(
                ErrorKind::DivisionByZero,
                "decimal division by zero".to_string(),
            ));
        }
        let mut r = (prec2 - 1) % DIGIT_PER_UNIT;
        while dec2.units[i2] < POWERS10[r as usize] {
            prec2 -= 1;
            r -= 1;
        }
        debug_assert!(prec2 > 0);

        // and the dividend's
        let mut i1 = 0usize;
        removed = ((prec1 - 1) % DIGIT_PER_UNIT) + 1;
        while prec1 > 0 && dec1.units[i1] == 0 {
            prec1 -= removed;
            removed = DIGIT_PER_UNIT;
            i1 += 1;
        }
        if prec1 <= 0 {
            self.make_zero(1, dec2.fraction_len);
            return Ok(true);
        }
        r = (prec1 - 1) % DIGIT_PER_UNIT;
        while dec1.units[i1] < POWERS10[r as usize] {
            prec1 -= 1;
            r -= 1;
        }
        debug_assert!(prec1 > 0);

        let int_num = (prec1 - frac_digits1) - (prec2 - frac_digits2)
            + (dec1.units[i1] >= dec2.units[i2]) as i32;
        let (leading_zero_units, int_units) = if int_num < 0 {
            ((-(int_num / DIGIT_PER_UNIT)) as usize, 0)
        } else {
            (0, round_up(int_num))
        };
        let frac_units = round_up(dec1.fraction_len + dec2.integer_len + 1);

        self.integer_len = int_units * DIGIT_PER_UNIT;
        self.fraction_len = dec1.fraction_len + dec2.integer_len + 1;

        let stop_w = (int_units + frac_units) as usize;
        let mut w = 0usize;
        let mut zeros = leading_zero_units;
        while zeros > 0 && w < stop_w {
            self.units[w] = 0;
            w += 1;
            zeros -= 1;
        }

        // working copy of the dividend, padded for the remainder shifts
        let mut len1 = (round_up(prec1) + round_up(2 * frac_digits2 + 1) + 1) as usize;
        len1 = len1.max(3);
        let mut tmp: Vec<DigitUnit> = Vec::with_capacity(len1);
        for k in 0..round_up(prec1) as usize {
            tmp.push(dec1.units[i1 + k]);
        }
        tmp.resize(len1, 0);

        let start2 = i2;
        let mut stop2 = i2 + round_up(prec2) as usize - 1;
        while stop2 >= start2 && dec2.units[stop2] == 0 {
            stop2 -= 1;
        }
        let len2 = stop2 - start2;
        let stop2 = stop2 + 1; // exclusive

        // normalized head of the divisor, for guessing only
        let norm_factor = (DIGIT_BASE as i64) / (dec2.units[start2] as i64 + 1);
        let mut norm2 = norm_factor * dec2.units[start2] as i64;
        if len2 > 0 {
            norm2 += norm_factor * dec2.units[start2 + 1] as i64 / DIGIT_BASE as i64;
        }

        let mut s1 = 0usize;
        let mut loops = 0usize;
        let mut dcarry: DigitUnit;
        if tmp[0] < dec2.units[start2] {
            dcarry = tmp[0];
            s1 += 1;
            loops += 1;
        } else {
            dcarry = 0;
        }

        while w < stop_w {
            if loops >= len1 {
                self.units[w] = 0;
                w += 1;
                loops += 1;
            } else if dcarry == 0 && tmp[s1] < dec2.units[start2] {
                self.units[w] = 0;
                w += 1;
                dcarry = tmp[s1];
                s1 += 1;
                loops += 1;
            } else {
                // D3: guess one quotient unit
                let first = tmp[s1] as i64 + dcarry as i64 * DIGIT_BASE as i64;
                let second = if s1 + 1 < len1 { tmp[s1 + 1] as i64 } else { 0 };
                let mut guess =
                    (norm_factor * first + norm_factor * second / DIGIT_BASE as i64) / norm2;
                if guess >= DIGIT_BASE as i64 {
                    guess = DIGIT_BASE as i64 - 1;
                }
                if len2 > 0 && start2 + 1 < stop2 {
                    // normalization was skipped on the divisor, correct here
                    if dec2.units[start2 + 1] as i64 * guess
                        > (first - guess * dec2.units[start2] as i64) * DIGIT_BASE as i64 + second
                    {
                        guess -= 1;
                    }
                    if dec2.units[start2 + 1] as i64 * guess
                        > (first - guess * dec2.units[start2] as i64) * DIGIT_BASE as i64 + second
                    {
                        guess -= 1;
                    }
                    debug_assert!(
                        dec2.units[start2 + 1] as i64 * guess
                            <= (first - guess * dec2.units[start2] as i64) * DIGIT_BASE as i64
                                + second
                    );
                }

                // D4: multiply and subtract
                if s1 + len2 >= len1 {
                    self.units[w] = guess as DigitUnit;
                    w += 1;
                    dcarry = tmp[s1];
                    s1 += 1;
                    loops += 1;
                    continue;
                }

                let divisor_units = stop2 - start2;
                let mut carry: i64 = 0;
                for k in 0..divisor_units {
                    let j2 = stop2 - 1 - k;
                    let j1 = s1 + len2 - k;
                    let product = guess * dec2.units[j2] as i64;
                    let high = product / DIGIT_BASE as i64;
                    let low = product - high * DIGIT_BASE as i64;

                    let mut unit = tmp[j1] as i64 - low - carry;
                    carry = if unit < 0 { 1 } else { 0 };
                    if carry > 0 {
                        unit += DIGIT_BASE as i64;
                    }
                    if unit < 0 {
                        unit += DIGIT_BASE as i64;
                        carry += 1;
                    }
                    tmp[j1] = unit as DigitUnit;
                    carry += high;
                }

                // D5: the remainder went negative when the head cannot
                // absorb the final borrow
                if (dcarry as i64) < carry {
                    // D6: correct the guess and add the divisor back
                    guess -= 1;
                    let mut add_carry = 0;
                    for k in 0..divisor_units {
                        let j2 = stop2 - 1 - k;
                        let j1 = s1 + len2 - k;
                        tmp[j1] = sub_add(tmp[j1], dec2.units[j2], &mut add_carry);
                    }
                }

                self.units[w] = guess as DigitUnit;
                w += 1;
                dcarry = tmp[s1];
                s1 += 1;
                loops += 1;
            }
        }

        self.set_sign(dec1.negative != dec2.negative);
        Ok(true)
    }

    /// Folding hash over the units, seeded with the shape
    pub fn hash_code(&self) -> u32 {
        let mut value: u32 = ((self.integer_len as u32) << 2)
            .wrapping_add(self.fraction_len as u32)
            .wrapping_add(self.negative as u32);
        for &unit in &self.units {
            value = value.wrapping_shl(4).wrapping_add(unit as u32);
            let g = value & (0xfu32 << 28);
            if g != 0 {
                value ^= g >> 24;
                value ^= g;
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits_from(integer_len: i32, fraction_len: i32, units: &[DigitUnit], negative: bool) -> Digits {
        let mut d = Digits::new();
        d.set_range(integer_len, fraction_len);
        d.units_mut().copy_from_slice(units);
        d.set_sign(negative);
        d
    }

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(0), 0);
        assert_eq!(round_up(1), 1);
        assert_eq!(round_up(9), 1);
        assert_eq!(round_up(10), 2);
        assert_eq!(round_up(18), 2);
        assert_eq!(round_up(19), 3);
    }

    #[test]
    fn test_set_to_max() {
        let mut d = Digits::new();
        d.set_to_max(11, 4);
        // 99 999999999 . 9999
        assert_eq!(d.units(), &[99, 999_999_999, 999_900_000]);

        d.set_to_max(9, 9);
        assert_eq!(d.units(), &[999_999_999, 999_999_999]);
    }

    #[test]
    fn test_do_compare() {
        let a = digits_from(9, 0, &[42], false);
        let b = digits_from(9, 0, &[41], false);
        assert_eq!(a.do_compare(&b), 1);
        assert_eq!(b.do_compare(&a), -1);
        assert_eq!(a.do_compare(&a), 0);

        // longer integer with zero surplus units compares equal
        let wide = digits_from(18, 0, &[0, 42], false);
        assert_eq!(wide.do_compare(&a), 0);

        // trailing fraction zeroes compare equal
        let frac = digits_from(9, 9, &[42, 0], false);
        assert_eq!(frac.do_compare(&a), 0);
        let frac_more = digits_from(9, 9, &[42, 500_000_000], false);
        assert_eq!(frac_more.do_compare(&a), 1);
        assert_eq!(a.do_compare(&frac_more), -1);
    }

    #[test]
    fn test_do_add_simple() {
        // 12.34 + 0.1 = 12.44 with 9-digit fraction units
        let a = digits_from(2, 2, &[12, 340_000_000], false);
        let b = digits_from(1, 1, &[0, 100_000_000], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Addition));

        assert!(result.do_add(&a, &b));
        assert!(!result.is_negative());
        assert_eq!(result.units(), &[12, 440_000_000]);
    }

    #[test]
    fn test_do_add_carry_across_units() {
        // 999999999 + 1 = 1000000000
        let a = digits_from(9, 0, &[999_999_999], false);
        let b = digits_from(1, 0, &[1], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Addition));

        assert!(result.do_add(&a, &b));
        assert_eq!(result.units(), &[1, 0]);
        assert_eq!(result.integer(), 18);
    }

    #[test]
    fn test_do_sub_swaps_and_flips() {
        let a = digits_from(9, 0, &[5], false);
        let b = digits_from(9, 0, &[9], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Subtraction));

        assert!(result.do_sub(&a, &b));
        assert!(result.is_negative());
        let (offset, int_len) = result.remove_leading_zeroes();
        assert_eq!(int_len, 1);
        assert_eq!(result.units()[offset], 4);
    }

    #[test]
    fn test_do_sub_borrow() {
        // 1000000000 - 1 = 999999999
        let a = digits_from(10, 0, &[1, 0], false);
        let b = digits_from(1, 0, &[1], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Subtraction));

        assert!(result.do_sub(&a, &b));
        let (offset, int_len) = result.remove_leading_zeroes();
        assert_eq!(int_len, 9);
        assert_eq!(result.units()[offset], 999_999_999);
    }

    #[test]
    fn test_do_sub_equal_is_positive_zero() {
        let a = digits_from(9, 0, &[7], true);
        let b = digits_from(9, 0, &[7], true);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Subtraction));

        assert!(result.do_sub(&a, &b));
        assert!(result.is_zero());
        assert!(!result.is_negative());
    }

    #[test]
    fn test_do_mul() {
        // 123456789 * 987654321
        let a = digits_from(9, 0, &[123_456_789], false);
        let b = digits_from(9, 0, &[987_654_321], true);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Multiplication));

        assert!(result.do_mul(&a, &b).unwrap());
        assert!(result.is_negative());
        // 121932631112635269 = 121932631 112635269
        assert_eq!(result.units(), &[121_932_631, 112_635_269]);
    }

    #[test]
    fn test_do_mul_zero_is_positive() {
        let a = digits_from(9, 0, &[0], true);
        let b = digits_from(9, 0, &[5], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Multiplication));

        assert!(result.do_mul(&a, &b).unwrap());
        assert!(result.is_zero());
        assert!(!result.is_negative());
    }

    #[test]
    fn test_do_div_exact() {
        // 84 / 2 = 42
        let a = digits_from(9, 0, &[84], false);
        let b = digits_from(9, 0, &[2], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Division));

        assert!(result.do_div(&a, &b).unwrap());
        let (offset, int_len) = result.remove_leading_zeroes();
        assert_eq!(int_len, 2);
        assert_eq!(result.units()[offset], 42);
        // everything after the integer part is zero
        assert!(result.units()[offset + 1..].iter().all(|&u| u == 0));
    }

    #[test]
    fn test_do_div_fraction() {
        // 1 / 8 = 0.125
        let a = digits_from(9, 0, &[1], false);
        let b = digits_from(9, 0, &[8], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Division));

        assert!(result.do_div(&a, &b).unwrap());
        let (_, int_len) = result.remove_leading_zeroes();
        assert_eq!(int_len, 0);
        // fraction starts right after the (all zero) integer units
        let frac_start = round_up(result.integer()) as usize;
        assert_eq!(result.units()[frac_start], 125_000_000);
    }

    #[test]
    fn test_do_div_by_zero() {
        let a = digits_from(9, 0, &[1], false);
        let b = digits_from(9, 9, &[0, 0], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Division));

        let err = result.do_div(&a, &b).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_do_div_sign() {
        let a = digits_from(9, 0, &[10], true);
        let b = digits_from(9, 0, &[2], false);
        let mut result = Digits::new();
        result.reset_units(a.calculate_result_size(&b, DataOperation::Division));

        assert!(result.do_div(&a, &b).unwrap());
        assert!(result.is_negative());
        let (offset, int_len) = result.remove_leading_zeroes();
        assert_eq!(int_len, 1);
        assert_eq!(result.units()[offset], 5);
    }

    #[test]
    fn test_hash_differs_by_sign_and_shape() {
        let a = digits_from(9, 0, &[42], false);
        let b = digits_from(9, 0, &[42], true);
        let c = digits_from(9, 9, &[42, 0], false);
        assert_ne!(a.hash_code(), b.hash_code());
        assert_ne!(a.hash_code(), c.hash_code());
    }
}
