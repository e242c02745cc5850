pub mod digits;
pub mod dump;

use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use crate::core::error::{Error, ErrorKind, Result};
use digits::{DataOperation, Digits, DIGIT_BASE, DIGIT_PER_UNIT, POWERS10, round_up};

pub use digits::{DigitUnit, DataOperation as Operation};

/// Default cap on operation result precision, in decimal digits
pub const MAX_PRECISION: i32 = 38;

/// Fixed-point signed decimal with a declared (precision, scale).
///
/// The value itself lives in base-10^9 units; precision and scale describe
/// the declared type, which arithmetic results widen within the
/// `MAX_PRECISION` cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decimal {
    pub(crate) precision: i32,
    pub(crate) scale: i32,
    pub(crate) value: Digits,
}

impl Decimal {
    /// An all-zero value of the given declared type
    pub fn new(precision: i32, scale: i32) -> Self {
        debug_assert!(precision > 0 && scale >= 0 && scale <= precision);
        let mut value = Digits::new();
        value.set_range(precision - scale, scale);
        Decimal { precision, scale, value }
    }

    pub fn precision(&self) -> i32 {
        self.precision
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_negative()
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn digits(&self) -> &Digits {
        &self.value
    }

    pub fn make_zero(&mut self) {
        let (integer, fraction) = (self.precision - self.scale, self.scale);
        self.value.make_zero(integer, fraction);
    }

    /// Largest representable value of the declared type
    pub fn set_to_max(&mut self) {
        let fraction = if self.scale < 0 { 0 } else { self.scale };
        self.value.set_to_max(self.precision - self.scale, fraction);
    }

    /// Smallest (most negative) representable value
    pub fn set_to_min(&mut self) {
        self.set_to_max();
        self.value.set_sign(true);
    }

    pub fn negate(&mut self) {
        let negative = self.value.is_negative();
        self.value.set_sign(!negative);
    }

    pub fn abs(&mut self) {
        self.value.set_sign(false);
    }

    /// Total order consistent across signs
    pub fn compare(&self, other: &Decimal) -> Ordering {
        if self.value.is_negative() == other.value.is_negative() {
            let bigger = self.value.do_compare(&other.value);
            let bigger = if self.value.is_negative() { -bigger } else { bigger };
            match bigger {
                0 => Ordering::Equal,
                b if b < 0 => Ordering::Less,
                _ => Ordering::Greater,
            }
        } else if self.value.is_negative() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// The declared type of an operation result, clamped to the precision
    /// cap with the excess removed from the fraction side.
    pub fn operation_precision_scale(
        precision1: i32,
        scale1: i32,
        precision2: i32,
        scale2: i32,
        operation: DataOperation,
        max_precision: i32,
    ) -> (i32, i32) {
        let (mut precision, mut scale) = match operation {
            DataOperation::Addition | DataOperation::Subtraction => {
                let integer = (precision1 - scale1).max(precision2 - scale2) + 1;
                let scale = scale1.max(scale2);
                (integer + scale, scale)
            }
            DataOperation::Multiplication => (precision1 + precision2, scale1 + scale2),
            DataOperation::Division => {
                (precision1 + precision2 + 1, scale1 - scale2 + precision2 + 1)
            }
        };
        if precision > max_precision {
            scale = 0.max(max_precision - (precision - scale));
            precision = max_precision;
        }
        (precision, scale)
    }

    /// Arithmetic; None means the result is NULL (non-assignment context)
    pub fn operate(&self, operation: DataOperation, other: &Decimal) -> Result<Option<Decimal>> {
        let mut result = Digits::new();
        result.reset_units(self.value.calculate_result_size(&other.value, operation));

        let same_sign = self.value.is_negative() == other.value.is_negative();
        let ok = match operation {
            DataOperation::Addition => {
                if same_sign {
                    result.do_add(&self.value, &other.value)
                } else {
                    result.do_sub(&self.value, &other.value)
                }
            }
            DataOperation::Subtraction => {
                if same_sign {
                    result.do_sub(&self.value, &other.value)
                } else {
                    result.do_add(&self.value, &other.value)
                }
            }
            DataOperation::Multiplication => result.do_mul(&self.value, &other.value)?,
            DataOperation::Division => result.do_div(&self.value, &other.value)?,
        };

        if !ok {
            return Ok(None);
        }
        let scale = result.fraction();
        let precision = result.integer() + scale;
        Ok(Some(Decimal { precision, scale, value: result }))
    }

    pub fn add(&self, other: &Decimal) -> Result<Decimal> {
        self.operate(DataOperation::Addition, other)?
            .ok_or_else(|| Error::new(ErrorKind::NumericValueOutOfRange, "decimal add overflow".to_string()))
    }

    pub fn sub(&self, other: &Decimal) -> Result<Decimal> {
        self.operate(DataOperation::Subtraction, other)?
            .ok_or_else(|| Error::new(ErrorKind::NumericValueOutOfRange, "decimal sub overflow".to_string()))
    }

    pub fn mul(&self, other: &Decimal) -> Result<Decimal> {
        self.operate(DataOperation::Multiplication, other)?
            .ok_or_else(|| Error::new(ErrorKind::NumericValueOutOfRange, "decimal mul overflow".to_string()))
    }

    pub fn div(&self, other: &Decimal) -> Result<Decimal> {
        self.operate(DataOperation::Division, other)?
            .ok_or_else(|| Error::new(ErrorKind::NumericValueOutOfRange, "decimal div overflow".to_string()))
    }

    /// Parse a literal into this declared type.
    ///
    /// In assignment context errors raise; otherwise a false return means
    /// the result is NULL. A fresh (unranged) value adopts the literal's
    /// own precision and scale.
    pub fn cast_from_string(&mut self, text: &str, for_assign: bool) -> Result<bool> {
        let bytes = text.as_bytes();
        let mut head = 0usize;
        let mut tail = bytes.len();
        while tail - head > 1 && bytes[head] == b' ' {
            head += 1;
        }
        while tail - head > 1 && bytes[tail - 1] == b' ' {
            tail -= 1;
        }

        let mut negative = false;
        if tail - head > 1 && (bytes[head] == b'+' || bytes[head] == b'-') {
            negative = bytes[head] == b'-';
            head += 1;
        }

        // one pass: mantissa digits around an optional period, then an
        // optional exponent
        let mut integer_digits: Vec<u8> = Vec::new();
        let mut fraction_digits: Vec<u8> = Vec::new();
        let mut exponent_text = String::new();
        let mut seen_period = false;
        let mut seen_exponent = false;
        let mut all_zero = true;

        let mut at = head;
        while at < tail {
            let c = bytes[at];
            if (c == b'E' || c == b'e') && !seen_exponent && at + 1 < tail {
                seen_exponent = true;
                at += 1;
                if at < tail && (bytes[at] == b'+' || bytes[at] == b'-') {
                    exponent_text.push(bytes[at] as char);
                    at += 1;
                }
                continue;
            }
            if c == b'.' && !seen_period && !seen_exponent {
                seen_period = true;
                at += 1;
                continue;
            }
            if c.is_ascii_digit() {
                if seen_exponent {
                    exponent_text.push(c as char);
                } else {
                    if !seen_period {
                        // leading integer zeroes carry no information
                        if !integer_digits.is_empty() || c != b'0' {
                            integer_digits.push(c - b'0');
                        }
                    } else {
                        fraction_digits.push(c - b'0');
                    }
                    if all_zero && c != b'0' {
                        all_zero = false;
                    }
                }
                at += 1;
                continue;
            }
            if for_assign {
                return Err(Error::new(
                    ErrorKind::InvalidCharacter,
                    format!("'{}' is not a decimal literal", text),
                ));
            }
            return Ok(false);
        }

        if all_zero {
            if self.value.integer() == 0 && self.value.fraction() == 0 {
                self.value.set_range(1, 0);
                self.precision = 1;
                self.scale = 0;
            }
            self.make_zero();
            return Ok(true);
        }

        let exponent: i32 = exponent_text.parse().unwrap_or(0);
        let integer_length = integer_digits.len() as i32;
        let fraction_length = fraction_digits.len() as i32;

        let integer_part_is_zero = exponent < 0 && integer_length <= -exponent;

        let integer_digit = if integer_part_is_zero { 1 } else { integer_length + exponent };
        let fraction_digit = if fraction_length < exponent { 0 } else { fraction_length - exponent };

        // assemble the digit string shifted by the exponent
        let mut all_digits: Vec<u8> = Vec::new();
        if integer_part_is_zero {
            all_digits.push(0);
            for _ in 0..(-exponent - integer_length) {
                all_digits.push(0);
            }
        }
        all_digits.extend_from_slice(&integer_digits);
        all_digits.extend_from_slice(&fraction_digits);
        for _ in 0..(exponent - fraction_length).max(0) {
            all_digits.push(0);
        }

        // a fresh value adopts the literal's own type
        if self.value.integer() == 0 && self.value.fraction() == 0 {
            self.value.set_range(integer_digit, fraction_digit);
            self.precision = integer_digit + fraction_digit;
            self.scale = fraction_digit;
        }

        let own_integer = self.value.integer();
        if integer_digit > own_integer && !integer_part_is_zero {
            if for_assign {
                return Err(Error::new(
                    ErrorKind::NumericValueOutOfRange,
                    format!("'{}' does not fit precision {} scale {}", text, self.precision, self.scale),
                ));
            }
            return Ok(false);
        }
        let own_fraction = self.value.fraction();

        let unit_len = self.value.unit_len();
        self.value.reset_units(unit_len);

        let integer_units = round_up(own_integer) as usize;

        // integer digits pack from the boundary downwards
        {
            let units = self.value.units_mut();
            let mut unit_value: DigitUnit = 0;
            let mut in_unit = 0usize;
            let mut write = integer_units;
            let mut remaining = own_integer;
            let mut read = integer_digit as usize;
            while remaining > 0 && read > 0 {
                read -= 1;
                unit_value += all_digits[read] as DigitUnit * POWERS10[in_unit];
                in_unit += 1;
                if in_unit == DIGIT_PER_UNIT as usize {
                    write -= 1;
                    units[write] = unit_value;
                    unit_value = 0;
                    in_unit = 0;
                }
                remaining -= 1;
            }
            if in_unit > 0 {
                write -= 1;
                units[write] = unit_value;
            }
        }

        // fraction digits pack forward, the tail left aligned
        if own_fraction > 0 {
            let units = self.value.units_mut();
            let mut unit_value: DigitUnit = 0;
            let mut in_unit = 0usize;
            let mut write = integer_units;
            let mut remaining = own_fraction;
            let mut read = integer_digit as usize;
            let total = all_digits.len();
            while remaining > 0 && read < total {
                unit_value = all_digits[read] as DigitUnit + unit_value * 10;
                read += 1;
                in_unit += 1;
                if in_unit == DIGIT_PER_UNIT as usize {
                    units[write] = unit_value;
                    write += 1;
                    unit_value = 0;
                    in_unit = 0;
                }
                remaining -= 1;
            }
            if in_unit > 0 {
                units[write] = unit_value * POWERS10[DIGIT_PER_UNIT as usize - in_unit];
            }
        }

        self.value.set_sign(negative);
        Ok(true)
    }

    /// Literal with its own inherent type
    pub fn from_string(text: &str) -> Result<Decimal> {
        let mut value = Decimal { precision: 0, scale: 0, value: Digits::new() };
        value.cast_from_string(text, true)?;
        Ok(value)
    }

    fn count_digits_u64(mut value: u64) -> i32 {
        let mut digits = 1;
        while value > 9 {
            digits += 1;
            value /= 10;
        }
        digits
    }

    /// Integer cast into this declared type
    pub fn cast_from_i64(&mut self, value: i64, for_assign: bool) -> Result<bool> {
        let negative = value < 0;
        let magnitude = value.unsigned_abs();
        self.cast_from_magnitude(magnitude, negative, for_assign)
    }

    pub fn cast_from_u64(&mut self, value: u64, for_assign: bool) -> Result<bool> {
        self.cast_from_magnitude(value, false, for_assign)
    }

    fn cast_from_magnitude(&mut self, magnitude: u64, negative: bool, for_assign: bool) -> Result<bool> {
        let digit_count = Self::count_digits_u64(magnitude);

        if self.value.integer() == 0 && self.value.fraction() == 0 {
            self.value.set_range(digit_count, 0);
            self.precision = digit_count;
            self.scale = 0;
        }
        if digit_count > self.value.integer() {
            if magnitude == 0 {
                self.make_zero();
                return Ok(true);
            }
            if for_assign {
                return Err(Error::new(
                    ErrorKind::NumericValueOutOfRange,
                    format!("{} does not fit precision {}", magnitude, self.precision),
                ));
            }
            return Ok(false);
        }
        debug_assert!(self.value.integer() > 0);

        let unit_len = self.value.unit_len();
        self.value.reset_units(unit_len);
        let integer_units = round_up(self.value.integer()) as usize;
        {
            let units = self.value.units_mut();
            let mut write = integer_units;
            let mut next = magnitude;
            while write > 0 {
                write -= 1;
                units[write] = (next % DIGIT_BASE as u64) as DigitUnit;
                next /= DIGIT_BASE as u64;
            }
        }
        self.value.set_sign(negative);
        Ok(true)
    }

    /// Double cast goes through the printed form; round-tripping IEEE
    /// doubles exactly is not attempted.
    pub fn cast_from_f64(&mut self, value: f64, for_assign: bool) -> Result<bool> {
        if !value.is_finite() {
            if for_assign {
                return Err(Error::new(
                    ErrorKind::NumericValueOutOfRange,
                    format!("{} is not a finite number", value),
                ));
            }
            return Ok(false);
        }
        let printed = format!("{:.14E}", value);
        self.cast_from_string(&printed, for_assign)
    }

    /// Checked accumulation of the integer part
    pub fn to_i64(&self) -> Result<i64> {
        let mut result: i64 = 0;
        let integer_units = round_up(self.value.integer()) as usize;
        let units = self.value.units();

        if self.value.is_negative() {
            for &unit in &units[..integer_units] {
                if result < i64::MIN / DIGIT_BASE as i64 {
                    return Err(out_of_range());
                }
                result *= DIGIT_BASE as i64;
                if result < i64::MIN + unit as i64 {
                    return Err(out_of_range());
                }
                result -= unit as i64;
            }
        } else {
            for &unit in &units[..integer_units] {
                if result > i64::MAX / DIGIT_BASE as i64 {
                    return Err(out_of_range());
                }
                result *= DIGIT_BASE as i64;
                if result > i64::MAX - unit as i64 {
                    return Err(out_of_range());
                }
                result += unit as i64;
            }
        }
        Ok(result)
    }

    pub fn to_i32(&self) -> Result<i32> {
        let wide = self.to_i64()?;
        i32::try_from(wide).map_err(|_| out_of_range())
    }

    pub fn to_u64(&self) -> Result<u64> {
        if self.value.is_negative() {
            return Err(out_of_range());
        }
        let mut result: u64 = 0;
        let integer_units = round_up(self.value.integer()) as usize;
        for &unit in &self.value.units()[..integer_units] {
            if result > u64::MAX / DIGIT_BASE as u64 {
                return Err(out_of_range());
            }
            result *= DIGIT_BASE as u64;
            if result > u64::MAX - unit as u64 {
                return Err(out_of_range());
            }
            result += unit as u64;
        }
        Ok(result)
    }

    pub fn to_u32(&self) -> Result<u32> {
        let wide = self.to_u64()?;
        u32::try_from(wide).map_err(|_| out_of_range())
    }

    pub fn to_f64(&self) -> f64 {
        let integer_units = round_up(self.value.integer()) as usize;
        let fraction_units = round_up(self.value.fraction()) as usize;
        let units = self.value.units();

        let mut result = 0f64;
        for &unit in &units[..integer_units] {
            result = result * DIGIT_BASE as f64 + unit as f64;
        }
        let mut fraction = 0f64;
        for &unit in &units[integer_units..integer_units + fraction_units] {
            fraction = fraction * DIGIT_BASE as f64 + unit as f64;
        }
        result += fraction / (DIGIT_BASE as f64).powi(fraction_units as i32);
        if self.value.is_negative() { -result } else { result }
    }

    /// Printable form without leading zeroes
    pub fn to_plain_string(&self) -> String {
        let (offset, integer_len) = self.value.remove_leading_zeroes();
        let fraction_len = self.value.fraction();
        let units = self.value.units();

        let mut out = String::new();
        if self.value.is_negative() {
            out.push('-');
        }

        if integer_len > 0 {
            let integer_units = round_up(integer_len) as usize;
            for (i, &unit) in units[offset..offset + integer_units].iter().enumerate() {
                if i == 0 {
                    out.push_str(&unit.to_string());
                } else {
                    out.push_str(&format!("{:09}", unit));
                }
            }
        } else {
            out.push('0');
        }

        if fraction_len > 0 {
            out.push('.');
            let start = offset + round_up(integer_len) as usize;
            let fraction_units = round_up(fraction_len) as usize;
            for (i, &unit) in units[start..start + fraction_units].iter().enumerate() {
                let printed = format!("{:09}", unit);
                if i + 1 == fraction_units {
                    let keep = fraction_len % DIGIT_PER_UNIT;
                    let keep = if keep > 0 { keep as usize } else { DIGIT_PER_UNIT as usize };
                    out.push_str(&printed[..keep]);
                } else {
                    out.push_str(&printed);
                }
            }
        }
        out
    }

    /// Whether the value survives re-declaration as (precision, scale)
    /// without losing digits
    pub fn can_no_lost_cast_to(&self, precision: i32, scale: i32) -> bool {
        let (offset, integer_len) = self.value.remove_leading_zeroes();
        if integer_len > precision - scale {
            return false;
        }
        if self.scale <= scale {
            return true;
        }

        let units = self.value.units();
        let start = offset + round_up(integer_len) as usize;
        let end = start + round_up(self.scale) as usize;

        let mut effective = -1i32;
        for (i, &unit) in units[start..end].iter().enumerate() {
            if unit != 0 {
                effective = i as i32;
            }
        }
        if effective == -1 {
            return true;
        }
        if effective <= round_up(scale) - 1 {
            let unit = units[start + effective as usize];
            let tail = scale - scale / DIGIT_PER_UNIT * DIGIT_PER_UNIT;
            let power = POWERS10[(DIGIT_PER_UNIT - tail) as usize];
            if unit == unit / power * power {
                return true;
            }
        }
        false
    }

    /// Re-declare another value as this declared type, truncating the
    /// fraction at the unit boundary; a too-large integer part raises.
    pub fn assign(&mut self, other: &Decimal) -> Result<()> {
        let own_integer = self.value.integer();
        let own_fraction = self.value.fraction();
        if (own_integer == 0 && own_fraction == 0)
            || (own_integer == other.value.integer() && own_fraction == other.value.fraction())
        {
            self.precision = other.precision;
            self.scale = other.scale;
            self.value = other.value.clone();
            return Ok(());
        }

        let (offset, integer_len) = other.value.remove_leading_zeroes();
        if own_integer < integer_len {
            return Err(out_of_range());
        }

        let unit_len = self.value.unit_len();
        self.value.reset_units(unit_len);

        let own_integer_units = round_up(own_integer) as usize;
        let other_integer_units = round_up(other.value.integer()) as usize;
        let keep_integer_units = round_up(integer_len) as usize;
        let keep_fraction_units =
            (round_up(other.value.fraction()) as usize).min(round_up(own_fraction) as usize);

        // the fraction tail must drop cleanly at the declared scale
        let cut_digits = if other.value.fraction() > own_fraction {
            ((DIGIT_PER_UNIT - own_fraction % DIGIT_PER_UNIT) % DIGIT_PER_UNIT) as usize
        } else {
            0
        };
        let power = POWERS10[cut_digits];

        {
            let other_units = other.value.units();
            let units = self.value.units_mut();
            for k in 0..keep_integer_units {
                units[own_integer_units - 1 - k] =
                    other_units[offset + keep_integer_units - 1 - k];
            }
            for k in 0..keep_fraction_units {
                let unit = other_units[other_integer_units + k];
                units[own_integer_units + k] = if k + 1 == keep_fraction_units && cut_digits > 0 {
                    (unit / power) * power
                } else {
                    unit
                };
            }
        }

        self.value.set_sign(other.value.is_negative());
        Ok(())
    }

    /// Planner-grade hash; not cryptographic
    pub fn hash_code(&self) -> u32 {
        ((self.precision as u32) << 8)
            .wrapping_add((self.scale as u32) << 4)
            .wrapping_add(self.value.hash_code())
    }
}

fn out_of_range() -> Error {
    Error::new(ErrorKind::NumericValueOutOfRange, "decimal out of range".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(precision: i32, scale: i32, text: &str) -> Decimal {
        let mut value = Decimal::new(precision, scale);
        value.cast_from_string(text, true).unwrap();
        value
    }

    #[test]
    fn test_cast_from_string_plain() {
        let value = decimal(5, 2, "12.34");
        assert_eq!(value.digits().units(), &[12, 340_000_000]);
        assert!(!value.is_negative());
        assert_eq!(value.to_plain_string(), "12.34");

        let negative = decimal(5, 2, "-1.50");
        assert!(negative.is_negative());
        assert_eq!(negative.to_plain_string(), "-1.50");
    }

    #[test]
    fn test_cast_from_string_exponent() {
        // 1.23E-4 at (10,8) is 0.00012300
        let value = decimal(10, 8, "1.23E-4");
        assert_eq!(value.digits().units(), &[0, 123_000]);
        assert_eq!(value.to_plain_string(), "0.00012300");

        let value = decimal(10, 0, "1.5E3");
        assert_eq!(value.to_plain_string(), "1500");
    }

    #[test]
    fn test_cast_from_string_zero_and_errors() {
        let zero = decimal(5, 2, "0.00");
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        let mut narrow = Decimal::new(3, 0);
        let err = narrow.cast_from_string("1234", true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NumericValueOutOfRange);
        assert!(!narrow.cast_from_string("1234", false).unwrap());

        let err = narrow.cast_from_string("12a4", true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCharacter);
    }

    #[test]
    fn test_from_string_adopts_inherent_type() {
        let value = Decimal::from_string("123.456").unwrap();
        assert_eq!(value.precision(), 6);
        assert_eq!(value.scale(), 3);
        assert_eq!(value.to_plain_string(), "123.456");
    }

    #[test]
    fn test_add_example() {
        let a = decimal(5, 2, "12.34");
        let b = decimal(5, 2, "0.1");
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.to_plain_string(), "12.44");
        assert_eq!(sum.digits().units()[sum.digits().unit_len() - 1], 440_000_000);
    }

    #[test]
    fn test_add_sub_inverse() {
        let cases = [
            ("12.34", "0.1"),
            ("0.05", "99.95"),
            ("-5.5", "2.25"),
            ("123456789123.456", "0.544"),
        ];
        for (x, y) in cases {
            let a = Decimal::from_string(x).unwrap();
            let b = Decimal::from_string(y).unwrap();
            let back = a.add(&b).unwrap().sub(&b).unwrap();
            assert_eq!(back.compare(&a), Ordering::Equal, "({} + {}) - {}", x, y, y);
        }
    }

    #[test]
    fn test_mixed_sign_addition() {
        let a = Decimal::from_string("5.5").unwrap();
        let b = Decimal::from_string("-2.25").unwrap();
        assert_eq!(a.add(&b).unwrap().to_plain_string(), "3.25");
        assert_eq!(b.add(&a).unwrap().to_plain_string(), "3.25");
        assert_eq!(a.sub(&b).unwrap().to_plain_string(), "7.75");
        assert_eq!(b.sub(&a).unwrap().to_plain_string(), "-7.75");
    }

    #[test]
    fn test_compare_total_order() {
        let values = [
            decimal(5, 2, "-1.50"),
            decimal(5, 2, "-1.05"),
            decimal(5, 2, "0"),
            decimal(5, 2, "0.99"),
            decimal(5, 2, "1.05"),
            decimal(5, 2, "999.99"),
        ];
        for i in 0..values.len() {
            assert_eq!(values[i].compare(&values[i]), Ordering::Equal);
            for j in i + 1..values.len() {
                assert_eq!(values[i].compare(&values[j]), Ordering::Less);
                assert_eq!(values[j].compare(&values[i]), Ordering::Greater);
            }
        }
    }

    #[test]
    fn test_multiplication() {
        let a = Decimal::from_string("12.5").unwrap();
        let b = Decimal::from_string("-8.04").unwrap();
        let product = a.mul(&b).unwrap();
        assert_eq!(product.to_plain_string(), "-100.500");
    }

    #[test]
    fn test_division() {
        // quotient scale is s1 + (p2 - s2) + 1, so 1/8 at (1,0) keeps two
        // fraction digits
        let a = Decimal::from_string("1").unwrap();
        let b = Decimal::from_string("8").unwrap();
        let quotient = a.div(&b).unwrap();
        assert_eq!(quotient.to_plain_string(), "0.12");

        // wider dividend scale keeps the exact expansion
        let a = Decimal::from_string("1.00").unwrap();
        let quotient = a.div(&b).unwrap();
        assert_eq!(quotient.compare(&Decimal::from_string("0.125").unwrap()), Ordering::Equal);

        let err = a.div(&Decimal::from_string("0").unwrap()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_division_repeating() {
        let a = Decimal::from_string("1").unwrap();
        let b = Decimal::from_string("3").unwrap();
        let quotient = a.div(&b).unwrap();
        // truncated expansion of one third
        assert!(quotient.to_plain_string().starts_with("0.33"));
    }

    #[test]
    fn test_integer_casts() {
        // 13 digits do not fit 10: NULL result outside assignment
        let mut value = Decimal::new(10, 0);
        assert!(!value.cast_from_i64(-1234567890123, false).unwrap());
        assert!(value.cast_from_i64(-1234567890123, true).is_err());

        let mut value = Decimal::new(15, 2);
        assert!(value.cast_from_i64(-1234567890123, true).unwrap());
        assert_eq!(value.to_plain_string(), "-1234567890123.00");
        assert_eq!(value.to_i64().unwrap(), -1234567890123);

        let mut value = Decimal::new(20, 0);
        assert!(value.cast_from_u64(u64::MAX, true).unwrap());
        assert_eq!(value.to_u64().unwrap(), u64::MAX);
        assert!(value.to_i64().is_err());
    }

    #[test]
    fn test_double_casts() {
        let mut value = Decimal::new(10, 4);
        assert!(value.cast_from_f64(1.5, true).unwrap());
        assert_eq!(value.to_plain_string(), "1.5000");
        assert!((value.to_f64() - 1.5).abs() < 1e-12);

        let mut value = Decimal::new(10, 4);
        assert!(value.cast_from_f64(-0.0625, true).unwrap());
        assert_eq!(value.to_plain_string(), "-0.0625");

        let mut value = Decimal::new(10, 4);
        assert!(value.cast_from_f64(f64::INFINITY, false).is_ok());
        assert!(!value.cast_from_f64(f64::INFINITY, false).unwrap());
    }

    #[test]
    fn test_to_f64() {
        let value = decimal(12, 3, "123456789.125");
        assert!((value.to_f64() - 123456789.125).abs() < 1e-3);

        let negative = decimal(5, 2, "-1.25");
        assert!((negative.to_f64() + 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_operation_precision_scale() {
        // addition widens the integer side by one digit
        let (p, s) = Decimal::operation_precision_scale(5, 2, 4, 3, DataOperation::Addition, MAX_PRECISION);
        assert_eq!((p, s), (7, 3));

        let (p, s) = Decimal::operation_precision_scale(5, 2, 4, 3, DataOperation::Multiplication, MAX_PRECISION);
        assert_eq!((p, s), (9, 5));

        // the cap trims the fraction side first
        let (p, s) = Decimal::operation_precision_scale(30, 10, 20, 10, DataOperation::Multiplication, MAX_PRECISION);
        assert_eq!(p, 38);
        assert_eq!(s, 38 - 30);
    }

    #[test]
    fn test_set_to_max_min() {
        let mut value = Decimal::new(5, 2);
        value.set_to_max();
        assert_eq!(value.to_plain_string(), "999.99");
        value.set_to_min();
        assert_eq!(value.to_plain_string(), "-999.99");
    }

    #[test]
    fn test_assign_re_declares() {
        let source = Decimal::from_string("12.345").unwrap();
        let mut wider = Decimal::new(10, 4);
        wider.assign(&source).unwrap();
        assert_eq!(wider.to_plain_string(), "12.3450");

        let mut narrow = Decimal::new(3, 0);
        let source = Decimal::from_string("1234").unwrap();
        assert!(narrow.assign(&source).is_err());
    }

    #[test]
    fn test_can_no_lost_cast_to() {
        let value = Decimal::from_string("12.30").unwrap();
        assert!(value.can_no_lost_cast_to(5, 2));
        assert!(value.can_no_lost_cast_to(4, 1)); // trailing zero drops cleanly
        assert!(!value.can_no_lost_cast_to(3, 2)); // integer would not fit

        let precise = Decimal::from_string("12.34").unwrap();
        assert!(!precise.can_no_lost_cast_to(4, 1));
    }

    #[test]
    fn test_hash_is_stable_and_discriminates() {
        let a = decimal(5, 2, "12.34");
        let b = decimal(5, 2, "12.34");
        let c = decimal(5, 2, "12.35");
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a.hash_code(), c.hash_code());
    }
}
