use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DataUnit;
use crate::coder::{Coder, floor_log2, parse_int_field, read_bits, test_bit, write_bits};

/// Extended Golomb codec.
///
/// A value v >= 1 splits into q = (v-1)/factor and r = (v-1)%factor.
/// q+1 is coded as Parameterized Exp-Golomb with the given lambda, then r
/// follows in a fixed field wide enough for factor-1. factor = 1 stores no
/// remainder and reproduces the parameterized coder bit-for-bit.
pub struct ExtendedGolombCoder {
    lambda: u32,
    factor: u32,
    remainder_bits: u32,
}

impl ExtendedGolombCoder {
    pub fn new(lambda: i32, factor: i32) -> Result<Self> {
        if !(0..32).contains(&lambda) {
            return Err(Error::new(
                ErrorKind::InvalidCoderArgument,
                format!("lambda={} out of [0,32)", lambda),
            ));
        }
        if !(1..32).contains(&factor) {
            return Err(Error::new(
                ErrorKind::InvalidCoderArgument,
                format!("factor={} out of [1,32)", factor),
            ));
        }
        let factor = factor as u32;
        let remainder_bits = if factor == 1 { 0 } else { 32 - (factor - 1).leading_zeros() };
        Ok(ExtendedGolombCoder { lambda: lambda as u32, factor, remainder_bits })
    }

    /// Parse the textual parameter form "lambda:factor"; either part may be
    /// omitted ("" and "0" and "0:1" all mean lambda 0, factor 1).
    pub fn parse(description: &str) -> Result<Self> {
        let mut lambda: i64 = 0;
        let mut factor: i64 = 1;

        for (count, field) in description.split(':').enumerate() {
            let value = match parse_int_field(field)? {
                Some(v) => v,
                None => continue,
            };
            match count {
                0 => {
                    if !(0..32).contains(&value) {
                        return Err(Error::new(
                            ErrorKind::InvalidCoderParameterDescription,
                            format!("description '{}' is invalid: lambda={}", description, value),
                        ));
                    }
                    lambda = value;
                }
                1 => {
                    if !(1..32).contains(&value) {
                        return Err(Error::new(
                            ErrorKind::InvalidCoderParameterDescription,
                            format!("description '{}' is invalid: factor={}", description, value),
                        ));
                    }
                    factor = value;
                }
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidCoderParameterDescription,
                        format!("description '{}' is invalid", description),
                    ));
                }
            }
        }

        Self::new(lambda as i32, factor as i32)
    }

    #[inline]
    fn quotient_bit_length(&self, quotient: u32) -> u32 {
        let upper = ((quotient - 1) >> self.lambda) + 1;
        2 * floor_log2(upper) + 1 + self.lambda
    }
}

impl Coder for ExtendedGolombCoder {
    fn bit_length(&self, value: u32) -> u32 {
        debug_assert!(value >= 1);
        let quotient = (value - 1) / self.factor + 1;
        self.quotient_bit_length(quotient) + self.remainder_bits
    }

    fn append(&self, value: u32, buf: &mut [DataUnit], cap_bits: u32, tail_bits: &mut u32) -> bool {
        let quotient = (value - 1) / self.factor + 1;
        let remainder = (value - 1) % self.factor;
        let length = self.quotient_bit_length(quotient) + self.remainder_bits;
        if *tail_bits + length > cap_bits {
            return false;
        }

        let mut at = *tail_bits;
        let upper = ((quotient - 1) >> self.lambda) + 1;
        let prefix = floor_log2(upper);
        write_bits(buf, at, 0, prefix);
        at += prefix;
        let low = if self.lambda == 0 { 0 } else { (quotient - 1) & ((1u32 << self.lambda) - 1) };
        write_bits(buf, at, (upper << self.lambda) | low, prefix + 1 + self.lambda);
        at += prefix + 1 + self.lambda;
        write_bits(buf, at, remainder, self.remainder_bits);

        *tail_bits += length;
        true
    }

    fn get(&self, value: &mut u32, buf: &[DataUnit], end_bits: u32, cur_bits: &mut u32) -> bool {
        if *cur_bits == end_bits {
            return false;
        }

        let mut at = *cur_bits;
        let mut prefix = 0u32;
        while !test_bit(buf, at) {
            prefix += 1;
            at += 1;
            if at == end_bits {
                panic!("truncated extended Golomb code in packed stream");
            }
        }
        if at + prefix + 1 + self.lambda + self.remainder_bits > end_bits {
            panic!("truncated extended Golomb code in packed stream");
        }

        let upper = read_bits(buf, at, prefix + 1);
        at += prefix + 1;
        let low = read_bits(buf, at, self.lambda);
        at += self.lambda;
        let quotient = ((upper - 1) << self.lambda) + low + 1;
        let remainder = read_bits(buf, at, self.remainder_bits);
        at += self.remainder_bits;

        *value = (quotient - 1) * self.factor + remainder + 1;
        *cur_bits = at;
        true
    }

    fn description(&self) -> String {
        format!("EXG:{}:{}", self.lambda, self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::ParameterizedExpGolombCoder;

    #[test]
    fn test_roundtrip() {
        for (lambda, factor) in [(0, 1), (0, 3), (1, 5), (2, 16), (3, 31)] {
            let coder = ExtendedGolombCoder::new(lambda, factor).unwrap();
            let values = [1u32, 2, 3, 5, 16, 31, 32, 100, 1023, 65537, (1 << 31) - 1];

            let mut buf = vec![0u32; 64];
            let mut tail = 0;
            for &v in &values {
                let before = tail;
                assert!(coder.append(v, &mut buf, 64 * 32, &mut tail));
                assert_eq!(tail - before, coder.bit_length(v));
            }

            let mut cur = 0;
            for &v in &values {
                let mut decoded = 0;
                assert!(coder.get(&mut decoded, &buf, tail, &mut cur));
                assert_eq!(decoded, v, "lambda={} factor={} value={}", lambda, factor, v);
            }
            assert_eq!(cur, tail);
        }
    }

    #[test]
    fn test_factor_one_matches_parameterized() {
        let ext = ExtendedGolombCoder::new(2, 1).unwrap();
        let peg = ParameterizedExpGolombCoder::new(2).unwrap();
        use crate::coder::Coder;

        for v in [1u32, 2, 9, 100, 4096] {
            assert_eq!(ext.bit_length(v), peg.bit_length(v));

            let mut buf_ext = vec![0u32; 4];
            let mut buf_peg = vec![0u32; 4];
            let (mut te, mut tp) = (0, 0);
            assert!(ext.append(v, &mut buf_ext, 128, &mut te));
            assert!(peg.append(v, &mut buf_peg, 128, &mut tp));
            assert_eq!(te, tp);
            assert_eq!(buf_ext, buf_peg);
        }
    }

    #[test]
    fn test_parse_forms() {
        let c = ExtendedGolombCoder::parse("").unwrap();
        assert_eq!(c.description(), "EXG:0:1");
        let c = ExtendedGolombCoder::parse("0").unwrap();
        assert_eq!(c.description(), "EXG:0:1");
        let c = ExtendedGolombCoder::parse("1:5").unwrap();
        assert_eq!(c.description(), "EXG:1:5");
        let c = ExtendedGolombCoder::parse(":5").unwrap();
        assert_eq!(c.description(), "EXG:0:5");
        assert!(ExtendedGolombCoder::parse("1:0").is_err());
        assert!(ExtendedGolombCoder::parse("1:32").is_err());
        assert!(ExtendedGolombCoder::parse("1:5:7").is_err());
    }

    #[test]
    fn test_append_refusal_is_atomic() {
        let coder = ExtendedGolombCoder::new(0, 3).unwrap();
        let mut buf = vec![0u32; 1];
        let mut tail = 0;
        assert!(coder.append(2, &mut buf, 32, &mut tail));
        let saved = (tail, buf[0]);
        assert!(!coder.append(1 << 20, &mut buf, 32, &mut tail));
        assert_eq!((tail, buf[0]), saved);
    }
}
