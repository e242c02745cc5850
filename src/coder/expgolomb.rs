use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DataUnit;
use crate::coder::{Coder, floor_log2, parse_int_field, read_bits, test_bit, write_bits};

/// Parameterized Exp-Golomb codec.
///
/// lambda = 0 is ordinary Elias gamma; larger lambda spends lambda fixed
/// low bits per value and shortens the prefix, biasing toward larger
/// expected values.
///
/// A value v >= 1 is coded as the gamma code of ((v-1) >> lambda) + 1
/// followed by the lambda low bits of v-1.
pub struct ParameterizedExpGolombCoder {
    lambda: u32,
}

impl ParameterizedExpGolombCoder {
    pub fn new(lambda: i32) -> Result<Self> {
        if !(0..32).contains(&lambda) {
            return Err(Error::new(
                ErrorKind::InvalidCoderArgument,
                format!("lambda={} out of [0,32)", lambda),
            ));
        }
        Ok(ParameterizedExpGolombCoder { lambda: lambda as u32 })
    }

    /// Parse the textual parameter form: a decimal lambda, "" meaning 0.
    pub fn parse(description: &str) -> Result<Self> {
        let lambda = parse_int_field(description)?.unwrap_or(0);
        if !(0..32).contains(&lambda) {
            return Err(Error::new(
                ErrorKind::InvalidCoderParameterDescription,
                format!("description '{}' is invalid: lambda={}", description, lambda),
            ));
        }
        Ok(ParameterizedExpGolombCoder { lambda: lambda as u32 })
    }

    pub fn lambda(&self) -> u32 {
        self.lambda
    }
}

impl Coder for ParameterizedExpGolombCoder {
    fn bit_length(&self, value: u32) -> u32 {
        debug_assert!(value >= 1);
        let upper = ((value - 1) >> self.lambda) + 1;
        2 * floor_log2(upper) + 1 + self.lambda
    }

    fn append(&self, value: u32, buf: &mut [DataUnit], cap_bits: u32, tail_bits: &mut u32) -> bool {
        let upper = ((value - 1) >> self.lambda) + 1;
        let prefix = floor_log2(upper);
        let length = 2 * prefix + 1 + self.lambda;
        if *tail_bits + length > cap_bits {
            return false;
        }

        let mut at = *tail_bits;
        write_bits(buf, at, 0, prefix);
        at += prefix;
        // upper carries its leading 1 bit; the low lambda bits follow
        let low = if self.lambda == 0 { 0 } else { (value - 1) & ((1u32 << self.lambda) - 1) };
        write_bits(buf, at, (upper << self.lambda) | low, prefix + 1 + self.lambda);

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
                panic!("truncated Exp-Golomb code in packed stream");
            }
        }
        if at + prefix + 1 + self.lambda > end_bits {
            panic!("truncated Exp-Golomb code in packed stream");
        }

        let upper = read_bits(buf, at, prefix + 1);
        at += prefix + 1;
        let low = read_bits(buf, at, self.lambda);
        at += self.lambda;

        *value = ((upper - 1) << self.lambda) + low + 1;
        *cur_bits = at;
        true
    }

    fn description(&self) -> String {
        format!("PEG:{}", self.lambda)
    }
}
