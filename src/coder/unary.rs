use crate::core::types::DataUnit;
use crate::coder::{Coder, clear_bit, set_bit, test_bit};

/// Unary codec, used for the location-within-word bitmap.
///
/// A gap g occupies g bits: g-1 clear bits then one set bit. Because the
/// gaps of a 1-based increasing location list carry an implicit leading
/// zero, the set bit for location L lands at stream offset L-1, so `find`
/// resolves a location with a single bit test instead of sequential decode.
pub struct UnaryCoder;

impl UnaryCoder {
    pub fn new() -> Self {
        UnaryCoder
    }
}

impl Default for UnaryCoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Coder for UnaryCoder {
    fn bit_length(&self, value: u32) -> u32 {
        debug_assert!(value >= 1);
        value
    }

    fn append(&self, value: u32, buf: &mut [DataUnit], cap_bits: u32, tail_bits: &mut u32) -> bool {
        if *tail_bits + value > cap_bits {
            return false;
        }
        for i in 0..value - 1 {
            clear_bit(buf, *tail_bits + i);
        }
        set_bit(buf, *tail_bits + value - 1);
        *tail_bits += value;
        true
    }

    fn get(&self, value: &mut u32, buf: &[DataUnit], end_bits: u32, cur_bits: &mut u32) -> bool {
        if *cur_bits == end_bits {
            return false;
        }
        let mut at = *cur_bits;
        while !test_bit(buf, at) {
            at += 1;
            if at == end_bits {
                panic!("truncated unary code in packed stream");
            }
        }
        *value = at - *cur_bits + 1;
        *cur_bits = at + 1;
        true
    }

    fn find(&self, target: u32, buf: &[DataUnit], end_bits: u32, start_bits: u32) -> bool {
        debug_assert!(target >= 1);
        let at = start_bits + target - 1;
        at < end_bits && test_bit(buf, at)
    }

    fn has_direct_find(&self) -> bool {
        true
    }

    fn description(&self) -> String {
        "UNA".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let coder = UnaryCoder::new();
        let gaps = [3u32, 4, 1, 1, 9, 2];

        let mut buf = vec![0u32; 2];
        let mut tail = 0;
        for &g in &gaps {
            assert_eq!(coder.bit_length(g), g);
            assert!(coder.append(g, &mut buf, 64, &mut tail));
        }
        assert_eq!(tail, gaps.iter().sum::<u32>());

        let mut cur = 0;
        for &g in &gaps {
            let mut decoded = 0;
            assert!(coder.get(&mut decoded, &buf, tail, &mut cur));
            assert_eq!(decoded, g);
        }
        assert!(!coder.get(&mut 0, &buf, tail, &mut cur));
    }

    #[test]
    fn test_find_is_direct_bit_test() {
        // gaps 3, 4 describe locations 3 and 7
        let coder = UnaryCoder::new();
        let mut buf = vec![0u32; 1];
        let mut tail = 0;
        assert!(coder.append(3, &mut buf, 32, &mut tail));
        assert!(coder.append(4, &mut buf, 32, &mut tail));

        assert!(coder.find(3, &buf, tail, 0));
        assert!(coder.find(7, &buf, tail, 0));
        assert!(!coder.find(1, &buf, tail, 0));
        assert!(!coder.find(4, &buf, tail, 0));
        assert!(!coder.find(8, &buf, tail, 0)); // past the end
    }

    #[test]
    fn test_append_refusal_is_atomic() {
        let coder = UnaryCoder::new();
        let mut buf = vec![0u32; 1];
        let mut tail = 0;
        assert!(coder.append(30, &mut buf, 32, &mut tail));
        let saved = (tail, buf[0]);
        assert!(!coder.append(3, &mut buf, 32, &mut tail));
        assert_eq!((tail, buf[0]), saved);
    }
}
