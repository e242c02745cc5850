use std::sync::Arc;
use crate::coder::Coder;
use crate::core::types::DataUnit;
use crate::location::LocationIterator;

/// Iterator over a packed location entry.
///
/// Decoding is lazy: each `next` reads one gap and accumulates it into the
/// current location, which keeps the edge cases in one place.
pub struct CompressedLocationListIterator<'a> {
    data: &'a [DataUnit],
    start_bits: u32,
    end_bits: u32,
    number: u32,
    decoded: u32,
    cur_bits: u32,
    current_location: u32,
    coder: Arc<dyn Coder>,
    length: u32,        // token length, for the occurrence tail position
}

impl<'a> CompressedLocationListIterator<'a> {
    pub fn new(
        data: &'a [DataUnit],
        start_bits: u32,
        end_bits: u32,
        number: u32,
        coder: Arc<dyn Coder>,
    ) -> Self {
        let mut iterator = CompressedLocationListIterator {
            data,
            start_bits,
            end_bits,
            number,
            decoded: 0,
            cur_bits: start_bits,
            current_location: 0,
            coder,
            length: 0,
        };
        iterator.next();
        iterator
    }

    pub fn set_length(&mut self, length: u32) {
        self.length = length;
    }
}

impl<'a> LocationIterator for CompressedLocationListIterator<'a> {
    fn next(&mut self) {
        if self.decoded >= self.number {
            // already past the last entry
            self.decoded = self.number + 1;
            return;
        }
        let mut gap = 0;
        if !self.coder.get(&mut gap, self.data, self.end_bits, &mut self.cur_bits) {
            unreachable!("packed location list shorter than its element count");
        }
        self.current_location += gap;
        self.decoded += 1;
    }

    fn reset(&mut self) {
        self.decoded = 0;
        self.cur_bits = self.start_bits;
        self.current_location = 0;
        self.next();
    }

    fn is_end(&self) -> bool {
        self.decoded > self.number
    }

    fn location(&self) -> u32 {
        self.current_location
    }

    fn end_location(&self) -> u32 {
        self.current_location + self.length
    }

    fn find(&mut self, target: u32) -> bool {
        if self.coder.has_direct_find() {
            if self.coder.find(target, self.data, self.end_bits, self.start_bits) {
                self.cur_bits = self.start_bits + target;
                self.current_location = target;
                return true;
            }
            return false;
        }
        self.lower_bound(target) && self.location() == target
    }

    fn frequency(&self) -> u32 {
        self.number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::{ParameterizedExpGolombCoder, UnaryCoder};

    fn packed(coder: &Arc<dyn Coder>, locations: &[u32]) -> (Vec<DataUnit>, u32) {
        let mut buf = vec![0u32; 16];
        let mut tail = 0;
        let mut last = 0;
        for &l in locations {
            assert!(coder.append(l - last, &mut buf, 16 * 32, &mut tail));
            last = l;
        }
        (buf, tail)
    }

    #[test]
    fn test_lazy_decode() {
        let coder: Arc<dyn Coder> = Arc::new(ParameterizedExpGolombCoder::new(0).unwrap());
        let locations = [3u32, 7, 11, 15, 20];
        let (buf, tail) = packed(&coder, &locations);

        let mut it = CompressedLocationListIterator::new(&buf, 0, tail, 5, coder.clone());
        it.set_length(2);
        let mut seen = Vec::new();
        while !it.is_end() {
            assert_eq!(it.end_location(), it.location() + 2);
            seen.push(it.location());
            it.next();
        }
        assert_eq!(seen, locations);

        it.reset();
        assert_eq!(it.location(), 3);
        assert_eq!(it.frequency(), 5);
    }

    #[test]
    fn test_lower_bound() {
        let coder: Arc<dyn Coder> = Arc::new(ParameterizedExpGolombCoder::new(0).unwrap());
        let (buf, tail) = packed(&coder, &[3, 7, 11, 15, 20]);
        let mut it = CompressedLocationListIterator::new(&buf, 0, tail, 5, coder);

        assert!(it.lower_bound(8));
        assert_eq!(it.location(), 11);
        assert!(it.lower_bound(11));
        assert_eq!(it.location(), 11);
        assert!(!it.lower_bound(21));
        assert!(it.is_end());
    }

    #[test]
    fn test_unary_direct_find() {
        let coder: Arc<dyn Coder> = Arc::new(UnaryCoder::new());
        let (buf, tail) = packed(&coder, &[3, 7, 12]);
        let mut it = CompressedLocationListIterator::new(&buf, 0, tail, 3, coder);

        assert!(it.find(7));
        assert_eq!(it.location(), 7);
        assert!(!it.find(8));
        assert!(it.find(12));
        assert_eq!(it.location(), 12);
    }
}
