use std::sync::Arc;
use crate::coder::{self, Coder};
use crate::core::types::DataUnit;
use crate::location::{CompressedLocationListIterator, LocationIterator};

/// Smallest dynamically allocated area, in units
pub const MINIMUM_UNIT_NUM: usize = 4;

/// Growth block once the area is large, in units
pub const BLOCK_UNIT_NUM: usize = 1024;

#[derive(Clone)]
enum Repr {
    Inline { first: u32, second: u32 },
    Unpacked { data: [u32; MINIMUM_UNIT_NUM] },
    Packed { area: Vec<DataUnit> },
}

/// In-document occurrence list that keeps small lists cheap.
///
/// Storage passes through three one-way states as values arrive:
///
/// 1. up to two values live directly in the two inline fields
/// 2. up to four values live raw in a 4-unit area
/// 3. beyond four, the area holds the last raw value in word 0, the tail
///    bit offset in word 1, and coder-packed gaps from word 2 on
pub struct SmartLocationList {
    coder: Arc<dyn Coder>,
    count: u32,
    repr: Repr,
}

impl SmartLocationList {
    pub fn new(coder: Arc<dyn Coder>) -> Self {
        SmartLocationList {
            coder,
            count: 0,
            repr: Repr::Inline { first: 0, second: 0 },
        }
    }

    pub fn set_coder(&mut self, coder: Arc<dyn Coder>) {
        self.coder = coder;
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.repr = Repr::Inline { first: 0, second: 0 };
    }

    /// Append a value after all current ones. Values must arrive strictly
    /// increasing.
    pub fn push_back(&mut self, value: u32) {
        match self.count {
            0 => {
                self.repr = Repr::Inline { first: value, second: 0 };
            }
            1 => {
                if let Repr::Inline { first, .. } = self.repr {
                    self.repr = Repr::Inline { first, second: value };
                }
            }
            2 => {
                // move the inline values into an allocated area
                if let Repr::Inline { first, second } = self.repr {
                    self.repr = Repr::Unpacked { data: [first, second, value, 0] };
                }
            }
            3 => {
                if let Repr::Unpacked { ref mut data } = self.repr {
                    data[3] = value;
                }
            }
            4 => {
                // repack everything stored so far through the coder
                if let Repr::Unpacked { data } = self.repr {
                    self.repr = Repr::Packed { area: vec![0; MINIMUM_UNIT_NUM] };
                    for v in data {
                        self.append(v);
                    }
                    self.append(value);
                }
            }
            _ => {
                self.append(value);
            }
        }
        self.count += 1;
    }

    /// Overwrite the head value of an empty or single-element list
    pub fn set_first_value(&mut self, value: u32) {
        debug_assert!(self.count <= 1);
        self.count = 1;
        self.repr = Repr::Inline { first: value, second: 0 };
    }

    /// Compress one more value into the packed area, growing it as needed
    fn append(&mut self, value: u32) {
        let Repr::Packed { ref mut area } = self.repr else {
            unreachable!("append on an unpacked location list");
        };

        debug_assert!(value > area[0]);
        let gap = value - area[0];

        loop {
            let cap_bits = ((area.len() - 2) as u32) << 5;
            let (head, packed) = area.split_at_mut(2);
            if self.coder.append(gap, packed, cap_bits, &mut head[1]) {
                break;
            }
            // no room in the current area, grow and retry
            let old = area.len();
            let grown = if old >= BLOCK_UNIT_NUM { old + BLOCK_UNIT_NUM } else { old * 2 };
            area.resize(grown, 0);
        }
        area[0] = value;
    }

    pub fn begin(&self) -> Box<dyn LocationIterator + '_> {
        match self.repr {
            Repr::Packed { ref area } if self.count > 4 => Box::new(
                CompressedLocationListIterator::new(
                    &area[2..],
                    0,
                    area[1],
                    self.count,
                    self.coder.clone(),
                ),
            ),
            Repr::Unpacked { data } => Box::new(SimpleIterator2 {
                position: 0,
                count: self.count,
                data,
            }),
            _ => {
                let (first, second) = match self.repr {
                    Repr::Inline { first, second } => (first, second),
                    _ => (0, 0),
                };
                Box::new(SimpleIterator1 {
                    position: 0,
                    count: self.count,
                    first,
                    second,
                })
            }
        }
    }

    pub fn size(&self) -> u32 {
        self.count
    }

    /// Total coded bit length: stored verbatim when packed, recomputed from
    /// the raw values otherwise
    pub fn bit_length(&self) -> u32 {
        match self.repr {
            Repr::Packed { ref area } => area[1],
            Repr::Unpacked { data } => {
                let mut bits = 0;
                debug_assert!(data[0] > 0);
                bits += self.coder.bit_length(data[0]);
                bits += self.coder.bit_length(data[1] - data[0]);
                bits += self.coder.bit_length(data[2] - data[1]);
                if self.count == 4 {
                    bits += self.coder.bit_length(data[3] - data[2]);
                }
                bits
            }
            Repr::Inline { first, second } => match self.count {
                0 => 0,
                1 => self.coder.bit_length(first),
                _ => self.coder.bit_length(first) + self.coder.bit_length(second - first),
            },
        }
    }

    /// Units of the allocated area, 0 while the values are inline
    pub fn unit_num(&self) -> u32 {
        match self.repr {
            Repr::Inline { .. } => 0,
            Repr::Unpacked { .. } => MINIMUM_UNIT_NUM as u32,
            Repr::Packed { ref area } => area.len() as u32,
        }
    }

    /// Own footprint in bytes, allocated area included
    pub fn data_size(&self) -> usize {
        let heap = match self.repr {
            Repr::Packed { ref area } => area.len() * std::mem::size_of::<DataUnit>(),
            _ => 0,
        };
        std::mem::size_of::<Self>() + heap
    }

    pub fn get(&self, index: u32) -> u32 {
        debug_assert!(index < self.count);
        match self.repr {
            Repr::Inline { first, second } => {
                if index == 0 { first } else { second }
            }
            Repr::Unpacked { data } => data[index as usize],
            Repr::Packed { ref area } => {
                let mut iterator = CompressedLocationListIterator::new(
                    &area[2..],
                    0,
                    area[1],
                    self.count,
                    self.coder.clone(),
                );
                for _ in 0..index {
                    iterator.next();
                }
                iterator.location()
            }
        }
    }

    /// Copy the packed bits onto a destination stream, advancing its tail.
    /// Only meaningful once the list is packed.
    pub fn copy(&self, target: &mut [DataUnit], bit_offset: &mut u32) {
        let Repr::Packed { ref area } = self.repr else {
            unreachable!("copy on an unpacked location list");
        };
        debug_assert!(self.count > 4);
        coder::move_bits(&area[2..], 0, area[1], *bit_offset, target);
        *bit_offset += area[1];
    }
}

/// Iterator for lists of one or two values
struct SimpleIterator1 {
    position: u32,
    count: u32,
    first: u32,
    second: u32,
}

impl LocationIterator for SimpleIterator1 {
    fn next(&mut self) {
        if self.position < self.count {
            self.position += 1;
        }
    }

    fn reset(&mut self) {
        self.position = 0;
    }

    fn is_end(&self) -> bool {
        self.position == self.count
    }

    fn location(&self) -> u32 {
        match self.position {
            0 => self.first,
            1 => self.second,
            _ => 0,
        }
    }

    fn end_location(&self) -> u32 {
        self.location()
    }
}

/// Iterator for lists of three or four values
struct SimpleIterator2 {
    position: u32,
    count: u32,
    data: [u32; MINIMUM_UNIT_NUM],
}

impl LocationIterator for SimpleIterator2 {
    fn next(&mut self) {
        if self.position < self.count {
            self.position += 1;
        }
    }

    fn reset(&mut self) {
        self.position = 0;
    }

    fn is_end(&self) -> bool {
        self.position == self.count
    }

    fn location(&self) -> u32 {
        if self.position < self.count {
            self.data[self.position as usize]
        } else {
            0
        }
    }

    fn end_location(&self) -> u32 {
        self.location()
    }
}
