use serde::{Serialize, Deserialize};

/// Storage unit of packed bit streams: one 32-bit word.
/// Bit 0 of a stream is the most significant bit of word 0.
pub type DataUnit = u32;

/// Number of bits in one DataUnit
pub const UNIT_BITS: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> DocId {
        DocId(self.0 + 1)
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// Ranking score attached to a document
pub type DocumentScore = f64;

/// Match mode for word-unit search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatchMode {
    Simple,       // term delimited by word boundaries on both sides
    ExactWord,    // interior boundaries must line up as well
    WordHead,     // boundary required at the head only
    WordTail,     // boundary required at the tail only
    Approximate,  // boundary at either end is enough
}
