pub mod posting;
pub mod term_index;

pub use posting::{PostingBuffer, PostingCoders, PostingList};
pub use term_index::{Term, TermIndex, TermInfo};
