use crate::core::types::TermMatchMode;
use crate::location::{LocationIterator, SmartLocationList};

/// Position iterator for word-unit matching.
///
/// Combines a term's occurrence iterator with the occurrence iterator of
/// the empty string, which hits exactly at the word boundaries of the
/// document. An occurrence survives when the boundaries required by the
/// match mode are present around (and, for exact matching, inside) it.
pub struct WordNodeLocationIterator<'a> {
    term: Box<dyn LocationIterator + 'a>,
    boundary: Box<dyn LocationIterator + 'a>,
    mode: TermMatchMode,
    word_length: u32,
    // separator positions inside the query term, relative to its head;
    // consulted by exact matching only
    token_boundary: Option<&'a SmartLocationList>,
    at_end: bool,
}

impl<'a> WordNodeLocationIterator<'a> {
    pub fn new(
        term: Box<dyn LocationIterator + 'a>,
        boundary: Box<dyn LocationIterator + 'a>,
        mode: TermMatchMode,
        word_length: u32,
        token_boundary: Option<&'a SmartLocationList>,
    ) -> Self {
        let mut this = WordNodeLocationIterator {
            term,
            boundary,
            mode,
            word_length,
            token_boundary,
            at_end: false,
        };
        this.raw_next();
        this
    }

    pub fn word_length(&self) -> u32 {
        self.word_length
    }

    /// Membership test on the boundary list. The boundary iterator only
    /// moves forward, so rewind it when the probe is behind the cursor.
    fn boundary_contains(&mut self, position: u32) -> bool {
        if self.boundary.is_end() || self.boundary.location() > position {
            self.boundary.reset();
        }
        self.boundary.find(position)
    }

    /// Exact matching: the separators inside the occurrence must be the
    /// term's own interior separators, nothing more and nothing less.
    fn interior_matches(&mut self) -> bool {
        let head = self.term.location();
        let tail = self.term.end_location();
        let token_boundary = match self.token_boundary {
            Some(list) => list,
            None => return true, // short-word case, same as simple matching
        };

        let mut expected = token_boundary.begin();
        self.boundary.reset();
        self.boundary.lower_bound(head + 1);
        loop {
            let in_document = if self.boundary.is_end() {
                None
            } else {
                let l = self.boundary.location();
                if l < tail { Some(l) } else { None }
            };
            let in_term = if expected.is_end() {
                None
            } else {
                Some(head + expected.location())
            };
            match (in_document, in_term) {
                (None, None) => return true,
                (Some(a), Some(b)) if a == b => {
                    self.boundary.next();
                    expected.next();
                }
                _ => return false,
            }
        }
    }

    fn matches(&mut self) -> bool {
        let head = self.term.location();
        let tail = self.term.end_location();
        match self.mode {
            TermMatchMode::Simple => {
                self.boundary_contains(head) && self.boundary_contains(tail)
            }
            TermMatchMode::ExactWord => {
                self.boundary_contains(head)
                    && self.boundary_contains(tail)
                    && self.interior_matches()
            }
            TermMatchMode::WordHead => self.boundary_contains(head),
            TermMatchMode::WordTail => self.boundary_contains(tail),
            TermMatchMode::Approximate => {
                self.boundary_contains(head) || self.boundary_contains(tail)
            }
        }
    }

    /// Advance until the mode's constraint holds; stay put if it already
    /// does.
    fn raw_next(&mut self) {
        loop {
            if self.term.is_end() {
                self.at_end = true;
                return;
            }
            if self.matches() {
                self.at_end = false;
                return;
            }
            self.term.next();
        }
    }
}

impl<'a> LocationIterator for WordNodeLocationIterator<'a> {
    fn next(&mut self) {
        self.term.next();
        self.raw_next();
    }

    fn reset(&mut self) {
        self.at_end = false;
        self.term.reset();
        self.boundary.reset();
        self.raw_next();
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn location(&self) -> u32 {
        self.term.location()
    }

    fn end_location(&self) -> u32 {
        self.term.end_location()
    }

    fn release(&mut self) {
        self.term.release();
        self.boundary.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::coder::{Coder, ParameterizedExpGolombCoder};
    use crate::location::iterator::CompressedLocationListIterator;
    use crate::core::types::DataUnit;

    fn gamma() -> Arc<dyn Coder> {
        Arc::new(ParameterizedExpGolombCoder::new(0).unwrap())
    }

    fn list_of(values: &[u32]) -> SmartLocationList {
        let mut list = SmartLocationList::new(gamma());
        for &v in values {
            list.push_back(v);
        }
        list
    }

    fn packed_with_length(values: &[u32], length: u32) -> (Vec<DataUnit>, u32, u32) {
        let coder = gamma();
        let mut buf = vec![0u32; 16];
        let mut tail = 0;
        let mut last = 0;
        for &v in values {
            assert!(coder.append(v - last, &mut buf, 16 * 32, &mut tail));
            last = v;
        }
        (buf, tail, length)
    }

    fn term_iterator<'a>(
        data: &'a (Vec<DataUnit>, u32, u32),
        count: u32,
    ) -> Box<dyn LocationIterator + 'a> {
        let mut it = CompressedLocationListIterator::new(&data.0, 0, data.1, count, gamma());
        it.set_length(data.2);
        Box::new(it)
    }

    #[test]
    fn test_simple_word_mode() {
        // term of length 3 at positions 1, 5, 12; boundaries at 5, 8, 20
        let term = packed_with_length(&[1, 5, 12], 3);
        let boundary = list_of(&[5, 8, 20]);

        let mut it = WordNodeLocationIterator::new(
            term_iterator(&term, 3),
            boundary.begin(),
            TermMatchMode::Simple,
            3,
            None,
        );

        // only the occurrence at 5 has boundaries at both 5 and 8
        assert!(!it.is_end());
        assert_eq!(it.location(), 5);
        it.next();
        assert!(it.is_end());
    }

    #[test]
    fn test_word_head_and_tail_modes() {
        let term = packed_with_length(&[1, 5, 12], 3);
        let boundary = list_of(&[1, 4, 5, 8, 20]);

        let mut head = WordNodeLocationIterator::new(
            term_iterator(&term, 3),
            boundary.begin(),
            TermMatchMode::WordHead,
            3,
            None,
        );
        assert_eq!(head.location(), 1);
        head.next();
        assert_eq!(head.location(), 5);
        head.next();
        assert!(head.is_end());

        let mut tail = WordNodeLocationIterator::new(
            term_iterator(&term, 3),
            boundary.begin(),
            TermMatchMode::WordTail,
            3,
            None,
        );
        assert_eq!(tail.location(), 1); // ends at 4, which is a boundary
        tail.next();
        assert_eq!(tail.location(), 5);
        tail.next();
        assert!(tail.is_end());
    }

    #[test]
    fn test_exact_word_mode() {
        // compound term of length 7 with an interior separator 3 past its
        // head; document boundaries 1, 4, 8 wrap and split position 1
        let term = packed_with_length(&[1, 10], 7);
        let boundary = list_of(&[1, 4, 8, 10, 17]);
        let interior = list_of(&[3]);

        let mut it = WordNodeLocationIterator::new(
            term_iterator(&term, 2),
            boundary.begin(),
            TermMatchMode::ExactWord,
            7,
            Some(&interior),
        );
        // at 1: boundaries 1 and 8 wrap it, interior 4 == 1+3 matches
        assert_eq!(it.location(), 1);
        it.next();
        // at 10: tail 17 is a boundary but the interior 13 is missing
        assert!(it.is_end());
    }

    #[test]
    fn test_approximate_mode() {
        let term = packed_with_length(&[1, 5, 12], 3);
        let boundary = list_of(&[4, 20]);

        let mut it = WordNodeLocationIterator::new(
            term_iterator(&term, 3),
            boundary.begin(),
            TermMatchMode::Approximate,
            3,
            None,
        );
        // 1 ends at 4 (boundary); 5 and 12 touch no boundary
        assert_eq!(it.location(), 1);
        it.next();
        assert!(it.is_end());
    }
}
