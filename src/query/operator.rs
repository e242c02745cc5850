use crate::core::types::{DocId, TermMatchMode};
use crate::location::{
    EndNodeLocationIterator, LocationIterator, LocationNodeLocationIterator, SmartLocationList,
    WordNodeLocationIterator,
};
use crate::query::DocumentIterator;

/// Keeps the documents where the child has an occurrence ending at a fixed
/// position, the tail displaced by `distance`.
pub struct OperatorEndNode {
    child: Box<dyn DocumentIterator>,
    end_location: u32,
    distance: u32,
    at_end: bool,
    tf: u32,
}

impl OperatorEndNode {
    pub fn new(child: Box<dyn DocumentIterator>, end_location: u32, distance: u32) -> Self {
        let mut node = OperatorEndNode { child, end_location, distance, at_end: false, tf: 0 };
        node.align(DocId(1));
        node
    }

    fn matches(&mut self) -> u32 {
        let (end_location, distance) = (self.end_location, self.distance);
        let locations = match self.child.locations() {
            Some(locations) => locations,
            None => return 0,
        };
        let mut iterator = EndNodeLocationIterator::new(locations, end_location, distance);
        let mut count = 0;
        while !iterator.is_end() {
            count += 1;
            iterator.next();
        }
        count
    }

    fn align(&mut self, mut target: DocId) -> bool {
        loop {
            if !self.child.lower_bound(target) {
                self.at_end = true;
                return false;
            }
            let tf = self.matches();
            if tf > 0 {
                self.tf = tf;
                self.at_end = false;
                return true;
            }
            target = self.child.doc_id().next();
        }
    }
}

impl DocumentIterator for OperatorEndNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let current = self.doc_id();
        self.align(current.next());
    }

    fn reset(&mut self) {
        self.child.reset();
        self.at_end = false;
        self.align(DocId(1));
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        self.align(doc)
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn doc_id(&self) -> DocId {
        self.child.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.tf
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        let (end_location, distance) = (self.end_location, self.distance);
        match self.child.locations() {
            Some(l) => Some(Box::new(EndNodeLocationIterator::new(l, end_location, distance))),
            None => None,
        }
    }
}

/// Keeps the documents where the child occurs at one fixed position.
pub struct OperatorLocationNode {
    child: Box<dyn DocumentIterator>,
    location: u32,
    at_end: bool,
    tf: u32,
}

impl OperatorLocationNode {
    pub fn new(child: Box<dyn DocumentIterator>, location: u32) -> Self {
        let mut node = OperatorLocationNode { child, location, at_end: false, tf: 0 };
        node.align(DocId(1));
        node
    }

    fn matches(&mut self) -> u32 {
        let location = self.location;
        let locations = match self.child.locations() {
            Some(locations) => locations,
            None => return 0,
        };
        let mut iterator = LocationNodeLocationIterator::new(locations, location);
        let mut count = 0;
        while !iterator.is_end() {
            count += 1;
            iterator.next();
        }
        count
    }

    fn align(&mut self, mut target: DocId) -> bool {
        loop {
            if !self.child.lower_bound(target) {
                self.at_end = true;
                return false;
            }
            let tf = self.matches();
            if tf > 0 {
                self.tf = tf;
                self.at_end = false;
                return true;
            }
            target = self.child.doc_id().next();
        }
    }
}

impl DocumentIterator for OperatorLocationNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let current = self.doc_id();
        self.align(current.next());
    }

    fn reset(&mut self) {
        self.child.reset();
        self.at_end = false;
        self.align(DocId(1));
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        self.align(doc)
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn doc_id(&self) -> DocId {
        self.child.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.tf
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        let location = self.location;
        match self.child.locations() {
            Some(l) => Some(Box::new(LocationNodeLocationIterator::new(l, location))),
            None => None,
        }
    }
}

/// Word-unit search: a term combined with the empty-string (word boundary)
/// node of the same section, matched per the mode.
pub struct OperatorWordNode {
    term: Box<dyn DocumentIterator>,
    boundary: Box<dyn DocumentIterator>,
    mode: TermMatchMode,
    word_length: u32,
    token_boundary: Option<SmartLocationList>,
    at_end: bool,
    tf: u32,
}

impl OperatorWordNode {
    pub fn new(
        term: Box<dyn DocumentIterator>,
        boundary: Box<dyn DocumentIterator>,
        mode: TermMatchMode,
        word_length: u32,
        token_boundary: Option<SmartLocationList>,
    ) -> Self {
        let mut node = OperatorWordNode {
            term,
            boundary,
            mode,
            word_length,
            token_boundary,
            at_end: false,
            tf: 0,
        };
        node.align(DocId(1));
        node
    }

    fn matches(&mut self) -> u32 {
        let term_locations = match self.term.locations() {
            Some(locations) => locations,
            None => return 0,
        };
        let boundary_locations = match self.boundary.locations() {
            Some(locations) => locations,
            None => return 0,
        };
        let mut iterator = WordNodeLocationIterator::new(
            term_locations,
            boundary_locations,
            self.mode,
            self.word_length,
            self.token_boundary.as_ref(),
        );
        let mut count = 0;
        while !iterator.is_end() {
            count += 1;
            iterator.next();
        }
        count
    }

    fn align(&mut self, mut target: DocId) -> bool {
        loop {
            // both the term and the boundary node must cover the document
            'documents: loop {
                if !self.term.lower_bound(target) {
                    self.at_end = true;
                    return false;
                }
                let term_doc = self.term.doc_id();
                if term_doc > target {
                    target = term_doc;
                }
                if !self.boundary.lower_bound(target) {
                    self.at_end = true;
                    return false;
                }
                let boundary_doc = self.boundary.doc_id();
                if boundary_doc > target {
                    target = boundary_doc;
                    continue 'documents;
                }
                break;
            }

            let tf = self.matches();
            if tf > 0 {
                self.tf = tf;
                self.at_end = false;
                return true;
            }
            target = target.next();
        }
    }
}

impl DocumentIterator for OperatorWordNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let current = self.doc_id();
        self.align(current.next());
    }

    fn reset(&mut self) {
        self.term.reset();
        self.boundary.reset();
        self.at_end = false;
        self.align(DocId(1));
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        self.align(doc)
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn doc_id(&self) -> DocId {
        self.term.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.tf
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        let term_locations = self.term.locations()?;
        let boundary_locations = self.boundary.locations()?;
        Some(Box::new(WordNodeLocationIterator::new(
            term_locations,
            boundary_locations,
            self.mode,
            self.word_length,
            self.token_boundary.as_ref(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::coder::ParameterizedExpGolombCoder;
    use crate::index::{PostingCoders, Term, TermIndex};
    use crate::query::atomic::AtomicNode;
    use crate::query::score::OkapiTf;

    const BOUNDARY: &str = "";

    fn coders() -> PostingCoders {
        PostingCoders {
            id: Arc::new(ParameterizedExpGolombCoder::new(1).unwrap()),
            frequency: Arc::new(ParameterizedExpGolombCoder::new(0).unwrap()),
            location: Arc::new(ParameterizedExpGolombCoder::new(0).unwrap()),
        }
    }

    // two documents; the empty-string term indexes the word boundaries
    fn word_index() -> TermIndex {
        let mut index = TermIndex::new(coders(), true);
        // doc 1: word "sea" at 1..4, word "seaside" at 5..12
        index
            .add_document(
                DocId(1),
                &[("sea", 1), ("seaside", 5), (BOUNDARY, 1), (BOUNDARY, 4), (BOUNDARY, 5), (BOUNDARY, 12)],
            )
            .unwrap();
        // doc 2: "sea" embedded mid-word, boundaries elsewhere
        index
            .add_document(DocId(2), &[("sea", 3), (BOUNDARY, 1), (BOUNDARY, 9)])
            .unwrap();
        index
    }

    fn leaf(index: &TermIndex, term: &str, length: u32) -> Box<dyn DocumentIterator> {
        let list = Arc::new(index.posting_list(&Term::new(term)).unwrap());
        let mut node = AtomicNode::new(
            list,
            Box::new(OkapiTf::new(1.0)),
            index.doc_count() as u64,
            false,
        );
        node.set_token_length(length);
        Box::new(node)
    }

    #[test]
    fn test_operator_end() {
        let index = word_index();
        let mut node = OperatorEndNode::new(leaf(&index, "sea", 3), 4, 1);
        // doc 1 has "sea" ending at 4; doc 2's occurrence ends at 6
        assert!(!node.is_end());
        assert_eq!(node.doc_id(), DocId(1));
        assert_eq!(node.in_doc_freq(), 1);
        node.next();
        assert!(node.is_end());
    }

    #[test]
    fn test_operator_location() {
        let index = word_index();
        let mut node = OperatorLocationNode::new(leaf(&index, "sea", 3), 3);
        assert_eq!(node.doc_id(), DocId(2));
        node.next();
        assert!(node.is_end());
    }

    #[test]
    fn test_operator_word_simple() {
        let index = word_index();
        let mut node = OperatorWordNode::new(
            leaf(&index, "sea", 3),
            leaf(&index, BOUNDARY, 0),
            TermMatchMode::Simple,
            3,
            None,
        );
        // doc 1 bounds "sea" at 1 and 4; doc 2's occurrence floats mid-word
        assert_eq!(node.doc_id(), DocId(1));
        assert_eq!(node.in_doc_freq(), 1);
        node.next();
        assert!(node.is_end());
    }

    #[test]
    fn test_operator_word_head() {
        let index = word_index();
        let mut node = OperatorWordNode::new(
            leaf(&index, "seaside", 7),
            leaf(&index, BOUNDARY, 0),
            TermMatchMode::WordHead,
            7,
            None,
        );
        assert_eq!(node.doc_id(), DocId(1));
        let mut locations = node.locations().unwrap();
        assert_eq!(locations.location(), 5);
        locations.next();
        assert!(locations.is_end());
    }
}
