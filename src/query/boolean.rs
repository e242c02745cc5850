use crate::core::types::DocId;
use crate::location::LocationIterator;
use crate::query::DocumentIterator;

/// Conjunction: documents matched by every child.
///
/// Ids merge by monotone lower bound, leapfrogging to the largest
/// candidate until all children agree.
pub struct AndNode {
    children: Vec<Box<dyn DocumentIterator>>,
    at_end: bool,
}

impl AndNode {
    pub fn new(children: Vec<Box<dyn DocumentIterator>>) -> Self {
        debug_assert!(!children.is_empty());
        let mut node = AndNode { children, at_end: false };
        node.align(DocId(1));
        node
    }

    fn align(&mut self, mut target: DocId) -> bool {
        'outer: loop {
            for child in self.children.iter_mut() {
                if !child.lower_bound(target) {
                    self.at_end = true;
                    return false;
                }
                let got = child.doc_id();
                if got > target {
                    target = got;
                    continue 'outer;
                }
            }
            self.at_end = false;
            return true;
        }
    }
}

impl DocumentIterator for AndNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let current = self.doc_id();
        self.align(current.next());
    }

    fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
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
        self.children[0].doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        // the conjunction occurs no more often than its rarest member
        self.children
            .iter_mut()
            .map(|child| child.in_doc_freq())
            .min()
            .unwrap_or(0)
    }
}

/// Disjunction: documents matched by any child, frequencies summed.
pub struct OrNode {
    children: Vec<Box<dyn DocumentIterator>>,
    current: DocId,
    at_end: bool,
}

impl OrNode {
    pub fn new(children: Vec<Box<dyn DocumentIterator>>) -> Self {
        debug_assert!(!children.is_empty());
        let mut node = OrNode { children, current: DocId(0), at_end: false };
        node.refresh();
        node
    }

    fn refresh(&mut self) {
        let mut smallest: Option<DocId> = None;
        for child in self.children.iter() {
            if !child.is_end() {
                let doc = child.doc_id();
                smallest = Some(match smallest {
                    Some(s) if s <= doc => s,
                    _ => doc,
                });
            }
        }
        match smallest {
            Some(doc) => {
                self.current = doc;
                self.at_end = false;
            }
            None => self.at_end = true,
        }
    }

    pub(crate) fn current_child_tfs(&mut self) -> Vec<u32> {
        let current = self.current;
        self.children
            .iter_mut()
            .filter(|child| !child.is_end() && child.doc_id() == current)
            .map(|child| child.in_doc_freq())
            .collect()
    }
}

impl DocumentIterator for OrNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let current = self.current;
        for child in self.children.iter_mut() {
            if !child.is_end() && child.doc_id() == current {
                child.next();
            }
        }
        self.refresh();
    }

    fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
        self.refresh();
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        for child in self.children.iter_mut() {
            child.lower_bound(doc);
        }
        self.refresh();
        !self.at_end
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn doc_id(&self) -> DocId {
        self.current
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.current_child_tfs().iter().sum()
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        let current = self.current;
        let mut parts = Vec::new();
        for child in self.children.iter_mut() {
            if !child.is_end() && child.doc_id() == current {
                if let Some(locations) = child.locations() {
                    parts.push(locations);
                }
            }
        }
        if parts.is_empty() {
            None
        } else {
            Some(Box::new(MergeLocationIterator::new(parts)))
        }
    }
}

/// Difference: documents of the left child the right child misses.
pub struct AndNotNode {
    left: Box<dyn DocumentIterator>,
    right: Box<dyn DocumentIterator>,
    at_end: bool,
}

impl AndNotNode {
    pub fn new(left: Box<dyn DocumentIterator>, right: Box<dyn DocumentIterator>) -> Self {
        let mut node = AndNotNode { left, right, at_end: false };
        node.align();
        node
    }

    fn align(&mut self) {
        while !self.left.is_end() {
            let doc = self.left.doc_id();
            if self.right.find(doc) {
                self.left.next();
            } else {
                break;
            }
        }
        self.at_end = self.left.is_end();
    }
}

impl DocumentIterator for AndNotNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        self.left.next();
        self.align();
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.align();
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        self.left.lower_bound(doc);
        self.align();
        !self.at_end
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn doc_id(&self) -> DocId {
        self.left.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.left.in_doc_freq()
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        self.left.locations()
    }
}

/// A set of spellings of one concept; behaves as a disjunction with the
/// occurrences of all spellings pooled together.
pub struct SynonymNode {
    inner: OrNode,
}

impl SynonymNode {
    pub fn new(children: Vec<Box<dyn DocumentIterator>>) -> Self {
        SynonymNode { inner: OrNode::new(children) }
    }
}

impl DocumentIterator for SynonymNode {
    fn next(&mut self) {
        self.inner.next();
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        self.inner.lower_bound(doc)
    }

    fn is_end(&self) -> bool {
        self.inner.is_end()
    }

    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.inner.in_doc_freq()
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        self.inner.locations()
    }
}

/// Query-expansion variant of the synonym set: expanded spellings must not
/// inflate the frequency, so the strongest child counts alone.
pub struct ExpandSynonymNode {
    inner: OrNode,
}

impl ExpandSynonymNode {
    pub fn new(children: Vec<Box<dyn DocumentIterator>>) -> Self {
        ExpandSynonymNode { inner: OrNode::new(children) }
    }
}

impl DocumentIterator for ExpandSynonymNode {
    fn next(&mut self) {
        self.inner.next();
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        self.inner.lower_bound(doc)
    }

    fn is_end(&self) -> bool {
        self.inner.is_end()
    }

    fn doc_id(&self) -> DocId {
        self.inner.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.inner.current_child_tfs().into_iter().max().unwrap_or(0)
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        self.inner.locations()
    }
}

/// Ascending merge of several position streams of one document
pub struct MergeLocationIterator<'a> {
    children: Vec<Box<dyn LocationIterator + 'a>>,
    at_end: bool,
}

impl<'a> MergeLocationIterator<'a> {
    pub fn new(children: Vec<Box<dyn LocationIterator + 'a>>) -> Self {
        let mut this = MergeLocationIterator { children, at_end: false };
        this.refresh();
        this
    }

    fn smallest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, child) in self.children.iter().enumerate() {
            if child.is_end() {
                continue;
            }
            best = match best {
                Some(b) if self.children[b].location() <= child.location() => Some(b),
                _ => Some(i),
            };
        }
        best
    }

    fn refresh(&mut self) {
        self.at_end = self.smallest().is_none();
    }
}

impl<'a> LocationIterator for MergeLocationIterator<'a> {
    fn next(&mut self) {
        if let Some(best) = self.smallest() {
            let at = self.children[best].location();
            // step every stream sitting on the current position
            for child in self.children.iter_mut() {
                if !child.is_end() && child.location() == at {
                    child.next();
                }
            }
        }
        self.refresh();
    }

    fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
        self.refresh();
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn location(&self) -> u32 {
        match self.smallest() {
            Some(best) => self.children[best].location(),
            None => 0,
        }
    }

    fn end_location(&self) -> u32 {
        match self.smallest() {
            Some(best) => self.children[best].end_location(),
            None => 0,
        }
    }

    fn release(&mut self) {
        for child in self.children.iter_mut() {
            child.release();
        }
    }
}
