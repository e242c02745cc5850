use crate::core::types::DocId;
use crate::location::LocationIterator;
use crate::query::DocumentIterator;

/// Position iterator of an ordered-distance match: every child must occur
/// at its fixed offset from the first child's position.
pub struct OrderedDistanceLocationIterator<'a> {
    children: Vec<(Box<dyn LocationIterator + 'a>, u32)>,
    at_end: bool,
}

impl<'a> OrderedDistanceLocationIterator<'a> {
    pub fn new(children: Vec<(Box<dyn LocationIterator + 'a>, u32)>) -> Self {
        debug_assert!(!children.is_empty());
        debug_assert_eq!(children[0].1, 0);
        let mut this = OrderedDistanceLocationIterator { children, at_end: false };
        this.align();
        this
    }

    fn align(&mut self) {
        'align: loop {
            if self.children[0].0.is_end() {
                self.at_end = true;
                return;
            }
            let base = self.children[0].0.location();
            for i in 1..self.children.len() {
                let offset = self.children[i].1;
                let want = base + offset;
                let child = &mut self.children[i].0;
                if !child.lower_bound(want) {
                    self.at_end = true;
                    return;
                }
                let got = child.location();
                if got != want {
                    // overshoot: catch the head up and retry
                    let new_base = got - offset;
                    if !self.children[0].0.lower_bound(new_base) {
                        self.at_end = true;
                        return;
                    }
                    continue 'align;
                }
            }
            self.at_end = false;
            return;
        }
    }
}

impl<'a> LocationIterator for OrderedDistanceLocationIterator<'a> {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        self.children[0].0.next();
        self.align();
    }

    fn reset(&mut self) {
        for (child, _) in self.children.iter_mut() {
            child.reset();
        }
        self.at_end = false;
        self.align();
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn location(&self) -> u32 {
        self.children[0].0.location()
    }

    fn end_location(&self) -> u32 {
        self.children[self.children.len() - 1].0.end_location()
    }

    fn release(&mut self) {
        for (child, _) in self.children.iter_mut() {
            child.release();
        }
    }
}

/// Ordered sequence with fixed offsets, e.g. a phrase. Children carry the
/// position offset of their occurrence from the head of the match.
pub struct OrderedDistanceNode {
    children: Vec<(Box<dyn DocumentIterator>, u32)>,
    at_end: bool,
    tf: u32,
}

impl OrderedDistanceNode {
    pub fn new(children: Vec<(Box<dyn DocumentIterator>, u32)>) -> Self {
        debug_assert!(!children.is_empty());
        debug_assert_eq!(children[0].1, 0);
        let mut node = OrderedDistanceNode { children, at_end: false, tf: 0 };
        node.align(DocId(1));
        node
    }

    fn matches(&mut self) -> u32 {
        let mut parts = Vec::new();
        for (child, offset) in self.children.iter_mut() {
            match child.locations() {
                Some(locations) => parts.push((locations, *offset)),
                None => return 0, // a positionless child cannot take part
            }
        }
        let mut iterator = OrderedDistanceLocationIterator::new(parts);
        let mut count = 0;
        while !iterator.is_end() {
            count += 1;
            iterator.next();
        }
        count
    }

    fn align(&mut self, mut target: DocId) -> bool {
        loop {
            'documents: loop {
                for i in 0..self.children.len() {
                    let child = &mut self.children[i].0;
                    if !child.lower_bound(target) {
                        self.at_end = true;
                        return false;
                    }
                    let got = child.doc_id();
                    if got > target {
                        target = got;
                        continue 'documents;
                    }
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

impl DocumentIterator for OrderedDistanceNode {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let current = self.doc_id();
        self.align(current.next());
    }

    fn reset(&mut self) {
        for (child, _) in self.children.iter_mut() {
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
        self.children[0].0.doc_id()
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.tf
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        let mut parts = Vec::new();
        for (child, offset) in self.children.iter_mut() {
            match child.locations() {
                Some(locations) => parts.push((locations, *offset)),
                None => return None,
            }
        }
        Some(Box::new(OrderedDistanceLocationIterator::new(parts)))
    }
}

/// Position iterator of an unordered window match: one occurrence of every
/// child, pairwise distinct, with head positions spread between the lower
/// and upper bound.
pub struct WithinLocationIterator<'a> {
    children: Vec<Box<dyn LocationIterator + 'a>>,
    lower: u32,
    upper: u32,
    at_end: bool,
}

impl<'a> WithinLocationIterator<'a> {
    pub fn new(children: Vec<Box<dyn LocationIterator + 'a>>, lower: u32, upper: u32) -> Self {
        debug_assert!(children.len() >= 2);
        let mut this = WithinLocationIterator { children, lower, upper, at_end: false };
        this.align();
        this
    }

    fn smallest(&self) -> usize {
        let mut best = 0;
        for i in 1..self.children.len() {
            if self.children[i].location() < self.children[best].location() {
                best = i;
            }
        }
        best
    }

    fn align(&mut self) {
        loop {
            if self.children.iter().any(|child| child.is_end()) {
                self.at_end = true;
                return;
            }

            let min_index = self.smallest();
            let min = self.children[min_index].location();
            let max = self.children.iter().map(|c| c.location()).max().unwrap();
            let spread = max - min;

            let mut distinct = true;
            for i in 0..self.children.len() {
                for j in i + 1..self.children.len() {
                    if self.children[i].location() == self.children[j].location() {
                        distinct = false;
                    }
                }
            }

            if distinct && spread >= self.lower && spread <= self.upper {
                self.at_end = false;
                return;
            }
            self.children[min_index].next();
        }
    }
}

impl<'a> LocationIterator for WithinLocationIterator<'a> {
    fn next(&mut self) {
        if self.at_end {
            return;
        }
        let min_index = self.smallest();
        self.children[min_index].next();
        self.align();
    }

    fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
        self.at_end = false;
        self.align();
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn location(&self) -> u32 {
        self.children[self.smallest()].location()
    }

    fn end_location(&self) -> u32 {
        self.children.iter().map(|c| c.end_location()).max().unwrap_or(0)
    }

    fn release(&mut self) {
        for child in self.children.iter_mut() {
            child.release();
        }
    }
}

/// Unordered proximity: all children within a bounded window.
pub struct WithinNode {
    children: Vec<Box<dyn DocumentIterator>>,
    lower: u32,
    upper: u32,
    at_end: bool,
    tf: u32,
}

impl WithinNode {
    pub fn new(children: Vec<Box<dyn DocumentIterator>>, lower: u32, upper: u32) -> Self {
        debug_assert!(children.len() >= 2);
        let mut node = WithinNode { children, lower, upper, at_end: false, tf: 0 };
        node.align(DocId(1));
        node
    }

    fn matches(&mut self) -> u32 {
        let (lower, upper) = (self.lower, self.upper);
        let mut parts = Vec::new();
        for child in self.children.iter_mut() {
            match child.locations() {
                Some(locations) => parts.push(locations),
                None => return 0,
            }
        }
        let mut iterator = WithinLocationIterator::new(parts, lower, upper);
        let mut count = 0;
        while !iterator.is_end() {
            count += 1;
            iterator.next();
        }
        count
    }

    fn align(&mut self, mut target: DocId) -> bool {
        loop {
            'documents: loop {
                for i in 0..self.children.len() {
                    let child = &mut self.children[i];
                    if !child.lower_bound(target) {
                        self.at_end = true;
                        return false;
                    }
                    let got = child.doc_id();
                    if got > target {
                        target = got;
                        continue 'documents;
                    }
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

impl DocumentIterator for WithinNode {
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
        self.tf
    }
}
