use crate::location::LocationIterator;

/// Positional filter keeping the occurrences whose tail lands a fixed
/// displacement before a given end position. At most one position of the
/// child can qualify, so after a hit the next `next` runs to the end.
pub struct EndNodeLocationIterator<'a> {
    iterator: Box<dyn LocationIterator + 'a>,
    end_location: u32,
    distance: u32,
}

impl<'a> EndNodeLocationIterator<'a> {
    pub fn new(
        iterator: Box<dyn LocationIterator + 'a>,
        end_location: u32,
        distance: u32,
    ) -> Self {
        let mut this = EndNodeLocationIterator { iterator, end_location, distance };
        this.raw_next();
        this
    }

    /// Advance until the constraint holds; stay put if it already does
    fn raw_next(&mut self) {
        while !self.iterator.is_end() {
            if self.iterator.end_location() + self.distance - 1 == self.end_location {
                break;
            }
            self.iterator.next();
        }
    }
}

impl<'a> LocationIterator for EndNodeLocationIterator<'a> {
    fn next(&mut self) {
        self.iterator.next();
        self.raw_next();
    }

    fn reset(&mut self) {
        self.iterator.reset();
        self.raw_next();
    }

    fn is_end(&self) -> bool {
        self.iterator.is_end()
    }

    fn location(&self) -> u32 {
        self.iterator.location()
    }

    fn end_location(&self) -> u32 {
        self.iterator.end_location()
    }

    fn release(&mut self) {
        self.iterator.release();
    }
}
