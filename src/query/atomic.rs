use std::sync::Arc;
use crate::core::types::{DocId, DocumentScore};
use crate::index::PostingList;
use crate::location::{CompressedLocationListIterator, LocationIterator};
use crate::query::DocumentIterator;
use crate::query::result::SearchResult;
use crate::query::score::ScoreCalculator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstStepStatus {
    NotYet,
    FirstDone,
    SecondDone,
}

/// Leaf node of the query tree: one term's posting stream plus its score
/// calculator.
///
/// The node is both the document iterator over the stream and the driver
/// of the two-stage ranking evaluation. The collection coefficient of the
/// calculator is computed once, on first use.
pub struct AtomicNode {
    list: Arc<PostingList>,
    token_length: u32,

    // decode cursor
    cur_bits: u32,
    current_doc: u32,
    tf: u32,
    loc_start: u32,
    loc_bits: u32,
    at_end: bool,

    // ranking state
    calculator: Box<dyn ScoreCalculator>,
    total_document_frequency: u64,
    want_tf: bool,
    first_step_status: FirstStepStatus,
    ranking_result: SearchResult,

    // cursor of the post-second-step lower bound
    position: usize,
    given_id: DocId,
}

impl AtomicNode {
    pub fn new(
        list: Arc<PostingList>,
        calculator: Box<dyn ScoreCalculator>,
        total_document_frequency: u64,
        want_tf: bool,
    ) -> Self {
        let want = want_tf;
        let mut node = AtomicNode {
            list,
            token_length: 0,
            cur_bits: 0,
            current_doc: 0,
            tf: 0,
            loc_start: 0,
            loc_bits: 0,
            at_end: false,
            calculator,
            total_document_frequency,
            want_tf: want,
            first_step_status: FirstStepStatus::NotYet,
            ranking_result: SearchResult::new(want),
            position: 0,
            given_id: DocId(0),
        };
        node.advance();
        node
    }

    pub fn set_token_length(&mut self, length: u32) {
        self.token_length = length;
    }

    pub fn document_frequency(&self) -> u32 {
        self.list.doc_count()
    }

    fn advance(&mut self) {
        if self.cur_bits == self.list.end_bits {
            self.at_end = true;
            return;
        }

        let mut gap = 0;
        if !self.list.coders.id.get(&mut gap, &self.list.units, self.list.end_bits, &mut self.cur_bits) {
            unreachable!("posting stream ended inside a document entry");
        }
        self.current_doc += gap;

        let mut tf = 0;
        if !self.list.coders.frequency.get(&mut tf, &self.list.units, self.list.end_bits, &mut self.cur_bits) {
            unreachable!("posting stream ended inside a document entry");
        }
        self.tf = tf;

        if self.list.store_locations {
            let mut loc_bits = 0;
            if !self.list.coders.location.get(&mut loc_bits, &self.list.units, self.list.end_bits, &mut self.cur_bits) {
                unreachable!("posting stream ended inside a document entry");
            }
            self.loc_start = self.cur_bits;
            self.loc_bits = loc_bits;
            self.cur_bits += loc_bits;
        }
    }

    fn rewind(&mut self) {
        self.cur_bits = 0;
        self.current_doc = 0;
        self.tf = 0;
        self.at_end = false;
        self.advance();
    }

    fn prepare_if_needed(&mut self) {
        if self.calculator.prepare_result() == 0.0 {
            let df = self.list.doc_count() as u64;
            self.calculator.prepare(self.total_document_frequency, df);
        }
    }

    /// Score of one document, None when it does not match
    pub fn evaluate_score(&mut self, doc: DocId) -> Option<DocumentScore> {
        if !self.find(doc) {
            return None;
        }
        let tf = self.tf;
        if tf == 0 {
            return None;
        }
        self.prepare_if_needed();
        let (score, exists) = self.calculator.score(tf, doc);
        exists.then_some(score)
    }

    /// Ranked lower bound: the first matching document at or past the
    /// given id, with its score.
    pub fn lower_bound_score(&mut self, given: DocId) -> Option<(DocId, DocumentScore)> {
        let mut id = given;
        loop {
            if !self.lower_bound(id) {
                return None; // no matching document remains
            }
            let found = self.doc_id();
            if self.tf != 0 {
                self.prepare_if_needed();
                let (score, exists) = self.calculator.score(self.tf, found);
                if exists {
                    return Some((found, score));
                }
            }
            id = found.next();
        }
    }

    /// First ranking stage: walk every live document, evaluate the tf part
    /// of the score, and collect (id, first-step score [, tf]) in id order.
    ///
    /// The expunged list must be ascending; a terminator of
    /// maxDocumentId + 1 is pushed for the walk so the inner loop needs no
    /// end-of-list branch, and popped before returning.
    pub fn do_first_step(&mut self, expunged: &mut Vec<DocId>, max_document_id: DocId) {
        if self.first_step_status != FirstStepStatus::NotYet {
            return;
        }

        expunged.push(max_document_id.next());
        self.retrieve(expunged);
        expunged.pop();

        self.first_step_status = FirstStepStatus::FirstDone;
    }

    fn retrieve(&mut self, expunged: &[DocId]) {
        self.prepare_if_needed();
        let mut result = SearchResult::new(self.want_tf);

        let mut id = DocId(1);
        let mut expunged_index = 0;

        'walk: while self.lower_bound(id) {
            let found = self.doc_id();

            // expunged-document check against the ascending list; the
            // terminator bounds the scan
            loop {
                if found >= expunged[expunged_index] {
                    if found == expunged[expunged_index] {
                        id = found.next();
                        expunged_index += 1;
                        continue 'walk;
                    }
                    expunged_index += 1;
                    continue;
                }
                break;
            }

            let tf = self.tf;
            if tf != 0 {
                // the tf / (X + tf) part only; the coefficient waits for
                // the second step
                let (first, exists) = self.calculator.first_step(tf, found);
                if exists {
                    result.push_back(found, first, tf);
                }
            }
            id = found.next();
        }

        self.ranking_result = result;
    }

    /// Second ranking stage: fold the prepared coefficient into every
    /// collected score.
    pub fn do_second_step(&mut self) {
        if self.first_step_status != FirstStepStatus::FirstDone {
            return;
        }
        if self.calculator.is_extended_first_step() {
            self.do_second_step_extended();
        } else {
            self.do_second_step_basic();
        }
        self.first_step_status = FirstStepStatus::SecondDone;
    }

    fn do_second_step_basic(&mut self) {
        let prepared = self.calculator.prepare_result();

        // plain (id, score) rows multiply in place
        if let SearchResult::Score(rows) = &mut self.ranking_result {
            for row in rows.iter_mut() {
                row.score *= prepared;
            }
            return;
        }

        // the tf-carrying shape goes through the generic accessors
        for i in 0..self.ranking_result.len() {
            let score = self.ranking_result.score(i);
            self.ranking_result.set_score(i, score * prepared);
        }
    }

    fn do_second_step_extended(&mut self) {
        let prepared = self.calculator.prepare_result();
        for i in 0..self.ranking_result.len() {
            let doc = self.ranking_result.doc_id(i);
            let score = prepared * self.calculator.extended_first_step(i, doc);
            self.ranking_result.set_score(i, score);
        }
    }

    /// Random access into the finished result, used by merges after the
    /// second step. The cursor survives monotone probing and rewinds when
    /// the probe goes backwards.
    pub fn lower_bound_score_for_second_step(
        &mut self,
        given: DocId,
    ) -> Option<(DocId, DocumentScore)> {
        let size = self.ranking_result.len();
        if self.position == size
            || (self.ranking_result.doc_id(self.position) > given && given < self.given_id)
        {
            self.position = 0;
        }
        while self.position < size {
            let doc = self.ranking_result.doc_id(self.position);
            if doc >= given {
                self.given_id = given;
                return Some((doc, self.ranking_result.score(self.position)));
            }
            self.position += 1;
        }
        None
    }

    pub fn ranking_result(&self) -> &SearchResult {
        &self.ranking_result
    }

    pub fn take_ranking_result(&mut self) -> SearchResult {
        self.first_step_status = FirstStepStatus::NotYet;
        self.position = 0;
        self.given_id = DocId(0);
        std::mem::replace(&mut self.ranking_result, SearchResult::new(self.want_tf))
    }

    pub fn calculator_description(&self, with_params: bool) -> String {
        self.calculator.describe(with_params)
    }
}

impl DocumentIterator for AtomicNode {
    fn next(&mut self) {
        if !self.at_end {
            self.advance();
        }
    }

    fn reset(&mut self) {
        self.rewind();
    }

    fn lower_bound(&mut self, doc: DocId) -> bool {
        let backwards = if self.at_end {
            doc.0 <= self.current_doc
        } else {
            doc.0 < self.current_doc
        };
        if backwards {
            self.rewind();
        }
        while !self.at_end && self.current_doc < doc.0 {
            self.advance();
        }
        !self.at_end
    }

    fn is_end(&self) -> bool {
        self.at_end
    }

    fn doc_id(&self) -> DocId {
        DocId(self.current_doc)
    }

    fn in_doc_freq(&mut self) -> u32 {
        self.tf
    }

    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        if !self.list.store_locations {
            return None;
        }
        let mut iterator = CompressedLocationListIterator::new(
            &self.list.units,
            self.loc_start,
            self.loc_start + self.loc_bits,
            self.tf,
            self.list.coders.location.clone(),
        );
        iterator.set_length(self.token_length);
        Some(Box::new(iterator))
    }
}
