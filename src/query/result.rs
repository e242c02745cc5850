use crate::core::types::{DocId, DocumentScore};
use crate::query::pair::{self, IdScorePair};
use crate::query::score::{ScoreCombiner, ScoreNegator};

/// Ranked result set, emitted in ascending document-id order.
///
/// Two shapes exist: the plain (id, score) vector that the fast second
/// step runs over, and the (id, score, tf) vector for callers that want
/// the per-document frequency back.
pub enum SearchResult {
    Score(Vec<IdScorePair>),
    WithTf(Vec<(DocId, DocumentScore, u32)>),
}

impl SearchResult {
    pub fn new(with_tf: bool) -> Self {
        if with_tf {
            SearchResult::WithTf(Vec::new())
        } else {
            SearchResult::Score(Vec::new())
        }
    }

    pub fn has_tf(&self) -> bool {
        matches!(self, SearchResult::WithTf(_))
    }

    pub fn push_back(&mut self, id: DocId, score: DocumentScore, tf: u32) {
        match self {
            SearchResult::Score(v) => v.push(IdScorePair::new(id, score)),
            SearchResult::WithTf(v) => v.push((id, score, tf)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SearchResult::Score(v) => v.len(),
            SearchResult::WithTf(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn doc_id(&self, index: usize) -> DocId {
        match self {
            SearchResult::Score(v) => v[index].id,
            SearchResult::WithTf(v) => v[index].0,
        }
    }

    pub fn score(&self, index: usize) -> DocumentScore {
        match self {
            SearchResult::Score(v) => v[index].score,
            SearchResult::WithTf(v) => v[index].1,
        }
    }

    pub fn set_score(&mut self, index: usize, score: DocumentScore) {
        match self {
            SearchResult::Score(v) => v[index].score = score,
            SearchResult::WithTf(v) => v[index].1 = score,
        }
    }

    pub fn tf(&self, index: usize) -> Option<u32> {
        match self {
            SearchResult::Score(_) => None,
            SearchResult::WithTf(v) => Some(v[index].2),
        }
    }

    /// Pairs in (score desc, id asc) order for top-k consumers
    pub fn sorted_by_score(&self) -> Vec<IdScorePair> {
        let mut pairs: Vec<IdScorePair> = (0..self.len())
            .map(|i| IdScorePair::new(self.doc_id(i), self.score(i)))
            .collect();
        pairs.sort_by(IdScorePair::score_compare);
        pairs
    }
}

/// Intersection of two id-ordered result sets, scores combined per pair
pub fn merge_and(
    x: &SearchResult,
    y: &SearchResult,
    combiner: &dyn ScoreCombiner,
) -> SearchResult {
    let mut out = SearchResult::new(false);
    let (mut i, mut j) = (0, 0);
    while i < x.len() && j < y.len() {
        let (a, b) = (x.doc_id(i), y.doc_id(j));
        if a == b {
            let pair = pair::fuzzy_and(
                &IdScorePair::new(a, x.score(i)),
                &IdScorePair::new(b, y.score(j)),
                combiner,
            );
            out.push_back(pair.id, pair.score, 0);
            i += 1;
            j += 1;
        } else if a < b {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Union of two id-ordered result sets
pub fn merge_or(
    x: &SearchResult,
    y: &SearchResult,
    combiner: &dyn ScoreCombiner,
) -> SearchResult {
    let mut out = SearchResult::new(false);
    let (mut i, mut j) = (0, 0);
    while i < x.len() || j < y.len() {
        if j == y.len() || (i < x.len() && x.doc_id(i) < y.doc_id(j)) {
            out.push_back(x.doc_id(i), x.score(i), 0);
            i += 1;
        } else if i == x.len() || y.doc_id(j) < x.doc_id(i) {
            out.push_back(y.doc_id(j), y.score(j), 0);
            j += 1;
        } else {
            let pair = pair::fuzzy_or(
                &IdScorePair::new(x.doc_id(i), x.score(i)),
                &IdScorePair::new(y.doc_id(j), y.score(j)),
                combiner,
            );
            out.push_back(pair.id, pair.score, 0);
            i += 1;
            j += 1;
        }
    }
    out
}

/// Difference: documents of x, scores dampened where y also matches
pub fn merge_and_not(
    x: &SearchResult,
    y: &SearchResult,
    combiner: &dyn ScoreCombiner,
    negator: &dyn ScoreNegator,
) -> SearchResult {
    let mut out = SearchResult::new(false);
    let mut j = 0;
    for i in 0..x.len() {
        let id = x.doc_id(i);
        while j < y.len() && y.doc_id(j) < id {
            j += 1;
        }
        if j < y.len() && y.doc_id(j) == id {
            let pair = pair::fuzzy_and_not(
                &IdScorePair::new(id, x.score(i)),
                &IdScorePair::new(id, y.score(j)),
                combiner,
                negator,
            );
            out.push_back(pair.id, pair.score, 0);
        } else {
            out.push_back(id, x.score(i), 0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::score::{MaxCombiner, MinCombiner, OneMinusNegator, ProdCombiner};

    fn result_of(entries: &[(u32, f64)]) -> SearchResult {
        let mut r = SearchResult::new(false);
        for &(id, score) in entries {
            r.push_back(DocId(id), score, 0);
        }
        r
    }

    #[test]
    fn test_shapes() {
        let mut with_tf = SearchResult::new(true);
        with_tf.push_back(DocId(3), 0.5, 2);
        assert!(with_tf.has_tf());
        assert_eq!(with_tf.tf(0), Some(2));
        assert_eq!(with_tf.doc_id(0), DocId(3));

        let mut plain = SearchResult::new(false);
        plain.push_back(DocId(3), 0.5, 2);
        assert_eq!(plain.tf(0), None);
        plain.set_score(0, 0.7);
        assert_eq!(plain.score(0), 0.7);
    }

    #[test]
    fn test_merge_and() {
        let x = result_of(&[(1, 0.4), (3, 0.8), (5, 0.6)]);
        let y = result_of(&[(3, 0.5), (4, 0.2), (5, 0.9)]);
        let out = merge_and(&x, &y, &MinCombiner);
        assert_eq!(out.len(), 2);
        assert_eq!(out.doc_id(0), DocId(3));
        assert_eq!(out.score(0), 0.5);
        assert_eq!(out.doc_id(1), DocId(5));
        assert_eq!(out.score(1), 0.6);
    }

    #[test]
    fn test_merge_or() {
        let x = result_of(&[(1, 0.4), (3, 0.8)]);
        let y = result_of(&[(2, 0.5), (3, 0.3)]);
        let out = merge_or(&x, &y, &MaxCombiner);
        let ids: Vec<u32> = (0..out.len()).map(|i| out.doc_id(i).0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(out.score(2), 0.8);
    }

    #[test]
    fn test_merge_and_not() {
        let x = result_of(&[(1, 0.4), (3, 0.8)]);
        let y = result_of(&[(3, 0.5)]);
        let out = merge_and_not(&x, &y, &ProdCombiner, &OneMinusNegator);
        assert_eq!(out.len(), 2);
        assert_eq!(out.score(0), 0.4);
        assert!((out.score(1) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_sorted_by_score() {
        let r = result_of(&[(1, 0.2), (2, 0.9), (3, 0.9)]);
        let sorted = r.sorted_by_score();
        let ids: Vec<u32> = sorted.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
