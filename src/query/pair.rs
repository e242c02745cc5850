use std::cmp::Ordering;
use crate::core::types::{DocId, DocumentScore};
use crate::query::score::{ScoreCombiner, ScoreNegator};

/// Document id paired with its ranking score.
///
/// The natural order is id order, which the set operations merge by;
/// `score_compare` gives the (score desc, id asc) order used for top-k.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdScorePair {
    pub id: DocId,
    pub score: DocumentScore,
}

impl IdScorePair {
    pub fn new(id: DocId, score: DocumentScore) -> Self {
        IdScorePair { id, score }
    }

    /// (score desc, id asc) order for ranked output
    pub fn score_compare(x: &IdScorePair, y: &IdScorePair) -> Ordering {
        match y.score.partial_cmp(&x.score) {
            Some(Ordering::Equal) | None => x.id.cmp(&y.id),
            Some(ordering) => ordering,
        }
    }
}

impl Eq for IdScorePair {}

impl PartialOrd for IdScorePair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdScorePair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id) // scores are ignored
    }
}

/// Score negation through the given negator
pub fn fuzzy_not(x: &IdScorePair, negator: &dyn ScoreNegator) -> IdScorePair {
    IdScorePair::new(x.id, negator.negate(x.score))
}

/// Score conjunction of two pairs of the same document
pub fn fuzzy_and(
    x: &IdScorePair,
    y: &IdScorePair,
    combiner: &dyn ScoreCombiner,
) -> IdScorePair {
    debug_assert_eq!(x.id, y.id);
    IdScorePair::new(x.id, combiner.combine(x.score, y.score))
}

/// Score disjunction of two pairs of the same document
pub fn fuzzy_or(
    x: &IdScorePair,
    y: &IdScorePair,
    combiner: &dyn ScoreCombiner,
) -> IdScorePair {
    debug_assert_eq!(x.id, y.id);
    IdScorePair::new(x.id, combiner.combine(x.score, y.score))
}

/// Score difference: x combined with the negation of y
pub fn fuzzy_and_not(
    x: &IdScorePair,
    y: &IdScorePair,
    combiner: &dyn ScoreCombiner,
    negator: &dyn ScoreNegator,
) -> IdScorePair {
    debug_assert_eq!(x.id, y.id);
    IdScorePair::new(x.id, combiner.combine(x.score, negator.negate(y.score)))
}
