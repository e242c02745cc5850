pub mod score;
pub mod pair;
pub mod result;
pub mod atomic;
pub mod boolean;
pub mod distance;
pub mod operator;

pub use atomic::AtomicNode;
pub use boolean::{AndNode, AndNotNode, ExpandSynonymNode, OrNode, SynonymNode};
pub use distance::{OrderedDistanceNode, WithinNode};
pub use operator::{OperatorEndNode, OperatorLocationNode, OperatorWordNode};
pub use pair::IdScorePair;
pub use result::SearchResult;
pub use score::{ScoreCalculator, ScoreCombiner, ScoreNegator};

use crate::core::types::DocId;
use crate::location::LocationIterator;

/// Iterator over the documents matching a query node, in ascending id
/// order. One evaluation runs on one thread; nodes are not shared.
pub trait DocumentIterator {
    /// Step to the next matching document
    fn next(&mut self);

    /// Rewind to the first matching document
    fn reset(&mut self);

    /// Advance to the smallest matching id >= doc
    fn lower_bound(&mut self, doc: DocId) -> bool;

    /// Whether the given document matches
    fn find(&mut self, doc: DocId) -> bool {
        self.lower_bound(doc) && self.doc_id() == doc
    }

    fn is_end(&self) -> bool;

    /// Current document id; meaningless once at the end
    fn doc_id(&self) -> DocId;

    /// Occurrence count of the node within the current document
    fn in_doc_freq(&mut self) -> u32;

    /// Occurrence positions within the current document. None when the
    /// node carries no positional data.
    fn locations(&mut self) -> Option<Box<dyn LocationIterator + '_>> {
        None
    }
}
