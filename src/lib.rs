pub mod core;
pub mod coder;
pub mod location;
pub mod storage;
pub mod index;
pub mod query;
pub mod decimal;
pub mod lob;
pub mod plan;

/*
┌──────────────────────────────────────────────────────────────────────┐
│                        QUELLDB MODULE MAP                            │
└──────────────────────────────────────────────────────────────────────┘

  core        Error/Result, DocId and unit types, Config
  coder       bit-packed integer codecs over 32-bit units
              • ParameterizedExpGolombCoder (lambda)
              • ExtendedGolombCoder (lambda, factor)
              • UnaryCoder (direct-find bitmap)
  location    in-document occurrence positions
              • SmartLocationList (inline → unpacked → packed)
              • CompressedLocationListIterator (lazy gap decode)
              • End / Location / Word positional filters
  index       Term → PostingBuffer (doc gap, tf, location block)
              • TermIndex glues tokenized documents together
  storage     OverflowFileHeader (file/page id split), PageStore,
              page chains with cancellation at fetch boundaries
  query       DocumentIterator tree over posting streams
              • AtomicNode: leaf cursor + two-stage ranking
              • And / Or / AndNot / Synonym / ExpandSynonym
              • OrderedDistance / Within (positional verification)
              • OperatorEnd / OperatorLocation / OperatorWord
              • ScoreCalculator, combiners, IdScorePair set ops
  decimal     base-10⁹ fixed-point arithmetic
              • compare/add/sub/mul/div, casts, sort-preserving dump
  lob         compressed large-object pages (32 KiB sub-blocks)
  plan        cascade aggregation rewrite (Avg → Sum/Count)

  read path:  query tree → AtomicNode → posting stream on overflow
              pages → location iterators → ranked (id, score, tf)
  write path: tokens → SmartLocationList → PostingBuffer → page chains
*/
