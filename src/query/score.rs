use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, DocumentScore};

/// Per-term ranking score calculator.
///
/// Scoring runs in two stages: `first_step` produces the tf-dependent part
/// per document, `prepare` caches the collection-dependent coefficient
/// once, and the second step multiplies the two.
pub trait ScoreCalculator: Send {
    /// Compute and cache the collection-level coefficient
    fn prepare(&mut self, total_df: u64, df: u64);

    /// The cached coefficient; 0 until `prepare` ran
    fn prepare_result(&self) -> DocumentScore;

    /// The tf part. The flag reports whether the document scores at all.
    fn first_step(&self, tf: u32, doc: DocId) -> (DocumentScore, bool);

    /// External calculators recompute per-entry scores in the second step
    fn is_extended_first_step(&self) -> bool {
        false
    }

    fn extended_first_step(&self, _index: usize, _doc: DocId) -> DocumentScore {
        1.0
    }

    /// Full score of one document
    fn score(&self, tf: u32, doc: DocId) -> (DocumentScore, bool) {
        let (first, exists) = self.first_step(tf, doc);
        (first * self.prepare_result(), exists)
    }

    /// Calculator name, with parameters when asked
    fn describe(&self, with_params: bool) -> String;
}

/// tf / (k + tf), no collection coefficient
pub struct OkapiTf {
    k: f64,
    prepared: DocumentScore,
}

impl OkapiTf {
    pub fn new(k: f64) -> Self {
        OkapiTf { k, prepared: 0.0 }
    }
}

impl Default for OkapiTf {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ScoreCalculator for OkapiTf {
    fn prepare(&mut self, _total_df: u64, _df: u64) {
        self.prepared = 1.0;
    }

    fn prepare_result(&self) -> DocumentScore {
        self.prepared
    }

    fn first_step(&self, tf: u32, _doc: DocId) -> (DocumentScore, bool) {
        (tf as f64 / (self.k + tf as f64), true)
    }

    fn describe(&self, with_params: bool) -> String {
        if with_params {
            format!("OkapiTf:{}", self.k)
        } else {
            "OkapiTf".to_string()
        }
    }
}

/// tf / (k + tf) weighted by log((N - df + 0.5) / (df + 0.5))
pub struct OkapiTfIdf {
    k: f64,
    prepared: DocumentScore,
}

impl OkapiTfIdf {
    pub fn new(k: f64) -> Self {
        OkapiTfIdf { k, prepared: 0.0 }
    }
}

impl Default for OkapiTfIdf {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ScoreCalculator for OkapiTfIdf {
    fn prepare(&mut self, total_df: u64, df: u64) {
        let n = total_df as f64;
        let df = df as f64;
        let idf = ((n - df + 0.5) / (df + 0.5)).ln();
        // rare enough terms dominate; a term in every document still
        // contributes a sliver instead of a negative weight
        self.prepared = if idf > 0.0 { idf } else { f64::MIN_POSITIVE };
    }

    fn prepare_result(&self) -> DocumentScore {
        self.prepared
    }

    fn first_step(&self, tf: u32, _doc: DocId) -> (DocumentScore, bool) {
        (tf as f64 / (self.k + tf as f64), true)
    }

    fn describe(&self, with_params: bool) -> String {
        if with_params {
            format!("OkapiTfIdf:{}", self.k)
        } else {
            "OkapiTfIdf".to_string()
        }
    }
}

/// Build a calculator from its textual description
pub fn calculator_from_description(description: &str) -> Result<Box<dyn ScoreCalculator>> {
    let trimmed = description.trim();
    let (name, params) = match trimmed.split_once(':') {
        Some((n, p)) => (n, Some(p)),
        None => (trimmed, None),
    };

    let k = match params {
        Some(p) => p.trim().parse::<f64>().map_err(|_| {
            Error::new(
                ErrorKind::BadArgument,
                format!("bad calculator parameter '{}'", description),
            )
        })?,
        None => 1.0,
    };

    match name {
        "OkapiTf" => Ok(Box::new(OkapiTf::new(k))),
        "OkapiTfIdf" => Ok(Box::new(OkapiTfIdf::new(k))),
        _ => Err(Error::new(
            ErrorKind::NotSupported,
            format!("unknown calculator '{}'", name),
        )),
    }
}

/// Combination rule for scores of the same document
pub trait ScoreCombiner: Send + Sync {
    fn combine(&self, x: DocumentScore, y: DocumentScore) -> DocumentScore;
    fn describe(&self) -> String;
}

/// Negation rule for scores
pub trait ScoreNegator: Send + Sync {
    fn negate(&self, x: DocumentScore) -> DocumentScore;
}

/// Conjunction by minimum
pub struct MinCombiner;

impl ScoreCombiner for MinCombiner {
    fn combine(&self, x: DocumentScore, y: DocumentScore) -> DocumentScore {
        if x < y { x } else { y }
    }

    fn describe(&self) -> String {
        "Min".to_string()
    }
}

/// Disjunction by maximum
pub struct MaxCombiner;

impl ScoreCombiner for MaxCombiner {
    fn combine(&self, x: DocumentScore, y: DocumentScore) -> DocumentScore {
        if x < y { y } else { x }
    }

    fn describe(&self) -> String {
        "Max".to_string()
    }
}

/// Conjunction by product
pub struct ProdCombiner;

impl ScoreCombiner for ProdCombiner {
    fn combine(&self, x: DocumentScore, y: DocumentScore) -> DocumentScore {
        x * y
    }

    fn describe(&self) -> String {
        "Prod".to_string()
    }
}

/// Disjunction by sum. The `algebraic-sum` feature switches the arithmetic
/// sum for x + y - xy.
pub struct SumCombiner;

impl ScoreCombiner for SumCombiner {
    #[cfg(feature = "algebraic-sum")]
    fn combine(&self, x: DocumentScore, y: DocumentScore) -> DocumentScore {
        if x > 1.0 || y > 1.0 {
            1.0
        } else {
            x + y - x * y
        }
    }

    #[cfg(not(feature = "algebraic-sum"))]
    fn combine(&self, x: DocumentScore, y: DocumentScore) -> DocumentScore {
        x + y
    }

    fn describe(&self) -> String {
        "Sum".to_string()
    }
}

/// 1 - x negation
pub struct OneMinusNegator;

impl ScoreNegator for OneMinusNegator {
    fn negate(&self, x: DocumentScore) -> DocumentScore {
        if x > 1.0 { 0.0 } else { 1.0 - x }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_okapi_tf() {
        let mut calc = OkapiTf::new(1.0);
        assert_eq!(calc.prepare_result(), 0.0);
        calc.prepare(100, 10);
        assert_eq!(calc.prepare_result(), 1.0);

        let (score, exists) = calc.first_step(1, DocId(1));
        assert!(exists);
        assert!((score - 0.5).abs() < 1e-12);

        // saturates toward 1 with growing tf
        let (high, _) = calc.first_step(1000, DocId(1));
        assert!(high > 0.99 && high < 1.0);
    }

    #[test]
    fn test_okapi_tf_idf_prepare() {
        let mut calc = OkapiTfIdf::new(1.0);
        calc.prepare(1000, 10);
        let expected = ((1000.0 - 10.0 + 0.5) / 10.5f64).ln();
        assert!((calc.prepare_result() - expected).abs() < 1e-12);

        // ubiquitous term degrades to a positive sliver
        let mut flat = OkapiTfIdf::new(1.0);
        flat.prepare(10, 10);
        assert!(flat.prepare_result() > 0.0);
        assert!(flat.prepare_result() < 1e-300);
    }

    #[test]
    fn test_describe_and_parse() {
        let calc = calculator_from_description("OkapiTfIdf:1.5").unwrap();
        assert_eq!(calc.describe(true), "OkapiTfIdf:1.5");
        assert_eq!(calc.describe(false), "OkapiTfIdf");

        let calc = calculator_from_description("OkapiTf").unwrap();
        assert_eq!(calc.describe(true), "OkapiTf:1");

        assert!(calculator_from_description("Cosine").is_err());
        assert!(calculator_from_description("OkapiTf:x").is_err());
    }

    #[test]
    fn test_combiners() {
        assert_eq!(MinCombiner.combine(0.3, 0.7), 0.3);
        assert_eq!(MaxCombiner.combine(0.3, 0.7), 0.7);
        assert_eq!(ProdCombiner.combine(0.5, 0.5), 0.25);
        #[cfg(not(feature = "algebraic-sum"))]
        assert_eq!(SumCombiner.combine(0.3, 0.4), 0.7);
        assert_eq!(OneMinusNegator.negate(0.25), 0.75);
    }
}
