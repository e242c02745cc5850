//! Aggregation planning for distributed (cascade) execution.
//!
//! On a cluster an aggregation runs in two phases: every shard computes a
//! partial aggregate over its rows, and a top node folds the partials.
//! Avg cannot be folded directly, so the planner rewrites it into a
//! Sum/Count pair for the shards and divides at the top. This is a pure
//! rewrite; nothing here iterates rows.

use std::cmp::Ordering;
use crate::core::error::{Error, ErrorKind, Result};
use crate::decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
    Max,
    Min,
}

impl AggregateFunction {
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
        }
    }
}

/// The query sent to each shard: a projection list plus the flag telling
/// whether the plan is distributed at all.
pub struct CascadeQuery {
    distribution: bool,
    projection: Vec<String>,
}

impl CascadeQuery {
    pub fn new(distribution: bool) -> Self {
        CascadeQuery { distribution, projection: Vec::new() }
    }

    pub fn is_distribution(&self) -> bool {
        self.distribution
    }

    pub fn add_projection_column(&mut self, sql: String) {
        if !self.projection.contains(&sql) {
            self.projection.push(sql);
        }
    }

    pub fn projection(&self) -> &[String] {
        &self.projection
    }
}

/// A scalar expression that can print itself as SQL and register what it
/// needs from the shards.
pub trait ScalarNode {
    fn to_sql(&self) -> String;
    fn retrieve_from_cascade(&self, query: &mut CascadeQuery);
}

/// Plain column reference
pub struct ColumnNode {
    name: String,
}

impl ColumnNode {
    pub fn new(name: impl Into<String>) -> Self {
        ColumnNode { name: name.into() }
    }
}

impl ScalarNode for ColumnNode {
    fn to_sql(&self) -> String {
        self.name.clone()
    }

    fn retrieve_from_cascade(&self, query: &mut CascadeQuery) {
        query.add_projection_column(self.to_sql());
    }
}

/// One aggregation over an operand, optionally DISTINCT.
pub struct AggregationNode {
    function: AggregateFunction,
    operand: Box<dyn ScalarNode>,
    distinct: bool,
}

impl AggregationNode {
    pub fn new(function: AggregateFunction, operand: Box<dyn ScalarNode>, distinct: bool) -> Self {
        AggregationNode { function, operand, distinct }
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }
}

impl ScalarNode for AggregationNode {
    fn to_sql(&self) -> String {
        if self.distinct {
            format!("{}(DISTINCT {})", self.function.sql_name(), self.operand.to_sql())
        } else {
            format!("{}({})", self.function.sql_name(), self.operand.to_sql())
        }
    }

    fn retrieve_from_cascade(&self, query: &mut CascadeQuery) {
        if self.distinct && query.is_distribution() {
            // distinct does not split; ship the rows and recompute on top
            self.operand.retrieve_from_cascade(query);
        } else {
            // shards compute the partial aggregate
            query.add_projection_column(self.to_sql());
        }
    }
}

/// The distributed form of Avg: shards return Sum and Count, the top node
/// divides.
pub struct AvgCascadeNode {
    sum: AggregationNode,
    count: AggregationNode,
}

impl AvgCascadeNode {
    pub fn new(operand_sql: impl Into<String> + Clone) -> Self {
        AvgCascadeNode {
            sum: AggregationNode::new(
                AggregateFunction::Sum,
                Box::new(ColumnNode::new(operand_sql.clone())),
                false,
            ),
            count: AggregationNode::new(
                AggregateFunction::Count,
                Box::new(ColumnNode::new(operand_sql)),
                false,
            ),
        }
    }
}

impl ScalarNode for AvgCascadeNode {
    fn to_sql(&self) -> String {
        format!("({} / {})", self.sum.to_sql(), self.count.to_sql())
    }

    fn retrieve_from_cascade(&self, query: &mut CascadeQuery) {
        self.sum.retrieve_from_cascade(query);
        self.count.retrieve_from_cascade(query);
    }
}

/// Plan one aggregation for the given query shape
pub fn plan_aggregation(
    function: AggregateFunction,
    operand_sql: impl Into<String> + Clone,
    distinct: bool,
    query: &CascadeQuery,
) -> Box<dyn ScalarNode> {
    if function == AggregateFunction::Avg && query.is_distribution() && !distinct {
        Box::new(AvgCascadeNode::new(operand_sql))
    } else {
        Box::new(AggregationNode::new(
            function,
            Box::new(ColumnNode::new(operand_sql)),
            distinct,
        ))
    }
}

/// Fold shard partials at the top of the cascade. Avg partials arrive as
/// (sum, count) pairs and go through `combine_avg` instead.
pub fn combine_partials(function: AggregateFunction, partials: &[Decimal]) -> Result<Decimal> {
    let mut iterator = partials.iter();
    let first = iterator.next().ok_or_else(|| {
        Error::new(ErrorKind::BadArgument, "no partials to combine".to_string())
    })?;
    let mut folded = first.clone();

    for partial in iterator {
        folded = match function {
            AggregateFunction::Sum | AggregateFunction::Count => folded.add(partial)?,
            AggregateFunction::Max => {
                if folded.compare(partial) == Ordering::Less {
                    partial.clone()
                } else {
                    folded
                }
            }
            AggregateFunction::Min => {
                if folded.compare(partial) == Ordering::Greater {
                    partial.clone()
                } else {
                    folded
                }
            }
            AggregateFunction::Avg => {
                return Err(Error::new(
                    ErrorKind::NotSupported,
                    "avg partials combine as sum/count pairs".to_string(),
                ));
            }
        };
    }
    Ok(folded)
}

/// Top-phase Avg: total of the partial sums over the total of the partial
/// counts
pub fn combine_avg(sums: &[Decimal], counts: &[Decimal]) -> Result<Decimal> {
    let total_sum = combine_partials(AggregateFunction::Sum, sums)?;
    let total_count = combine_partials(AggregateFunction::Sum, counts)?;
    total_sum.div(&total_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_printing() {
        let node = AggregationNode::new(
            AggregateFunction::Sum,
            Box::new(ColumnNode::new("t.price")),
            false,
        );
        assert_eq!(node.to_sql(), "SUM(t.price)");

        let distinct = AggregationNode::new(
            AggregateFunction::Count,
            Box::new(ColumnNode::new("t.user")),
            true,
        );
        assert_eq!(distinct.to_sql(), "COUNT(DISTINCT t.user)");

        let avg = AvgCascadeNode::new("t.price");
        assert_eq!(avg.to_sql(), "(SUM(t.price) / COUNT(t.price))");
    }

    #[test]
    fn test_avg_rewrites_for_distribution() {
        let mut query = CascadeQuery::new(true);
        let node = plan_aggregation(AggregateFunction::Avg, "t.price", false, &query);
        node.retrieve_from_cascade(&mut query);
        assert_eq!(query.projection(), &["SUM(t.price)", "COUNT(t.price)"]);
    }

    #[test]
    fn test_local_avg_stays_whole() {
        let mut query = CascadeQuery::new(false);
        let node = plan_aggregation(AggregateFunction::Avg, "t.price", false, &query);
        node.retrieve_from_cascade(&mut query);
        assert_eq!(query.projection(), &["AVG(t.price)"]);
    }

    #[test]
    fn test_distinct_distributed_recurses_to_operand() {
        let mut query = CascadeQuery::new(true);
        let node = plan_aggregation(AggregateFunction::Count, "t.user", true, &query);
        node.retrieve_from_cascade(&mut query);
        // the raw column ships; the distinct count happens on top
        assert_eq!(query.projection(), &["t.user"]);

        let mut local = CascadeQuery::new(false);
        let node = plan_aggregation(AggregateFunction::Count, "t.user", true, &local);
        node.retrieve_from_cascade(&mut local);
        assert_eq!(local.projection(), &["COUNT(DISTINCT t.user)"]);
    }

    #[test]
    fn test_combine_partials() {
        let partials = [
            Decimal::from_string("10.5").unwrap(),
            Decimal::from_string("2.25").unwrap(),
            Decimal::from_string("-1.75").unwrap(),
        ];
        let sum = combine_partials(AggregateFunction::Sum, &partials).unwrap();
        assert_eq!(sum.to_plain_string(), "11.00");

        let max = combine_partials(AggregateFunction::Max, &partials).unwrap();
        assert_eq!(max.to_plain_string(), "10.5");
        let min = combine_partials(AggregateFunction::Min, &partials).unwrap();
        assert_eq!(min.to_plain_string(), "-1.75");
    }

    #[test]
    fn test_combine_avg() {
        let sums = [
            Decimal::from_string("10").unwrap(),
            Decimal::from_string("20").unwrap(),
        ];
        let counts = [
            Decimal::from_string("2").unwrap(),
            Decimal::from_string("4").unwrap(),
        ];
        let avg = combine_avg(&sums, &counts).unwrap();
        assert_eq!(avg.compare(&Decimal::from_string("5").unwrap()), std::cmp::Ordering::Equal);
    }
}
