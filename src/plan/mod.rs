pub mod aggregation;

pub use aggregation::{
    AggregateFunction, AggregationNode, AvgCascadeNode, CascadeQuery, ColumnNode, ScalarNode,
    combine_partials, plan_aggregation,
};
