//! Analysis modules.
//!
//! Metric extraction rules and the cross-run aggregator.

pub mod aggregator;
pub mod metric;

pub use aggregator::{AggregateOptions, LogAggregator};
pub use metric::{MetricRule, BUILTIN_METRICS};
