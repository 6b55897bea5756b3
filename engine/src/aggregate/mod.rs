//! Concurrent multi-source query aggregation

mod aggregator;

pub use aggregator::{AggregateError, QueryAggregator};
