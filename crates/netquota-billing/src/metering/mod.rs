//! Metering module
//!
//! Provides sample aggregation:
//! - UsageAggregator: sums byte samples into megabyte totals and averages
//!   utilization samples

pub mod aggregator;

pub use aggregator::{SampleTally, UsageAggregator};
