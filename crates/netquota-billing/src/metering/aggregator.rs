//! Usage aggregation
//!
//! Reduces the bucketed samples of a billing window to totals.

use netquota_common::{MetricSample, StatisticKind, TransferUsage, UsageTotal};
use tracing::{debug, warn};

/// Counts gathered while folding a sample sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleTally {
    /// Sum of accepted values
    pub total: f64,
    /// Samples that contributed to the total
    pub accepted: usize,
    /// Samples of the wrong statistic kind
    pub ignored: usize,
    /// Negative or non-finite values
    pub rejected: usize,
}

impl SampleTally {
    fn fold(samples: &[MetricSample], kind: StatisticKind) -> Self {
        let mut tally = Self::default();
        for sample in samples {
            if sample.statistic != kind {
                tally.ignored += 1;
                continue;
            }
            if !sample.value.is_finite() || sample.value < 0.0 {
                tally.rejected += 1;
                continue;
            }
            tally.total += sample.value;
            tally.accepted += 1;
        }
        tally
    }
}

/// Stateless aggregator for metric samples
pub struct UsageAggregator;

impl UsageAggregator {
    /// Sum the `Sum` samples (bytes) and convert to megabytes.
    ///
    /// An empty sequence is valid and yields zero usage.
    pub fn aggregate(samples: &[MetricSample]) -> UsageTotal {
        let tally = SampleTally::fold(samples, StatisticKind::Sum);
        if tally.rejected > 0 {
            warn!(rejected = tally.rejected, "Skipped invalid byte samples");
        }
        debug!(
            accepted = tally.accepted,
            ignored = tally.ignored,
            bytes = tally.total,
            "Aggregated transfer samples"
        );
        UsageTotal::from_bytes(tally.total)
    }

    /// Aggregate both transfer directions of one resource
    pub fn aggregate_transfer(inbound: &[MetricSample], outbound: &[MetricSample]) -> TransferUsage {
        TransferUsage::new(Self::aggregate(inbound), Self::aggregate(outbound))
    }

    /// Mean of the `Average` samples, `None` when there are none
    pub fn average(samples: &[MetricSample]) -> Option<f64> {
        let tally = SampleTally::fold(samples, StatisticKind::Average);
        if tally.rejected > 0 {
            warn!(rejected = tally.rejected, "Skipped invalid average samples");
        }
        if tally.accepted == 0 {
            return None;
        }
        Some(tally.total / tally.accepted as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netquota_common::BYTES_PER_MB;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(UsageAggregator::aggregate(&[]), UsageTotal::ZERO);
    }

    #[test]
    fn test_daily_buckets_sum_to_megabytes() {
        let samples = vec![
            MetricSample::sum(512.0 * 1024.0 * 1024.0),
            MetricSample::sum(256.0 * 1024.0 * 1024.0),
            MetricSample::sum(256.0 * 1024.0 * 1024.0),
        ];
        assert_eq!(UsageAggregator::aggregate(&samples).megabytes, 1024.0);
    }

    #[test]
    fn test_average_samples_do_not_count_as_bytes() {
        let samples = vec![MetricSample::sum(BYTES_PER_MB), MetricSample::average(99.0)];
        assert_eq!(UsageAggregator::aggregate(&samples).megabytes, 1.0);
    }

    #[test]
    fn test_invalid_values_skipped() {
        let samples = vec![
            MetricSample::sum(BYTES_PER_MB),
            MetricSample::sum(-5.0),
            MetricSample::sum(f64::NAN),
            MetricSample::sum(f64::INFINITY),
        ];
        let tally = SampleTally::fold(&samples, StatisticKind::Sum);
        assert_eq!(tally.accepted, 1);
        assert_eq!(tally.rejected, 3);
        assert_eq!(UsageAggregator::aggregate(&samples).megabytes, 1.0);
    }

    #[test]
    fn test_transfer_directions() {
        let usage = UsageAggregator::aggregate_transfer(
            &[MetricSample::sum(BYTES_PER_MB)],
            &[MetricSample::sum(3.0 * BYTES_PER_MB)],
        );
        assert_eq!(usage.inbound.megabytes, 1.0);
        assert_eq!(usage.outbound.megabytes, 3.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(UsageAggregator::average(&[]), None);
        assert_eq!(UsageAggregator::average(&[MetricSample::sum(10.0)]), None);

        let samples = vec![
            MetricSample::average(40.0),
            MetricSample::average(60.0),
            MetricSample::average(80.0),
        ];
        assert_eq!(UsageAggregator::average(&samples), Some(60.0));
    }

    proptest! {
        #[test]
        fn prop_aggregate_matches_sum(values in prop::collection::vec(0.0f64..1.0e12, 0..64)) {
            let samples: Vec<_> = values.iter().copied().map(MetricSample::sum).collect();
            let expected = values.iter().sum::<f64>() / BYTES_PER_MB;
            let total = UsageAggregator::aggregate(&samples);
            prop_assert!((total.megabytes - expected).abs() <= expected.abs() * 1e-12 + 1e-9);
        }
    }
}
