//! Usage Types - samples, totals and quota
//!
//! A metrics backend returns bucketed [`MetricSample`]s. Summed byte samples
//! reduce to a [`UsageTotal`] in megabytes, which is compared against a
//! [`Quota`] and priced.

use serde::{Deserialize, Serialize};

use crate::{BYTES_PER_MB, MB_PER_GB};

/// Statistic carried by a metric sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    /// Total over the bucket (bytes for transfer metrics)
    Sum,
    /// Mean over the bucket (percent for utilization metrics)
    Average,
}

impl StatisticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::Sum => "Sum",
            StatisticKind::Average => "Average",
        }
    }
}

/// One aggregated value for a sub-interval of the billing window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Bytes or percent, depending on the metric
    pub value: f64,
    /// Statistic kind
    pub statistic: StatisticKind,
}

impl MetricSample {
    pub fn sum(value: f64) -> Self {
        Self {
            value,
            statistic: StatisticKind::Sum,
        }
    }

    pub fn average(value: f64) -> Self {
        Self {
            value,
            statistic: StatisticKind::Average,
        }
    }
}

/// Transfer volume in megabytes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct UsageTotal {
    pub megabytes: f64,
}

impl UsageTotal {
    pub const ZERO: UsageTotal = UsageTotal { megabytes: 0.0 };

    pub fn from_megabytes(megabytes: f64) -> Self {
        Self { megabytes }
    }

    pub fn from_bytes(bytes: f64) -> Self {
        Self {
            megabytes: bytes / BYTES_PER_MB,
        }
    }

    pub fn from_gigabytes(gigabytes: f64) -> Self {
        Self {
            megabytes: gigabytes * MB_PER_GB,
        }
    }

    pub fn gigabytes(&self) -> f64 {
        self.megabytes / MB_PER_GB
    }
}

/// Inbound and outbound totals for one resource
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferUsage {
    pub inbound: UsageTotal,
    /// Billed direction: quota and cost apply here
    pub outbound: UsageTotal,
}

impl TransferUsage {
    pub fn new(inbound: UsageTotal, outbound: UsageTotal) -> Self {
        Self { inbound, outbound }
    }
}

/// Monthly transfer ceiling per resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub megabytes: f64,
}

impl Quota {
    pub fn from_megabytes(megabytes: f64) -> Self {
        Self { megabytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total_unit_conversions() {
        let total = UsageTotal::from_bytes(3.0 * 1024.0 * 1024.0);
        assert_eq!(total.megabytes, 3.0);

        let total = UsageTotal::from_gigabytes(2.0);
        assert_eq!(total.megabytes, 2048.0);
        assert_eq!(total.gigabytes(), 2.0);
    }

    #[test]
    fn test_sample_constructors() {
        assert_eq!(MetricSample::sum(10.0).statistic, StatisticKind::Sum);
        assert_eq!(MetricSample::average(55.0).statistic, StatisticKind::Average);
        assert_eq!(StatisticKind::Average.as_str(), "Average");
    }

    #[test]
    fn test_sample_serde_shape() {
        let json = serde_json::to_value(MetricSample::sum(1.5)).unwrap();
        assert_eq!(json["statistic"], "sum");
        assert_eq!(json["value"], 1.5);
    }
}
