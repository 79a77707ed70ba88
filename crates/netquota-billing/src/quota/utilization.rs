//! Utilization ceilings for average-percent metrics (CPU, disk, memory)
//!
//! Unlike the transfer quota, a breach here only raises an alert.

use std::collections::HashMap;
use std::str::FromStr;

use netquota_common::NetquotaError;
use serde::{Deserialize, Serialize};

/// Ceiling for one metric, e.g. `CPUUtilization=90`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationThreshold {
    pub metric: String,
    pub max_percent: f64,
}

impl UtilizationThreshold {
    pub fn new(metric: impl Into<String>, max_percent: f64) -> Self {
        Self {
            metric: metric.into(),
            max_percent,
        }
    }

    /// Breach when the average is strictly above the ceiling
    pub fn check(&self, average_percent: f64) -> Option<UtilizationBreach> {
        (average_percent > self.max_percent).then(|| UtilizationBreach {
            metric: self.metric.clone(),
            average_percent,
            max_percent: self.max_percent,
        })
    }

    /// Parse a comma-separated `metric=percent` list; blanks are skipped
    pub fn parse_list(list: &str) -> Result<Vec<Self>, NetquotaError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for UtilizationThreshold {
    type Err = NetquotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (metric, percent) = s.split_once('=').ok_or_else(|| {
            NetquotaError::Config(format!("utilization threshold must be metric=percent: {s}"))
        })?;
        let metric = metric.trim();
        if metric.is_empty() {
            return Err(NetquotaError::Config(format!(
                "utilization threshold has no metric: {s}"
            )));
        }
        let max_percent: f64 = percent.trim().parse().map_err(|_| {
            NetquotaError::Config(format!("invalid utilization percent: {}", percent.trim()))
        })?;
        if !(0.0..=100.0).contains(&max_percent) {
            return Err(NetquotaError::Config(format!(
                "utilization percent out of range: {max_percent}"
            )));
        }
        Ok(Self::new(metric, max_percent))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationBreach {
    pub metric: String,
    pub average_percent: f64,
    pub max_percent: f64,
}

pub struct UtilizationEvaluator;

impl UtilizationEvaluator {
    /// Breaches in threshold order. Metrics without a measured average are
    /// not breaches.
    pub fn evaluate(
        thresholds: &[UtilizationThreshold],
        averages: &HashMap<String, f64>,
    ) -> Vec<UtilizationBreach> {
        thresholds
            .iter()
            .filter_map(|t| averages.get(&t.metric).and_then(|avg| t.check(*avg)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_is_strict() {
        let threshold = UtilizationThreshold::new("CPUUtilization", 90.0);
        assert!(threshold.check(90.0).is_none());
        let breach = threshold.check(90.5).unwrap();
        assert_eq!(breach.metric, "CPUUtilization");
        assert_eq!(breach.average_percent, 90.5);
    }

    #[test]
    fn test_evaluator_keeps_threshold_order() {
        let thresholds = vec![
            UtilizationThreshold::new("disk_used_percent", 85.0),
            UtilizationThreshold::new("CPUUtilization", 90.0),
            UtilizationThreshold::new("mem_used_percent", 70.0),
        ];
        let averages = HashMap::from([
            ("CPUUtilization".to_string(), 97.0),
            ("disk_used_percent".to_string(), 91.0),
        ]);

        let breaches = UtilizationEvaluator::evaluate(&thresholds, &averages);
        let metrics: Vec<_> = breaches.iter().map(|b| b.metric.as_str()).collect();
        assert_eq!(metrics, vec!["disk_used_percent", "CPUUtilization"]);
    }

    #[test]
    fn test_parse_list() {
        let thresholds =
            UtilizationThreshold::parse_list("CPUUtilization=90, disk_used_percent = 85 ,").unwrap();
        assert_eq!(
            thresholds,
            vec![
                UtilizationThreshold::new("CPUUtilization", 90.0),
                UtilizationThreshold::new("disk_used_percent", 85.0),
            ]
        );
        assert!(UtilizationThreshold::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!("CPUUtilization".parse::<UtilizationThreshold>().is_err());
        assert!("=50".parse::<UtilizationThreshold>().is_err());
        assert!("mem=lots".parse::<UtilizationThreshold>().is_err());
        assert!("mem=150".parse::<UtilizationThreshold>().is_err());
    }
}
