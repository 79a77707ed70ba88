//! Quota evaluation
//!
//! `usage_percent = usage / quota * 100`; a resource is over quota only when
//! the percentage is strictly above 100.

use netquota_common::{Quota, QuotaError, UsageTotal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of comparing usage with its quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStatus {
    Normal,
    Exceeded,
}

impl QuotaStatus {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, QuotaStatus::Exceeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaStatus::Normal => "Normal",
            QuotaStatus::Exceeded => "Exceeded",
        }
    }
}

impl std::fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaEvaluation {
    pub usage_percent: f64,
    pub status: QuotaStatus,
}

pub struct QuotaEvaluator;

impl QuotaEvaluator {
    /// Percentage threshold above which a quota counts as exceeded
    pub const EXCEEDED_ABOVE_PERCENT: f64 = 100.0;

    pub fn evaluate(usage: &UsageTotal, quota: &Quota) -> Result<QuotaEvaluation, QuotaError> {
        if quota.megabytes == 0.0 {
            return Err(QuotaError::DivisionByZero);
        }
        if !quota.megabytes.is_finite() || quota.megabytes < 0.0 {
            return Err(QuotaError::InvalidQuota(quota.megabytes));
        }

        let usage_percent = usage.megabytes / quota.megabytes * 100.0;
        let status = if usage_percent > Self::EXCEEDED_ABOVE_PERCENT {
            QuotaStatus::Exceeded
        } else {
            QuotaStatus::Normal
        };

        debug!(usage_mb = usage.megabytes, quota_mb = quota.megabytes, usage_percent, %status, "Evaluated quota");
        Ok(QuotaEvaluation {
            usage_percent,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(usage: f64, quota: f64) -> Result<QuotaEvaluation, QuotaError> {
        QuotaEvaluator::evaluate(&UsageTotal::from_megabytes(usage), &Quota::from_megabytes(quota))
    }

    #[test]
    fn test_exactly_full_is_normal() {
        let evaluation = evaluate(1000.0, 1000.0).unwrap();
        assert_eq!(evaluation.usage_percent, 100.0);
        assert_eq!(evaluation.status, QuotaStatus::Normal);
    }

    #[test]
    fn test_just_over_is_exceeded() {
        let evaluation = evaluate(1000.01, 1000.0).unwrap();
        assert!(evaluation.usage_percent > 100.0);
        assert_eq!(evaluation.status, QuotaStatus::Exceeded);
    }

    #[test]
    fn test_half_used() {
        let evaluation = evaluate(250.0, 500.0).unwrap();
        assert_eq!(evaluation.usage_percent, 50.0);
        assert!(!evaluation.status.is_exceeded());
    }

    #[test]
    fn test_zero_quota_is_an_error() {
        assert_eq!(evaluate(10.0, 0.0), Err(QuotaError::DivisionByZero));
        assert_eq!(evaluate(0.0, 0.0), Err(QuotaError::DivisionByZero));
    }

    #[test]
    fn test_invalid_quota() {
        assert_eq!(evaluate(10.0, -5.0), Err(QuotaError::InvalidQuota(-5.0)));
        assert!(matches!(evaluate(10.0, f64::NAN), Err(QuotaError::InvalidQuota(_))));
        assert!(matches!(evaluate(10.0, f64::INFINITY), Err(QuotaError::InvalidQuota(_))));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(QuotaStatus::Exceeded.to_string(), "Exceeded");
        assert_eq!(QuotaStatus::Normal.as_str(), "Normal");
    }
}
