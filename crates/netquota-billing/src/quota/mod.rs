//! Threshold evaluation: transfer quota and utilization ceilings

pub mod evaluator;
pub mod utilization;

pub use evaluator::{QuotaEvaluation, QuotaEvaluator, QuotaStatus};
pub use utilization::{UtilizationBreach, UtilizationEvaluator, UtilizationThreshold};
