//! Usage report assembly
//!
//! Renders the plain-text status report that is mailed (and, when the quota
//! is exceeded, published) for each monitored resource.

use std::fmt::Write as _;

use netquota_common::{Quota, TransferUsage, NETWORK_IN_METRIC, NETWORK_OUT_METRIC};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::pricing::{CostEstimate, CostMode};
use crate::quota::{QuotaEvaluation, QuotaStatus, UtilizationBreach};

/// Evaluated state of one resource for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub resource_id: String,
    pub usage: TransferUsage,
    pub quota: Quota,
    pub usage_percent: f64,
    pub status: QuotaStatus,
    pub cost: CostEstimate,
    pub breaches: Vec<UtilizationBreach>,
    /// Soft failures recorded while acting on the report
    pub notes: Vec<String>,
    pub narrative: String,
}

impl UsageReport {
    /// Append a note line and re-render the narrative
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
        self.narrative = render(self);
    }

    pub fn status_text(&self) -> &'static str {
        match self.status {
            QuotaStatus::Normal => "Normal - instance running",
            QuotaStatus::Exceeded => "Exceeded - quota used up, stop requested",
        }
    }

    pub fn used_fallback_price(&self) -> bool {
        self.cost.mode.is_fallback()
    }
}

pub struct UsageReportBuilder {
    resource_id: String,
    usage: TransferUsage,
    quota: Quota,
    evaluation: QuotaEvaluation,
    cost: CostEstimate,
    breaches: Vec<UtilizationBreach>,
    notes: Vec<String>,
}

impl UsageReportBuilder {
    pub fn new(
        resource_id: impl Into<String>,
        usage: TransferUsage,
        quota: Quota,
        evaluation: QuotaEvaluation,
        cost: CostEstimate,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            usage,
            quota,
            evaluation,
            cost,
            breaches: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn breaches(mut self, breaches: Vec<UtilizationBreach>) -> Self {
        self.breaches = breaches;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn build(self) -> UsageReport {
        let mut report = UsageReport {
            resource_id: self.resource_id,
            usage: self.usage,
            quota: self.quota,
            usage_percent: self.evaluation.usage_percent,
            status: self.evaluation.status,
            cost: self.cost,
            breaches: self.breaches,
            notes: self.notes,
            narrative: String::new(),
        };
        report.narrative = render(&report);
        report
    }
}

/// `$1234.57`, rounded half away from zero
pub fn format_usd(amount: Decimal) -> String {
    format!(
        "${:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn cost_line(cost: &CostEstimate) -> String {
    match cost.mode {
        CostMode::Tiered => format!("{} (tiered pricing)", format_usd(cost.usd)),
        CostMode::FlatFallback { rate_usd_per_gb } => format!(
            "{} (flat rate ${}/GB, used default price)",
            format_usd(cost.usd),
            rate_usd_per_gb.normalize()
        ),
    }
}

fn render(report: &UsageReport) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Instance ID: {}", report.resource_id);
    let _ = writeln!(
        text,
        "Total {NETWORK_OUT_METRIC} Usage: {:.2} MB",
        report.usage.outbound.megabytes
    );
    let _ = writeln!(
        text,
        "Total {NETWORK_IN_METRIC} Usage: {:.2} MB",
        report.usage.inbound.megabytes
    );
    let _ = writeln!(text, "Quota: {:.2} MB", report.quota.megabytes);
    let _ = writeln!(text, "Usage Percent: {:.2}%", report.usage_percent);
    let _ = writeln!(text, "Status: {}", report.status_text());
    let _ = write!(text, "Estimated Cost: {}", cost_line(&report.cost));
    for breach in &report.breaches {
        let _ = write!(
            text,
            "\nUtilization: {} average {:.2}% above {:.2}%",
            breach.metric, breach.average_percent, breach.max_percent
        );
    }
    for note in &report.notes {
        let _ = write!(text, "\nNote: {note}");
    }
    text
}
