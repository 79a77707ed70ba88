//! Monitoring workflow
//!
//! One invocation walks every monitored resource through
//! `Start -> MetricsFetched -> Evaluated -> (Normal | Exceeded) -> Reported -> Done`.
//! Resources run through a bounded, order-preserving pool; a failure on one
//! resource never aborts the others.

use std::collections::HashMap;
use std::future::Future;

use futures::stream::{self, StreamExt};
use netquota_billing::{
    Billing, BillingConfig, CostMode, QuotaEvaluator, TieredCostCalculator, UsageReport,
    UsageReportBuilder, UtilizationEvaluator,
};
use netquota_common::{
    ActionError, BillingWindow, NetquotaError, PricingError, Result, TransferUsage,
    NETWORK_IN_METRIC, NETWORK_OUT_METRIC,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::collaborators::{Ack, Collaborators};
use crate::config::MonitorConfig;
use crate::telemetry::MonitorMetrics;
use crate::{QUOTA_EXCEEDED_SUBJECT, REPORT_SUBJECT, UTILIZATION_SUBJECT};

/// Per-resource state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Start,
    MetricsFetched,
    Evaluated,
    Normal,
    Exceeded,
    Reported,
    Done,
}

/// Result of one side-effecting call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded { reference: Option<String> },
    Failed { reason: String },
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded { .. })
    }
}

impl From<&std::result::Result<Ack, ActionError>> for ActionOutcome {
    fn from(result: &std::result::Result<Ack, ActionError>) -> Self {
        match result {
            Ok(ack) => ActionOutcome::Succeeded {
                reference: ack.reference.clone(),
            },
            Err(e) => ActionOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Actions attempted for one resource; `None` means not attempted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    pub stop: Option<ActionOutcome>,
    pub notify: Option<ActionOutcome>,
    pub email: Option<ActionOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Normal,
    Exceeded,
    /// Metrics could not be fetched; nothing was done
    Skipped,
}

/// Everything that happened to one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutcome {
    pub resource_id: String,
    pub status: ResourceStatus,
    pub states: Vec<WorkflowState>,
    pub report: Option<UsageReport>,
    pub actions: ActionLog,
    pub error: Option<String>,
}

impl ResourceOutcome {
    fn skipped(resource_id: String, states: Vec<WorkflowState>, error: &NetquotaError) -> Self {
        let mut states = states;
        states.push(WorkflowState::Done);
        Self {
            resource_id,
            status: ResourceStatus::Skipped,
            states,
            report: None,
            actions: ActionLog::default(),
            error: Some(error.to_string()),
        }
    }
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationSummary {
    pub status_code: u16,
    pub window: BillingWindow,
    pub region: String,
    pub pricing_mode: CostMode,
    pub resources: Vec<ResourceOutcome>,
    /// Invocation-level soft failures
    pub warnings: Vec<String>,
}

impl InvocationSummary {
    pub fn count(&self, status: ResourceStatus) -> usize {
        self.resources.iter().filter(|r| r.status == status).count()
    }

    pub fn outcome(&self, resource_id: &str) -> Option<&ResourceOutcome> {
        self.resources.iter().find(|r| r.resource_id == resource_id)
    }

    /// `{ "statusCode": 200, "body": "<summary json>" }`
    pub fn to_response(&self) -> Result<InvocationResponse> {
        Ok(InvocationResponse {
            status_code: self.status_code,
            body: serde_json::to_string(self)?,
        })
    }
}

/// Handler-style response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    /// 500 carrying the error message
    pub fn from_error(err: &NetquotaError) -> Self {
        Self {
            status_code: 500,
            body: serde_json::json!({ "error": err.to_string() }).to_string(),
        }
    }
}

/// Usage monitoring workflow
pub struct MonitoringWorkflow {
    config: MonitorConfig,
    collaborators: Collaborators,
    billing: Billing,
    metrics: MonitorMetrics,
}

impl MonitoringWorkflow {
    pub fn new(
        config: MonitorConfig,
        collaborators: Collaborators,
        metrics: MonitorMetrics,
    ) -> Result<Self> {
        config.validate()?;
        let billing = Billing::new(BillingConfig {
            fallback_rate: config.fallback_rate,
            ..BillingConfig::default()
        });
        Ok(Self {
            config,
            collaborators,
            billing,
            metrics,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.metrics
    }

    /// Run and render the handler response
    pub async fn invoke(&self, window: BillingWindow) -> InvocationResponse {
        match self.run(window).await.and_then(|summary| summary.to_response()) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Invocation failed");
                InvocationResponse::from_error(&e)
            }
        }
    }

    /// Evaluate every monitored resource for `window`
    #[instrument(skip(self, window), fields(start = %window.start, end = %window.end))]
    pub async fn run(&self, window: BillingWindow) -> Result<InvocationSummary> {
        let mut warnings = Vec::new();

        let calculator = self.resolve_pricing().await?;
        if calculator.mode().is_fallback() {
            self.metrics.pricing_fallbacks.inc();
            warnings.push(format!(
                "pricing lookup failed for {}, used default price",
                self.config.region
            ));
        }

        let resource_ids = match self.resource_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Resource listing failed");
                warnings.push(format!("resource listing failed: {e}"));
                Vec::new()
            }
        };
        info!(
            resources = resource_ids.len(),
            workers = self.config.max_concurrency,
            "Evaluating resources"
        );

        let resources: Vec<ResourceOutcome> = stream::iter(resource_ids)
            .map(|id| self.evaluate_resource(id, window, &calculator))
            .buffered(self.config.max_concurrency)
            .collect()
            .await;

        Ok(InvocationSummary {
            status_code: 200,
            window,
            region: self.config.region.clone(),
            pricing_mode: calculator.mode(),
            resources,
            warnings,
        })
    }

    /// One pricing lookup per invocation
    async fn resolve_pricing(&self) -> Result<TieredCostCalculator> {
        let region = self.config.region.as_str();
        let lookup = self
            .bounded("pricing lookup", self.collaborators.pricing.rate_per_gb(region))
            .await
            .map_err(|e| match e {
                NetquotaError::Pricing(p) => p,
                other => PricingError::Unavailable(other.to_string()),
            })
            .and_then(|rate| {
                Decimal::try_from(rate)
                    .map_err(|_| PricingError::InvalidSchedule(format!("unusable rate {rate}")))
            });

        self.billing
            .calculator_for(region, lookup)
            .map_err(|e| NetquotaError::Config(format!("fallback rate unusable: {e}")))
    }

    async fn resource_ids(&self) -> Result<Vec<String>> {
        if !self.config.instance_ids.is_empty() {
            return Ok(self.config.instance_ids.clone());
        }
        debug!("No instances configured, listing all");
        self.bounded("resource listing", self.collaborators.lister.list_all())
            .await
    }

    #[instrument(skip(self, window, calculator))]
    async fn evaluate_resource(
        &self,
        resource_id: String,
        window: BillingWindow,
        calculator: &TieredCostCalculator,
    ) -> ResourceOutcome {
        let mut states = vec![WorkflowState::Start];
        let metrics = &self.collaborators.metrics;

        let outbound = self
            .bounded(
                "NetworkOut fetch",
                metrics.sum(NETWORK_OUT_METRIC, &resource_id, window),
            )
            .await;
        let inbound = self
            .bounded(
                "NetworkIn fetch",
                metrics.sum(NETWORK_IN_METRIC, &resource_id, window),
            )
            .await;
        let usage = match (inbound, outbound) {
            (Ok(inbound), Ok(outbound)) => TransferUsage::new(inbound, outbound),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Metrics unavailable, skipping resource");
                self.metrics.resources_skipped.inc();
                return ResourceOutcome::skipped(resource_id, states, &e);
            }
        };

        let mut averages = HashMap::new();
        let mut notes = Vec::new();
        for threshold in &self.config.utilization_thresholds {
            let average = self
                .bounded(
                    "utilization fetch",
                    metrics.average(&threshold.metric, &resource_id, window),
                )
                .await;
            match average {
                Ok(Some(average)) => {
                    averages.insert(threshold.metric.clone(), average);
                }
                Ok(None) => debug!(metric = %threshold.metric, "No utilization data"),
                Err(e) => {
                    warn!(metric = %threshold.metric, error = %e, "Utilization unavailable");
                    notes.push(format!("{} unavailable: {e}", threshold.metric));
                }
            }
        }
        states.push(WorkflowState::MetricsFetched);

        let breaches =
            UtilizationEvaluator::evaluate(&self.config.utilization_thresholds, &averages);

        let evaluation = match QuotaEvaluator::evaluate(&usage.outbound, &self.config.quota) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                let e = NetquotaError::from(e);
                warn!(error = %e, "Quota evaluation failed, skipping resource");
                self.metrics.resources_skipped.inc();
                return ResourceOutcome::skipped(resource_id, states, &e);
            }
        };
        let cost = calculator.estimate(&usage.outbound);
        self.metrics.resources_evaluated.inc();
        self.metrics
            .utilization_breaches
            .inc_by(breaches.len() as u64);

        let mut report = UsageReportBuilder::new(
            resource_id.clone(),
            usage,
            self.config.quota,
            evaluation,
            cost,
        )
        .breaches(breaches)
        .build();
        for note in notes {
            report.push_note(note);
        }
        states.push(WorkflowState::Evaluated);
        info!(
            outbound_mb = usage.outbound.megabytes,
            usage_percent = evaluation.usage_percent,
            status = %evaluation.status,
            cost = %cost.usd,
            "Resource evaluated"
        );

        let mut actions = ActionLog::default();
        let status = if evaluation.status.is_exceeded() {
            states.push(WorkflowState::Exceeded);
            self.metrics.quota_exceeded.inc();

            let stopped = self
                .act("stop", self.collaborators.controller.stop(&resource_id))
                .await;
            record(&mut report, "stop action failed", &stopped);
            actions.stop = Some(ActionOutcome::from(&stopped));

            let notified = self
                .act(
                    "notification",
                    self.collaborators.notifier.publish(
                        &self.config.sns_topic,
                        QUOTA_EXCEEDED_SUBJECT,
                        &report.narrative,
                    ),
                )
                .await;
            record(&mut report, "notification failed", &notified);
            actions.notify = Some(ActionOutcome::from(&notified));
            ResourceStatus::Exceeded
        } else {
            states.push(WorkflowState::Normal);
            if !report.breaches.is_empty() {
                let notified = self
                    .act(
                        "notification",
                        self.collaborators.notifier.publish(
                            &self.config.sns_topic,
                            UTILIZATION_SUBJECT,
                            &report.narrative,
                        ),
                    )
                    .await;
                record(&mut report, "notification failed", &notified);
                actions.notify = Some(ActionOutcome::from(&notified));
            }
            ResourceStatus::Normal
        };

        let emailed = self
            .act(
                "email",
                self.collaborators.mailer.send(
                    REPORT_SUBJECT,
                    &report.narrative,
                    &self.config.email_address,
                ),
            )
            .await;
        record(&mut report, "email failed", &emailed);
        actions.email = Some(ActionOutcome::from(&emailed));
        states.push(WorkflowState::Reported);
        states.push(WorkflowState::Done);

        ResourceOutcome {
            resource_id,
            status,
            states,
            report: Some(report),
            actions,
            error: None,
        }
    }

    /// Run a collaborator call under the configured timeout
    async fn bounded<T, E, F>(&self, call: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        NetquotaError: From<E>,
    {
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result.map_err(NetquotaError::from),
            Err(_) => Err(NetquotaError::Timeout(format!(
                "{call} after {}ms",
                self.config.call_timeout.as_millis()
            ))),
        }
    }

    /// Attempt a side effect once; failures are logged and counted
    async fn act<F>(&self, action: &str, fut: F) -> std::result::Result<Ack, ActionError>
    where
        F: Future<Output = std::result::Result<Ack, ActionError>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ActionError::Timeout {
                action: action.to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        };
        match &result {
            Ok(ack) => info!(action, reference = ?ack.reference, "Action succeeded"),
            Err(e) => {
                self.metrics.action_failures.inc();
                warn!(action, error = %e, "Action failed");
            }
        }
        result
    }
}

/// Add a report note for a failed action
fn record(report: &mut UsageReport, label: &str, result: &std::result::Result<Ack, ActionError>) {
    if let Err(e) = result {
        let reason = match e {
            ActionError::Failed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        report.push_note(format!("{label}: {reason}"));
    }
}
