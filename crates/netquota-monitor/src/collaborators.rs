//! External collaborators of the monitoring workflow
//!
//! Each capability the workflow needs from the outside world sits behind its
//! own trait so providers can be swapped without touching the decision logic.

use std::sync::Arc;

use async_trait::async_trait;
use netquota_billing::UsageAggregator;
use netquota_common::{
    ActionError, BillingWindow, MetricSample, MetricsError, PricingError, StatisticKind,
    UsageTotal, DAILY_PERIOD_SECS,
};
use serde::{Deserialize, Serialize};

/// One metric query against the metrics service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub metric_name: String,
    pub resource_id: String,
    pub window: BillingWindow,
    /// Bucket size in seconds
    pub period_secs: u32,
    pub statistic: StatisticKind,
}

impl MetricQuery {
    /// Daily `Sum` buckets, used for transfer volume
    pub fn daily_sum(
        metric_name: impl Into<String>,
        resource_id: impl Into<String>,
        window: BillingWindow,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            resource_id: resource_id.into(),
            window,
            period_secs: DAILY_PERIOD_SECS,
            statistic: StatisticKind::Sum,
        }
    }

    /// Daily `Average` buckets, used for utilization percentages
    pub fn daily_average(
        metric_name: impl Into<String>,
        resource_id: impl Into<String>,
        window: BillingWindow,
    ) -> Self {
        Self {
            statistic: StatisticKind::Average,
            ..Self::daily_sum(metric_name, resource_id, window)
        }
    }
}

/// Acknowledgement of a side-effecting call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Provider reference, e.g. a message id
    pub reference: Option<String>,
}

impl Ack {
    pub fn with_reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }
}

/// Time-bucketed metric statistics
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Samples for the query, in bucket order; empty when nothing was recorded
    async fn fetch(&self, query: &MetricQuery) -> Result<Vec<MetricSample>, MetricsError>;

    /// Total transfer of one metric over the window
    async fn sum(
        &self,
        metric_name: &str,
        resource_id: &str,
        window: BillingWindow,
    ) -> Result<UsageTotal, MetricsError> {
        let samples = self
            .fetch(&MetricQuery::daily_sum(metric_name, resource_id, window))
            .await?;
        Ok(UsageAggregator::aggregate(&samples))
    }

    /// Mean percent of one metric over the window, `None` without data
    async fn average(
        &self,
        metric_name: &str,
        resource_id: &str,
        window: BillingWindow,
    ) -> Result<Option<f64>, MetricsError> {
        let samples = self
            .fetch(&MetricQuery::daily_average(metric_name, resource_id, window))
            .await?;
        Ok(UsageAggregator::average(&samples))
    }
}

/// Stops compute resources
#[async_trait]
pub trait ResourceController: Send + Sync {
    async fn stop(&self, resource_id: &str) -> Result<Ack, ActionError>;
}

/// Regional data-transfer price lookup
#[async_trait]
pub trait PricingCatalog: Send + Sync {
    /// First-tier outbound rate in USD per GB
    async fn rate_per_gb(&self, region: &str) -> Result<f64, PricingError>;
}

/// Publishes alerts to a notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, channel: &str, subject: &str, message: &str)
        -> Result<Ack, ActionError>;
}

/// Sends the usage report email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<Ack, ActionError>;
}

/// Enumerates monitored resources when none are configured
#[async_trait]
pub trait ResourceLister: Send + Sync {
    async fn list_all(&self) -> Result<Vec<String>, MetricsError>;
}

/// The full set of collaborators one workflow talks to
#[derive(Clone)]
pub struct Collaborators {
    pub metrics: Arc<dyn MetricsProvider>,
    pub controller: Arc<dyn ResourceController>,
    pub pricing: Arc<dyn PricingCatalog>,
    pub notifier: Arc<dyn Notifier>,
    pub mailer: Arc<dyn Mailer>,
    pub lister: Arc<dyn ResourceLister>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
