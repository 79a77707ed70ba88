//! In-memory collaborators
//!
//! Used by tests and local runs. Each one can be told to fail or to stall so
//! the workflow's degradation paths can be exercised.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use netquota_common::{ActionError, MetricSample, MetricsError, PricingError};
use parking_lot::Mutex;

use crate::collaborators::{
    Ack, Mailer, MetricQuery, MetricsProvider, Notifier, PricingCatalog, ResourceController,
    ResourceLister,
};

/// Metric store keyed by (resource, metric name)
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    samples: DashMap<(String, String), Vec<MetricSample>>,
    failures: DashMap<(String, String), String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<MetricQuery>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stall every fetch before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, resource_id: &str, metric: &str, samples: Vec<MetricSample>) {
        self.samples
            .insert((resource_id.to_string(), metric.to_string()), samples);
    }

    /// Make fetches of one metric fail with `reason`
    pub fn fail(&self, resource_id: &str, metric: &str, reason: impl Into<String>) {
        self.failures
            .insert((resource_id.to_string(), metric.to_string()), reason.into());
    }

    /// Resources with at least one stored metric, sorted
    pub fn resources(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.samples.iter().map(|e| e.key().0.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn queries(&self) -> Vec<MetricQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl MetricsProvider for InMemoryMetrics {
    async fn fetch(&self, query: &MetricQuery) -> Result<Vec<MetricSample>, MetricsError> {
        self.queries.lock().push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = (query.resource_id.clone(), query.metric_name.clone());
        if let Some(reason) = self.failures.get(&key) {
            return Err(MetricsError::Unavailable {
                resource_id: query.resource_id.clone(),
                metric: query.metric_name.clone(),
                reason: reason.value().clone(),
            });
        }

        Ok(self
            .samples
            .get(&key)
            .map(|samples| {
                samples
                    .iter()
                    .copied()
                    .filter(|s| s.statistic == query.statistic)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Region to first-tier rate table
#[derive(Debug, Clone)]
pub struct StaticPricingCatalog {
    rates: HashMap<String, f64>,
    unavailable: Option<String>,
}

impl StaticPricingCatalog {
    /// Empty table: every lookup is `NotFound`
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
            unavailable: None,
        }
    }

    pub fn with_rate(mut self, region: impl Into<String>, rate_usd_per_gb: f64) -> Self {
        self.rates.insert(region.into(), rate_usd_per_gb);
        self
    }

    /// Every lookup fails as if the catalog were down
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            rates: HashMap::new(),
            unavailable: Some(reason.into()),
        }
    }
}

impl Default for StaticPricingCatalog {
    /// Published internet egress rates for common regions
    fn default() -> Self {
        [
            ("us-east-1", 0.09),
            ("us-east-2", 0.09),
            ("us-west-1", 0.09),
            ("us-west-2", 0.09),
            ("eu-west-1", 0.09),
            ("eu-central-1", 0.09),
            ("ap-southeast-1", 0.12),
            ("ap-northeast-1", 0.114),
            ("ap-south-1", 0.1093),
            ("sa-east-1", 0.15),
        ]
        .into_iter()
        .fold(Self::empty(), |catalog, (region, rate)| {
            catalog.with_rate(region, rate)
        })
    }
}

#[async_trait]
impl PricingCatalog for StaticPricingCatalog {
    async fn rate_per_gb(&self, region: &str) -> Result<f64, PricingError> {
        if let Some(reason) = &self.unavailable {
            return Err(PricingError::Unavailable(reason.clone()));
        }
        self.rates
            .get(region)
            .copied()
            .ok_or_else(|| PricingError::NotFound {
                region: region.to_string(),
            })
    }
}

/// Shared failure/stall switches for the recording doubles
#[derive(Debug, Default)]
struct Behavior {
    failure: Option<String>,
    delay: Option<Duration>,
}

impl Behavior {
    async fn apply(&self, action: &str) -> Result<(), ActionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(reason) => Err(ActionError::failed(action, reason.clone())),
            None => Ok(()),
        }
    }
}

/// Records stop requests
#[derive(Debug, Default)]
pub struct RecordingController {
    stopped: Mutex<Vec<String>>,
    behavior: Behavior,
}

impl RecordingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior {
                failure: Some(reason.into()),
                delay: None,
            },
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behavior.delay = Some(delay);
        self
    }

    /// Every attempted stop, including failed ones
    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().clone()
    }
}

#[async_trait]
impl ResourceController for RecordingController {
    async fn stop(&self, resource_id: &str) -> Result<Ack, ActionError> {
        self.stopped.lock().push(resource_id.to_string());
        self.behavior.apply("stop").await?;
        Ok(Ack::with_reference(format!("stopping:{resource_id}")))
    }
}

/// A message published to a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub channel: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<Published>>,
    behavior: Behavior,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior {
                failure: Some(reason.into()),
                delay: None,
            },
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behavior.delay = Some(delay);
        self
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(
        &self,
        channel: &str,
        subject: &str,
        message: &str,
    ) -> Result<Ack, ActionError> {
        let id = {
            let mut published = self.published.lock();
            published.push(Published {
                channel: channel.to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
            });
            published.len()
        };
        self.behavior.apply("notification").await?;
        Ok(Ack::with_reference(format!("msg-{id}")))
    }
}

/// An email handed to the mailer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    behavior: Behavior,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: Behavior {
                failure: Some(reason.into()),
                delay: None,
            },
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behavior.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<Ack, ActionError> {
        let id = {
            let mut sent = self.sent.lock();
            sent.push(SentMail {
                subject: subject.to_string(),
                body: body.to_string(),
                recipient: recipient.to_string(),
            });
            sent.len()
        };
        self.behavior.apply("email").await?;
        Ok(Ack::with_reference(format!("mail-{id}")))
    }
}

/// Fixed resource list
#[derive(Debug, Clone, Default)]
pub struct StaticResourceLister {
    ids: Vec<String>,
    failure: Option<String>,
}

impl StaticResourceLister {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            ids: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

#[async_trait]
impl ResourceLister for StaticResourceLister {
    async fn list_all(&self) -> Result<Vec<String>, MetricsError> {
        match &self.failure {
            Some(reason) => Err(MetricsError::Listing(reason.clone())),
            None => Ok(self.ids.clone()),
        }
    }
}
