//! File-backed metrics
//!
//! Reads a JSON export of metric samples:
//!
//! ```json
//! {
//!   "i-0abc": {
//!     "NetworkOut": [{ "value": 1048576.0, "statistic": "sum" }],
//!     "CPUUtilization": [{ "value": 42.5, "statistic": "average" }]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use netquota_common::{MetricSample, MetricsError, Result};
use tracing::info;

use super::memory::InMemoryMetrics;
use crate::collaborators::{MetricQuery, MetricsProvider, ResourceLister};

type Snapshot = BTreeMap<String, BTreeMap<String, Vec<MetricSample>>>;

/// Metrics provider and resource lister over a JSON snapshot
#[derive(Debug)]
pub struct SnapshotMetricsProvider {
    store: InMemoryMetrics,
    resources: Vec<String>,
}

impl SnapshotMetricsProvider {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let provider = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            resources = provider.resources.len(),
            "Loaded metrics snapshot"
        );
        Ok(provider)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        let store = InMemoryMetrics::new();
        for (resource_id, metrics) in &snapshot {
            for (metric, samples) in metrics {
                store.insert(resource_id, metric, samples.clone());
            }
        }
        Ok(Self {
            store,
            resources: snapshot.into_keys().collect(),
        })
    }
}

#[async_trait]
impl MetricsProvider for SnapshotMetricsProvider {
    async fn fetch(&self, query: &MetricQuery) -> std::result::Result<Vec<MetricSample>, MetricsError> {
        self.store.fetch(query).await
    }
}

#[async_trait]
impl ResourceLister for SnapshotMetricsProvider {
    async fn list_all(&self) -> std::result::Result<Vec<String>, MetricsError> {
        Ok(self.resources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use netquota_common::{BillingWindow, NETWORK_OUT_METRIC};

    const SNAPSHOT: &str = r#"{
        "i-b": { "NetworkOut": [{ "value": 1048576.0, "statistic": "sum" }] },
        "i-a": {
            "NetworkOut": [
                { "value": 2097152.0, "statistic": "sum" },
                { "value": 1048576.0, "statistic": "sum" }
            ],
            "CPUUtilization": [{ "value": 42.5, "statistic": "average" }]
        }
    }"#;

    #[tokio::test]
    async fn test_snapshot_fetch_and_list() {
        let provider = SnapshotMetricsProvider::from_json(SNAPSHOT).unwrap();
        assert_eq!(provider.list_all().await.unwrap(), vec!["i-a", "i-b"]);

        let window =
            BillingWindow::full_month(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()).unwrap();
        let samples = provider
            .fetch(&MetricQuery::daily_sum(NETWORK_OUT_METRIC, "i-a", window))
            .await
            .unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, 2097152.0);
    }

    #[test]
    fn test_malformed_snapshot() {
        assert!(SnapshotMetricsProvider::from_json("{\"i-a\": 3}").is_err());
        assert!(SnapshotMetricsProvider::from_path("/nonexistent/netquota.json").is_err());
    }
}
