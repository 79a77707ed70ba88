//! Netquota Monitor - one invocation over the current billing window

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use netquota_common::NetquotaError;
use netquota_monitor::providers::{
    DryRunController, DryRunMailer, DryRunNotifier, SnapshotMetricsProvider, StaticPricingCatalog,
};
use netquota_monitor::{
    Collaborators, InvocationResponse, MonitorConfig, MonitorMetrics, MonitoringWorkflow,
};
use prometheus::Encoder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = netquota_common::VERSION, "Starting Netquota Monitor...");

    let config = match MonitorConfig::load().and_then(require_snapshot) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            println!("{}", serde_json::to_string(&InvocationResponse::from_error(&e))?);
            return Err(e.into());
        }
    };

    let window = config.window_policy.window_at(Utc::now())?;
    let snapshot = config
        .metrics_snapshot
        .as_ref()
        .context("metrics snapshot path missing")?;
    let metrics_source = Arc::new(SnapshotMetricsProvider::from_path(snapshot)?);

    let collaborators = Collaborators {
        metrics: metrics_source.clone(),
        controller: Arc::new(DryRunController),
        pricing: Arc::new(StaticPricingCatalog::default()),
        notifier: Arc::new(DryRunNotifier),
        mailer: Arc::new(DryRunMailer),
        lister: metrics_source,
    };

    let registry = prometheus::Registry::new();
    let metrics = MonitorMetrics::new()?;
    metrics.register(&registry)?;

    let workflow = MonitoringWorkflow::new(config, collaborators, metrics)?;
    let response = workflow.invoke(window).await;
    println!("{}", serde_json::to_string(&response)?);

    let mut buffer = Vec::new();
    prometheus::TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    tracing::debug!(metrics = %String::from_utf8_lossy(&buffer), "Invocation metrics");

    tracing::info!(status = response.status_code, "Netquota Monitor finished");
    Ok(())
}

fn require_snapshot(config: MonitorConfig) -> netquota_common::Result<MonitorConfig> {
    if config.metrics_snapshot.is_none() {
        return Err(NetquotaError::Config(format!(
            "{} is required by the file-backed metrics provider",
            netquota_monitor::config::METRICS_SNAPSHOT
        )));
    }
    Ok(config)
}
