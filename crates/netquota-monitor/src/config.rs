//! Monitor configuration
//!
//! All recognized settings live in one immutable [`MonitorConfig`] built at
//! startup. Any missing or malformed value is a fatal configuration error.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use netquota_billing::{UtilizationThreshold, DEFAULT_FALLBACK_RATE};
use netquota_common::{NetquotaError, Quota, Result, WindowPolicy};
use rust_decimal::Decimal;

pub const SNS_TOPIC: &str = "SNS_TOPIC";
pub const DATA_TRANSFER_QUOTA_MB: &str = "DATA_TRANSFER_QUOTA_MB";
pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
pub const INSTANCE_ID: &str = "INSTANCE_ID";
pub const EC2_INSTANCE_IDS: &str = "EC2_INSTANCE_IDS";
pub const REGION: &str = "REGION";
pub const FALLBACK_RATE_USD_PER_GB: &str = "FALLBACK_RATE_USD_PER_GB";
pub const BILLING_WINDOW: &str = "BILLING_WINDOW";
pub const UTILIZATION_THRESHOLDS: &str = "UTILIZATION_THRESHOLDS";
pub const CALL_TIMEOUT_SECS: &str = "CALL_TIMEOUT_SECS";
pub const MAX_CONCURRENCY: &str = "MAX_CONCURRENCY";
pub const METRICS_SNAPSHOT: &str = "METRICS_SNAPSHOT";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Notification channel for alerts
    pub sns_topic: String,
    /// Monthly outbound transfer quota per resource
    pub quota: Quota,
    /// Report recipient (and sender)
    pub email_address: String,
    /// Explicit resources; empty means discover through the lister
    pub instance_ids: Vec<String>,
    /// Pricing lookup key
    pub region: String,
    /// Flat USD/GB rate when pricing lookup fails
    pub fallback_rate: Decimal,
    pub window_policy: WindowPolicy,
    pub utilization_thresholds: Vec<UtilizationThreshold>,
    /// Bound on every collaborator call
    pub call_timeout: Duration,
    /// Resources evaluated concurrently
    pub max_concurrency: usize,
    /// JSON metric snapshot for the file-backed provider
    pub metrics_snapshot: Option<PathBuf>,
}

impl MonitorConfig {
    /// Configuration with defaults for every optional setting
    pub fn new(
        sns_topic: impl Into<String>,
        quota: Quota,
        email_address: impl Into<String>,
    ) -> Self {
        Self {
            sns_topic: sns_topic.into(),
            quota,
            email_address: email_address.into(),
            instance_ids: Vec::new(),
            region: DEFAULT_REGION.to_string(),
            fallback_rate: DEFAULT_FALLBACK_RATE,
            window_policy: WindowPolicy::default(),
            utilization_thresholds: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            metrics_snapshot: None,
        }
    }

    pub fn with_instances<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_fallback_rate(mut self, rate: Decimal) -> Self {
        self.fallback_rate = rate;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Vec<UtilizationThreshold>) -> Self {
        self.utilization_thresholds = thresholds;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers;
        self
    }

    /// Load configuration from `.env` and the process environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| NetquotaError::Config(format!("{key} is required")))
        };

        let quota_mb: f64 = parse(DATA_TRANSFER_QUOTA_MB, &required(DATA_TRANSFER_QUOTA_MB)?)?;
        let mut cfg = Self::new(
            required(SNS_TOPIC)?,
            Quota::from_megabytes(quota_mb),
            required(EMAIL_ADDRESS)?,
        );

        let mut ids = Vec::new();
        for value in [get(INSTANCE_ID), get(EC2_INSTANCE_IDS)].into_iter().flatten() {
            for id in value.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                if !ids.iter().any(|known: &String| known == id) {
                    ids.push(id.to_string());
                }
            }
        }
        cfg.instance_ids = ids;

        if let Some(region) = get(REGION) {
            cfg.region = region;
        }
        if let Some(rate) = get(FALLBACK_RATE_USD_PER_GB) {
            cfg.fallback_rate = parse(FALLBACK_RATE_USD_PER_GB, &rate)?;
        }
        if let Some(policy) = get(BILLING_WINDOW) {
            cfg.window_policy = policy.parse()?;
        }
        if let Some(list) = get(UTILIZATION_THRESHOLDS) {
            cfg.utilization_thresholds = UtilizationThreshold::parse_list(&list)?;
        }
        if let Some(secs) = get(CALL_TIMEOUT_SECS) {
            cfg.call_timeout = Duration::from_secs(parse(CALL_TIMEOUT_SECS, &secs)?);
        }
        if let Some(workers) = get(MAX_CONCURRENCY) {
            cfg.max_concurrency = parse(MAX_CONCURRENCY, &workers)?;
        }
        cfg.metrics_snapshot = get(METRICS_SNAPSHOT).map(PathBuf::from);

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants the workflow relies on
    pub fn validate(&self) -> Result<()> {
        if !self.quota.megabytes.is_finite() || self.quota.megabytes <= 0.0 {
            return Err(NetquotaError::Config(format!(
                "{DATA_TRANSFER_QUOTA_MB} must be positive, got {}",
                self.quota.megabytes
            )));
        }
        if self.sns_topic.is_empty() {
            return Err(NetquotaError::Config(format!("{SNS_TOPIC} is required")));
        }
        if self.email_address.is_empty() {
            return Err(NetquotaError::Config(format!("{EMAIL_ADDRESS} is required")));
        }
        if self.fallback_rate < Decimal::ZERO {
            return Err(NetquotaError::Config(format!(
                "{FALLBACK_RATE_USD_PER_GB} must not be negative"
            )));
        }
        if self.call_timeout.is_zero() {
            return Err(NetquotaError::Config(format!("{CALL_TIMEOUT_SECS} must be positive")));
        }
        if self.max_concurrency == 0 {
            return Err(NetquotaError::Config(format!("{MAX_CONCURRENCY} must be positive")));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| NetquotaError::Config(format!("invalid {key}: {value}")))
}
