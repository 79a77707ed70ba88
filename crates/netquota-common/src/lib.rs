//! # Netquota Common
//!
//! Shared value types and errors for the netquota usage monitor.
//!
//! ## Core Types
//!
//! - [`MetricSample`]: one bucketed statistic returned by a metrics backend
//! - [`UsageTotal`]/[`TransferUsage`]: aggregated transfer volume in megabytes
//! - [`Quota`]: configured monthly transfer ceiling
//! - [`BillingWindow`]/[`WindowPolicy`]: the interval usage is aggregated over
//!
//! All of these are immutable values computed fresh on each invocation.

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    ActionError, MetricsError, NetquotaError, PricingError, QuotaError, Result,
};
pub use types::{
    usage::{MetricSample, Quota, StatisticKind, TransferUsage, UsageTotal},
    window::{BillingWindow, WindowPolicy},
};

/// Netquota version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bytes in one megabyte (binary)
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Megabytes in one gigabyte (binary)
pub const MB_PER_GB: f64 = 1024.0;

/// Metric bucket length in seconds (one day)
pub const DAILY_PERIOD_SECS: u32 = 86_400;

/// Outbound transfer metric name
pub const NETWORK_OUT_METRIC: &str = "NetworkOut";

/// Inbound transfer metric name
pub const NETWORK_IN_METRIC: &str = "NetworkIn";
