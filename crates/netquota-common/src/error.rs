//! Error types for netquota
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using NetquotaError
pub type Result<T> = std::result::Result<T, NetquotaError>;

/// Unified error type for netquota operations
#[derive(Debug, Error)]
pub enum NetquotaError {
    // Quota errors
    #[error("Quota error: {0}")]
    Quota(#[from] QuotaError),

    // Pricing errors
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    // Metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    // Side-effecting action errors
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),

    // Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl NetquotaError {
    /// Whether the error must abort the whole invocation
    pub fn is_fatal(&self) -> bool {
        matches!(self, NetquotaError::Config(_))
    }
}

/// Quota evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuotaError {
    #[error("Quota is zero: usage percent is undefined")]
    DivisionByZero,

    #[error("Invalid quota: {0} MB")]
    InvalidQuota(f64),
}

/// Pricing lookup and schedule errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("No data-transfer price listed for region {region}")]
    NotFound { region: String },

    #[error("Pricing catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid price schedule: {0}")]
    InvalidSchedule(String),
}

/// Metric retrieval errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("Metric {metric} unavailable for {resource_id}: {reason}")]
    Unavailable {
        resource_id: String,
        metric: String,
        reason: String,
    },

    #[error("Resource listing failed: {0}")]
    Listing(String),
}

/// Stop/notify/email failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("{action} failed: {reason}")]
    Failed { action: String, reason: String },

    #[error("{action} timed out after {elapsed_ms}ms")]
    Timeout { action: String, elapsed_ms: u64 },
}

impl ActionError {
    pub fn failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::Failed {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

// Implement From for common external error types
impl From<serde_json::Error> for NetquotaError {
    fn from(err: serde_json::Error) -> Self {
        NetquotaError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for NetquotaError {
    fn from(err: std::io::Error) -> Self {
        NetquotaError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for NetquotaError {
    fn from(err: anyhow::Error) -> Self {
        NetquotaError::Internal(err.to_string())
    }
}
