//! # Netquota Monitor
//!
//! Evaluates each monitored instance's monthly outbound transfer against its
//! quota. Over-quota instances are stopped and announced; every instance gets
//! a usage report by email.
//!
//! ## Components
//!
//! - **Config**: [`MonitorConfig`] loaded once from the environment
//! - **Collaborators**: metrics, pricing, stop, notify, mail and listing traits
//! - **Workflow**: [`MonitoringWorkflow`] drives the per-resource state machine
//! - **Telemetry**: prometheus counters for each outcome

pub mod collaborators;
pub mod config;
pub mod providers;
pub mod telemetry;
pub mod workflow;

pub use collaborators::{
    Ack, Collaborators, Mailer, MetricQuery, MetricsProvider, Notifier, PricingCatalog,
    ResourceController, ResourceLister,
};
pub use config::MonitorConfig;
pub use telemetry::MonitorMetrics;
pub use workflow::{
    ActionLog, ActionOutcome, InvocationResponse, InvocationSummary, MonitoringWorkflow,
    ResourceOutcome, ResourceStatus, WorkflowState,
};

/// Subject of the alert for an over-quota instance
pub const QUOTA_EXCEEDED_SUBJECT: &str = "EC2 NetworkOut exceeded quota";

/// Subject of the alert for a utilization breach
pub const UTILIZATION_SUBJECT: &str = "EC2 utilization above threshold";

/// Subject of the per-instance report email
pub const REPORT_SUBJECT: &str = "EC2 Instance Network Usage Report";
