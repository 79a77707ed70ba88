//! Collaborator implementations

pub mod dry_run;
pub mod memory;
pub mod snapshot;

pub use dry_run::{DryRunController, DryRunMailer, DryRunNotifier};
pub use memory::{
    InMemoryMetrics, Published, RecordingController, RecordingMailer, RecordingNotifier,
    SentMail, StaticPricingCatalog, StaticResourceLister,
};
pub use snapshot::SnapshotMetricsProvider;
