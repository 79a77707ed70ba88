//! Report module

pub mod builder;

pub use builder::{format_usd, UsageReport, UsageReportBuilder};
