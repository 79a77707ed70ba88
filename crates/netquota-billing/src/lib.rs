//! # Netquota Billing
//!
//! Usage aggregation, transfer pricing and quota evaluation.
//!
//! ## Cost Formula
//!
//! ```text
//! cost = Σ_tier  min(remaining_gb, band_gb) × rate_tier
//! ```
//!
//! Where:
//! - bands are filled cheapest-first from 0 GB upwards
//! - the canonical schedule is 0.09 / 0.085 / 0.07 / 0.05 USD per GB with
//!   breaks at 10 TB, 40 TB and 100 TB
//! - without a regional price, a single fallback rate applies to all usage
//!
//! ## Quota
//!
//! ```text
//! percent = usage_mb / quota_mb × 100,   exceeded ⇔ percent > 100
//! ```

pub mod metering;
pub mod pricing;
pub mod quota;
pub mod report;

pub use metering::UsageAggregator;
pub use pricing::{CostEstimate, CostMode, PriceSchedule, PriceTier, TieredCostCalculator};
pub use quota::{
    QuotaEvaluation, QuotaEvaluator, QuotaStatus, UtilizationBreach, UtilizationEvaluator,
    UtilizationThreshold,
};
pub use report::{UsageReport, UsageReportBuilder};

use netquota_common::PricingError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

/// Default flat rate (USD/GB) when the pricing catalog has no answer
pub const DEFAULT_FALLBACK_RATE: Decimal = dec!(0.09);

/// Billing configuration
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Tier schedule a regional rate is applied to
    pub schedule: PriceSchedule,
    /// Flat rate used when pricing lookup fails
    pub fallback_rate: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            schedule: PriceSchedule::canonical(),
            fallback_rate: DEFAULT_FALLBACK_RATE,
        }
    }
}

/// Billing service
pub struct Billing {
    config: BillingConfig,
}

impl Billing {
    pub fn new(config: BillingConfig) -> Self {
        Self { config }
    }

    /// Pick the calculator for the outcome of a regional price lookup.
    ///
    /// A found rate prices the first band of the tiered schedule; any lookup
    /// failure degrades to flat-fallback mode.
    pub fn calculator_for(
        &self,
        region: &str,
        lookup: std::result::Result<Decimal, PricingError>,
    ) -> std::result::Result<TieredCostCalculator, PricingError> {
        let regional = lookup.and_then(|rate| self.config.schedule.with_first_tier_rate(rate));
        match regional {
            Ok(schedule) => {
                info!(region, rate = %schedule.first_tier_rate(), "Using regional tiered pricing");
                Ok(TieredCostCalculator::new(schedule))
            }
            Err(e) => {
                warn!(
                    region,
                    error = %e,
                    fallback_rate = %self.config.fallback_rate,
                    "Pricing lookup failed, using default price"
                );
                TieredCostCalculator::flat_fallback(self.config.fallback_rate)
            }
        }
    }
}

impl Default for Billing {
    fn default() -> Self {
        Self::new(BillingConfig::default())
    }
}
