//! Tiered transfer cost calculator
//!
//! Progressive billing: each band's rate applies only to the gigabytes that
//! fall inside that band, and lower bands are always filled first. Usage that
//! lands exactly on a band boundary is billed entirely by the cheaper side.

use netquota_common::{PricingError, UsageTotal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::schedule::PriceSchedule;

/// Whether a cost came from the tiered schedule or a fallback flat rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostMode {
    Tiered,
    FlatFallback { rate_usd_per_gb: Decimal },
}

impl CostMode {
    pub fn is_fallback(&self) -> bool {
        matches!(self, CostMode::FlatFallback { .. })
    }
}

/// Cost of one resource's billed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// USD, unrounded
    pub usd: Decimal,
    /// Billed volume in GB
    pub billed_gb: Decimal,
    pub mode: CostMode,
}

/// Converts transfer volume into USD
#[derive(Debug, Clone)]
pub struct TieredCostCalculator {
    schedule: PriceSchedule,
    mode: CostMode,
}

impl TieredCostCalculator {
    pub fn new(schedule: PriceSchedule) -> Self {
        Self {
            schedule,
            mode: CostMode::Tiered,
        }
    }

    /// Calculator over the published four-band schedule
    pub fn canonical() -> Self {
        Self::new(PriceSchedule::canonical())
    }

    /// Single-rate calculator used when no regional price is available
    pub fn flat_fallback(rate_usd_per_gb: Decimal) -> Result<Self, PricingError> {
        Ok(Self {
            schedule: PriceSchedule::flat(rate_usd_per_gb)?,
            mode: CostMode::FlatFallback { rate_usd_per_gb },
        })
    }

    pub fn schedule(&self) -> &PriceSchedule {
        &self.schedule
    }

    pub fn mode(&self) -> CostMode {
        self.mode
    }

    /// Estimate the cost of `usage`
    #[instrument(skip(self), fields(mode = ?self.mode))]
    pub fn estimate(&self, usage: &UsageTotal) -> CostEstimate {
        let billed_gb = Self::to_gigabytes(usage);
        let usd = self.cost_for_gb(billed_gb);
        debug!(%billed_gb, %usd, "Estimated transfer cost");
        CostEstimate {
            usd,
            billed_gb,
            mode: self.mode,
        }
    }

    /// Walk the bands, charging each for the portion of `gb` it covers
    pub fn cost_for_gb(&self, gb: Decimal) -> Decimal {
        let mut remaining = gb.max(Decimal::ZERO);
        let mut lower = Decimal::ZERO;
        let mut cost = Decimal::ZERO;

        for tier in self.schedule.tiers() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let billed = match tier.threshold_gb {
                Some(upper) => remaining.min(upper - lower),
                None => remaining,
            };
            cost = cost.saturating_add(billed.saturating_mul(tier.rate_usd_per_gb));
            remaining -= billed;
            if let Some(upper) = tier.threshold_gb {
                lower = upper;
            }
        }

        cost
    }

    /// Megabytes to gigabytes.
    ///
    /// NaN and non-positive usage bill nothing. Volumes beyond `Decimal`'s
    /// range, including `+inf`, saturate at `Decimal::MAX` megabytes.
    fn to_gigabytes(usage: &UsageTotal) -> Decimal {
        let mb = usage.megabytes;
        if mb.is_nan() || mb <= 0.0 {
            return Decimal::ZERO;
        }
        let megabytes = match Decimal::try_from(mb) {
            Ok(megabytes) => megabytes,
            Err(_) if mb >= 1.0 => Decimal::MAX,
            Err(_) => Decimal::ZERO,
        };
        megabytes / dec!(1024)
    }
}

impl Default for TieredCostCalculator {
    fn default() -> Self {
        Self::canonical()
    }
}
