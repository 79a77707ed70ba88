//! Price schedules for outbound data transfer
//!
//! A schedule is an ordered list of bands. Each band carries its upper bound
//! in GB (`None` for the last, unbounded band) and a USD rate per GB.
//! Bounds strictly increase and rates never increase.

use netquota_common::PricingError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One band of a tiered schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Upper bound of the band in GB, inclusive
    pub threshold_gb: Option<Decimal>,
    /// USD per GB inside the band
    pub rate_usd_per_gb: Decimal,
}

impl PriceTier {
    pub fn bounded(threshold_gb: Decimal, rate_usd_per_gb: Decimal) -> Self {
        Self {
            threshold_gb: Some(threshold_gb),
            rate_usd_per_gb,
        }
    }

    pub fn unbounded(rate_usd_per_gb: Decimal) -> Self {
        Self {
            threshold_gb: None,
            rate_usd_per_gb,
        }
    }
}

/// Validated tier list; deserializes through [`PriceSchedule::new`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PriceTier>", into = "Vec<PriceTier>")]
pub struct PriceSchedule {
    tiers: Vec<PriceTier>,
}

impl PriceSchedule {
    /// Build a schedule, checking ordering and volume-discount invariants
    pub fn new(tiers: Vec<PriceTier>) -> Result<Self, PricingError> {
        let Some((last, bounded)) = tiers.split_last() else {
            return Err(PricingError::InvalidSchedule("no tiers".into()));
        };
        if last.threshold_gb.is_some() {
            return Err(PricingError::InvalidSchedule(
                "last tier must be unbounded".into(),
            ));
        }

        let mut previous_bound = Decimal::ZERO;
        for tier in bounded {
            let Some(bound) = tier.threshold_gb else {
                return Err(PricingError::InvalidSchedule(
                    "only the last tier may be unbounded".into(),
                ));
            };
            if bound <= previous_bound {
                return Err(PricingError::InvalidSchedule(format!(
                    "thresholds must increase: {bound} after {previous_bound}"
                )));
            }
            previous_bound = bound;
        }

        for pair in tiers.windows(2) {
            if pair[1].rate_usd_per_gb > pair[0].rate_usd_per_gb {
                return Err(PricingError::InvalidSchedule(format!(
                    "rates must not increase: {} after {}",
                    pair[1].rate_usd_per_gb, pair[0].rate_usd_per_gb
                )));
            }
        }
        if tiers.iter().any(|t| t.rate_usd_per_gb < Decimal::ZERO) {
            return Err(PricingError::InvalidSchedule("negative rate".into()));
        }

        Ok(Self { tiers })
    }

    /// Published four-band internet egress schedule
    pub fn canonical() -> Self {
        Self {
            tiers: vec![
                PriceTier::bounded(dec!(10240), dec!(0.09)),
                PriceTier::bounded(dec!(40960), dec!(0.085)),
                PriceTier::bounded(dec!(102400), dec!(0.07)),
                PriceTier::unbounded(dec!(0.05)),
            ],
        }
    }

    /// Single unbounded band at `rate`
    pub fn flat(rate_usd_per_gb: Decimal) -> Result<Self, PricingError> {
        Self::new(vec![PriceTier::unbounded(rate_usd_per_gb)])
    }

    /// Replace the first band's rate with a regional rate.
    ///
    /// Later bands are capped at that rate so the schedule keeps its
    /// volume discount.
    pub fn with_first_tier_rate(&self, rate_usd_per_gb: Decimal) -> Result<Self, PricingError> {
        let tiers = self
            .tiers
            .iter()
            .enumerate()
            .map(|(i, tier)| PriceTier {
                threshold_gb: tier.threshold_gb,
                rate_usd_per_gb: if i == 0 {
                    rate_usd_per_gb
                } else {
                    tier.rate_usd_per_gb.min(rate_usd_per_gb)
                },
            })
            .collect();
        Self::new(tiers)
    }

    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    pub fn first_tier_rate(&self) -> Decimal {
        self.tiers[0].rate_usd_per_gb
    }
}

impl TryFrom<Vec<PriceTier>> for PriceSchedule {
    type Error = PricingError;

    fn try_from(tiers: Vec<PriceTier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<PriceSchedule> for Vec<PriceTier> {
    fn from(schedule: PriceSchedule) -> Self {
        schedule.tiers
    }
}

impl Default for PriceSchedule {
    fn default() -> Self {
        Self::canonical()
    }
}
