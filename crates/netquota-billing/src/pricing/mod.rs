//! Pricing module
//!
//! Provides transfer cost calculation with:
//! - Validated tier schedules (volume discounts)
//! - Marginal, band-by-band billing
//! - Flat-rate fallback when no regional price is known

pub mod calculator;
pub mod schedule;

pub use calculator::{CostEstimate, CostMode, TieredCostCalculator};
pub use schedule::{PriceSchedule, PriceTier};
