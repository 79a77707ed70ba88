//! Billing windows
//!
//! Usage is aggregated over a calendar month. The caller picks exactly one
//! [`WindowPolicy`] per invocation and hands the resulting [`BillingWindow`]
//! to the workflow, so nothing downstream reads the wall clock.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NetquotaError, Result};

/// How the end of the billing window is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// First of month 00:00:00 to last day 23:59:59
    #[default]
    FullMonth,
    /// First of month 00:00:00 to now
    MonthToDate,
}

impl WindowPolicy {
    /// Resolve the window containing `now`
    pub fn window_at(&self, now: DateTime<Utc>) -> Result<BillingWindow> {
        match self {
            WindowPolicy::FullMonth => BillingWindow::full_month(now),
            WindowPolicy::MonthToDate => BillingWindow::month_to_date(now),
        }
    }
}

impl FromStr for WindowPolicy {
    type Err = NetquotaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full_month" => Ok(WindowPolicy::FullMonth),
            "month_to_date" => Ok(WindowPolicy::MonthToDate),
            other => Err(NetquotaError::Config(format!(
                "unknown billing window policy: {other}"
            ))),
        }
    }
}

/// Closed interval over which metrics are aggregated; may be empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(NetquotaError::Config(format!(
                "billing window ends before it starts: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The whole calendar month containing `now`
    pub fn full_month(now: DateTime<Utc>) -> Result<Self> {
        let first = first_day_of_month(now.date_naive())?;
        let next_first = first_day_of_next_month(first)?;
        let last = next_first - Duration::days(1);
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| NetquotaError::Internal("invalid end-of-day time".into()))?;

        Self::new(
            Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)),
            Utc.from_utc_datetime(&last.and_time(end_of_day)),
        )
    }

    /// From the start of the month containing `now` up to `now`
    pub fn month_to_date(now: DateTime<Utc>) -> Result<Self> {
        let first = first_day_of_month(now.date_naive())?;
        Self::new(Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)), now)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

fn first_day_of_month(date: NaiveDate) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| NetquotaError::Internal(format!("no first day for {date}")))
}

fn first_day_of_next_month(first: NaiveDate) -> Result<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| NetquotaError::Internal(format!("no month after {first}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_full_month_bounds() {
        let window = BillingWindow::full_month(at(2024, 4, 17, 9, 30, 0)).unwrap();
        assert_eq!(window.start, at(2024, 4, 1, 0, 0, 0));
        assert_eq!(window.end, at(2024, 4, 30, 23, 59, 59));
    }

    #[test]
    fn test_full_month_december_rolls_year() {
        let window = BillingWindow::full_month(at(2023, 12, 31, 23, 0, 0)).unwrap();
        assert_eq!(window.start, at(2023, 12, 1, 0, 0, 0));
        assert_eq!(window.end, at(2023, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_full_month_leap_february() {
        let window = BillingWindow::full_month(at(2024, 2, 10, 0, 0, 0)).unwrap();
        assert_eq!(window.end, at(2024, 2, 29, 23, 59, 59));

        let window = BillingWindow::full_month(at(2023, 2, 10, 0, 0, 0)).unwrap();
        assert_eq!(window.end, at(2023, 2, 28, 23, 59, 59));
    }

    #[test]
    fn test_month_to_date_ends_now() {
        let now = at(2024, 7, 3, 12, 0, 0);
        let window = WindowPolicy::MonthToDate.window_at(now).unwrap();
        assert_eq!(window.start, at(2024, 7, 1, 0, 0, 0));
        assert_eq!(window.end, now);
        assert_eq!(window.duration(), Duration::hours(60));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let result = BillingWindow::new(at(2024, 5, 2, 0, 0, 0), at(2024, 5, 1, 0, 0, 0));
        assert!(matches!(result, Err(NetquotaError::Config(_))));
    }

    #[test]
    fn test_month_to_date_at_first_instant_is_empty() {
        let now = at(2024, 8, 1, 0, 0, 0);
        let window = WindowPolicy::MonthToDate.window_at(now).unwrap();
        assert_eq!(window.start, window.end);
        assert_eq!(window.duration(), Duration::zero());
        assert!(BillingWindow::new(now, now).is_ok());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("full_month".parse::<WindowPolicy>().unwrap(), WindowPolicy::FullMonth);
        assert_eq!(
            " Month_To_Date ".parse::<WindowPolicy>().unwrap(),
            WindowPolicy::MonthToDate
        );
        assert!("weekly".parse::<WindowPolicy>().is_err());
        assert_eq!(WindowPolicy::default(), WindowPolicy::FullMonth);
    }
}
