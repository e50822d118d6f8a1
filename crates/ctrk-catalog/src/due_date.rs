//! # Due-Date Descriptors
//!
//! Statutory deadlines come in three shapes:
//!
//! - a fixed offset from a base event (`60 days from the AGM`),
//! - a fixed calendar day (`31 October`),
//! - a day of the month following the return period (`20th of next month`).
//!
//! The applicability engine emits these descriptors verbatim. Callers that
//! need a concrete date call [`DueDateCalculation::resolve`] with the date
//! of the base event (for offsets) or the end of the period (otherwise).

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// The event an offset deadline is counted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DueDateBase {
    /// Last day of the return period.
    PeriodEnd,
    /// Last day of the financial year.
    FinancialYearEnd,
    /// Date of the annual general meeting.
    AnnualGeneralMeeting,
}

/// A due-date computation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DueDateCalculation {
    /// `days` after the base event.
    Offset { base: DueDateBase, days: u32 },
    /// The first `month`/`day` strictly after the anchor.
    Fixed { month: u32, day: u32 },
    /// `day` of the month following the anchor, clamped to month length.
    FollowingMonthDay { day: u32 },
}

impl DueDateCalculation {
    /// Check that the descriptor can produce a real date.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Offset { .. } => Ok(()),
            Self::Fixed { month, day } => {
                // 2024 is a leap year, so 29 February is accepted.
                if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
                    return Err(format!("{month:02}-{day:02} is not a calendar day"));
                }
                Ok(())
            }
            Self::FollowingMonthDay { day } => {
                if !(1..=31).contains(&day) {
                    return Err(format!("day {day} is out of range 1..=31"));
                }
                Ok(())
            }
        }
    }

    /// Resolve the concrete due date for `anchor`.
    ///
    /// Returns `None` when the descriptor is invalid or the result falls
    /// outside the representable date range.
    pub fn resolve(&self, anchor: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Offset { days, .. } => anchor.checked_add_days(Days::new(u64::from(days))),
            Self::Fixed { month, day } => {
                let this_year = fixed_day(anchor.year(), month, day)?;
                if this_year > anchor {
                    Some(this_year)
                } else {
                    fixed_day(anchor.year() + 1, month, day)
                }
            }
            Self::FollowingMonthDay { day } => {
                let (year, month) = if anchor.month() == 12 {
                    (anchor.year() + 1, 1)
                } else {
                    (anchor.year(), anchor.month() + 1)
                };
                let clamped = day.min(days_in_month(year, month)?);
                NaiveDate::from_ymd_opt(year, month, clamped)
            }
        }
    }
}

/// `month`/`day` in `year`, moving 29 February to the 28th in common years.
fn fixed_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)?)))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}
