//! Named date-range presets and their local-calendar resolution.
//!
//! All boundaries are computed against the local calendar and normalized to
//! start-of-day / end-of-day. Resolution is a pure function of `now`, so
//! applying the same preset twice at the same instant yields the same range.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The named date-range filters offered on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    /// First instant of the current month up to now
    #[default]
    ThisMonth,
    /// Start of day six days ago up to now
    Last7Days,
    /// The whole previous month
    LastMonth,
    /// First instant of the current year up to now
    ThisYear,
    /// Unconstrained
    All,
}

/// A resolved date range; `None` bounds are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DatePreset {
    /// Resolves the preset against the current local time.
    #[must_use]
    pub fn resolve(self) -> DateRange {
        self.resolve_at(Local::now())
    }

    /// Resolves the preset against an explicit `now`.
    #[must_use]
    pub fn resolve_at(self, now: DateTime<Local>) -> DateRange {
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);

        match self {
            Self::ThisMonth => DateRange {
                start: Some(local_midnight(first_of_month(today))),
                end: Some(now_utc),
            },
            Self::Last7Days => DateRange {
                start: Some(local_midnight(today - Duration::days(6))),
                end: Some(now_utc),
            },
            Self::LastMonth => {
                let last_of_previous = first_of_month(today) - Duration::days(1);
                DateRange {
                    start: Some(local_midnight(first_of_month(last_of_previous))),
                    end: Some(end_of_day(last_of_previous)),
                }
            }
            Self::ThisYear => DateRange {
                start: Some(local_midnight(first_of_year(today))),
                end: Some(now_utc),
            },
            Self::All => DateRange::default(),
        }
    }
}

impl DateRange {
    /// An explicit range from the date picker. When only a start day is
    /// chosen the range collapses to that single day.
    #[must_use]
    pub fn custom(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        Self {
            start: Some(local_midnight(start)),
            end: Some(end_of_day(end.unwrap_or(start))),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Local midnight of `date`, as UTC. When midnight falls into a DST gap the
/// earliest existing time of that day is used instead.
#[must_use]
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let mut naive = date.and_time(NaiveTime::MIN);
    for _ in 0..4 {
        if let Some(local) = Local.from_local_datetime(&naive).earliest() {
            return local.with_timezone(&Utc);
        }
        naive += Duration::hours(1);
    }
    // No zone skips more than a few hours; treat the naive time as UTC.
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The last instant of `date`: one millisecond before the next midnight.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    local_midnight(date + Duration::days(1)) - Duration::milliseconds(1)
}
