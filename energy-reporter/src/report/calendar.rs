//! Calendar days, reporting windows and day bucketing.
//!
//! Every boundary is an explicit `OffsetDateTime` in the configured offset:
//! a day spans `[00:00:00.000000, 23:59:59.999999]`.

use std::{fmt, str::FromStr};

use time::{macros::time, Date, Duration, OffsetDateTime, Time, UtcOffset};

const DAY_END: Time = time!(23:59:59.999999);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Daily, Period::Weekly, Period::Monthly];

    /// Number of calendar days covered, today included.
    pub fn days(self) -> u8 {
        match self {
            Period::Daily => 1,
            Period::Weekly => 7,
            Period::Monthly => 31,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            other => Err(format!("unknown report period '{other}', expected daily|weekly|monthly")),
        }
    }
}

pub fn day_start(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.midnight().assume_offset(offset)
}

pub fn day_end(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.with_time(DAY_END).assume_offset(offset)
}

/// Calendar day an instant falls on, as seen from `offset`.
pub fn day_of(ts: OffsetDateTime, offset: UtcOffset) -> Date {
    ts.to_offset(offset).date()
}

/// Closed range of whole calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub first_day: Date,
    pub last_day: Date,
    pub offset: UtcOffset,
}

impl Window {
    /// Trailing window of `period.days()` days ending on (and including) `today`.
    pub fn for_period(period: Period, today: Date, offset: UtcOffset) -> Self {
        let back = Duration::days(i64::from(period.days()) - 1);
        Self {
            first_day: today.saturating_sub(back),
            last_day: today,
            offset,
        }
    }

    pub fn start(&self) -> OffsetDateTime {
        day_start(self.first_day, self.offset)
    }

    pub fn end(&self) -> OffsetDateTime {
        day_end(self.last_day, self.offset)
    }

    /// Days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = Date> {
        let last = self.last_day;
        std::iter::successors(Some(self.first_day), |d| d.next_day()).take_while(move |d| *d <= last)
    }

    pub fn is_single_day(&self) -> bool {
        self.first_day == self.last_day
    }
}
