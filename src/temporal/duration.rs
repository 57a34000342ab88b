//! Calendar durations restricted to whole months and years.
//!
//! Durations are the stride of cycling periods and the offset of lagged
//! references, so they must survive round trips through configuration and
//! compose with calendar arithmetic: adding `P1M` to Jan 31 clamps to the
//! last day of February while the time of day passes through unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GraphError;

/// A signed ISO 8601 duration made of whole months and years, e.g. `P2M`,
/// `P1Y6M`, `-P6M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarDuration {
    months: i32,
}

impl CalendarDuration {
    /// Builds a duration from a total month count (negative for lags into
    /// the past).
    pub fn from_months(months: i32) -> Self {
        Self { months }
    }

    /// Builds a duration from whole years.
    pub fn from_years(years: i32) -> Self {
        Self { months: years * 12 }
    }

    /// Parses an ISO 8601 duration string restricted to `Y` and `M`
    /// designators, with an optional leading sign.
    pub fn parse(value: &str) -> Result<Self, GraphError> {
        let bad = |reason: &str| GraphError::BadDuration {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let mut rest = value.trim();
        let negative = if let Some(stripped) = rest.strip_prefix('-') {
            rest = stripped;
            true
        } else {
            false
        };
        rest = rest
            .strip_prefix('P')
            .ok_or_else(|| bad("expected leading 'P'"))?;
        if rest.is_empty() {
            return Err(bad("empty duration"));
        }

        let mut months: i64 = 0;
        let mut digits = String::new();
        let mut seen_unit = false;
        for ch in rest.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                'Y' | 'M' => {
                    if digits.is_empty() {
                        return Err(bad("designator without a number"));
                    }
                    let count: i64 = digits
                        .parse()
                        .map_err(|_| bad("number out of range"))?;
                    months += if ch == 'Y' { count * 12 } else { count };
                    digits.clear();
                    seen_unit = true;
                }
                'T' => return Err(bad("time components are not supported")),
                'D' | 'W' => return Err(bad("only whole months and years are supported")),
                _ => return Err(bad("unexpected character")),
            }
        }
        if !digits.is_empty() {
            return Err(bad("trailing number without designator"));
        }
        if !seen_unit {
            return Err(bad("no year or month component"));
        }

        let months = if negative { -months } else { months };
        let months = i32::try_from(months).map_err(|_| bad("number out of range"))?;
        Ok(Self { months })
    }

    /// Total signed month count.
    pub fn months(&self) -> i32 {
        self.months
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0
    }

    pub fn is_negative(&self) -> bool {
        self.months < 0
    }

    /// Adds this duration to a date using calendar arithmetic: year and
    /// month fields advance, the day clamps to the end of the target month,
    /// and the time of day is unchanged.
    pub fn add_to(&self, date: NaiveDateTime) -> NaiveDateTime {
        let total = date.year() * 12 + date.month0() as i32 + self.months;
        let year = total.div_euclid(12);
        let month = total.rem_euclid(12) as u32 + 1;
        let day = date.day().min(days_in_month(year, month));
        NaiveDate::from_ymd_opt(year, month, day)
            .expect("clamped day is always valid for its month")
            .and_time(date.time())
    }

    /// The additive inverse, used for reversing lags.
    pub fn negated(&self) -> Self {
        Self {
            months: -self.months,
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month is always 1..=12 here"),
    }
}

impl fmt::Display for CalendarDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 {
            return write!(f, "P0M");
        }
        if self.months < 0 {
            write!(f, "-")?;
        }
        let total = self.months.unsigned_abs();
        let years = total / 12;
        let months = total % 12;
        write!(f, "P")?;
        if years > 0 {
            write!(f, "{years}Y")?;
        }
        if months > 0 {
            write!(f, "{months}M")?;
        }
        Ok(())
    }
}

impl FromStr for CalendarDuration {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CalendarDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
