//! Cycle-date enumeration.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::temporal::duration::CalendarDuration;

/// Date cycling block of a cycle: repeat from `start_date` with stride
/// `period` while strictly before `stop_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclingSpec {
    pub start_date: NaiveDateTime,
    pub stop_date: NaiveDateTime,
    pub period: CalendarDuration,
}

impl CyclingSpec {
    pub fn new(
        start_date: NaiveDateTime,
        stop_date: NaiveDateTime,
        period: CalendarDuration,
    ) -> Self {
        Self {
            start_date,
            stop_date,
            period,
        }
    }

    /// Checks the block for internal consistency.
    pub fn validate(&self, cycle: &str) -> Result<(), GraphError> {
        if self.start_date > self.stop_date {
            return Err(GraphError::BadDate {
                value: self.start_date.to_string(),
                reason: format!(
                    "cycle '{}': start_date lies after stop_date {}",
                    cycle, self.stop_date
                ),
            });
        }
        if self.period.months() <= 0 {
            return Err(GraphError::BadDuration {
                value: self.period.to_string(),
                reason: format!("cycle '{cycle}': period must be positive"),
            });
        }
        if self.period.add_to(self.start_date) > self.stop_date {
            return Err(GraphError::BadDuration {
                value: self.period.to_string(),
                reason: format!(
                    "cycle '{}': period exceeds the window {} -- {}",
                    cycle, self.start_date, self.stop_date
                ),
            });
        }
        Ok(())
    }

    /// Enumerates cycle dates: `start_date`, `start_date + period`, ...,
    /// stopping before `stop_date` (half-open).
    pub fn dates(&self) -> Vec<NaiveDateTime> {
        let mut dates = Vec::new();
        let mut current = self.start_date;
        while current < self.stop_date {
            dates.push(current);
            current = self.period.add_to(current);
        }
        dates
    }

    /// Half-open membership test against this block's window.
    pub fn contains(&self, date: NaiveDateTime) -> bool {
        crate::temporal::date::date_in_range(date, self.start_date, self.stop_date)
    }
}
