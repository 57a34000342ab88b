//! Temporal arithmetic: dates, calendar durations, cycling and guards.

pub mod cycling;
pub mod date;
pub mod duration;
pub mod when;

pub use cycling::CyclingSpec;
pub use date::{date_in_range, parse_date};
pub use duration::CalendarDuration;
pub use when::WhenSpec;
