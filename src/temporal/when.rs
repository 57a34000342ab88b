//! `when` guards: date predicates gating whether a dependency edge exists.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A conjunction of optional date clauses evaluated against the consuming
/// task's cycle date.
///
/// With no clauses the guard always passes. Any present clause fails on an
/// undated coordinate: one-off items are never date-guarded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WhenSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<NaiveDateTime>,
}

impl WhenSpec {
    /// The guard with no clauses; always passes.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn at(date: NaiveDateTime) -> Self {
        Self {
            at: Some(date),
            ..Self::default()
        }
    }

    pub fn before(date: NaiveDateTime) -> Self {
        Self {
            before: Some(date),
            ..Self::default()
        }
    }

    pub fn after(date: NaiveDateTime) -> Self {
        Self {
            after: Some(date),
            ..Self::default()
        }
    }

    pub fn is_unconditional(&self) -> bool {
        self.at.is_none() && self.before.is_none() && self.after.is_none()
    }

    /// Evaluates the guard for a cycle date (`None` for undated cycles).
    pub fn is_active(&self, date: Option<NaiveDateTime>) -> bool {
        if self.is_unconditional() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        if self.at.is_some_and(|at| date != at) {
            return false;
        }
        if self.before.is_some_and(|before| date >= before) {
            return false;
        }
        if self.after.is_some_and(|after| date <= after) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::date::parse_date;

    fn d(s: &str) -> NaiveDateTime {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_empty_guard_always_passes() {
        assert!(WhenSpec::any().is_active(Some(d("2026-01-01"))));
        assert!(WhenSpec::any().is_active(None));
    }

    #[test]
    fn test_at_requires_exact_date() {
        let guard = WhenSpec::at(d("2026-01-01"));
        assert!(guard.is_active(Some(d("2026-01-01"))));
        assert!(!guard.is_active(Some(d("2026-03-01"))));
    }

    #[test]
    fn test_after_is_strict() {
        let guard = WhenSpec::after(d("2026-01-01"));
        assert!(!guard.is_active(Some(d("2026-01-01"))));
        assert!(guard.is_active(Some(d("2026-01-02"))));
    }

    #[test]
    fn test_before_is_strict() {
        let guard = WhenSpec::before(d("2026-06-01"));
        assert!(guard.is_active(Some(d("2026-05-31"))));
        assert!(!guard.is_active(Some(d("2026-06-01"))));
    }

    #[test]
    fn test_before_and_after_conjunction() {
        let guard = WhenSpec {
            before: Some(d("2026-06-01")),
            after: Some(d("2026-01-01")),
            at: None,
        };
        assert!(guard.is_active(Some(d("2026-03-01"))));
        assert!(!guard.is_active(Some(d("2026-01-01"))));
        assert!(!guard.is_active(Some(d("2026-06-01"))));
    }

    #[test]
    fn test_any_clause_fails_on_undated() {
        assert!(!WhenSpec::at(d("2026-01-01")).is_active(None));
        assert!(!WhenSpec::before(d("2026-01-01")).is_active(None));
        assert!(!WhenSpec::after(d("2026-01-01")).is_active(None));
    }
}
