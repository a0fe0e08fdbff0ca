//! Per-request evaluation context.

use chrono::{NaiveDateTime, Utc};

/// State captured once at the start of a logical request and threaded
/// through every listing and materialization it performs.
///
/// `NOW` date bounds resolve against [`EvaluationContext::now`], so all calls
/// sharing a context agree on the projected date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationContext {
    now: NaiveDateTime,
}

impl EvaluationContext {
    /// Capture the current UTC instant.
    pub fn new() -> Self {
        Self {
            now: Utc::now().naive_utc(),
        }
    }

    /// A context pinned to a fixed instant.
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}
