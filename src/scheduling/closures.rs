//! Business-closure calendar collaborator.
//!
//! The engine treats any closure date as an unconditional hard stop for event
//! creation, with no override path. Production deployments back this with the
//! public-holiday feed; tests and small installs use the static
//! implementation.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Descriptive information about a closure date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureInfo {
    /// Human-readable name of the closure (e.g. "Australia Day").
    pub name: String,
}

/// Lookup contract for business-closure dates.
pub trait ClosureCalendar: Send + Sync {
    /// Whether the business is closed on the given date.
    fn is_closure_date(&self, date: NaiveDate) -> bool;

    /// Descriptive info for a closure date, if it is one.
    fn closure_info(&self, date: NaiveDate) -> Option<ClosureInfo>;
}

/// A fixed set of closure dates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticClosureCalendar {
    closures: HashMap<NaiveDate, String>,
}

impl StaticClosureCalendar {
    /// Create an empty calendar (no closures).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a closure date.
    pub fn with_closure(mut self, date: NaiveDate, name: impl Into<String>) -> Self {
        self.closures.insert(date, name.into());
        self
    }
}

impl ClosureCalendar for StaticClosureCalendar {
    fn is_closure_date(&self, date: NaiveDate) -> bool {
        self.closures.contains_key(&date)
    }

    fn closure_info(&self, date: NaiveDate) -> Option<ClosureInfo> {
        self.closures.get(&date).map(|name| ClosureInfo {
            name: name.clone(),
        })
    }
}
