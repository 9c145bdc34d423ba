//! Time windows for filtering casts by recency

use super::types::Record;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowSize {
    Day,
    Week,
}

impl WindowSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowSize::Day => "24h",
            WindowSize::Week => "7d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindowSize::Day => "Last 24 Hours",
            WindowSize::Week => "Last 7 Days",
        }
    }

    pub fn duration_secs(&self) -> i64 {
        match self {
            WindowSize::Day => 24 * 60 * 60,
            WindowSize::Week => 7 * 24 * 60 * 60,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "24h" | "1d" | "day" => Some(WindowSize::Day),
            "7d" | "1w" | "week" => Some(WindowSize::Week),
            _ => None,
        }
    }

    pub fn all() -> [WindowSize; 2] {
        [WindowSize::Day, WindowSize::Week]
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open interval `[since, until)`
///
/// Membership only checks the lower bound: casts stamped slightly in the
/// future (clock skew) still count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub size: WindowSize,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    pub fn ending_at(size: WindowSize, now: DateTime<Utc>) -> Self {
        Self {
            size,
            since: now - Duration::seconds(size.duration_secs()),
            until: now,
        }
    }

    pub fn contains(&self, record: &Record) -> bool {
        record.created_at >= self.since
    }
}
