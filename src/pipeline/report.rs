//! Report assembly - one leaderboard computation
//!
//! ```text
//! PageFetcher::fetch_all
//!     ↓ (per page)
//! TimeWindow::contains
//!     ↓
//! ActivityAggregator::add
//!     ↓ (stream exhausted)
//! ranker::rank
//!     ↓
//! Report { leaderboard, diagnostics, stats }
//! ```
//!
//! Fetch failures never abort a computation. The report carries the
//! (possibly partial) leaderboard together with the diagnostics, so callers
//! can tell "no activity in window" from "fetch failed" via
//! [`Report::status`].

use super::aggregator::ActivityAggregator;
use super::fetcher::{FetchDiagnostic, FetchSettings, PageFetcher};
use super::ranker::{rank, DEFAULT_LIMIT};
use super::source::CastSource;
use super::types::{Credential, Leaderboard};
use super::window::{TimeWindow, WindowSize};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSettings {
    pub fetch: FetchSettings,
    /// Maximum leaderboard length
    pub limit: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// At least one author on the leaderboard
    Ready,
    /// Empty leaderboard, every page fetched cleanly
    NoActivity,
    /// Empty leaderboard and at least one page failed
    FetchFailed,
}

/// Terminal "zero entries" state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyResult {
    pub status: ReportStatus,
}

impl std::fmt::Display for EmptyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            ReportStatus::FetchFailed => {
                write!(f, "No active users found: the API request failed (see diagnostics)")
            }
            _ => write!(f, "No active users found in the selected window"),
        }
    }
}

impl std::error::Error for EmptyResult {}

/// The computation was cancelled before it finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCancelled;

impl std::fmt::Display for ReportCancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Report computation cancelled")
    }
}

impl std::error::Error for ReportCancelled {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub window: TimeWindow,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub leaderboard: Leaderboard,
    pub diagnostics: Vec<FetchDiagnostic>,
    pub pages_fetched: usize,
    pub records_fetched: usize,
    pub records_in_window: usize,
    pub truncated_by_page_cap: bool,
}

impl Report {
    pub fn status(&self) -> ReportStatus {
        if !self.leaderboard.is_empty() {
            ReportStatus::Ready
        } else if self.diagnostics.is_empty() {
            ReportStatus::NoActivity
        } else {
            ReportStatus::FetchFailed
        }
    }

    /// Partial leaderboards are still leaderboards; check `diagnostics`
    pub fn is_partial(&self) -> bool {
        !self.diagnostics.is_empty() || self.truncated_by_page_cap
    }

    pub fn leaderboard_or_empty(&self) -> Result<&Leaderboard, EmptyResult> {
        match self.status() {
            ReportStatus::Ready => Ok(&self.leaderboard),
            status => Err(EmptyResult { status }),
        }
    }
}

pub struct ReportAssembler {
    fetcher: PageFetcher,
    source_name: String,
    limit: usize,
    /// Timestamp function (for testing with fixed time)
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl ReportAssembler {
    /// Create an assembler using system time
    pub fn new(source: Arc<dyn CastSource>, settings: ReportSettings) -> Self {
        Self::new_with_now_fn(source, settings, Box::new(Utc::now))
    }

    /// Create an assembler with a custom clock
    pub fn new_with_now_fn(
        source: Arc<dyn CastSource>,
        settings: ReportSettings,
        now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    ) -> Self {
        let source_name = source.source_name().to_string();
        Self {
            fetcher: PageFetcher::new(source, settings.fetch),
            source_name,
            limit: settings.limit,
            now_fn,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Compute the leaderboard for `size` ending now
    ///
    /// Returns `Err(ReportCancelled)` only if `cancel` fires; every fetch
    /// failure ends up in `Report::diagnostics` instead.
    pub async fn compute_leaderboard(
        &self,
        size: WindowSize,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<Report, ReportCancelled> {
        let now = (self.now_fn)();
        let window = TimeWindow::ending_at(size, now);

        log::info!(
            "🔍 Computing {} leaderboard since {}",
            size.as_str(),
            window.since.to_rfc3339()
        );

        let mut aggregator = ActivityAggregator::new();
        let mut records_in_window = 0usize;

        let summary = self
            .fetcher
            .fetch_all(credential, cancel, |records| {
                for record in records.iter().filter(|r| window.contains(r)) {
                    records_in_window += 1;
                    aggregator.add(record);
                }
            })
            .await;

        if summary.cancelled {
            return Err(ReportCancelled);
        }

        if aggregator.skipped_without_author() > 0 {
            log::debug!(
                "Skipped {} casts without an author fid",
                aggregator.skipped_without_author()
            );
        }

        let authors = aggregator.len();
        let leaderboard = rank(aggregator.into_entries(), self.limit);

        let report = Report {
            window,
            generated_at: now,
            source: self.source_name.clone(),
            leaderboard,
            diagnostics: summary.diagnostics,
            pages_fetched: summary.pages_fetched,
            records_fetched: summary.records_fetched,
            records_in_window,
            truncated_by_page_cap: summary.truncated_by_page_cap,
        };

        match report.status() {
            ReportStatus::Ready => log::info!(
                "✅ {} window: {} casts in window from {} authors, top {} kept",
                size.as_str(),
                records_in_window,
                authors,
                report.leaderboard.len()
            ),
            ReportStatus::NoActivity => log::warn!(
                "⚠️  No casts in the {} window ({} fetched)",
                size.as_str(),
                report.records_fetched
            ),
            ReportStatus::FetchFailed => log::error!(
                "❌ Empty leaderboard for {} window after {} fetch failure(s)",
                size.as_str(),
                report.diagnostics.len()
            ),
        }

        Ok(report)
    }
}
