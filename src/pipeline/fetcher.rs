//! Cursor-following page fetch loop
//!
//! Pages are requested strictly one after another (each cursor comes from
//! the previous response). The loop is fail-soft: a page that still fails
//! after retries ends the loop, is recorded as a [`FetchDiagnostic`], and
//! everything accumulated before it is kept.
//!
//! Stop conditions, in order of precedence:
//! 1. cancellation token fired
//! 2. page failure (after retries)
//! 3. no `next` cursor
//! 4. server repeated the cursor it was given
//! 5. `max_pages` reached

use super::backoff::{BackoffStop, ExponentialBackoff, RetryPolicy};
use super::error::FetchError;
use super::source::{CastSource, PageRequest};
use super::types::{Credential, Page, Record};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default records per page (Neynar's maximum)
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default hard cap on pages per run
pub const DEFAULT_MAX_PAGES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub page_size: usize,
    pub max_pages: usize,
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            retry: RetryPolicy::default(),
        }
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDiagnostic {
    /// Zero-based index of the failed page
    pub page: usize,
    pub cursor: Option<String>,
    pub error: FetchError,
}

impl std::fmt::Display for FetchDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {}: {}", self.page, self.error)
    }
}

/// Summary of one fetch loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub pages_fetched: usize,
    pub records_fetched: usize,
    pub diagnostics: Vec<FetchDiagnostic>,
    /// Stopped at `max_pages` while the server still had a cursor
    pub truncated_by_page_cap: bool,
    pub cancelled: bool,
}

pub struct PageFetcher {
    source: Arc<dyn CastSource>,
    settings: FetchSettings,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn CastSource>, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetch pages until the stream ends, handing each page's records to `sink`
    pub async fn fetch_all<F>(
        &self,
        credential: &Credential,
        cancel: &CancellationToken,
        mut sink: F,
    ) -> FetchSummary
    where
        F: FnMut(&[Record]),
    {
        let mut summary = FetchSummary::default();
        let mut cursor: Option<String> = None;

        loop {
            if summary.pages_fetched >= self.settings.max_pages {
                if cursor.is_some() {
                    log::warn!(
                        "⚠️  Page cap reached ({} pages), stopping with cursor still open",
                        self.settings.max_pages
                    );
                    summary.truncated_by_page_cap = true;
                }
                break;
            }

            let page_index = summary.pages_fetched;
            let page = match self.fetch_with_retry(cursor.as_deref(), credential, cancel).await {
                Ok(page) => page,
                Err(PageFailure::Cancelled) => {
                    log::info!("🛑 Fetch cancelled after {} pages", summary.pages_fetched);
                    summary.cancelled = true;
                    break;
                }
                Err(PageFailure::Failed(error)) => {
                    log::error!(
                        "❌ {} page {} failed: {} (keeping {} records fetched so far)",
                        self.source.source_name(),
                        page_index,
                        error,
                        summary.records_fetched
                    );
                    summary.diagnostics.push(FetchDiagnostic {
                        page: page_index,
                        cursor: cursor.clone(),
                        error,
                    });
                    break;
                }
            };

            summary.pages_fetched += 1;
            summary.records_fetched += page.records.len();
            log::debug!(
                "Page {}: {} records, next cursor: {}",
                page_index,
                page.records.len(),
                page.next_cursor.is_some()
            );

            sink(&page.records);

            match page.next_cursor {
                None => break,
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    log::warn!("⚠️  Server repeated cursor {}, stopping pagination", next);
                    summary.diagnostics.push(FetchDiagnostic {
                        page: page_index,
                        cursor: Some(next),
                        error: FetchError::Schema("server returned the same cursor twice".to_string()),
                    });
                    break;
                }
                Some(next) => cursor = Some(next),
            }
        }

        log::info!(
            "📥 Fetched {} records in {} pages from {} ({} failures)",
            summary.records_fetched,
            summary.pages_fetched,
            self.source.source_name(),
            summary.diagnostics.len()
        );

        summary
    }

    async fn fetch_with_retry(
        &self,
        cursor: Option<&str>,
        credential: &Credential,
        cancel: &CancellationToken,
    ) -> Result<Page, PageFailure> {
        let mut backoff = ExponentialBackoff::new(self.settings.retry);

        loop {
            let request = PageRequest {
                cursor,
                page_size: self.settings.page_size,
                credential,
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PageFailure::Cancelled),
                result = self.source.fetch_page(request) => result,
            };

            match result {
                Ok(page) => return Ok(page),
                Err(error) if error.is_retryable() => {
                    log::warn!("Page request failed: {}", error);
                    match backoff.sleep(cancel).await {
                        Ok(()) => continue,
                        Err(BackoffStop::Cancelled) => return Err(PageFailure::Cancelled),
                        Err(BackoffStop::MaxRetriesExceeded) => return Err(PageFailure::Failed(error)),
                    }
                }
                Err(error) => return Err(PageFailure::Failed(error)),
            }
        }
    }
}

enum PageFailure {
    Cancelled,
    Failed(FetchError),
}
