//! Cast leaderboard pipeline
//!
//! ## Architecture
//!
//! ```text
//! CastSource (NeynarClient)
//!     ↓ one page per request
//! PageFetcher (cursor loop, retries, page cap, cancellation)
//!     ↓ records
//! TimeWindow filter → ActivityAggregator
//!     ↓ entries (first-seen order)
//! ranker::rank (count desc, stable, top N)
//!     ↓
//! Report (leaderboard + diagnostics) → csv_export
//! ```
//!
//! `ReportAssembler` runs the whole chain once; `ReportRunner` wraps it so
//! that re-triggering cancels the stale run instead of racing it.
//!
//! ## Module Organization
//!
//! - `types` - Record, Page, ActivityEntry, Leaderboard, Credential
//! - `error` - fetch error taxonomy
//! - `source` - CastSource trait and the Neynar HTTP client
//! - `backoff` - retry policy for transient failures
//! - `fetcher` - pagination loop
//! - `window` - 24h / 7d windows
//! - `aggregator` - per-author counting
//! - `ranker` - ordering and truncation
//! - `csv_export` - CSV text and file export
//! - `report` - single computation
//! - `runner` - generation-tagged, cancellable runs

pub mod aggregator;
pub mod backoff;
pub mod csv_export;
pub mod error;
pub mod fetcher;
pub mod ranker;
pub mod report;
pub mod runner;
pub mod source;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use aggregator::ActivityAggregator;
pub use backoff::RetryPolicy;
pub use csv_export::{export_filename, to_csv, write_csv_file, ExportError};
pub use error::{FetchError, TransportError};
pub use fetcher::{FetchDiagnostic, FetchSettings, PageFetcher};
pub use ranker::rank;
pub use report::{EmptyResult, Report, ReportAssembler, ReportSettings, ReportStatus};
pub use runner::{ReportRunner, ReportState};
pub use source::{CastSource, NeynarClient, PageRequest};
pub use types::{ActivityEntry, Credential, Leaderboard, Page, Record};
pub use window::{TimeWindow, WindowSize};
