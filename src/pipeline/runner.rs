//! Report runner - one live computation at a time
//!
//! Every [`ReportRunner::trigger`] starts a fresh, independent run and
//! cancels the one in flight. Runs are tagged with a generation number; a
//! run may only publish its report while its generation is still the latest,
//! so a late result from a superseded run can never overwrite a newer state.
//!
//! Callers observe progress through a `tokio::sync::watch` channel:
//! `Idle → Loading → Ready`.

use super::report::{Report, ReportAssembler};
use super::types::Credential;
use super::window::WindowSize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    Idle,
    Loading {
        generation: u64,
        window: WindowSize,
    },
    Ready {
        generation: u64,
        report: Arc<Report>,
    },
}

impl ReportState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ReportState::Loading { .. })
    }

    pub fn generation(&self) -> u64 {
        match self {
            ReportState::Idle => 0,
            ReportState::Loading { generation, .. } | ReportState::Ready { generation, .. } => {
                *generation
            }
        }
    }
}

pub struct ReportRunner {
    assembler: Arc<ReportAssembler>,
    credential: Credential,
    latest_generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<CancellationToken>>,
    state_tx: Arc<watch::Sender<ReportState>>,
}

impl ReportRunner {
    pub fn new(assembler: Arc<ReportAssembler>, credential: Credential) -> Self {
        let (state_tx, _) = watch::channel(ReportState::Idle);
        Self {
            assembler,
            credential,
            latest_generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReportState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ReportState {
        self.state_tx.borrow().clone()
    }

    pub fn assembler(&self) -> &ReportAssembler {
        &self.assembler
    }

    /// Start a new run for `window`, superseding any run in flight
    pub fn trigger(&self, window: WindowSize) -> JoinHandle<()> {
        let token = CancellationToken::new();
        let generation = self.latest_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        self.state_tx.send_replace(ReportState::Loading { generation, window });
        log::info!("⏳ Loading {} leaderboard (run #{})", window.as_str(), generation);

        let assembler = self.assembler.clone();
        let credential = self.credential.clone();
        let latest = self.latest_generation.clone();
        let state_tx = self.state_tx.clone();

        tokio::spawn(async move {
            match assembler.compute_leaderboard(window, &credential, &token).await {
                Ok(report) => {
                    if !commit(&state_tx, &latest, generation, report) {
                        log::debug!("Discarded result of superseded run #{}", generation);
                    }
                }
                Err(cancelled) => {
                    log::info!("🛑 Run #{} ({}): {}", generation, window.as_str(), cancelled);
                }
            }
        })
    }

    /// Cancel the run in flight, if any
    ///
    /// A cancelled `Loading` state goes back to `Idle`. A published `Ready`
    /// state is left alone.
    pub fn cancel(&self) {
        if let Some(token) = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            token.cancel();
        }

        let latest = &self.latest_generation;
        let reset = self.state_tx.send_if_modified(|state| {
            if !state.is_loading() {
                return false;
            }
            latest.fetch_add(1, Ordering::SeqCst);
            *state = ReportState::Idle;
            true
        });
        if reset {
            log::info!("🛑 Loading cancelled");
        }
    }
}

/// Publish `report` only if `generation` is still the latest
///
/// The check runs under the channel's write lock, so it cannot interleave
/// with another commit.
fn commit(
    state_tx: &watch::Sender<ReportState>,
    latest: &AtomicU64,
    generation: u64,
    report: Report,
) -> bool {
    let report = Arc::new(report);
    state_tx.send_if_modified(|state| {
        if latest.load(Ordering::SeqCst) != generation {
            return false;
        }
        *state = ReportState::Ready {
            generation,
            report: report.clone(),
        };
        true
    })
}

/// Wait until the runner publishes a report for the current generation
pub async fn wait_ready(rx: &mut watch::Receiver<ReportState>) -> Option<Arc<Report>> {
    let state = rx
        .wait_for(|state| matches!(state, ReportState::Ready { .. }))
        .await
        .ok()?;
    match &*state {
        ReportState::Ready { report, .. } => Some(report.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::backoff::RetryPolicy;
    use crate::pipeline::error::FetchError;
    use crate::pipeline::fetcher::tests::record;
    use crate::pipeline::fetcher::FetchSettings;
    use crate::pipeline::report::ReportSettings;
    use crate::pipeline::source::{CastSource, PageRequest};
    use crate::pipeline::types::Page;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::sync::Notify;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
    }

    /// First call blocks until released; later calls answer immediately
    struct GatedSource {
        gate: Notify,
        calls: AtomicU64,
    }

    #[async_trait]
    impl CastSource for GatedSource {
        async fn fetch_page(&self, _request: PageRequest<'_>) -> Result<Page, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.gate.notified().await;
            }
            Ok(Page {
                records: vec![record(call + 1, &format!("user{}", call + 1))],
                next_cursor: None,
            })
        }

        fn source_name(&self) -> &str {
            "gated"
        }
    }

    fn runner(source: Arc<dyn CastSource>) -> ReportRunner {
        let settings = ReportSettings {
            fetch: FetchSettings {
                page_size: 100,
                max_pages: 10,
                retry: RetryPolicy::none(),
            },
            limit: 100,
        };
        let assembler = ReportAssembler::new_with_now_fn(source, settings, Box::new(now));
        ReportRunner::new(Arc::new(assembler), Credential::new("k"))
    }

    fn sample_report(runner: &ReportRunner) -> Report {
        match runner.state() {
            ReportState::Ready { report, .. } => (*report).clone(),
            other => panic!("expected ready state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_run_reaches_ready() {
        let source = Arc::new(GatedSource { gate: Notify::new(), calls: AtomicU64::new(1) });
        let runner = runner(source);
        let mut rx = runner.subscribe();

        runner.trigger(WindowSize::Day).await.unwrap();

        let report = wait_ready(&mut rx).await.unwrap();
        assert_eq!(report.leaderboard.len(), 1);
        assert_eq!(runner.state().generation(), 1);
    }

    #[tokio::test]
    async fn test_retrigger_cancels_stale_run() {
        let source = Arc::new(GatedSource { gate: Notify::new(), calls: AtomicU64::new(0) });
        let runner = runner(source.clone());

        let first = runner.trigger(WindowSize::Day);
        // Let the first run reach the gate
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(runner.state().is_loading());

        let second = runner.trigger(WindowSize::Week);
        first.await.unwrap();
        second.await.unwrap();

        match runner.state() {
            ReportState::Ready { generation, report } => {
                assert_eq!(generation, 2);
                assert_eq!(report.window.size, WindowSize::Week);
                assert_eq!(report.leaderboard.entries()[0].author_id, 2);
            }
            other => panic!("expected ready state, got {:?}", other),
        }

        // Releasing the gate afterwards changes nothing
        source.gate.notify_one();
        tokio::task::yield_now().await;
        assert_eq!(runner.state().generation(), 2);
    }

    #[tokio::test]
    async fn test_superseded_commit_is_rejected() {
        let source = Arc::new(GatedSource { gate: Notify::new(), calls: AtomicU64::new(1) });
        let runner = runner(source);
        runner.trigger(WindowSize::Day).await.unwrap();
        let report = sample_report(&runner);

        let latest = AtomicU64::new(3);
        assert!(!commit(&runner.state_tx, &latest, 2, report.clone()));
        assert_eq!(runner.state().generation(), 1);

        assert!(commit(&runner.state_tx, &latest, 3, report));
        assert_eq!(runner.state().generation(), 3);
    }

    #[tokio::test]
    async fn test_explicit_cancel() {
        let source = Arc::new(GatedSource { gate: Notify::new(), calls: AtomicU64::new(0) });
        let runner = runner(source);

        let handle = runner.trigger(WindowSize::Day);
        assert!(runner.state().is_loading());
        runner.cancel();
        handle.await.unwrap();

        assert_eq!(runner.state(), ReportState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_rejects_late_commit() {
        let source = Arc::new(GatedSource { gate: Notify::new(), calls: AtomicU64::new(1) });
        let runner = runner(source);
        runner.trigger(WindowSize::Day).await.unwrap();
        let report = sample_report(&runner);

        runner.trigger(WindowSize::Week);
        let generation = runner.state().generation();
        runner.cancel();

        assert_eq!(runner.state(), ReportState::Idle);
        assert!(!commit(&runner.state_tx, &runner.latest_generation, generation, report));
        assert_eq!(runner.state(), ReportState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_keeps_ready_state() {
        let source = Arc::new(GatedSource { gate: Notify::new(), calls: AtomicU64::new(1) });
        let runner = runner(source);
        runner.trigger(WindowSize::Day).await.unwrap();

        runner.cancel();

        assert!(matches!(runner.state(), ReportState::Ready { generation: 1, .. }));
    }
}
