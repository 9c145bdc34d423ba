//! Leaderboard Binary - most active Farcaster authors
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin leaderboard -- --window 7d --export
//! cargo run --release --bin leaderboard -- --interactive
//! ```
//!
//! ## Environment Variables
//!
//! - NEYNAR_API_KEY - API key sent with every request (required)
//! - CASTRANK_* - see `castrank::config::LeaderboardConfig::from_env`
//! - RUST_LOG - Logging level (optional, default: info)

use castrank::cli::{CliArgs, Command, USAGE};
use castrank::config::LeaderboardConfig;
use castrank::pipeline::{
    runner::wait_ready, write_csv_file, NeynarClient, Report, ReportAssembler, ReportRunner,
    ReportState, ReportStatus, WindowSize,
};
use castrank::render::format_report;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args = CliArgs::from_env()?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = LeaderboardConfig::from_env()?;
    let window = args.window.unwrap_or(config.default_window);
    let export_dir = args.export_dir.clone().unwrap_or_else(|| config.export_dir.clone());

    log::info!("🚀 Starting castrank leaderboard");
    log::info!("   ├─ API: {}", config.api_url);
    log::info!("   ├─ Window: {}", window.label());
    log::info!("   ├─ Page size: {}", config.page_size);
    log::info!("   ├─ Max pages: {}", config.max_pages);
    log::info!("   ├─ Result limit: {}", config.result_limit);
    log::info!("   └─ Retries: {} (timeout {}s)", config.max_retries, config.request_timeout_secs);

    let client = NeynarClient::new(
        config.api_url.clone(),
        config.api_key_header.clone(),
        config.source_name.clone(),
        config.request_timeout(),
    )?;
    let assembler = Arc::new(ReportAssembler::new(Arc::new(client), config.report_settings()));
    let runner = ReportRunner::new(assembler, config.credential.clone());

    if args.interactive {
        run_interactive(&runner, window, &export_dir, args.rows).await?;
        return Ok(());
    }

    let mut rx = runner.subscribe();
    runner.trigger(window);
    let report = wait_ready(&mut rx)
        .await
        .ok_or("report runner stopped before producing a report")?;

    println!("{}", format_report(&report, args.rows));

    if args.export {
        export(&report, &export_dir, runner.assembler().limit());
    }

    if report.status() == ReportStatus::FetchFailed {
        std::process::exit(2);
    }

    Ok(())
}

fn export(report: &Report, dir: &Path, limit: usize) {
    match report.leaderboard_or_empty() {
        Ok(leaderboard) => {
            let date = report.generated_at.date_naive();
            match write_csv_file(dir, leaderboard, limit, &report.source, date) {
                Ok(path) => println!("📝 Saved {}", path.display()),
                Err(e) => log::error!("❌ CSV export failed: {}", e),
            }
        }
        Err(empty) => log::warn!("⚠️  Nothing to export: {}", empty),
    }
}

async fn run_interactive(
    runner: &ReportRunner,
    initial: WindowSize,
    export_dir: &Path,
    rows: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rx = runner.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current_window = initial;
    let mut latest: Option<Arc<Report>> = None;

    println!("Commands: 24h | 7d | export | refresh | quit");
    runner.trigger(current_window);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                match state {
                    ReportState::Loading { window, .. } => println!("⏳ Loading {}...", window.label()),
                    ReportState::Ready { report, .. } => {
                        println!("{}", format_report(&report, rows));
                        latest = Some(report);
                    }
                    ReportState::Idle => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Some(Command::Window(window)) => {
                        current_window = window;
                        latest = None;
                        runner.trigger(window);
                    }
                    Some(Command::Refresh) => {
                        latest = None;
                        runner.trigger(current_window);
                    }
                    Some(Command::Export) => match &latest {
                        Some(report) => export(report, export_dir, runner.assembler().limit()),
                        None => println!("Still loading, try again when the leaderboard is shown"),
                    },
                    Some(Command::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command '{}'", line.trim()),
                }
            }
        }
    }

    runner.cancel();
    Ok(())
}
