//! Plain-text rendering of a report for the terminal

use crate::pipeline::report::{Report, ReportStatus};
use std::fmt::Write;

/// Longest username shown before truncation
const NAME_WIDTH: usize = 24;

/// Render the first `rows` entries (0 = all) plus a status footer
pub fn format_report(report: &Report, rows: usize) -> String {
    let mut out = String::new();
    let title = format!(
        "Top {} Most Active Users on {} ({})",
        report.leaderboard.len(),
        report.source,
        report.window.size.label()
    );
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));

    match report.leaderboard_or_empty() {
        Ok(leaderboard) => {
            let shown = if rows == 0 { leaderboard.len() } else { rows };
            let _ = writeln!(out, "{:>4}  {:<width$}  {:>6}", "#", "Username", "Casts", width = NAME_WIDTH);
            for (idx, entry) in leaderboard.top(shown).iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>4}  {:<width$}  {:>6}",
                    idx + 1,
                    truncate(&entry.display_name, NAME_WIDTH),
                    entry.count,
                    width = NAME_WIDTH
                );
            }
            if shown < leaderboard.len() {
                let _ = writeln!(out, "      … {} more", leaderboard.len() - shown);
            }
        }
        Err(empty) => {
            let _ = writeln!(out, "{}", empty);
        }
    }

    let _ = writeln!(
        out,
        "\n{} casts in window, {} fetched over {} pages",
        report.records_in_window, report.records_fetched, report.pages_fetched
    );
    if report.truncated_by_page_cap {
        let _ = writeln!(out, "⚠️  Stopped at the page cap; older casts were not fetched");
    }
    if report.status() != ReportStatus::FetchFailed {
        for diagnostic in &report.diagnostics {
            let _ = writeln!(out, "⚠️  Partial result: {}", diagnostic);
        }
    } else {
        for diagnostic in &report.diagnostics {
            let _ = writeln!(out, "❌ {}", diagnostic);
        }
    }

    out
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
