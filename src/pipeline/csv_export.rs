//! CSV export of a leaderboard
//!
//! Format:
//!
//! ```text
//! Rank,Username,Casts
//! 1,alice,3
//! 2,bob,2
//! ```
//!
//! Fields containing a comma, quote or newline are quoted (RFC 4180), so a
//! username like `a,b` survives a round trip. The body never embeds the
//! generation date; it only appears in [`export_filename`].

use super::types::Leaderboard;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CSV_MIME_TYPE: &str = "text/csv";

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "IO error: {}", e),
            ExportError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Rank")]
    rank: usize,
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Casts")]
    casts: u64,
}

/// Write the leaderboard as CSV into any writer
pub fn write_csv<W: std::io::Write>(leaderboard: &Leaderboard, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    if leaderboard.is_empty() {
        // serialize() only emits the header alongside the first row
        wtr.write_record(["Rank", "Username", "Casts"])?;
    }

    for (rank, entry) in leaderboard.ranked() {
        wtr.serialize(CsvRow {
            rank,
            username: &entry.display_name,
            casts: entry.count,
        })?;
    }

    wtr.flush()?;
    Ok(())
}

/// Render the leaderboard as CSV text
pub fn to_csv(leaderboard: &Leaderboard) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(leaderboard, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// `top_<limit>_<source>_users_<YYYY-MM-DD>.csv`
pub fn export_filename(limit: usize, source: &str, date: NaiveDate) -> String {
    format!("top_{}_{}_users_{}.csv", limit, source, date.format("%Y-%m-%d"))
}

/// Write the CSV into `dir` under [`export_filename`] and return its path
pub fn write_csv_file(
    dir: &Path,
    leaderboard: &Leaderboard,
    limit: usize,
    source: &str,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(limit, source, date));
    let file = std::fs::File::create(&path)?;
    write_csv(leaderboard, std::io::BufWriter::new(file))?;

    log::info!("📝 Exported {} rows to {}", leaderboard.len(), path.display());
    Ok(path)
}
