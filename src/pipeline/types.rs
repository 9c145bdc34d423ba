//! Core data structures for the cast leaderboard pipeline
//!
//! - `Record` - one cast as consumed by the pipeline (author + timestamp only)
//! - `Page` - one batch of records plus the continuation cursor
//! - `ActivityEntry` - per-author aggregate
//! - `Leaderboard` - ranked, truncated list of entries
//! - `Credential` - opaque API key sent as a request header

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name used when a cast carries no username
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One cast record
///
/// Built from the raw API JSON via [`Record::from_json`]. Only the fields
/// the pipeline consumes are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Author fid. `None` when missing or zero; such records never reach an entry.
    pub author_id: Option<u64>,
    pub author_name: String,
    pub author_avatar_url: String,
    /// Defaults to the Unix epoch when absent or unparseable
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn new(
        author_id: Option<u64>,
        author_name: impl Into<String>,
        author_avatar_url: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            author_id,
            author_name: author_name.into(),
            author_avatar_url: author_avatar_url.into(),
            created_at,
        }
    }

    /// Convert one element of the `casts` array
    ///
    /// Returns `None` only when the value is not a JSON object. Each field is
    /// read on its own, so a mistyped field falls back to its default without
    /// affecting the others.
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }

        let author_name = value
            .pointer("/author/username")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string();

        let created_at = value
            .get("created_at")
            .and_then(parse_timestamp)
            .or_else(|| value.get("timestamp").and_then(parse_timestamp))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Some(Self {
            author_id: value.pointer("/author/fid").and_then(parse_fid),
            author_name,
            author_avatar_url: value
                .pointer("/author/pfp_url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            created_at,
        })
    }
}

/// Fids arrive as numbers; numeric strings are tolerated. Zero counts as missing.
fn parse_fid(value: &Value) -> Option<u64> {
    let fid = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (fid != 0).then_some(fid)
}

/// RFC 3339 strings or epoch milliseconds
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) if !s.is_empty() => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

/// One page of casts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<Record>,
    /// `None` marks the end of the stream
    pub next_cursor: Option<String>,
}

/// Per-author activity aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub author_id: u64,
    pub display_name: String,
    pub avatar_url: String,
    pub count: u64,
}

impl ActivityEntry {
    pub fn new(author_id: u64) -> Self {
        Self {
            author_id,
            display_name: UNKNOWN_AUTHOR.to_string(),
            avatar_url: String::new(),
            count: 0,
        }
    }
}

/// Ranked list of authors, highest count first
///
/// Only constructed by the ranker, so counts are always non-increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    entries: Vec<ActivityEntry>,
}

impl Leaderboard {
    pub(crate) fn from_ranked(entries: Vec<ActivityEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(1-based rank, entry)` pairs
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &ActivityEntry)> {
        self.entries.iter().enumerate().map(|(idx, entry)| (idx + 1, entry))
    }

    /// First `n` entries, e.g. for a chart excerpt
    pub fn top(&self, n: usize) -> &[ActivityEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn total_casts(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }
}

/// API credential, sent verbatim as a header value
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_record_from_full_cast() {
        let cast = json!({
            "hash": "0xabc",
            "author": { "fid": 3, "username": "dwr", "pfp_url": "https://img/dwr.png" },
            "timestamp": "2024-05-01T12:00:00Z"
        });

        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.author_id, Some(3));
        assert_eq!(record.author_name, "dwr");
        assert_eq!(record.author_avatar_url, "https://img/dwr.png");
        assert_eq!(record.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_created_at_takes_precedence_over_timestamp() {
        let cast = json!({
            "author": { "fid": 1 },
            "created_at": "2024-01-02T00:00:00+02:00",
            "timestamp": "2030-01-01T00:00:00Z"
        });

        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_epoch_millis_timestamp() {
        let cast = json!({ "author": { "fid": 1 }, "timestamp": 1_700_000_000_000i64 });
        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let record = Record::from_json(&json!({})).unwrap();
        assert_eq!(record.author_id, None);
        assert_eq!(record.author_name, UNKNOWN_AUTHOR);
        assert_eq!(record.author_avatar_url, "");
        assert_eq!(record.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_empty_username_and_zero_fid() {
        let cast = json!({ "author": { "fid": 0, "username": "", "pfp_url": null } });
        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.author_id, None);
        assert_eq!(record.author_name, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_garbage_timestamp_falls_back_to_epoch() {
        let cast = json!({ "author": { "fid": "42" }, "created_at": "yesterday" });
        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.author_id, Some(42));
        assert_eq!(record.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_mistyped_username_keeps_other_fields() {
        let cast = json!({
            "author": { "fid": 9, "username": 12345, "pfp_url": "x" },
            "timestamp": "2024-05-01T00:00:00Z"
        });

        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.author_id, Some(9));
        assert_eq!(record.author_name, UNKNOWN_AUTHOR);
        assert_eq!(record.author_avatar_url, "x");
        assert_eq!(record.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_mistyped_avatar_keeps_other_fields() {
        let cast = json!({
            "author": { "fid": 9, "username": "nine", "pfp_url": { "url": "x" } },
            "created_at": "2024-05-01T00:00:00Z"
        });

        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.author_id, Some(9));
        assert_eq!(record.author_name, "nine");
        assert_eq!(record.author_avatar_url, "");
        assert_eq!(record.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_non_object_author_uses_defaults() {
        let cast = json!({ "author": "dwr", "timestamp": "2024-05-01T00:00:00Z" });
        let record = Record::from_json(&cast).unwrap();
        assert_eq!(record.author_id, None);
        assert_eq!(record.author_name, UNKNOWN_AUTHOR);
        assert_eq!(record.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(Record::from_json(&json!("cast")).is_none());
        assert!(Record::from_json(&json!(null)).is_none());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret-key");
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert_eq!(credential.expose(), "secret-key");
    }
}
