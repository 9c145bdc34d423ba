//! Cast source - one page per request
//!
//! [`CastSource`] is the seam between the fetch loop and the network. The
//! production implementation is [`NeynarClient`], which talks to Neynar's
//! Farcaster casts endpoint.
//!
//! ## Wire format
//!
//! ```text
//! GET <api_url>?limit=<page_size>[&cursor=<cursor>]
//! <api_key_header>: <credential>
//!
//! { "casts": [ { "author": { "fid", "username", "pfp_url" }, "timestamp" }, ... ],
//!   "next": { "cursor": "..." | null } }
//! ```

use super::error::{FetchError, TransportError};
use super::types::{Credential, Page, Record};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Maximum number of body bytes kept in a status error
const ERROR_BODY_LIMIT: usize = 512;

/// Parameters for a single page request
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub cursor: Option<&'a str>,
    pub page_size: usize,
    pub credential: &'a Credential,
}

/// Source of paginated cast records
#[async_trait]
pub trait CastSource: Send + Sync {
    /// Fetch one page starting at `request.cursor`
    async fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page, FetchError>;

    /// Short source name used in logs and export filenames
    fn source_name(&self) -> &str;
}

/// HTTP client for the Neynar casts endpoint
pub struct NeynarClient {
    client: reqwest::Client,
    api_url: String,
    api_key_header: String,
    source_name: String,
}

impl NeynarClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key_header: impl Into<String>,
        source_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key_header: api_key_header.into(),
            source_name: source_name.into(),
        })
    }
}

#[async_trait]
impl CastSource for NeynarClient {
    async fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page, FetchError> {
        let mut builder = self
            .client
            .get(&self.api_url)
            .header(self.api_key_header.as_str(), request.credential.expose())
            .query(&[("limit", request.page_size.to_string())]);

        if let Some(cursor) = request.cursor {
            builder = builder.query(&[("cursor", cursor)]);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let mut end = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(TransportError::Status { status: status.as_u16(), body }.into());
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::MalformedBody(e.to_string()))?;

        parse_page(&body)
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Decode a casts response body into a [`Page`]
///
/// A missing or non-array `casts` field is a schema error. Array elements
/// that are not objects are skipped.
pub fn parse_page(body: &Value) -> Result<Page, FetchError> {
    let casts = body
        .get("casts")
        .ok_or_else(|| FetchError::Schema("response has no `casts` field".to_string()))?
        .as_array()
        .ok_or_else(|| FetchError::Schema("`casts` is not an array".to_string()))?;

    let records: Vec<Record> = casts.iter().filter_map(Record::from_json).collect();
    let skipped = casts.len() - records.len();
    if skipped > 0 {
        log::debug!("Skipped {} non-object cast entries", skipped);
    }

    let next_cursor = body
        .get("next")
        .and_then(|next| next.get("cursor"))
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string);

    Ok(Page { records, next_cursor })
}
