use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use thiserror::Error;

use crate::config::StoreOptions;

/// One curated news record as delivered by the hosted row store.
///
/// Items are immutable once fetched; everything downstream only changes
/// which items are *visible*, never the items themselves. Decoding is
/// deliberately lenient: `summary` and `tags` may be missing or null in a
/// row, and unknown columns are ignored.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub tags: Vec<String>,
    pub original_url: String,
    pub importance_score: i64,
    pub published_at: String,
    pub created_at: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("decoding store response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Cheap-to-clone handle on the hosted store. Stateless between queries;
/// constructed once at startup from configuration and shared from there.
#[derive(Clone)]
pub struct StoreHandle {
    http: Client,
    options: Arc<StoreOptions>,
}

pub fn init(options: &StoreOptions) -> Result<StoreHandle> {
    if options.endpoint.trim().is_empty() {
        tracing::warn!("store endpoint is not configured; the feed will render empty");
    }
    let http = Client::builder()
        .user_agent(concat!("newsdesk-tui/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client for the store")?;
    Ok(StoreHandle {
        http,
        options: Arc::new(options.clone()),
    })
}

impl StoreHandle {
    fn rows_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.options.endpoint.trim_end_matches('/'),
            self.options.table
        )
    }

    /// Raw query: the most recent `limit` rows, newest publication date
    /// first, higher importance first within a date. Ordering and
    /// truncation happen server-side; callers never re-sort.
    pub fn query_recent(&self, limit: usize) -> Result<Vec<NewsItem>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(self.rows_url())
            .query(&[
                ("select", "*"),
                ("order", "published_at.desc,importance_score.desc"),
                ("limit", limit.as_str()),
            ])
            .header("apikey", &self.options.api_key)
            .bearer_auth(&self.options.api_key)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: body,
            });
        }
        decode_items(&body)
    }

    /// The fetch boundary: any failure is reported to the log sink and
    /// degraded to an empty batch. The page must always render, even with
    /// zero items, so nothing past this point can fail.
    pub fn fetch_recent_items(&self, limit: usize) -> Vec<NewsItem> {
        match self.query_recent(limit) {
            Ok(items) => {
                tracing::debug!(count = items.len(), "fetched recent items");
                items
            }
            Err(err) => {
                tracing::error!(%err, limit, "fetching recent items failed; degrading to empty feed");
                Vec::new()
            }
        }
    }
}

pub(crate) fn decode_items(body: &str) -> Result<Vec<NewsItem>, StoreError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decode_preserves_row_order() {
        let body = r#"[
            {"id":"b","title":"Second","summary":["x"],"tags":["llm"],
             "original_url":"https://example.com/b","importance_score":9,
             "published_at":"2025-01-02","created_at":"2025-01-02T07:00:00Z"},
            {"id":"a","title":"First","summary":[],"tags":[],
             "original_url":"https://example.com/a","importance_score":4,
             "published_at":"2025-01-01","created_at":"2025-01-01T07:00:00Z"}
        ]"#;
        let items = decode_items(body).expect("decode");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "b");
        assert_eq!(items[1].id, "a");
        assert_eq!(items[0].importance_score, 9);
    }

    #[test]
    fn decode_defaults_missing_summary_and_tags() {
        let body = r#"[
            {"id":"a","title":"Bare row",
             "original_url":"https://example.com/a","importance_score":5,
             "published_at":"2025-01-01","created_at":"2025-01-01T07:00:00Z"}
        ]"#;
        let items = decode_items(body).expect("decode");
        assert!(items[0].summary.is_empty());
        assert!(items[0].tags.is_empty());
    }

    #[test]
    fn decode_treats_null_summary_and_tags_as_empty() {
        let body = r#"[
            {"id":"a","title":"Null row","summary":null,"tags":null,
             "original_url":"https://example.com/a","importance_score":5,
             "published_at":"2025-01-01","created_at":"2025-01-01T07:00:00Z"}
        ]"#;
        let items = decode_items(body).expect("decode");
        assert!(items[0].summary.is_empty());
        assert!(items[0].tags.is_empty());
    }

    #[test]
    fn decode_ignores_unknown_columns() {
        let body = r#"[
            {"id":"a","title":"Extra row","summary":["s"],"tags":["t"],
             "original_url":"https://example.com/a","importance_score":5,
             "published_at":"2025-01-01","created_at":"2025-01-01T07:00:00Z",
             "embedding":[0.1,0.2],"source_rank":3}
        ]"#;
        let items = decode_items(body).expect("decode");
        assert_eq!(items[0].title, "Extra row");
    }

    #[test]
    fn decode_rejects_malformed_rows() {
        let result = decode_items(r#"[{"id":42}]"#);
        assert_matches!(result, Err(StoreError::Decode(_)));
    }
}
