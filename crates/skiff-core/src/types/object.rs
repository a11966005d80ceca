//! Object types

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::parse_rfc822;

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    pub size: u64,
}

/// A single page of bucket listing results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub items: Vec<ObjectRecord>,
    pub truncated: bool,
    /// Key of the last item; `None` when the page is empty
    pub next_marker: Option<String>,
}

impl ListingPage {
    pub fn new(items: Vec<ObjectRecord>, truncated: bool) -> Self {
        let next_marker = items.last().map(|item| item.key.clone());
        Self {
            items,
            truncated,
            next_marker,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Metadata the service reports for an object in its response headers
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// User metadata from `x-amz-meta-*`, prefix stripped
    pub metadata: BTreeMap<String, String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub headers: HeaderMap,
}

impl ObjectMetadata {
    const USER_METADATA_PREFIX: &'static str = "x-amz-meta-";

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        let metadata = headers
            .iter()
            .filter_map(|(name, value)| {
                let name = name.as_str().strip_prefix(Self::USER_METADATA_PREFIX)?;
                let value = value.to_str().ok()?;
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Self {
            metadata,
            size: text("content-length").and_then(|v| v.trim().parse().ok()),
            content_type: text("content-type"),
            etag: text("etag"),
            date: text("date").as_deref().and_then(parse_rfc822),
            last_modified: text("last-modified").as_deref().and_then(parse_rfc822),
            headers: headers.clone(),
        }
    }
}

/// Body and metadata of a fetched object
#[derive(Debug, Clone)]
pub struct ObjectResponse {
    pub status: u16,
    pub info: ObjectMetadata,
    pub body: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;

    fn record(key: &str) -> ObjectRecord {
        ObjectRecord {
            key: key.to_string(),
            last_modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            etag: "\"abc\"".to_string(),
            size: 1,
        }
    }

    #[test]
    fn test_listing_page_marker() {
        let page = ListingPage::new(vec![record("a"), record("b")], true);
        assert_eq!(page.next_marker.as_deref(), Some("b"));
        assert_eq!(page.len(), 2);

        let empty = ListingPage::new(Vec::new(), false);
        assert!(empty.is_empty());
        assert_eq!(empty.next_marker, None);
    }

    #[test]
    fn test_metadata_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("1024"));
        headers.insert("content-type", HeaderValue::from_static("image/png"));
        headers.insert("etag", HeaderValue::from_static("\"9b2cf535f27731c974343645a3985328\""));
        headers.insert("last-modified", HeaderValue::from_static("Wed, 28 Oct 2009 22:32:00 GMT"));
        headers.insert("x-amz-meta-author", HeaderValue::from_static("ada"));

        let info = ObjectMetadata::from_headers(&headers);
        assert_eq!(info.size, Some(1024));
        assert_eq!(info.content_type.as_deref(), Some("image/png"));
        assert_eq!(info.metadata.get("author").map(String::as_str), Some("ada"));
        assert_eq!(
            info.last_modified,
            Some(Utc.with_ymd_and_hms(2009, 10, 28, 22, 32, 0).unwrap())
        );
        assert!(info.date.is_none());
    }
}
