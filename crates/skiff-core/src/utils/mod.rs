//! Canonicalization and formatting helpers
//!
//! Everything here is a total function: empty header sets and empty bodies
//! are valid inputs.

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Prefix shared by all headers that take part in the signature descriptor.
pub const AMZ_HEADER_PREFIX: &str = "x-amz-";

/// Prefix for user metadata headers on upload.
pub const METADATA_HEADER_PREFIX: &str = "X-AMZ-Meta-";

/// Path escaping: unreserved characters plus `/` pass through.
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Query escaping: like `PATH_ESCAPE` but `/` is encoded too.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the `x-amz-*` block of the signature descriptor.
///
/// Names are lower-cased and sorted, values are trimmed, repeated names are
/// folded into one `name:v1,v2` line. Returns an empty string when no such
/// header is present.
pub fn canonicalize_amz_headers<'a, I, K, V>(headers: I) -> String
where
    I: IntoIterator<Item = (&'a K, &'a V)>,
    K: AsRef<str> + ?Sized + 'a,
    V: AsRef<str> + ?Sized + 'a,
{
    let mut grouped: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_ref().to_ascii_lowercase();
        if name.starts_with(AMZ_HEADER_PREFIX) {
            grouped.entry(name).or_default().push(value.as_ref().trim());
        }
    }

    let mut result = String::new();
    for (name, mut values) in grouped {
        // Sorted so that header insertion order never changes the signature.
        values.sort_unstable();
        result.push_str(&name);
        result.push(':');
        result.push_str(&values.join(","));
        result.push('\n');
    }
    result
}

/// Percent-encode a bucket name, key or sub-resource, keeping `/`.
pub fn url_encode(s: &str) -> String {
    utf8_percent_encode(s, PATH_ESCAPE).to_string()
}

/// Form-encode a query argument component: `/` is escaped, space becomes `+`.
pub fn quote_plus(s: &str) -> String {
    s.split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_ESCAPE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Base64 MD5 of a body, for `Content-MD5`.
pub fn content_hash(body: &[u8]) -> String {
    skiff_crypto::md5_base64(body)
}

/// Format datetime for HTTP headers
pub fn rfc822_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP header date such as `Wed, 28 Oct 2009 22:32:00 GMT`.
pub fn parse_rfc822(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a listing timestamp such as `2009-10-12T17:50:30.000Z`.
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Turn user metadata into upload headers (`X-AMZ-Meta-<name>`).
pub fn metadata_headers(metadata: &BTreeMap<String, String>) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(k, v)| (format!("{}{}", METADATA_HEADER_PREFIX, k), v.clone()))
        .collect()
}

/// XML escape string
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonicalize_amz_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("X-AMZ-Meta-Reviewed".to_string(), " yes ".to_string());
        headers.insert("x-amz-acl".to_string(), "public-read".to_string());
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        headers.insert("x-amz-meta-reviewed".to_string(), "again".to_string());

        assert_eq!(
            canonicalize_amz_headers(&headers),
            "x-amz-acl:public-read\nx-amz-meta-reviewed:again,yes\n"
        );
    }

    #[test]
    fn test_canonicalize_amz_headers_order_independent() {
        let forward = [
            ("x-amz-b", "2"),
            ("X-Amz-A", "1"),
            ("x-amz-a", "0"),
            ("Date", "now"),
        ];
        let mut reversed = forward;
        reversed.reverse();

        let pairs = |list: &[(&'static str, &'static str)]| {
            canonicalize_amz_headers(list.iter().map(|(k, v)| (*k, *v)))
        };
        assert_eq!(pairs(&forward), pairs(&reversed));
        assert_eq!(pairs(&forward), "x-amz-a:0,1\nx-amz-b:2\n");
    }

    #[test]
    fn test_canonicalize_amz_headers_empty() {
        let headers: BTreeMap<String, String> = BTreeMap::new();
        assert_eq!(canonicalize_amz_headers(&headers), "");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("photos/2024/cat.jpg"), "photos/2024/cat.jpg");
        assert_eq!(url_encode("hello world"), "hello%20world");
        assert_eq!(url_encode("a+b&c"), "a%2Bb%26c");
        assert_eq!(url_encode("ünï"), "%C3%BCn%C3%AF");
        assert_eq!(url_encode(""), "");
    }

    #[test]
    fn test_quote_plus() {
        assert_eq!(quote_plus("hello world"), "hello+world");
        assert_eq!(quote_plus("a/b"), "a%2Fb");
        assert_eq!(quote_plus("abc+/="), "abc%2B%2F%3D");
    }

    #[test]
    fn test_rfc822_round_trip() {
        let dt = Utc.with_ymd_and_hms(2009, 10, 28, 22, 32, 0).unwrap();
        let formatted = rfc822_timestamp(&dt);
        assert_eq!(formatted, "Wed, 28 Oct 2009 22:32:00 GMT");
        assert_eq!(parse_rfc822(&formatted), Some(dt));
    }

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_iso8601("2009-10-12T17:50:30.000Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2009, 10, 12, 17, 50, 30).unwrap());
        assert!(parse_iso8601("yesterday").is_none());
    }

    #[test]
    fn test_metadata_headers() {
        let mut meta = BTreeMap::new();
        meta.insert("author".to_string(), "ada".to_string());
        assert_eq!(
            metadata_headers(&meta),
            vec![("X-AMZ-Meta-author".to_string(), "ada".to_string())]
        );
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(content_hash(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }
}
