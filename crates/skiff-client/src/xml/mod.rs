//! XML documents exchanged with the storage service

use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::Deserialize;

use skiff_core::types::{ListingPage, ObjectRecord};
use skiff_core::utils::{parse_iso8601, xml_escape};
use skiff_core::{Error, Result, S3_NAMESPACE};

const LIST_BUCKET_RESULT: &str = "ListBucketResult";

// ============= Bucket Listing =============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    is_truncated: Option<String>,
    #[serde(rename = "Contents", default)]
    contents: Vec<Contents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Contents {
    key: String,
    last_modified: String,
    #[serde(rename = "ETag", default)]
    etag: String,
    size: u64,
}

impl Contents {
    fn into_record(self) -> Result<ObjectRecord> {
        let last_modified = parse_iso8601(&self.last_modified).ok_or_else(|| {
            Error::MalformedListing(format!(
                "invalid LastModified {:?} for key {:?}",
                self.last_modified, self.key
            ))
        })?;

        Ok(ObjectRecord {
            key: self.key,
            last_modified,
            etag: self.etag,
            size: self.size,
        })
    }
}

/// Parse one page of a bucket listing.
///
/// The root must be `ListBucketResult` in the S3 namespace and
/// `IsTruncated` must read exactly `true` or `false`.
pub fn parse_listing_page(body: &[u8]) -> Result<ListingPage> {
    check_listing_root(body)?;

    let text = std::str::from_utf8(body)
        .map_err(|e| Error::MalformedListing(format!("listing is not UTF-8: {}", e)))?;
    let result: ListBucketResult =
        from_str(text).map_err(|e| Error::MalformedListing(e.to_string()))?;

    let truncated = match result.is_truncated.as_deref().map(str::trim) {
        Some("true") => true,
        Some("false") => false,
        other => {
            return Err(Error::MalformedListing(format!(
                "invalid IsTruncated value: {:?}",
                other
            )))
        }
    };

    let items = result
        .contents
        .into_iter()
        .map(Contents::into_record)
        .collect::<Result<Vec<_>>>()?;

    Ok(ListingPage::new(items, truncated))
}

fn check_listing_root(body: &[u8]) -> Result<()> {
    let mut reader = NsReader::from_reader(body);

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) | Ok((ns, Event::Empty(e))) => {
                let in_namespace = match ns {
                    ResolveResult::Bound(Namespace(uri)) => uri == S3_NAMESPACE.as_bytes(),
                    _ => false,
                };
                let local = e.local_name();
                if in_namespace && local.as_ref() == LIST_BUCKET_RESULT.as_bytes() {
                    return Ok(());
                }
                return Err(Error::MalformedListing(format!(
                    "root tag mismatch, wanted {{{}}}{} but got {}",
                    S3_NAMESPACE,
                    LIST_BUCKET_RESULT,
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok((_, Event::Eof)) => {
                return Err(Error::MalformedListing("empty listing document".into()));
            }
            Ok(_) => {}
            Err(e) => return Err(Error::MalformedListing(format!("XML parse error: {}", e))),
        }
    }
}

// ============= Error Responses =============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorDocument {
    code: Option<String>,
    message: Option<String>,
}

/// Service error `Code` and `Message`, when the body is an error document.
pub fn parse_error_body(body: &[u8]) -> (Option<String>, Option<String>) {
    let doc = std::str::from_utf8(body)
        .ok()
        .and_then(|text| from_str::<ErrorDocument>(text).ok())
        .unwrap_or_default();
    (doc.code, doc.message)
}

// ============= Delete Objects =============

/// Quiet-mode batch delete body, keys in input order.
pub fn delete_objects_request<S: AsRef<str>>(keys: &[S]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Delete><Quiet>true</Quiet>"#);
    for key in keys {
        xml.push_str("<Object><Key>");
        xml.push_str(&xml_escape(key.as_ref()));
        xml.push_str("</Key></Object>");
    }
    xml.push_str("</Delete>");
    xml
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Listing document with one `Contents` entry per key.
    pub(crate) fn listing_xml(keys: &[&str], truncated: bool) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>bucket</Name>
  <Prefix></Prefix>
  <Marker></Marker>
  <MaxKeys>1000</MaxKeys>
"#,
        );
        xml.push_str(&format!("  <IsTruncated>{}</IsTruncated>\n", truncated));
        for (i, key) in keys.iter().enumerate() {
            xml.push_str(&format!(
                "  <Contents>\n    <Key>{}</Key>\n    <LastModified>2009-10-12T17:50:30.000Z</LastModified>\n    <ETag>\"fba9dede5f27731c9771645a3986328{}\"</ETag>\n    <Size>{}</Size>\n    <StorageClass>STANDARD</StorageClass>\n  </Contents>\n",
                xml_escape(key),
                i,
                100 + i
            ));
        }
        xml.push_str("</ListBucketResult>");
        xml
    }

    #[test]
    fn test_parse_listing_in_document_order() {
        let xml = listing_xml(&["zeta", "alpha", "a&b"], true);
        let page = parse_listing_page(xml.as_bytes()).unwrap();

        let keys: Vec<_> = page.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "a&b"]);
        assert!(page.truncated);
        assert_eq!(page.next_marker.as_deref(), Some("a&b"));
        assert_eq!(page.items[1].size, 101);
        assert_eq!(page.items[0].etag, "\"fba9dede5f27731c9771645a39863280\"");
    }

    #[test]
    fn test_parse_empty_listing() {
        let xml = listing_xml(&[], false);
        let page = parse_listing_page(xml.as_bytes()).unwrap();
        assert!(page.is_empty());
        assert!(!page.truncated);
        assert_eq!(page.next_marker, None);
    }

    #[test]
    fn test_rejects_wrong_root() {
        let xml = r#"<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><IsTruncated>false</IsTruncated></ListAllMyBucketsResult>"#;
        let err = parse_listing_page(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedListing(ref m) if m.contains("root tag mismatch")));
    }

    #[test]
    fn test_rejects_missing_namespace() {
        let xml = "<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>";
        assert!(matches!(
            parse_listing_page(xml.as_bytes()),
            Err(Error::MalformedListing(_))
        ));
    }

    #[test]
    fn test_rejects_bad_truncation_flag() {
        let xml = listing_xml(&["a"], false).replace(
            "<IsTruncated>false</IsTruncated>",
            "<IsTruncated>maybe</IsTruncated>",
        );
        let err = parse_listing_page(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedListing(ref m) if m.contains("IsTruncated")));

        let missing = listing_xml(&["a"], false).replace("<IsTruncated>false</IsTruncated>", "");
        assert!(parse_listing_page(missing.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_listing_page(b"").is_err());
        assert!(parse_listing_page(b"not xml at all").is_err());
    }

    #[test]
    fn test_parse_error_body() {
        let (code, message) = parse_error_body(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
        );
        assert_eq!(code.as_deref(), Some("NoSuchKey"));
        assert_eq!(message.as_deref(), Some("The specified key does not exist."));

        let (code, message) = parse_error_body(b"<Error><Message>Not Found</Message></Error>");
        assert_eq!(code, None);
        assert_eq!(message.as_deref(), Some("Not Found"));

        assert_eq!(parse_error_body(b""), (None, None));
    }

    #[test]
    fn test_delete_objects_request() {
        assert_eq!(
            delete_objects_request(&["a", "b<c"]),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Delete><Quiet>true</Quiet>\
             <Object><Key>a</Key></Object><Object><Key>b&lt;c</Key></Object></Delete>"
        );
    }
}
