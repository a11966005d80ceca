//! Bucket client
//!
//! Every operation follows the same path: build a [`Request`], sign it,
//! dispatch it through the [`HttpClient`], then interpret the reply. Listing
//! additionally loops, one request per page, until the service reports the
//! listing is complete.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::StatusCode;
use tracing::{debug, warn};

use skiff_auth::{presigned_url, sign, Credentials};
use skiff_core::types::{
    ArgSeparator, Expiry, Headers, Method, ObjectMetadata, ObjectRecord, ObjectResponse,
    ObjectUpload, Request, RequestBuilder, CONTENT_LENGTH, CONTENT_MD5, CONTENT_TYPE,
};
use skiff_core::utils::{content_hash, metadata_headers};
use skiff_core::{BucketConfig, Error, ResponseError, Result, MAX_DELETE_KEYS};

use crate::mime::{ExtensionMimeGuesser, MimeGuesser};
use crate::transport::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
use crate::xml::{delete_objects_request, parse_error_body, parse_listing_page};

/// Header carrying a canned ACL on upload
pub const ACL_HEADER: &str = "X-AMZ-ACL";

/// Content type sent with batch deletes. The body is plain XML; the service
/// accepts this value and clients have always sent it.
const BATCH_DELETE_CONTENT_TYPE: &str = "multipart/form-data";

/// First backoff delay between transport retries
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Options for [`Bucket::listdir`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only keys starting with this prefix
    pub prefix: Option<String>,
    /// Only keys lexicographically after this one
    pub marker: Option<String>,
    /// Page size hint and cap on the total number of returned records
    pub limit: Option<usize>,
    pub delimiter: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    fn query_args(&self, marker: Option<&str>) -> Vec<(String, String)> {
        let limit = self.limit.map(|l| l.to_string());
        [
            ("prefix", self.prefix.as_deref()),
            ("marker", marker),
            ("max-keys", limit.as_deref()),
            ("delimiter", self.delimiter.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v.to_string())))
        .collect()
    }
}

/// Client for one bucket.
///
/// Read-only once built, so one instance can serve any number of concurrent
/// operations. Cloning is cheap and shares the transport.
#[derive(Clone)]
pub struct Bucket {
    name: String,
    base_url: String,
    credentials: Credentials,
    timeout: Option<Duration>,
    max_retries: u32,
    http: Arc<dyn HttpClient>,
    mime: Arc<dyn MimeGuesser>,
}

impl Bucket {
    /// Client over the default `reqwest` transport.
    pub fn new(config: BucketConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(ReqwestClient::new()?))
    }

    pub fn with_transport(config: BucketConfig, http: Arc<dyn HttpClient>) -> Result<Self> {
        let base_url = config.resolve_base_url()?;
        let credentials = Credentials::from(&config);
        if credentials.is_empty() {
            return Err(Error::InvalidArgument(
                "access key and secret key are required".into(),
            ));
        }
        let timeout = config.timeout();
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidArgument("timeout must be positive".into()));
        }
        debug!("Bucket {} at {}", config.name, base_url);

        Ok(Self {
            credentials,
            timeout,
            max_retries: config.max_retries,
            name: config.name,
            base_url,
            http,
            mime: Arc::new(ExtensionMimeGuesser),
        })
    }

    pub fn with_mime_guesser(mut self, mime: Arc<dyn MimeGuesser>) -> Self {
        self.mime = mime;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Handle on the same bucket whose calls run without a transport
    /// timeout. `self` keeps its own timeout, as do calls already in flight.
    ///
    /// ```ignore
    /// let huge = bucket.without_timeout().get("dumps/full.tar").await?;
    /// ```
    pub fn without_timeout(&self) -> Bucket {
        Bucket {
            timeout: None,
            ..self.clone()
        }
    }

    /// Request builder preset to this bucket.
    pub fn request(&self) -> RequestBuilder {
        Request::builder(self.name.as_str())
    }

    /// Sign and send a request, retrying transport failures only.
    pub async fn send(&self, mut request: Request) -> Result<HttpResponse> {
        sign(&mut request, &self.credentials)?;

        let http_request = HttpRequest {
            url: request.to_url(&self.base_url, ArgSeparator::Ampersand),
            method: request.method().into(),
            headers: request
                .headers()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: request.body().cloned(),
            timeout: self.timeout,
        };
        debug!("Sending {} to {}", request, http_request.url);

        let mut delay = RETRY_BASE_DELAY;
        let mut attempt = 0;
        loop {
            match self.http.fetch(http_request.clone()).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} failed (attempt {} of {}): {}",
                        request,
                        attempt,
                        self.max_retries + 1,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                result => return result,
            }
        }
    }

    /// Send and turn non-2xx replies into errors. `key` names the object a
    /// 404 refers to.
    async fn dispatch(&self, request: Request, key: Option<&str>) -> Result<HttpResponse> {
        let response = self.send(request).await?;
        check_response(response, key)
    }

    /// Fetch an object with its metadata.
    pub async fn get(&self, key: &str) -> Result<ObjectResponse> {
        let request = self.request().key(key).build()?;
        let response = self.dispatch(request, Some(key)).await?;

        Ok(ObjectResponse {
            status: response.status.as_u16(),
            info: ObjectMetadata::from_headers(&response.headers),
            body: response.body,
        })
    }

    /// Fetch an object's metadata only.
    pub async fn info(&self, key: &str) -> Result<ObjectMetadata> {
        let request = self.request().method(Method::Head).key(key).build()?;
        let response = self.dispatch(request, Some(key)).await?;
        Ok(ObjectMetadata::from_headers(&response.headers))
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.info(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Store an object.
    ///
    /// `Content-Type` comes from the upload's mimetype, else its headers,
    /// else a guess from the key. The transformer, if any, runs before the
    /// length and digest headers are filled in.
    pub async fn put(&self, key: &str, upload: impl Into<ObjectUpload>) -> Result<()> {
        let upload = upload.into();
        let mut headers = upload.headers;

        if let Some(mimetype) = upload.mimetype {
            set_header(&mut headers, CONTENT_TYPE, mimetype);
        } else if !has_header(&headers, CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE.to_string(), self.mime.guess(key));
        }
        for (name, value) in metadata_headers(&upload.metadata) {
            set_header(&mut headers, &name, value);
        }
        if let Some(acl) = upload.acl {
            set_header(&mut headers, ACL_HEADER, acl);
        }

        let body = match upload.transformer {
            Some(transformer) => transformer.transform(&mut headers, upload.body),
            None => upload.body,
        };

        if !has_header(&headers, CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH.to_string(), body.len().to_string());
        }
        if !has_header(&headers, CONTENT_MD5) {
            headers.insert(CONTENT_MD5.to_string(), content_hash(&body));
        }

        let request = self
            .request()
            .method(Method::Put)
            .key(key)
            .headers(headers)
            .body(body)
            .build()?;
        self.dispatch(request, Some(key)).await?;
        Ok(())
    }

    /// Delete one or more keys.
    ///
    /// A single key is a plain DELETE and a missing key counts as deleted.
    /// Several keys go out as one quiet batch delete of at most
    /// [`MAX_DELETE_KEYS`].
    pub async fn delete<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        match keys {
            [] => Err(Error::InvalidArgument("at least one key is required".into())),
            [key] => {
                let key = key.as_ref();
                let request = self.request().method(Method::Delete).key(key).build()?;
                match self.dispatch(request, Some(key)).await {
                    Err(e) if e.is_not_found() => {
                        debug!("Delete of missing key {:?} treated as done", key);
                        Ok(())
                    }
                    result => result.map(|_| ()),
                }
            }
            _ if keys.len() > MAX_DELETE_KEYS => Err(Error::InvalidArgument(format!(
                "cannot delete more than {} keys at a time, got {}",
                MAX_DELETE_KEYS,
                keys.len()
            ))),
            _ => {
                let request = self
                    .request()
                    .method(Method::Post)
                    .subresource("delete")
                    .header(CONTENT_TYPE, BATCH_DELETE_CONTENT_TYPE)
                    .body(delete_objects_request(keys))
                    .build()?;
                self.dispatch(request, None).await?;
                Ok(())
            }
        }
    }

    /// List bucket contents, following continuation markers page by page.
    ///
    /// Pages are fetched strictly in sequence. Records keep page order. A
    /// `limit` is sent as `max-keys` and also caps the total returned. Any
    /// failure discards what was gathered so far.
    pub async fn listdir(&self, options: ListOptions) -> Result<Vec<ObjectRecord>> {
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut marker = options.marker.clone();
        let mut pages = 0usize;

        loop {
            let mut builder = self.request();
            for (name, value) in options.query_args(marker.as_deref()) {
                builder = builder.arg(name, value);
            }
            let response = self.dispatch(builder.build()?, None).await?;
            let page = parse_listing_page(&response.body)?;
            pages += 1;

            debug!(
                "Listing page {} of {}: {} records, truncated={}",
                pages,
                self.name,
                page.len(),
                page.truncated
            );

            let truncated = page.truncated;
            let next_marker = page.next_marker;
            records.extend(page.items);

            if let Some(limit) = options.limit {
                if records.len() >= limit {
                    records.truncate(limit);
                    break;
                }
            }
            if !truncated {
                break;
            }
            match next_marker {
                Some(next) => marker = Some(next),
                None => {
                    return Err(Error::MalformedListing(
                        "truncated listing page carries no entries to continue from".into(),
                    ))
                }
            }
        }

        Ok(records)
    }

    /// Unsigned URL for `key`. No network I/O.
    ///
    /// Arguments are joined with `;`.
    pub fn make_url(&self, key: &str, args: &[(&str, &str)]) -> Result<String> {
        let mut builder = self.request().key(key);
        for (name, value) in args {
            builder = builder.arg(*name, *value);
        }
        Ok(builder.build()?.to_url(&self.base_url, ArgSeparator::Semicolon))
    }

    /// Signed download URL for `key`, valid until `expiry`.
    pub fn make_signed_url(&self, key: &str, expiry: impl Into<Expiry>) -> Result<String> {
        self.make_signed_url_at(key, expiry, Utc::now())
    }

    /// As [`make_signed_url`](Self::make_signed_url), with an explicit
    /// signing time.
    pub fn make_signed_url_at(
        &self,
        key: &str,
        expiry: impl Into<Expiry>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        presigned_url(
            &self.base_url,
            &self.name,
            key,
            &self.credentials,
            expiry.into(),
            now,
        )
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("access_key", &self.credentials.access_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn check_response(response: HttpResponse, key: Option<&str>) -> Result<HttpResponse> {
    if response.status.is_success() {
        return Ok(response);
    }

    let status = response.status;
    let (code, message) = parse_error_body(&response.body);

    let mut error = ResponseError::new(status.as_u16(), response.body);
    if let Some(reason) = status.canonical_reason() {
        error = error.with_reason(reason);
    }
    if let Some(message) = message {
        error = error.with_message(message);
    }

    // A 404 naming some other missing resource (e.g. the bucket) stays a
    // plain protocol error.
    let missing_key = status == StatusCode::NOT_FOUND
        && code.as_deref().map_or(true, |c| c == "NoSuchKey");
    if let Some(code) = code {
        error = error.with_code(code);
    }

    match key {
        Some(key) if missing_key => Err(Error::KeyNotFound {
            key: key.to_string(),
            source: error.with_key(key),
        }),
        Some(key) => Err(Error::Protocol(error.with_key(key))),
        None => Err(Error::Protocol(error)),
    }
}

fn has_header(headers: &Headers, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

fn set_header(headers: &mut Headers, name: &str, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}
