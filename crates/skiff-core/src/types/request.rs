//! Storage requests and their canonical forms
//!
//! A [`Request`] describes one operation against a bucket. Its
//! [`descriptor`](Request::descriptor) is the exact string the signer hashes,
//! so every byte of it, newlines included, is part of the wire protocol.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::{canonicalize_amz_headers, content_hash, quote_plus, rfc822_timestamp, url_encode};
use crate::{Error, Result};

/// Ordered request header set
pub type Headers = BTreeMap<String, String>;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_MD5: &str = "Content-MD5";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const DATE: &str = "Date";

/// HTTP methods used by the storage protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            _ => Err(format!("Invalid method: {}", s)),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Put => http::Method::PUT,
            Method::Post => http::Method::POST,
            Method::Delete => http::Method::DELETE,
            Method::Head => http::Method::HEAD,
        }
    }
}

/// Separator placed between query arguments when rendering a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgSeparator {
    #[default]
    Ampersand,
    /// Legacy separator some URL consumers still expect
    Semicolon,
}

impl ArgSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ampersand => "&",
            Self::Semicolon => ";",
        }
    }
}

/// One storage operation: method, target and payload.
#[derive(Debug, Clone)]
pub struct Request {
    bucket: String,
    key: Option<String>,
    method: Method,
    headers: Headers,
    args: Vec<(String, String)>,
    body: Option<Bytes>,
    subresource: Option<String>,
}

impl Request {
    pub fn builder(bucket: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn args(&self) -> &[(String, String)] {
        &self.args
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn subresource(&self) -> Option<&str> {
        self.subresource.as_deref()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Set a header, replacing any existing header of the same name
    /// regardless of case. Used by the signer to attach `Authorization`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Replace the query arguments, keeping their order.
    pub fn with_args(mut self, args: Vec<(String, String)>) -> Self {
        self.args = args;
        self
    }

    /// `/bucket/key?subresource`, the resource part of the descriptor.
    pub fn canonical_resource(&self) -> String {
        let mut resource = format!("/{}/", url_encode(&self.bucket));
        if let Some(key) = self.key.as_deref().filter(|k| !k.is_empty()) {
            resource.push_str(&url_encode(key));
        }
        if let Some(sub) = self.subresource.as_deref().filter(|s| !s.is_empty()) {
            resource.push('?');
            resource.push_str(&url_encode(sub));
        }
        resource
    }

    /// The string the request signature is computed over.
    ///
    /// ```text
    /// METHOD\n
    /// Content-MD5\n
    /// Content-Type\n
    /// Date\n
    /// x-amz-name:value\n   (zero or more)
    /// /bucket/key?subresource
    /// ```
    pub fn descriptor(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}{}",
            self.method,
            self.header(CONTENT_MD5).unwrap_or(""),
            self.header(CONTENT_TYPE).unwrap_or(""),
            self.header(DATE).unwrap_or(""),
            canonicalize_amz_headers(&self.headers),
            self.canonical_resource()
        )
    }

    /// Render the request URL against a bucket base URL.
    pub fn to_url(&self, base_url: &str, separator: ArgSeparator) -> String {
        let mut url = format!("{}/", base_url);
        if let Some(key) = self.key.as_deref().filter(|k| !k.is_empty()) {
            url.push_str(&url_encode(key));
        }

        let mut parts = Vec::with_capacity(2);
        if let Some(sub) = self.subresource.as_deref().filter(|s| !s.is_empty()) {
            parts.push(sub.to_string());
        }
        if !self.args.is_empty() {
            parts.push(
                self.args
                    .iter()
                    .map(|(k, v)| format!("{}={}", quote_plus(k), quote_plus(v)))
                    .collect::<Vec<_>>()
                    .join(separator.as_str()),
            );
        }
        if !parts.is_empty() {
            url.push('?');
            url.push_str(&parts.join("&"));
        }
        url
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<S3 {} request bucket {:?} key {:?}>",
            self.method,
            self.bucket,
            self.key.as_deref().unwrap_or("")
        )
    }
}

fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Builder for [`Request`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            request: Request {
                bucket: bucket.into(),
                key: None,
                method: Method::Get,
                headers: Headers::new(),
                args: Vec::new(),
                body: None,
                subresource: None,
            },
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.request.key = Some(key.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.set_header(name, value);
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.request.set_header(name, value);
        }
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.args.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    pub fn subresource(mut self, subresource: impl Into<String>) -> Self {
        self.request.subresource = Some(subresource.into());
        self
    }

    /// Build the request, stamping `Date` with the current time.
    pub fn build(self) -> Result<Request> {
        self.build_at(Utc::now())
    }

    /// Build the request, stamping `Date` with `now` when absent.
    ///
    /// A non-empty body without `Content-MD5` gets its digest computed here.
    pub fn build_at(self, now: DateTime<Utc>) -> Result<Request> {
        let mut request = self.request;

        if request.header(AUTHORIZATION).is_some() {
            return Err(Error::InvalidArgument(
                "requests must not carry a pre-computed Authorization header".into(),
            ));
        }

        let md5 = match request.body {
            Some(ref body) if !body.is_empty() && request.header(CONTENT_MD5).is_none() => {
                Some(content_hash(body))
            }
            _ => None,
        };
        if let Some(md5) = md5 {
            request.headers.insert(CONTENT_MD5.to_string(), md5);
        }

        if request.header(DATE).is_none() {
            request
                .headers
                .insert(DATE.to_string(), rfc822_timestamp(&now));
        }

        Ok(request)
    }
}
