//! Upload payloads

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Headers;

/// Rewrites an upload body before length and digest headers are computed,
/// e.g. to compress it. May adjust the outgoing headers as well.
pub trait BodyTransformer: Send + Sync {
    fn transform(&self, headers: &mut Headers, body: Bytes) -> Bytes;
}

impl<F> BodyTransformer for F
where
    F: Fn(&mut Headers, Bytes) -> Bytes + Send + Sync,
{
    fn transform(&self, headers: &mut Headers, body: Bytes) -> Bytes {
        self(headers, body)
    }
}

/// Content for one key together with the options it is stored with.
#[derive(Clone, Default)]
pub struct ObjectUpload {
    pub body: Bytes,
    /// Canned ACL sent as `X-AMZ-ACL`
    pub acl: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Overrides any guessed or supplied `Content-Type`
    pub mimetype: Option<String>,
    pub headers: Headers,
    pub transformer: Option<Arc<dyn BodyTransformer>>,
}

impl ObjectUpload {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn acl(mut self, acl: impl Into<String>) -> Self {
        self.acl = Some(acl.into());
        self
    }

    pub fn metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    pub fn mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn transformer(mut self, transformer: impl BodyTransformer + 'static) -> Self {
        self.transformer = Some(Arc::new(transformer));
        self
    }
}

impl From<Bytes> for ObjectUpload {
    fn from(body: Bytes) -> Self {
        Self::new(body)
    }
}

impl From<Vec<u8>> for ObjectUpload {
    fn from(body: Vec<u8>) -> Self {
        Self::new(body)
    }
}

impl From<String> for ObjectUpload {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

impl From<&'static str> for ObjectUpload {
    fn from(body: &'static str) -> Self {
        Self::new(body)
    }
}

impl fmt::Debug for ObjectUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUpload")
            .field("len", &self.body.len())
            .field("acl", &self.acl)
            .field("metadata", &self.metadata)
            .field("mimetype", &self.mimetype)
            .field("headers", &self.headers)
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}
