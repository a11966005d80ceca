//! Configuration for a Skiff bucket client

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::url_encode;
use crate::{Error, Result, S3_DOMAIN};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Bucket name
    pub name: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    /// Bucket endpoint; derived from `name` when absent
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request transport timeout in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Require `https` (true) or `http` (false); unchecked when absent
    #[serde(default)]
    pub secure: Option<bool>,

    /// Extra attempts after a transport failure
    #[serde(default)]
    pub max_retries: u32,
}

impl BucketConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sub-millisecond remainders round up, so only a zero duration
    /// becomes a zero timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("SKIFF_BUCKET") {
            config.name = name;
        }
        if let Ok(key) = std::env::var("SKIFF_ACCESS_KEY") {
            config.access_key = key;
        }
        if let Ok(secret) = std::env::var("SKIFF_SECRET_KEY") {
            config.secret_key = secret;
        }
        if let Ok(url) = std::env::var("SKIFF_BASE_URL") {
            config.base_url = Some(url);
        }
        if let Ok(timeout) = std::env::var("SKIFF_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                config.timeout_ms = Some(t);
            }
        }
        if let Ok(secure) = std::env::var("SKIFF_SECURE") {
            config.secure = Some(secure == "true" || secure == "1");
        }
        if let Ok(retries) = std::env::var("SKIFF_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                config.max_retries = r;
            }
        }

        config
    }

    /// Endpoint for this bucket.
    ///
    /// Without a `base_url` this is `scheme://s3.amazonaws.com/<name>`. With
    /// one, an explicit `secure` flag must agree with its scheme.
    pub fn resolve_base_url(&self) -> Result<String> {
        if self.name.is_empty() {
            return Err(Error::InvalidArgument("bucket name is required".into()));
        }

        let scheme = if self.secure.unwrap_or(false) { "https" } else { "http" };
        match self.base_url.as_deref() {
            None | Some("") => Ok(format!("{}://{}/{}", scheme, S3_DOMAIN, url_encode(&self.name))),
            Some(url) => {
                if self.secure.is_some() && !url.starts_with(&format!("{}://", scheme)) {
                    return Err(Error::InvalidArgument(format!(
                        "secure={}, url must use {}",
                        self.secure.unwrap_or(false),
                        scheme
                    )));
                }
                Ok(url.trim_end_matches('/').to_string())
            }
        }
    }
}
