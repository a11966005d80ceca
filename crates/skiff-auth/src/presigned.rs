//! Query-string authenticated URLs
//!
//! The signed descriptor is the ordinary GET descriptor with the `Date` line
//! carrying the expiry as seconds since the epoch. The signature then travels
//! in the query string instead of an `Authorization` header.

use chrono::{DateTime, Utc};
use skiff_core::types::{ArgSeparator, Expiry, Request, DATE};
use skiff_core::Result;
use tracing::debug;

use crate::{sign, Credentials};

const AWS_ACCESS_KEY_ID: &str = "AWSAccessKeyId";
const EXPIRES: &str = "Expires";
const SIGNATURE: &str = "Signature";

/// Build and sign a GET for `key` whose query carries the credentials.
pub fn presign_request(
    bucket: &str,
    key: &str,
    credentials: &Credentials,
    expiry: Expiry,
    now: DateTime<Utc>,
) -> Result<Request> {
    let expires = expiry.timestamp(now)?.to_string();

    let mut request = Request::builder(bucket)
        .key(key)
        .header(DATE, expires.clone())
        .build_at(now)?;
    let signature = sign(&mut request, credentials)?;

    debug!("Presigned {} until {}", request, expires);

    Ok(request.with_args(vec![
        (AWS_ACCESS_KEY_ID.to_string(), credentials.access_key.clone()),
        (EXPIRES.to_string(), expires),
        (SIGNATURE.to_string(), signature),
    ]))
}

/// Signed download URL for `key` under `base_url`.
pub fn presigned_url(
    base_url: &str,
    bucket: &str,
    key: &str,
    credentials: &Credentials,
    expiry: Expiry,
    now: DateTime<Utc>,
) -> Result<String> {
    let request = presign_request(bucket, key, credentials, expiry, now)?;
    Ok(request.to_url(base_url, ArgSeparator::Ampersand))
}
