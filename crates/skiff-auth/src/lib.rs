//! Authentication for Skiff
//!
//! Requests are authenticated with the `AWS <access-key>:<signature>` scheme:
//! an HMAC-SHA1 over the request descriptor, keyed by the secret key. The
//! same descriptor, with `Date` replaced by an expiry timestamp, backs
//! query-string authenticated URLs.

pub mod credentials;
pub mod presigned;
pub mod signature;

pub use credentials::Credentials;
pub use presigned::{presign_request, presigned_url};
pub use signature::{compute_signature, sign, AUTH_SCHEME};
