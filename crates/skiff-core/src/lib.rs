//! Skiff Core Library
//!
//! Core types, configuration, and canonicalization rules shared by the Skiff
//! object storage client.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::BucketConfig;
pub use error::{Error, ResponseError, Result};

/// Skiff version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default storage service host
pub const S3_DOMAIN: &str = "s3.amazonaws.com";

/// XML namespace of listing and error documents
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Maximum number of keys in one batch delete
pub const MAX_DELETE_KEYS: usize = 1000;
