//! Skiff Client - Async access to one S3-compatible bucket
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Bucket                           │
//! │  get / info / exists / put / delete / listdir / URLs     │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐    │
//! │  │   Request    │  │    Signer    │  │ Listing XML  │    │
//! │  │ (skiff-core) │  │ (skiff-auth) │  │   (xml.rs)   │    │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘    │
//! │         └─────────────────┼─────────────────┘            │
//! │                  ┌────────┴────────┐                     │
//! │                  │   HttpClient    │                     │
//! │                  │    (reqwest)    │                     │
//! │                  └─────────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use skiff_client::{Bucket, BucketConfig, ListOptions};
//!
//! # async fn run() -> skiff_client::Result<()> {
//! let bucket = Bucket::new(
//!     BucketConfig::new("photos").with_credentials("AKID", "secret"),
//! )?;
//!
//! bucket.put("cats/tom.jpg", std::fs::read("tom.jpg").unwrap_or_default()).await?;
//! for record in bucket.listdir(ListOptions::new().prefix("cats/")).await? {
//!     println!("{} {}", record.key, record.size);
//! }
//! let link = bucket.make_signed_url("cats/tom.jpg", std::time::Duration::from_secs(600))?;
//! # let _ = link;
//! # Ok(())
//! # }
//! ```

mod bucket;
mod mime;
mod transport;
mod xml;

pub use bucket::{Bucket, ListOptions, ACL_HEADER};
pub use mime::{ExtensionMimeGuesser, MimeGuesser};
pub use transport::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use xml::{delete_objects_request, parse_error_body, parse_listing_page};

// Re-export types from core and auth
pub use skiff_auth::Credentials;
pub use skiff_core::types::{
    BodyTransformer, Expiry, Headers, ObjectMetadata, ObjectRecord, ObjectResponse, ObjectUpload,
};
pub use skiff_core::{BucketConfig, Error, ResponseError, Result};
