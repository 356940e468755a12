//! # echord-rest
//!
//! Outbound request plumbing for the REST API.
//!
//! ## Features
//!
//! - **Dispatcher**: per-bucket FIFO queues that never exceed the bucket's quota
//! - **Throttle recovery**: 429 responses are retried transparently, global
//!   throttles pause every bucket
//! - **Bucket discovery**: routes converge on the server-assigned bucket hash
//! - **RestClient**: authenticated JSON requests issued through the dispatcher
//!
//! ## Example
//!
//! ```ignore
//! use echord_rest::{RestClient, RestConfig, DispatcherConfig};
//!
//! let client = RestClient::new(RestConfig::new(token), DispatcherConfig::default())?;
//! let channel = client.get("/channels/41771983423143937").await?;
//! ```

pub mod client;
pub mod error;
pub mod ratelimit;

pub use client::{RequestOptions, RestClient, RestConfig};
pub use error::{DispatchError, RestError, RestResult};
pub use ratelimit::{
    BucketRegistry, Completed, Dispatcher, DispatcherConfig, OperationError, RateLimitHeaders,
    Route,
};
