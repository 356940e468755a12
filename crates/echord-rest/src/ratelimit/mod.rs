//! Per-bucket rate limiting.
//!
//! Every outbound operation belongs to a bucket. Operations in one bucket run
//! strictly one after another and never exceed the bucket's quota; operations
//! in different buckets run concurrently.

mod bucket;
mod dispatcher;
mod global;
mod headers;
mod outcome;
mod registry;
mod route;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use headers::RateLimitHeaders;
pub(crate) use headers::{parse_seconds, seconds};
pub use outcome::{Completed, OperationError};
pub use registry::BucketRegistry;
pub use route::Route;
