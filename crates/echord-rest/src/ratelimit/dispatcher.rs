//! Rate-limited dispatcher
//!
//! Runs caller-supplied operations through per-bucket FIFO queues. Each
//! bucket with pending work has exactly one drain task; the task is the sole
//! mutator of that bucket's quota.

use dashmap::DashMap;
use echord_common::ClientConfig;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace, warn};

use super::bucket::{Job, JobOutcome, RequestQueue};
use super::global::GlobalLimit;
use super::headers::RateLimitHeaders;
use super::outcome::{Completed, OperationError};
use super::registry::BucketRegistry;
use super::route::Route;
use crate::error::DispatchError;

/// Quota assumed for a bucket the server has not described yet
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub default_limit: u32,
    pub default_window: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_window: Duration::from_secs(5),
        }
    }
}

impl From<&ClientConfig> for DispatcherConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            default_limit: config.api.bucket_limit,
            default_window: config.api.bucket_window,
        }
    }
}

struct DispatcherInner {
    config: DispatcherConfig,
    queues: DashMap<String, Arc<RequestQueue>>,
    global: GlobalLimit,
    registry: BucketRegistry,
    shutdown: watch::Sender<bool>,
}

/// Per-bucket request dispatcher
///
/// Cheap to clone; clones share buckets, the global throttle and the
/// bucket registry.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(DispatcherInner {
                config: DispatcherConfig {
                    default_limit: config.default_limit.max(1),
                    ..config
                },
                queues: DashMap::new(),
                global: GlobalLimit::default(),
                registry: BucketRegistry::new(),
                shutdown,
            }),
        }
    }

    /// Run `operation` in the bucket `bucket_key`
    ///
    /// The operation may be called more than once: a `RateLimited` outcome puts
    /// it back at the head of the bucket's queue and it runs again once the
    /// bucket (or the global throttle) allows. `Failed` is returned to the
    /// caller without retry.
    pub async fn submit<T, E, F, Fut>(
        &self,
        bucket_key: impl Into<String>,
        operation: F,
    ) -> Result<T, DispatchError<E>>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Completed<T>, OperationError<E>>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.enqueue(bucket_key.into(), None, operation).await
    }

    /// Run `operation` in the bucket currently assigned to `route`
    ///
    /// Bucket hashes reported with the operation's outcome (`Completed` or
    /// `RateLimited`) are recorded, so later submissions for the same endpoint
    /// land in the server's bucket. That bucket starts from the quota reported
    /// alongside the hash.
    pub async fn submit_route<T, E, F, Fut>(
        &self,
        route: &Route,
        operation: F,
    ) -> Result<T, DispatchError<E>>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Completed<T>, OperationError<E>>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let key = self.inner.registry.resolve(route);
        self.enqueue(key, Some(route.clone()), operation).await
    }

    /// Bucket key a submission for `route` would use right now
    pub fn bucket_key(&self, route: &Route) -> String {
        self.inner.registry.resolve(route)
    }

    pub fn registry(&self) -> &BucketRegistry {
        &self.inner.registry
    }

    /// Remaining quota of a bucket, if the bucket exists
    pub fn remaining(&self, bucket_key: &str) -> Option<u32> {
        self.inner
            .queues
            .get(bucket_key)
            .map(|queue| queue.state.lock().remaining)
    }

    /// Number of buckets created so far
    pub fn bucket_count(&self) -> usize {
        self.inner.queues.len()
    }

    /// Stop all drain loops
    ///
    /// Queued and waiting operations resolve with `DispatchError::Shutdown`;
    /// an operation already running finishes and delivers its result.
    ///
    /// An operation that panics resolves with `DispatchError::Panicked` and
    /// the rest of its bucket keeps draining.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.send_replace(true) {
            debug!(buckets = self.inner.queues.len(), "Dispatcher shutting down");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    async fn enqueue<T, E, F, Fut>(
        &self,
        key: String,
        route: Option<Route>,
        mut operation: F,
    ) -> Result<T, DispatchError<E>>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Completed<T>, OperationError<E>>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        if self.is_shutdown() {
            return Err(DispatchError::Shutdown);
        }

        let (tx, rx) = oneshot::channel();
        let reply = Arc::new(Mutex::new(Some(tx)));

        let run = Box::new(move || {
            let reply = Arc::clone(&reply);
            let abandoned = reply.lock().as_ref().is_none_or(oneshot::Sender::is_closed);
            let pending = (!abandoned).then(&mut operation);

            async move {
                let Some(pending) = pending else {
                    return JobOutcome::Abandoned;
                };

                let (result, headers) = match pending.await {
                    Ok(Completed { value, headers }) => (Ok(value), headers),
                    Err(OperationError::Failed(e)) => (Err(DispatchError::Operation(e)), None),
                    Err(OperationError::RateLimited {
                        retry_after,
                        global,
                        headers,
                    }) => {
                        return JobOutcome::RateLimited {
                            retry_after,
                            global,
                            headers,
                        }
                    }
                };

                if let Some(tx) = reply.lock().take() {
                    let _ = tx.send(result);
                }
                JobOutcome::Done(headers)
            }
            .boxed()
        });

        let queue = self.inner.queue(&key);
        queue.push_back(Job { route, run });
        trace!(bucket = %key, "Queued operation");

        if queue.try_start() {
            tokio::spawn(drain(Arc::clone(&self.inner), queue));
        }

        match rx.await {
            Ok(result) => result,
            // Dropped unanswered: cleared on shutdown, or unwound by a panic
            Err(_) if self.is_shutdown() => Err(DispatchError::Shutdown),
            Err(_) => Err(DispatchError::Panicked),
        }
    }
}

impl DispatcherInner {
    fn new_queue(&self, key: &str) -> RequestQueue {
        RequestQueue::new(
            key.to_string(),
            self.config.default_limit,
            self.config.default_window,
        )
    }

    fn queue(&self, key: &str) -> Arc<RequestQueue> {
        if let Some(queue) = self.queues.get(key) {
            return Arc::clone(queue.value());
        }

        Arc::clone(
            self.queues
                .entry(key.to_string())
                .or_insert_with(|| {
                    debug!(bucket = %key, "Created bucket");
                    Arc::new(self.new_queue(key))
                })
                .value(),
        )
    }

    /// Create `key` with the quota the server reported for it; an existing
    /// bucket is left to its own drain loop
    fn seed(&self, key: &str, headers: &RateLimitHeaders) {
        self.queues.entry(key.to_string()).or_insert_with(|| {
            debug!(
                bucket = %key,
                limit = headers.limit,
                remaining = headers.remaining,
                "Created bucket from server quota"
            );
            let queue = self.new_queue(key);
            queue.state.lock().observe(headers, Instant::now());
            Arc::new(queue)
        });
    }

    /// Record a bucket hash reported for `route` and seed the bucket it maps to
    fn learn(&self, from: &RequestQueue, route: Option<&Route>, headers: Option<&RateLimitHeaders>) {
        let (Some(route), Some(headers)) = (route, headers) else {
            return;
        };
        let Some(hash) = headers.bucket.as_deref() else {
            return;
        };

        self.registry.learn(&route.endpoint(), hash);
        let key = self.registry.resolve(route);
        if key != from.key {
            self.seed(&key, headers);
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

/// Sleep until `deadline` unless shutdown is signalled first
async fn pause(deadline: Instant, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        () = sleep_until(deadline) => {}
        _ = shutdown.changed() => {}
    }
}

async fn drain(inner: Arc<DispatcherInner>, queue: Arc<RequestQueue>) {
    let mut shutdown = inner.shutdown.subscribe();
    trace!(bucket = %queue.key, "Drain loop started");

    loop {
        if *shutdown.borrow_and_update() {
            let dropped = queue.clear();
            if dropped > 0 {
                debug!(bucket = %queue.key, dropped, "Dropped queued operations on shutdown");
            }
            if queue.release() {
                continue;
            }
            break;
        }

        if let Some(until) = inner.global.active_until(Instant::now()) {
            trace!(bucket = %queue.key, "Waiting for global rate limit");
            pause(until, &mut shutdown).await;
            continue;
        }

        let wait = queue.state.lock().wait_until(Instant::now());
        if let Some(until) = wait {
            trace!(bucket = %queue.key, "Bucket exhausted, waiting for reset");
            pause(until, &mut shutdown).await;
            continue;
        }

        let Some(mut job) = queue.pop_front() else {
            if queue.release() {
                continue;
            }
            break;
        };

        queue.state.lock().begin(Instant::now());

        let Ok(outcome) = AssertUnwindSafe(async { (job.run)().await })
            .catch_unwind()
            .await
        else {
            // Dropping the job drops its reply channel; the caller sees `Panicked`
            warn!(bucket = %queue.key, "Operation panicked");
            queue.state.lock().complete(None, Instant::now());
            continue;
        };

        match outcome {
            JobOutcome::Done(headers) => {
                queue.state.lock().complete(headers.as_ref(), Instant::now());
                inner.learn(&queue, job.route.as_ref(), headers.as_ref());
            }
            JobOutcome::RateLimited {
                retry_after,
                global,
                headers,
            } => {
                warn!(
                    bucket = %queue.key,
                    retry_after_ms = retry_after.as_millis() as u64,
                    global,
                    "Rate limited, retrying"
                );
                let now = Instant::now();
                if global {
                    if let Some(until) = now.checked_add(retry_after) {
                        inner.global.suspend_until(until);
                    }
                } else {
                    queue.state.lock().throttle(retry_after, now);
                }
                inner.learn(&queue, job.route.as_ref(), headers.as_ref());
                queue.push_front(job);
            }
            JobOutcome::Abandoned => {
                trace!(bucket = %queue.key, "Skipped abandoned operation");
            }
        }
    }

    trace!(bucket = %queue.key, "Drain loop stopped");
}
