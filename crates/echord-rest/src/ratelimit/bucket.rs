//! Bucket quota state and its FIFO queue.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use super::headers::RateLimitHeaders;
use super::route::Route;

/// What one run of a queued operation told the drain loop
pub(crate) enum JobOutcome {
    /// Ran to completion (success or terminal failure); one unit of quota spent
    Done(Option<RateLimitHeaders>),
    /// Throttled; the job goes back to the head of the queue
    RateLimited {
        retry_after: Duration,
        global: bool,
        headers: Option<RateLimitHeaders>,
    },
    /// The caller stopped waiting before the job ran
    Abandoned,
}

pub(crate) type JobFn = Box<dyn FnMut() -> BoxFuture<'static, JobOutcome> + Send>;

pub(crate) struct Job {
    /// Route the job was submitted for, when submitted by route
    pub(crate) route: Option<Route>,
    pub(crate) run: JobFn,
}

/// Local view of a bucket's quota
#[derive(Debug, Clone)]
pub(crate) struct BucketState {
    pub(crate) limit: u32,
    pub(crate) remaining: u32,
    pub(crate) reset_at: Instant,
    window: Duration,
}

impl BucketState {
    pub(crate) fn new(limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            limit,
            remaining: limit,
            reset_at: now,
            window,
        }
    }

    /// Deadline to wait for before the next dispatch, if the quota is spent
    ///
    /// Refills the quota once the window has elapsed.
    pub(crate) fn wait_until(&mut self, now: Instant) -> Option<Instant> {
        if self.remaining == 0 {
            if now < self.reset_at {
                return Some(self.reset_at);
            }
            self.remaining = self.limit;
        }
        None
    }

    /// Called right before an operation runs; opens a new window if the
    /// previous one has elapsed
    pub(crate) fn begin(&mut self, now: Instant) {
        if now >= self.reset_at {
            self.remaining = self.limit;
            self.reset_at = now + self.window;
        }
    }

    /// Account for a finished operation and apply server metadata
    pub(crate) fn complete(&mut self, headers: Option<&RateLimitHeaders>, now: Instant) {
        self.remaining = self.remaining.saturating_sub(1);

        if let Some(headers) = headers {
            self.observe(headers, now);
        }
    }

    /// Adopt whatever quota fields the server reported
    pub(crate) fn observe(&mut self, headers: &RateLimitHeaders, now: Instant) {
        if let Some(limit) = headers.limit {
            self.limit = limit;
        }
        if let Some(remaining) = headers.remaining {
            self.remaining = remaining;
        }
        if let Some(reset_at) = headers.reset_after.and_then(|after| now.checked_add(after)) {
            self.reset_at = reset_at;
        }
    }

    /// Server rejected a request in this bucket: nothing more until `retry_after`
    pub(crate) fn throttle(&mut self, retry_after: Duration, now: Instant) {
        self.remaining = 0;
        if let Some(reset_at) = now.checked_add(retry_after) {
            self.reset_at = reset_at;
        }
    }
}

/// One bucket: its quota and the operations waiting on it
pub(crate) struct RequestQueue {
    pub(crate) key: String,
    pub(crate) jobs: Mutex<VecDeque<Job>>,
    pub(crate) state: Mutex<BucketState>,
    processing: AtomicBool,
}

impl RequestQueue {
    pub(crate) fn new(key: String, limit: u32, window: Duration) -> Self {
        Self {
            key,
            jobs: Mutex::new(VecDeque::new()),
            state: Mutex::new(BucketState::new(limit, window, Instant::now())),
            processing: AtomicBool::new(false),
        }
    }

    /// Claim the drain loop; `true` if the caller must start it
    pub(crate) fn try_start(&self) -> bool {
        !self.processing.swap(true, Ordering::AcqRel)
    }

    /// Release the drain loop; `true` if the caller should keep draining
    /// because work arrived while releasing
    pub(crate) fn release(&self) -> bool {
        self.processing.store(false, Ordering::Release);
        !self.jobs.lock().is_empty() && self.try_start()
    }

    pub(crate) fn push_back(&self, job: Job) {
        self.jobs.lock().push_back(job);
    }

    pub(crate) fn push_front(&self, job: Job) {
        self.jobs.lock().push_front(job);
    }

    pub(crate) fn pop_front(&self) -> Option<Job> {
        self.jobs.lock().pop_front()
    }

    /// Drop every queued job, returning how many were dropped
    pub(crate) fn clear(&self) -> usize {
        let mut jobs = self.jobs.lock();
        let dropped = jobs.len();
        jobs.clear();
        dropped
    }
}
