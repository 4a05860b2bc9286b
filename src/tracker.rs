use std::path::Path;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use serde_json::{Map, Value};

use crate::error::{RandimgError, Result};
use crate::models::{format_timestamp, parse_timestamp, RequestRecord};
use crate::sink::{RequestSink, TracingSink};
use crate::storage::{LocalStorage, RecordStore};

const TIMESTAMP_KEY: &str = "timestamp";

/// Source of "now" for window calculations
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time truncated to whole seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// At most `limit` accepted requests per trailing `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: usize,
    pub window: Duration,
}

impl RateLimit {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const DEFAULT_WINDOW_SECS: u64 = 60 * 60;

    pub fn new(limit: usize, window_secs: u64) -> Self {
        Self {
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// The error reported when this limit is hit
    pub fn exceeded(&self) -> RandimgError {
        RandimgError::RateLimitExceeded {
            limit: self.limit,
            window_secs: self.window_secs(),
        }
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, Self::DEFAULT_WINDOW_SECS)
    }
}

/// `end - window_secs`, or a config error when that is not a representable time
fn window_start(end: NaiveDateTime, window_secs: u64) -> Result<NaiveDateTime> {
    i64::try_from(window_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|window| end.checked_sub_signed(window))
        .ok_or_else(|| {
            RandimgError::Config(format!("rate limit window too large: {window_secs}s"))
        })
}

/// File-backed sliding-window request counter.
///
/// Every accepted request lands in two places: the rolling tracker, which
/// only keeps requests inside the trailing window, and the archive, which
/// keeps everything.
///
/// The tracker assumes a single process. Each [`record_request`] is a
/// read-modify-write of the tracker file without a lock, so two concurrent
/// invocations against the same file can both be admitted.
///
/// [`record_request`]: RequestTracker::record_request
pub struct RequestTracker {
    storage: Box<dyn RecordStore>,
    rate_limit: RateLimit,
    clock: Box<dyn Clock>,
    sink: Box<dyn RequestSink>,
    requests: Vec<RequestRecord>,
}

impl RequestTracker {
    /// Tracker at `tracker_file` with the default limit, the system clock
    /// and tracing output.
    pub fn open(tracker_file: &Path) -> Result<Self> {
        Self::new(
            Box::new(LocalStorage::new(tracker_file)),
            RateLimit::default(),
            Box::new(SystemClock),
            Box::new(TracingSink),
        )
    }

    /// Loads and prunes existing records. A missing tracker file is an empty
    /// tracker; a corrupt one is an error.
    pub fn new(
        storage: Box<dyn RecordStore>,
        rate_limit: RateLimit,
        clock: Box<dyn Clock>,
        sink: Box<dyn RequestSink>,
    ) -> Result<Self> {
        let mut tracker = Self {
            storage,
            rate_limit,
            clock,
            sink,
            requests: Vec::new(),
        };
        tracker.reload()?;
        Ok(tracker)
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    /// In-window requests, oldest first
    pub fn requests(&self) -> &[RequestRecord] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.rate_limit.limit.saturating_sub(self.requests.len())
    }

    pub fn is_under_limit(&self) -> bool {
        self.requests.len() < self.rate_limit.limit
    }

    /// Current time in the format records are stored with
    pub fn timestamp(&self) -> String {
        format_timestamp(self.clock.now())
    }

    /// Re-read the tracker file and drop expired records
    pub fn reload(&mut self) -> Result<()> {
        self.requests = self.storage.get()?;
        self.prune_expired()?;
        Ok(())
    }

    /// Remove every record outside `[now - window, now]`, returning how many
    /// were dropped. Records dated in the future are dropped too.
    pub fn prune_expired(&mut self) -> Result<usize> {
        let end = self.clock.now();
        let start = window_start(end, self.rate_limit.window_secs())?;

        let in_window = self
            .requests
            .iter()
            .map(|r| r.parsed_timestamp().map(|ts| ts >= start && ts <= end))
            .collect::<Result<Vec<bool>>>()?;

        let before = self.requests.len();
        let mut keep = in_window.into_iter();
        self.requests.retain(|_| keep.next().unwrap_or(false));
        let removed = before - self.requests.len();

        if removed > 0 {
            tracing::debug!(removed, remaining = self.requests.len(), "pruned expired requests");
        }

        Ok(removed)
    }

    /// Admit one request if the window has room.
    ///
    /// State is re-read first so the decision reflects the file, not this
    /// tracker's snapshot. On success the record is persisted to the tracker
    /// and appended to the archive, and the new in-window count is returned.
    /// At the limit nothing is written and `RateLimitExceeded` is returned.
    /// A `timestamp` key in `metadata` is rejected, it would shadow the
    /// record's own field on disk.
    pub fn record_request(
        &mut self,
        timestamp: &str,
        metadata: Map<String, Value>,
    ) -> Result<usize> {
        if metadata.contains_key(TIMESTAMP_KEY) {
            return Err(RandimgError::ReservedKey(TIMESTAMP_KEY.to_string()));
        }
        parse_timestamp(timestamp)?;
        self.reload()?;

        if !self.is_under_limit() {
            tracing::debug!(
                count = self.requests.len(),
                limit = self.rate_limit.limit,
                "request rejected"
            );
            return Err(self.rate_limit.exceeded());
        }

        let record = RequestRecord {
            timestamp: timestamp.to_string(),
            metadata,
        };

        self.requests.push(record.clone());
        self.storage.set(&self.requests)?;
        self.storage.append_archive(&record)?;

        let count = self.requests.len();
        self.sink.accepted(&record, count, self.rate_limit.limit);

        Ok(count)
    }
}
