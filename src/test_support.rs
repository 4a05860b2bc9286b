use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::models::RequestRecord;
use crate::sink::{request_lines, RequestSink};
use crate::tracker::Clock;

/// Unique scratch directory under the system temp dir, removed on drop
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("randimg-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Clock pinned to a base instant, moved forward by hand
pub struct FixedClock {
    base: NaiveDateTime,
    offset_secs: Cell<i64>,
}

impl FixedClock {
    pub fn new() -> Self {
        Self {
            base: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            offset_secs: Cell::new(0),
        }
    }

    pub fn base(&self) -> NaiveDateTime {
        self.base
    }

    /// Position the clock `secs` seconds after the base instant
    pub fn set(&self, secs: i64) {
        self.offset_secs.set(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.base + Duration::seconds(self.offset_secs.get())
    }
}

impl Clock for std::rc::Rc<FixedClock> {
    fn now(&self) -> NaiveDateTime {
        self.as_ref().now()
    }
}

/// Sink that keeps every line for assertions
#[derive(Default)]
pub struct MemorySink {
    lines: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl RequestSink for std::rc::Rc<MemorySink> {
    fn accepted(&self, record: &RequestRecord, count: usize, limit: usize) {
        self.lines
            .borrow_mut()
            .extend(request_lines(record, count, limit));
    }
}
