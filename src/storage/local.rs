use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;
use crate::models::RequestRecord;

use super::RecordStore;

const ARCHIVE_SUFFIX: &str = "archive";

/// JSON file storage with atomic writes.
///
/// The tracker file holds the rolling window, the archive file every
/// accepted request. Both are JSON arrays of [`RequestRecord`].
#[derive(Debug, Clone)]
pub struct LocalStorage {
    tracker_file: PathBuf,
    archive_file: PathBuf,
}

impl LocalStorage {
    /// Storage with the archive next to the tracker (`tracker.json` ->
    /// `tracker.archive.json`).
    pub fn new(tracker_file: &Path) -> Self {
        Self::with_archive(tracker_file, &default_archive_path(tracker_file))
    }

    pub fn with_archive(tracker_file: &Path, archive_file: &Path) -> Self {
        Self {
            tracker_file: tracker_file.to_path_buf(),
            archive_file: archive_file.to_path_buf(),
        }
    }

    pub fn tracker_file(&self) -> &Path {
        &self.tracker_file
    }

    pub fn archive_file(&self) -> &Path {
        &self.archive_file
    }

    fn read(path: &Path) -> Result<Vec<RequestRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let records: Vec<RequestRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn write(path: &Path, records: &[RequestRecord]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let temp_file = get_temp_file(path);

        fs::write(&temp_file, json)?;
        if let Err(e) = fs::rename(&temp_file, path) {
            let _ = fs::remove_file(&temp_file);
            return Err(e.into());
        }

        Ok(())
    }
}

/// `dir/name.json` -> `dir/name.archive.json`
pub fn default_archive_path(tracker_file: &Path) -> PathBuf {
    let stem = tracker_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "tracker".to_string());
    let extension = tracker_file
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "json".to_string());
    tracker_file.with_file_name(format!("{stem}.{ARCHIVE_SUFFIX}.{extension}"))
}

/// Sibling temp file, so the final rename never crosses filesystems
fn get_temp_file(target_file: &Path) -> PathBuf {
    let random_string = Uuid::new_v4().to_string()[..8].to_string();
    let filename = target_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "tracker.json".to_string());
    target_file.with_file_name(format!(".{filename}.TEMP-{random_string}"))
}

impl RecordStore for LocalStorage {
    fn get(&self) -> Result<Vec<RequestRecord>> {
        Self::read(&self.tracker_file)
    }

    fn get_archive(&self) -> Result<Vec<RequestRecord>> {
        Self::read(&self.archive_file)
    }

    fn set(&self, records: &[RequestRecord]) -> Result<()> {
        Self::write(&self.tracker_file, records)
    }

    fn append_archive(&self, record: &RequestRecord) -> Result<()> {
        let mut archive = Self::read(&self.archive_file)?;
        archive.push(record.clone());
        Self::write(&self.archive_file, &archive)
    }
}
