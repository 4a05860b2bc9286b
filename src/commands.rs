use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::api_client::{PhotoQuery, PhotoSource, UnsplashClient};
use crate::config::Config;
use crate::error::{RandimgError, Result};
use crate::render::Render;
use crate::sink::TracingSink;
use crate::storage::LocalStorage;
use crate::tracker::{RequestTracker, SystemClock};

/// A saved image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: usize,
    /// In-window request count after this one
    pub count: usize,
}

#[derive(Debug)]
pub enum Outcome {
    Saved(Download),
    /// The window was full; nothing was downloaded
    RateLimited(RandimgError),
}

/// Execute one run of the CLI
pub fn run(
    tracker_json: &Path,
    output_dir: &Path,
    archive: Option<&Path>,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let render = Render::new(verbose);
    let config = Config::load(config_path)?;

    let storage = match archive {
        Some(archive) => LocalStorage::with_archive(tracker_json, archive),
        None => LocalStorage::new(tracker_json),
    };
    tracing::debug!(
        tracker = %storage.tracker_file().display(),
        archive = %storage.archive_file().display(),
        "opening request tracker"
    );
    let mut tracker = RequestTracker::new(
        Box::new(storage),
        config.rate_limit(),
        Box::new(SystemClock),
        Box::new(TracingSink),
    )?;

    if !tracker.is_under_limit() {
        render.rate_limited(&tracker.rate_limit().exceeded().to_string());
        return Ok(());
    }

    let client = UnsplashClient::new(
        &config.api_base_url,
        config.access_key()?,
        Duration::from_secs(config.timeout_secs),
    )?;

    match download_random_image(&mut tracker, &client, &config, output_dir)? {
        Outcome::Saved(download) => {
            render.success_download(
                &download.path,
                download.bytes,
                download.count,
                tracker.rate_limit().limit,
            );
        }
        Outcome::RateLimited(err) => render.rate_limited(&err.to_string()),
    }

    Ok(())
}

/// Fetch one random photo's metadata, record the request, then save the
/// image under `output_dir`.
///
/// If the tracker refuses the request the image is not downloaded and the
/// refusal is returned as [`Outcome::RateLimited`]; there is no retry.
pub fn download_random_image(
    tracker: &mut RequestTracker,
    source: &dyn PhotoSource,
    config: &Config,
    output_dir: &Path,
) -> Result<Outcome> {
    if !tracker.is_under_limit() {
        return Ok(Outcome::RateLimited(tracker.rate_limit().exceeded()));
    }

    let query = PhotoQuery {
        orientation: config.orientation.clone(),
        topics: config.topic_ids(),
    };
    let request_url = source.random_photo_url(&query);
    let photo = source.random_photo(&request_url)?;

    let image_url = photo.image_url(config.width, &config.format);
    let filename = photo.filename(&config.format)?;
    let filepath = output_dir.join(&filename);

    let mut metadata = Map::new();
    metadata.insert("username".into(), Value::from(photo.user.username.clone()));
    metadata.insert("image_id".into(), Value::from(photo.id.clone()));
    metadata.insert("request_url".into(), Value::from(request_url));
    metadata.insert("image_url".into(), Value::from(image_url.clone()));
    metadata.insert("filename".into(), Value::from(filename));
    metadata.insert(
        "filepath".into(),
        Value::from(filepath.to_string_lossy().to_string()),
    );
    metadata.insert("topics".into(), Value::from(config.topic_titles()));
    metadata.insert("format".into(), Value::from(config.format.clone()));
    metadata.insert("width".into(), Value::from(config.width.to_string()));
    metadata.insert("orientation".into(), Value::from(config.orientation.clone()));

    let timestamp = tracker.timestamp();
    let count = match tracker.record_request(&timestamp, metadata) {
        Ok(count) => count,
        Err(err) if err.is_rate_limited() => {
            tracing::warn!(
                image_id = %photo.id,
                "window filled before recording, skipping download"
            );
            return Ok(Outcome::RateLimited(err));
        }
        Err(err) => return Err(err),
    };

    fs::create_dir_all(output_dir)?;
    let image = source.download(&image_url)?;
    fs::write(&filepath, &image)?;
    tracing::info!(path = %filepath.display(), bytes = image.len(), "image saved");

    Ok(Outcome::Saved(Download {
        path: filepath,
        bytes: image.len(),
        count,
    }))
}
