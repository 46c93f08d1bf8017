//! Export Service - Transient URL, Save, Revoke
//!
//! The host hands out a transient object URL for the artifact bytes, the
//! save is triggered against that URL, and the URL is revoked as soon as the
//! save returns, whether it succeeded or not.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::synth::SynthesizedArtifact;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not create download URL: {0}")]
    UrlUnavailable(String),

    #[error("Saving {file_name} failed: {source}")]
    SaveFailed {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Nothing to export: no completed job")]
    NoArtifact,
}

impl ExportError {
    /// Whether offering the download again may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExportError::InvalidFileName(_) | ExportError::NoArtifact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub file_name: String,
    pub location: String,
    pub bytes: u64,
    pub saved_at: DateTime<Utc>,
}

/// Environment that can turn bytes into a "save as" download.
pub trait DownloadHost {
    fn create_object_url(&self, data: &[u8], media_type: &str) -> Result<ObjectUrl, ExportError>;
    fn save_as(&self, url: &ObjectUrl, file_name: &str) -> Result<SaveReceipt, ExportError>;
    fn revoke_object_url(&self, url: &ObjectUrl);
}

/// Revokes its URL when dropped.
struct TransientUrl<'h, H: DownloadHost + ?Sized> {
    host: &'h H,
    url: ObjectUrl,
}

impl<'h, H: DownloadHost + ?Sized> TransientUrl<'h, H> {
    fn acquire(host: &'h H, data: &[u8], media_type: &str) -> Result<Self, ExportError> {
        let url = host.create_object_url(data, media_type)?;
        Ok(Self { host, url })
    }
}

impl<H: DownloadHost + ?Sized> Drop for TransientUrl<'_, H> {
    fn drop(&mut self) {
        self.host.revoke_object_url(&self.url);
    }
}

/// Save `artifact` through `host` under its suggested file name.
pub fn export_artifact<H: DownloadHost + ?Sized>(
    host: &H,
    artifact: &SynthesizedArtifact,
) -> Result<SaveReceipt, ExportError> {
    let transient = TransientUrl::acquire(host, artifact.bytes(), &artifact.media_type)?;
    let result = host.save_as(&transient.url, &artifact.suggested_file_name);

    match &result {
        Ok(receipt) => info!(
            file = %receipt.file_name,
            location = %receipt.location,
            bytes = receipt.bytes,
            "artifact exported"
        ),
        Err(e) => warn!(
            file = %artifact.suggested_file_name,
            retryable = e.is_retryable(),
            "export failed: {}",
            e
        ),
    }

    result
}

/// Export with the simulated preparation delay in front.
#[derive(Debug, Clone)]
pub struct Exporter {
    prepare_latency: Duration,
}

impl Exporter {
    pub fn new(prepare_latency: Duration) -> Self {
        Self { prepare_latency }
    }

    pub async fn export<H: DownloadHost + ?Sized>(
        &self,
        host: &H,
        artifact: &SynthesizedArtifact,
    ) -> Result<SaveReceipt, ExportError> {
        debug!(file = %artifact.suggested_file_name, "preparing export");
        tokio::time::sleep(self.prepare_latency).await;
        export_artifact(host, artifact)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `write` against `stage`, removing whatever it left behind if it fails.
fn write_stage<F>(stage: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    write(stage).map_err(|e| {
        let _ = fs::remove_file(stage);
        e
    })
}

/// Saves downloads into a directory.
///
/// Object URLs are backed by hidden staging files next to the target;
/// revoking a URL deletes its staging file.
#[derive(Debug)]
pub struct DirectoryHost {
    dir: PathBuf,
    staged: Mutex<HashMap<ObjectUrl, PathBuf>>,
}

impl DirectoryHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of URLs created and not yet revoked.
    pub fn live_urls(&self) -> usize {
        lock(&self.staged).len()
    }
}

impl DownloadHost for DirectoryHost {
    fn create_object_url(&self, data: &[u8], _media_type: &str) -> Result<ObjectUrl, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ExportError::UrlUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        let id = Uuid::new_v4();
        let stage = self.dir.join(format!(".filegen-{}.part", id));
        write_stage(&stage, |path| fs::write(path, data))
            .map_err(|e| ExportError::UrlUnavailable(format!("{}: {}", stage.display(), e)))?;

        let url = ObjectUrl::new(format!("blob:filegen/{}", id));
        lock(&self.staged).insert(url.clone(), stage);
        Ok(url)
    }

    fn save_as(&self, url: &ObjectUrl, file_name: &str) -> Result<SaveReceipt, ExportError> {
        // must be a single plain path component
        if Path::new(file_name).file_name() != Some(OsStr::new(file_name)) {
            return Err(ExportError::InvalidFileName(file_name.to_string()));
        }

        let stage = lock(&self.staged)
            .get(url)
            .cloned()
            .ok_or_else(|| ExportError::UrlUnavailable(format!("{} was revoked", url.as_str())))?;

        let target = self.dir.join(file_name);
        let bytes = fs::copy(&stage, &target).map_err(|source| ExportError::SaveFailed {
            file_name: file_name.to_string(),
            source,
        })?;

        Ok(SaveReceipt {
            file_name: file_name.to_string(),
            location: target.display().to_string(),
            bytes,
            saved_at: Utc::now(),
        })
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        if let Some(stage) = lock(&self.staged).remove(url) {
            if let Err(e) = fs::remove_file(&stage) {
                debug!(path = %stage.display(), "staging file already gone: {}", e);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDownload {
    pub file_name: String,
    pub data_uri: String,
}

/// Keeps downloads in memory as base64 `data:` URIs.
///
/// Each created URL gets its own `blob:` key, so revoking one never
/// affects another URL for the same bytes.
#[derive(Debug, Default)]
pub struct DataUriHost {
    live: Mutex<HashMap<ObjectUrl, String>>,
    saved: Mutex<Vec<SavedDownload>>,
}

impl DataUriHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downloads(&self) -> Vec<SavedDownload> {
        lock(&self.saved).clone()
    }

    pub fn live_urls(&self) -> usize {
        lock(&self.live).len()
    }
}

pub fn data_uri(data: &[u8], media_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        media_type,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

impl DownloadHost for DataUriHost {
    fn create_object_url(&self, data: &[u8], media_type: &str) -> Result<ObjectUrl, ExportError> {
        let url = ObjectUrl::new(format!("blob:filegen/{}", Uuid::new_v4()));
        lock(&self.live).insert(url.clone(), data_uri(data, media_type));
        Ok(url)
    }

    fn save_as(&self, url: &ObjectUrl, file_name: &str) -> Result<SaveReceipt, ExportError> {
        let uri = lock(&self.live)
            .get(url)
            .cloned()
            .ok_or_else(|| ExportError::UrlUnavailable(format!("{} was revoked", url.as_str())))?;

        let payload = uri
            .split_once(";base64,")
            .map(|(_, b64)| b64)
            .ok_or_else(|| ExportError::UrlUnavailable("malformed data URI".into()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ExportError::UrlUnavailable(e.to_string()))?
            .len() as u64;

        lock(&self.saved).push(SavedDownload {
            file_name: file_name.to_string(),
            data_uri: uri,
        });

        Ok(SaveReceipt {
            file_name: file_name.to_string(),
            location: "memory".to_string(),
            bytes,
            saved_at: Utc::now(),
        })
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        lock(&self.live).remove(url);
    }
}
