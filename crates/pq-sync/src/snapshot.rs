//! Local JSON mirror of the request collection
//!
//! Written after every mutation, read once at startup before any remote
//! call. The file is replaced through a temp file and rename so a crash
//! mid-write leaves the previous snapshot intact.

use pq_core::Request;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Snapshot file failures
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Read or write failed
    #[error("io error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Contents did not (de)serialize
    #[error("invalid snapshot {path}: {source}")]
    Serde {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn serde(path: &Path, source: serde_json::Error) -> Self {
        Self::Serde {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write-through JSON file cache for the request collection
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    /// Cache at `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the snapshot with `records`
    ///
    /// # Errors
    /// - `SnapshotError::Io` if the file cannot be written
    pub async fn save(&self, records: &[Request]) -> Result<(), SnapshotError> {
        write_json(&self.path, records).await
    }

    /// Load the snapshot; a missing file is an empty collection
    ///
    /// # Errors
    /// - `SnapshotError::Io` if the file exists but cannot be read
    /// - `SnapshotError::Serde` if it is not a JSON array of requests
    pub async fn load(&self) -> Result<Vec<Request>, SnapshotError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

/// Serialize `value` to `path` via a sibling temp file
pub(crate) async fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), SnapshotError> {
    let body = serde_json::to_vec_pretty(value).map_err(|e| SnapshotError::serde(path, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SnapshotError::io(path, e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|e| SnapshotError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| SnapshotError::io(path, e))
}

/// Deserialize `path`, `None` if it does not exist
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SnapshotError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SnapshotError::serde(path, e))
}
