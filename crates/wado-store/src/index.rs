//! Whole-document JSON index files.

use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};
use wado_stats::StatsRegistry;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::fs::{expand_home, write_atomic};

/// How [`IndexStore::write_with`] treats an existing file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing file. When `false` an existing file is left alone.
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// `overwrite` was off and the file already existed.
    Skipped,
}

/// Reads and writes JSON index documents.
///
/// Reads follow the soft-miss rule: a document that is absent (the normal
/// state before the first write), unreadable or malformed yields `None` or
/// the caller's default, with a log line. [`load`](IndexStore::load) is the
/// strict variant for read-modify-write paths. Writes replace the file
/// wholesale and propagate every error.
pub struct IndexStore {
    stats: Arc<StatsRegistry>,
    message_count: u64,
}

impl IndexStore {
    pub fn new(stats: Arc<StatsRegistry>) -> Self {
        Self {
            stats,
            message_count: 1000,
        }
    }

    /// Period of the "Read JSON"/"Write JSON" progress lines.
    pub fn with_message_count(mut self, message_count: u64) -> Self {
        self.message_count = message_count;
        self
    }

    pub fn stats(&self) -> &Arc<StatsRegistry> {
        &self.stats
    }

    /// Load and parse `dir/name`, or `None` on any failure.
    pub async fn read(&self, dir: &Path, name: &str) -> Option<Value> {
        self.read_as(dir, name).await
    }

    /// Load and parse `dir/name`, or `default` on any failure.
    pub async fn read_or(&self, dir: &Path, name: &str, default: Value) -> Value {
        self.read(dir, name).await.unwrap_or(default)
    }

    /// Typed variant of [`read`](Self::read); a document that does not fit
    /// `T` is a soft miss like any other parse failure.
    pub async fn read_as<T: DeserializeOwned>(&self, dir: &Path, name: &str) -> Option<T> {
        match self.load(dir, name).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                debug!(dir = %dir.display(), name, "index document not present");
                None
            }
            Err(e) => {
                warn!(dir = %dir.display(), name, error = %e, "couldn't load index document");
                None
            }
        }
    }

    /// Load `dir/name` for a read-modify-write.
    ///
    /// Unlike [`read`](Self::read) this separates an absent document
    /// (`Ok(None)`) from one that exists but cannot be used: I/O failures,
    /// bad gzip data and unparsable JSON are errors, so the caller never
    /// mistakes a damaged index for an empty one.
    pub async fn load<T: DeserializeOwned>(&self, dir: &Path, name: &str) -> StoreResult<Option<T>> {
        let path = expand_home(dir).join(name);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let data = decode_blocking(name, raw).await.map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let value = serde_json::from_slice(&data).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.stats
            .add("Read JSON", &format!("Read JSON file {name}"), self.message_count);
        Ok(Some(value))
    }

    /// Serialize `data` and replace `dir/name` with it.
    pub async fn write<T: Serialize + ?Sized>(
        &self,
        dir: &Path,
        name: &str,
        data: &T,
    ) -> StoreResult<()> {
        self.write_with(dir, name, data, WriteOptions::default())
            .await
            .map(|_| ())
    }

    pub async fn write_with<T: Serialize + ?Sized>(
        &self,
        dir: &Path,
        name: &str,
        data: &T,
        options: WriteOptions,
    ) -> StoreResult<WriteOutcome> {
        let dir = expand_home(dir);
        let path = dir.join(name);

        if !options.overwrite && fs::try_exists(&path).await? {
            debug!(path = %path.display(), "index document exists, not overwriting");
            self.stats.add(
                "JSON not written",
                &format!("Did not write JSON file {name}"),
                self.message_count,
            );
            return Ok(WriteOutcome::Skipped);
        }

        let json = serde_json::to_vec(data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let encoded = encode_blocking(name, json).await?;
        write_atomic(&path, &encoded).await?;

        debug!(path = %path.display(), len = encoded.len(), "wrote index document");
        self.stats
            .add("Write JSON", &format!("Write JSON file {name}"), self.message_count);
        Ok(WriteOutcome::Written)
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("stats", &self.stats.name())
            .field("message_count", &self.message_count)
            .finish()
    }
}

/// Gzip work runs on the blocking pool so large documents do not stall
/// other requests.
pub(crate) async fn encode_blocking(name: &str, data: Vec<u8>) -> StoreResult<Vec<u8>> {
    if !codec::is_gzip_name(name) {
        return Ok(data);
    }
    let name = name.to_string();
    tokio::task::spawn_blocking(move || codec::encode_for(&name, data))
        .await
        .map_err(|e| StoreError::Compression(e.to_string()))?
        .map_err(|e| StoreError::Compression(e.to_string()))
}

pub(crate) async fn decode_blocking(name: &str, data: Vec<u8>) -> io::Result<Vec<u8>> {
    if !codec::is_gzip_name(name) {
        return Ok(data);
    }
    let name = name.to_string();
    tokio::task::spawn_blocking(move || codec::decode_for(&name, data))
        .await
        .map_err(io::Error::other)?
}
