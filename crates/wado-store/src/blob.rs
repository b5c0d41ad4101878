//! Content-addressed bulk-data blobs.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info, warn};
use wado_shard::{BlobShard, DEFAULT_BLOB_EXTENSION};
use wado_stats::StatsRegistry;
use wado_types::ContentHash;

use crate::error::{StoreError, StoreResult};
use crate::fs::write_atomic;
use crate::index::{decode_blocking, encode_blocking};
use crate::multipart;

/// Result of a garbage-collection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    pub blobs_scanned: usize,
    pub blobs_removed: usize,
    pub bytes_freed: u64,
}

/// Immutable payloads stored under `{root}/{h[0:3]}/{h[3:5]}/{h[5:]}{ext}`.
///
/// The store trusts the caller's hash: writing different bytes under an
/// existing hash is not detected. Blobs are never modified, only created
/// and (during garbage collection) removed.
pub struct BlobStore {
    root: PathBuf,
    default_ext: String,
    stats: Arc<StatsRegistry>,
}

impl BlobStore {
    /// Create a store rooted at the bulk-data directory.
    pub fn new(root: impl Into<PathBuf>, stats: Arc<StatsRegistry>) -> Self {
        Self {
            root: root.into(),
            default_ext: DEFAULT_BLOB_EXTENSION.to_string(),
            stats,
        }
    }

    pub fn with_default_extension(mut self, ext: impl Into<String>) -> Self {
        self.default_ext = ext.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_extension(&self) -> &str {
        &self.default_ext
    }

    pub fn path_for(&self, hash: &ContentHash, ext: &str) -> PathBuf {
        self.root.join(BlobShard::of(hash, ext).relative_path())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub async fn put(&self, hash: &ContentHash, bytes: &[u8]) -> StoreResult<()> {
        self.put_with_ext(hash, bytes, &self.default_ext).await
    }

    /// Store `bytes` under `hash`, gzip-compressed if `ext` names gzip.
    ///
    /// Writing an existing hash again overwrites it with (by contract)
    /// identical content.
    pub async fn put_with_ext(&self, hash: &ContentHash, bytes: &[u8], ext: &str) -> StoreResult<()> {
        let path = self.path_for(hash, ext);
        let encoded = encode_blocking(ext, bytes.to_vec()).await?;
        write_atomic(&path, &encoded).await?;
        debug!(hash = %hash, path = %path.display(), "stored blob");
        Ok(())
    }

    /// Hash `bytes` and store them under the computed hash.
    pub async fn put_content(&self, bytes: &[u8], ext: &str) -> StoreResult<ContentHash> {
        let hash = ContentHash::compute(bytes);
        self.put_with_ext(&hash, bytes, ext).await?;
        Ok(hash)
    }

    // -----------------------------------------------------------------------
    // Reads (soft miss)
    // -----------------------------------------------------------------------

    pub async fn get(&self, hash: &ContentHash) -> Option<Bytes> {
        self.get_with_ext(hash, &self.default_ext).await
    }

    /// Read a blob, decompressing gzip names. `None` if absent or unreadable.
    pub async fn get_with_ext(&self, hash: &ContentHash, ext: &str) -> Option<Bytes> {
        self.stats.add("Read Hash Data", "Read hash data", 100);
        let path = self.path_for(hash, ext);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(hash = %hash, path = %path.display(), "blob not present");
                return None;
            }
            Err(e) => {
                warn!(hash = %hash, path = %path.display(), error = %e, "couldn't read blob");
                return None;
            }
        };

        match decode_blocking(ext, raw).await {
            Ok(data) => Some(Bytes::from(data)),
            Err(e) => {
                warn!(hash = %hash, path = %path.display(), error = %e, "couldn't decompress blob");
                None
            }
        }
    }

    pub async fn get_or(&self, hash: &ContentHash, ext: &str, default: Bytes) -> Bytes {
        self.get_with_ext(hash, ext).await.unwrap_or(default)
    }

    /// Read a blob and unwrap a multipart envelope if it has one.
    pub async fn get_bulkdata(&self, hash: &ContentHash, ext: &str) -> Option<Bytes> {
        let data = self.get_with_ext(hash, ext).await?;
        let body = multipart::extract_first_part(&data).map(|part| data.slice_ref(part));
        Some(body.unwrap_or(data))
    }

    pub async fn exists(&self, hash: &ContentHash, ext: &str) -> StoreResult<bool> {
        Ok(fs::try_exists(self.path_for(hash, ext)).await?)
    }

    // -----------------------------------------------------------------------
    // Garbage collection
    // -----------------------------------------------------------------------

    /// Remove a blob. Returns `true` if a file was removed.
    ///
    /// Only for garbage collection: removing a referenced blob leaves
    /// dangling references in index documents.
    pub async fn delete(&self, hash: &ContentHash, ext: &str) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(hash, ext)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every `ext` blob whose hash is not in `reachable`.
    pub async fn gc(&self, reachable: &HashSet<ContentHash>, ext: &str) -> StoreResult<GcReport> {
        let root = self.root.clone();
        let ext = ext.to_string();
        let reachable = reachable.clone();

        let report = tokio::task::spawn_blocking(move || collect_garbage(&root, &reachable, &ext))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))??;

        info!(
            scanned = report.blobs_scanned,
            removed = report.blobs_removed,
            bytes_freed = report.bytes_freed,
            "bulk-data garbage collection finished"
        );
        Ok(report)
    }
}

fn collect_garbage(
    root: &Path,
    reachable: &HashSet<ContentHash>,
    ext: &str,
) -> StoreResult<GcReport> {
    let mut report = GcReport::default();
    if !root.exists() {
        return Ok(report);
    }

    for entry in walkdir::WalkDir::new(root).min_depth(3).max_depth(3) {
        let entry = entry.map_err(|e| StoreError::Io(io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(hash) = BlobShard::hash_from_relative(relative, ext) else {
            continue;
        };
        report.blobs_scanned += 1;
        if reachable.contains(&hash) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        std::fs::remove_file(entry.path())?;
        report.blobs_removed += 1;
        report.bytes_freed += size;
    }
    Ok(report)
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("root", &self.root)
            .field("default_ext", &self.default_ext)
            .finish()
    }
}
