//! Filesystem helpers shared by both stores.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

/// Resolve a leading `~` against `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Replace `path` with `bytes` so that readers see either the old or the new
/// content, never a partial file.
///
/// Missing parent directories are created. The temp file lives next to the
/// target so the final rename stays on one filesystem.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::now_v7()));

    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    debug!(path = %path.display(), len = bytes.len(), "replaced file");
    Ok(())
}
