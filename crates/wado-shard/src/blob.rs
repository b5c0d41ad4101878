use std::path::{Path, PathBuf};

use wado_types::ContentHash;

/// Extension used when the caller does not name one.
pub const DEFAULT_BLOB_EXTENSION: &str = ".json.gz";

/// Path segments of a content-addressed blob: `h[0:3]/h[3:5]/h[5:]{ext}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobShard {
    pub dir1: String,
    pub dir2: String,
    pub file_name: String,
}

impl BlobShard {
    pub fn of(hash: &ContentHash, ext: &str) -> Self {
        let h = hash.as_str();
        Self {
            dir1: h[0..3].to_string(),
            dir2: h[3..5].to_string(),
            file_name: format!("{}{ext}", &h[5..]),
        }
    }

    /// `dir1/dir2`, relative to the bulk-data root.
    pub fn dir(&self) -> PathBuf {
        Path::new(&self.dir1).join(&self.dir2)
    }

    /// `dir1/dir2/file_name`, relative to the bulk-data root.
    pub fn relative_path(&self) -> PathBuf {
        self.dir().join(&self.file_name)
    }

    /// Rebuild the hash from a path relative to the bulk-data root.
    ///
    /// Returns `None` when the path does not have the `3/2/rest{ext}` shape.
    pub fn hash_from_relative(path: &Path, ext: &str) -> Option<ContentHash> {
        let parts: Vec<&str> = path
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        let [dir1, dir2, file] = parts.as_slice() else {
            return None;
        };
        if dir1.len() != 3 || dir2.len() != 2 {
            return None;
        }
        let rest = file.strip_suffix(ext)?;
        ContentHash::parse(&format!("{dir1}{dir2}{rest}")).ok()
    }
}
