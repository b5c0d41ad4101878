use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wado_shard::DEFAULT_BLOB_EXTENSION;

use crate::error::{StoreError, StoreResult};
use crate::fs::expand_home;

/// Store configuration.
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of the on-disk layout. A leading `~` is resolved against `$HOME`.
    pub root_dir: PathBuf,
    /// Maximum age of a cached index document before it is reloaded.
    #[serde(rename = "study_data_lifetime_ms", with = "duration_ms")]
    pub study_data_lifetime: Duration,
    /// Write index documents as `index.json.gz` rather than `index.json`.
    pub gzip: bool,
    /// Place study directories under `studies/{primary}/{secondary}/`.
    pub hash_study_uid_path: bool,
    /// Extension appended to bulk-data blob file names.
    pub bulkdata_extension: String,
    /// Period of the progress line logged by store counters (0 disables).
    pub stats_message_count: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("~/dicomweb"),
            study_data_lifetime: Duration::from_secs(60),
            gzip: true,
            hash_study_uid_path: false,
            bulkdata_extension: DEFAULT_BLOB_EXTENSION.to_string(),
            stats_message_count: 1000,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root_dir`.
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn resolved_root(&self) -> PathBuf {
        expand_home(&self.root_dir)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
