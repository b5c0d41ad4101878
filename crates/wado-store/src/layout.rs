use std::fmt;
use std::path::{Path, PathBuf};

use wado_shard::shard_of;
use wado_types::Uid;

use crate::config::StoreConfig;

/// Where one index document lives: a directory and a file name inside it.
///
/// Also serves as the identity of a container for caching and locking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexLocation {
    pub dir: PathBuf,
    pub name: String,
}

impl IndexLocation {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

impl fmt::Display for IndexLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// The on-disk directory layout.
///
/// ```text
/// {root}/studies/index.json.gz
/// {root}/studies/{study}/series/index.json.gz
/// {root}/studies/{study}/series/{series}/instances/index.json.gz
/// {root}/bulkdata/{h[0:3]}/{h[3:5]}/{h[5:]}{ext}
/// {root}/temp/
/// ```
///
/// With `hash_study_uid_path`, `{study}` becomes `{primary}/{secondary}/{study}`.
#[derive(Clone, Debug)]
pub struct StoreLayout {
    root: PathBuf,
    gzip: bool,
    hash_study_uid_path: bool,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gzip: true,
            hash_study_uid_path: false,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            root: config.resolved_root(),
            gzip: config.gzip,
            hash_study_uid_path: config.hash_study_uid_path,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_name(&self) -> &'static str {
        if self.gzip {
            "index.json.gz"
        } else {
            "index.json"
        }
    }

    pub fn studies_dir(&self) -> PathBuf {
        self.root.join("studies")
    }

    pub fn bulkdata_dir(&self) -> PathBuf {
        self.root.join("bulkdata")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    pub fn study_dir(&self, study: &Uid) -> PathBuf {
        let studies = self.studies_dir();
        if self.hash_study_uid_path {
            shard_of(study.as_str())
                .join_onto(&studies)
                .join(study.as_str())
        } else {
            studies.join(study.as_str())
        }
    }

    pub fn series_dir(&self, study: &Uid, series: &Uid) -> PathBuf {
        self.study_dir(study).join("series").join(series.as_str())
    }

    pub fn studies_index(&self) -> IndexLocation {
        IndexLocation::new(self.studies_dir(), self.index_name())
    }

    pub fn series_index(&self, study: &Uid) -> IndexLocation {
        IndexLocation::new(self.study_dir(study).join("series"), self.index_name())
    }

    pub fn instances_index(&self, study: &Uid, series: &Uid) -> IndexLocation {
        IndexLocation::new(
            self.series_dir(study, series).join("instances"),
            self.index_name(),
        )
    }
}
