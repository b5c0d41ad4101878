use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tags::{self, Attribute};

/// A level of the study → series → instance hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Study,
    Series,
    Instance,
}

impl Level {
    /// The attribute whose value uniquely identifies a record at this level.
    pub fn identifier(&self) -> &'static Attribute {
        match self {
            Self::Study => &tags::STUDY_INSTANCE_UID,
            Self::Series => &tags::SERIES_INSTANCE_UID,
            Self::Instance => &tags::SOP_INSTANCE_UID,
        }
    }

    /// Directory holding the index document (and entity directories) for
    /// this level.
    pub fn collection_dir(&self) -> &'static str {
        match self {
            Self::Study => "studies",
            Self::Series => "series",
            Self::Instance => "instances",
        }
    }

    pub fn child(&self) -> Option<Level> {
        match self {
            Self::Study => Some(Self::Series),
            Self::Series => Some(Self::Instance),
            Self::Instance => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Study => write!(f, "study"),
            Self::Series => write!(f, "series"),
            Self::Instance => write!(f, "instance"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(Level::Study.identifier().keyword, "StudyInstanceUID");
        assert_eq!(Level::Series.identifier().tag, "0020000E");
        assert_eq!(Level::Instance.identifier().keyword, "SOPInstanceUID");
    }

    #[test]
    fn hierarchy() {
        assert_eq!(Level::Study.child(), Some(Level::Series));
        assert_eq!(Level::Series.child(), Some(Level::Instance));
        assert_eq!(Level::Instance.child(), None);
    }

    #[test]
    fn display_and_serde() {
        assert_eq!(Level::Series.to_string(), "series");
        let json = serde_json::to_string(&Level::Instance).unwrap();
        assert_eq!(json, "\"instance\"");
    }
}
