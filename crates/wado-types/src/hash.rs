use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Shortest hash that still leaves a file name after the 3/2 directory split.
pub const MIN_CONTENT_HASH_LEN: usize = 6;

/// Hex content hash naming an immutable bulk-data blob.
///
/// The store never recomputes the hash on read: the same `ContentHash`
/// always refers to the same bytes because the writer derived it from them.
/// Values are normalized to lowercase.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse a hex hash string, normalizing to lowercase.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        if value.len() < MIN_CONTENT_HASH_LEN {
            return Err(TypeError::InvalidContentHash {
                hash: value.to_string(),
                reason: format!("shorter than {MIN_CONTENT_HASH_LEN} characters"),
            });
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidContentHash {
                hash: value.to_string(),
                reason: "contains non-hex characters".into(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Hash `data` with BLAKE3 and return the hex digest.
    pub fn compute(data: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(data).as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0[..self.0.len().min(8)];
        write!(f, "ContentHash({short})")
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
