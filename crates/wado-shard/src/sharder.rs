use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Layout version of the identifier hash (CRC-32/IEEE, 8 hex digits, 4/4).
pub const SHARD_HASH_VERSION: u32 = 1;

/// A two-level shard directory pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardPath {
    /// Hex characters `[0, 4)` of the hash.
    pub primary: String,
    /// Hex characters `[4, 8)` of the hash.
    pub secondary: String,
}

impl ShardPath {
    /// `base/primary/secondary`.
    pub fn join_onto(&self, base: &Path) -> PathBuf {
        base.join(&self.primary).join(&self.secondary)
    }
}

impl fmt::Display for ShardPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary, self.secondary)
    }
}

/// Map an identifier to its shard directories.
///
/// Total over all strings, including the empty one. Distinct identifiers
/// may share a shard; only the directory is shared, the identifier itself
/// still names the entity inside it.
pub fn shard_of(identifier: &str) -> ShardPath {
    let hex = format!("{:08x}", crc32fast::hash(identifier.as_bytes()));
    ShardPath {
        primary: hex[0..4].to_string(),
        secondary: hex[4..8].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn is_lower_hex(s: &str) -> bool {
        s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }

    #[test]
    fn known_value_is_pinned() {
        // CRC-32/IEEE("123456789") = 0xcbf43926
        let shard = shard_of("123456789");
        assert_eq!(shard.primary, "cbf4");
        assert_eq!(shard.secondary, "3926");
    }

    #[test]
    fn empty_identifier_is_zero_padded() {
        let shard = shard_of("");
        assert_eq!(shard.primary, "0000");
        assert_eq!(shard.secondary, "0000");
    }

    #[test]
    fn join_onto_base() {
        let shard = shard_of("1.2.3");
        let path = shard.join_onto(Path::new("/data/studies"));
        assert_eq!(
            path,
            PathBuf::from("/data/studies")
                .join(&shard.primary)
                .join(&shard.secondary)
        );
        assert_eq!(shard.to_string(), format!("{}/{}", shard.primary, shard.secondary));
    }

    #[test]
    fn different_identifiers_usually_differ() {
        assert_ne!(shard_of("1.2.3"), shard_of("1.2.4"));
    }

    proptest! {
        #[test]
        fn deterministic(s in ".*") {
            prop_assert_eq!(shard_of(&s), shard_of(&s));
        }

        #[test]
        fn parts_are_four_lower_hex(s in ".*") {
            let shard = shard_of(&s);
            prop_assert_eq!(shard.primary.len(), 4);
            prop_assert_eq!(shard.secondary.len(), 4);
            prop_assert!(is_lower_hex(&shard.primary));
            prop_assert!(is_lower_hex(&shard.secondary));
        }
    }
}
