use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum length of a DICOM UID value.
pub const MAX_UID_LEN: usize = 64;

/// A validated DICOM unique identifier.
///
/// UIDs name studies, series and instances and are used verbatim as
/// directory names, so validation rejects anything that could escape or
/// alias a path: separators, whitespace, control characters and the
/// `.`/`..` components. Conformant UIDs (digits and dots) always pass.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Validate and wrap a UID string.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn validate(value: &str) -> Result<(), TypeError> {
    let fail = |reason: &str| {
        Err(TypeError::InvalidUid {
            uid: value.to_string(),
            reason: reason.to_string(),
        })
    };

    if value.is_empty() {
        return fail("must not be empty");
    }
    if value.len() > MAX_UID_LEN {
        return fail(&format!(
            "length {} exceeds {MAX_UID_LEN} characters",
            value.len()
        ));
    }
    if value == "." || value == ".." {
        return fail("must not be a relative path component");
    }
    if let Some(ch) = value
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_whitespace() || c.is_control())
    {
        return fail(&format!("contains forbidden character {ch:?}"));
    }
    Ok(())
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Uid {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Uid {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl PartialEq<str> for Uid {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Uid {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_conformant_uid() {
        let uid = Uid::new("1.2.840.10008.5.1.4.1.1.2").unwrap();
        assert_eq!(uid.as_str(), "1.2.840.10008.5.1.4.1.1.2");
        assert_eq!(uid, "1.2.840.10008.5.1.4.1.1.2");
    }

    #[test]
    fn accepts_exactly_64_chars() {
        let value = "1".repeat(MAX_UID_LEN);
        assert!(Uid::new(value).is_ok());
    }

    #[test]
    fn rejects_65_chars() {
        let err = Uid::new("1".repeat(MAX_UID_LEN + 1)).unwrap_err();
        assert!(matches!(err, TypeError::InvalidUid { .. }));
        assert!(err.to_string().contains("exceeds 64"));
    }

    #[test]
    fn rejects_empty() {
        assert!(Uid::new("").is_err());
    }

    #[test]
    fn rejects_path_like_values() {
        assert!(Uid::new("..").is_err());
        assert!(Uid::new(".").is_err());
        assert!(Uid::new("1.2/3").is_err());
        assert!(Uid::new("1.2\\3").is_err());
        assert!(Uid::new("1.2 3").is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let uid = Uid::new("1.2.3").unwrap();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"1.2.3\"");
        let parsed: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, uid);
    }

    #[test]
    fn deserialize_validates() {
        let long = format!("\"{}\"", "9".repeat(70));
        assert!(serde_json::from_str::<Uid>(&long).is_err());
    }

    #[test]
    fn display_is_raw_value() {
        let uid = Uid::new("1.2.3").unwrap();
        assert_eq!(format!("{uid}"), "1.2.3");
        assert_eq!(format!("{uid:?}"), "Uid(1.2.3)");
    }
}
