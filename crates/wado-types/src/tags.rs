//! Keyword/tag dictionary for the attributes that index documents and
//! queries care about.
//!
//! Index records may carry an attribute under its DICOM keyword
//! (`PatientName`) or its hex tag (`00100010`); queries may use either. The
//! dictionary lets both sides resolve one name to the other.

/// A dictionary entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub keyword: &'static str,
    /// Eight uppercase hex digits, group then element.
    pub tag: &'static str,
    /// Value representation.
    pub vr: &'static str,
}

impl Attribute {
    const fn new(keyword: &'static str, tag: &'static str, vr: &'static str) -> Self {
        Self { keyword, tag, vr }
    }

    /// Whether values of this attribute are dates or times (range-matchable).
    pub fn is_temporal(&self) -> bool {
        is_temporal_vr(self.vr)
    }
}

pub const STUDY_INSTANCE_UID: Attribute = Attribute::new("StudyInstanceUID", "0020000D", "UI");
pub const SERIES_INSTANCE_UID: Attribute = Attribute::new("SeriesInstanceUID", "0020000E", "UI");
pub const SOP_INSTANCE_UID: Attribute = Attribute::new("SOPInstanceUID", "00080018", "UI");
pub const PATIENT_NAME: Attribute = Attribute::new("PatientName", "00100010", "PN");
pub const PATIENT_ID: Attribute = Attribute::new("PatientID", "00100020", "LO");
pub const STUDY_DATE: Attribute = Attribute::new("StudyDate", "00080020", "DA");
pub const STUDY_TIME: Attribute = Attribute::new("StudyTime", "00080030", "TM");

/// Every attribute the dictionary knows.
pub const DICTIONARY: &[Attribute] = &[
    STUDY_INSTANCE_UID,
    SERIES_INSTANCE_UID,
    SOP_INSTANCE_UID,
    PATIENT_NAME,
    PATIENT_ID,
    STUDY_DATE,
    STUDY_TIME,
    Attribute::new("StudyDescription", "00081030", "LO"),
    Attribute::new("ModalitiesInStudy", "00080061", "CS"),
    Attribute::new("AccessionNumber", "00080050", "SH"),
    Attribute::new("StudyID", "00200010", "SH"),
    Attribute::new("ReferringPhysicianName", "00080090", "PN"),
    Attribute::new("PatientBirthDate", "00100030", "DA"),
    Attribute::new("PatientSex", "00100040", "CS"),
    Attribute::new("Modality", "00080060", "CS"),
    Attribute::new("SeriesNumber", "00200011", "IS"),
    Attribute::new("SeriesDescription", "0008103E", "LO"),
    Attribute::new("SeriesDate", "00080021", "DA"),
    Attribute::new("SeriesTime", "00080031", "TM"),
    Attribute::new("InstanceNumber", "00200013", "IS"),
    Attribute::new("SOPClassUID", "00080016", "UI"),
];

/// Look up an attribute by keyword (`PatientName`) or tag (`00100010`,
/// case-insensitive for the hex digits).
pub fn lookup(name: &str) -> Option<&'static Attribute> {
    DICTIONARY
        .iter()
        .find(|a| a.keyword == name || a.tag.eq_ignore_ascii_case(name))
}

/// The other spelling of `name`: the tag for a keyword, the keyword for a tag.
pub fn alias(name: &str) -> Option<&'static str> {
    let attr = lookup(name)?;
    if attr.keyword == name {
        Some(attr.tag)
    } else {
        Some(attr.keyword)
    }
}

pub fn is_temporal_vr(vr: &str) -> bool {
    matches!(vr, "DA" | "DT" | "TM")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_keyword_and_tag() {
        assert_eq!(lookup("PatientName"), Some(&PATIENT_NAME));
        assert_eq!(lookup("00100010"), Some(&PATIENT_NAME));
        assert_eq!(lookup("0020000d"), Some(&STUDY_INSTANCE_UID));
        assert!(lookup("NoSuchKeyword").is_none());
    }

    #[test]
    fn alias_goes_both_ways() {
        assert_eq!(alias("StudyDate"), Some("00080020"));
        assert_eq!(alias("00080020"), Some("StudyDate"));
        assert_eq!(alias("limit"), None);
    }

    #[test]
    fn temporal_attributes() {
        assert!(STUDY_DATE.is_temporal());
        assert!(STUDY_TIME.is_temporal());
        assert!(!PATIENT_NAME.is_temporal());
    }

    #[test]
    fn dictionary_has_unique_tags() {
        let mut tags: Vec<_> = DICTIONARY.iter().map(|a| a.tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), DICTIONARY.len());
    }
}
