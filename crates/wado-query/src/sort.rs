use std::cmp::Ordering;

use serde_json::Value;

use wado_types::tags::{STUDY_DATE, STUDY_INSTANCE_UID, STUDY_TIME};

use crate::record::{first_value_of, IndexRecord};

/// Compare two optional attribute values.
///
/// Missing values sort first. Values that both parse as numbers compare
/// numerically, anything else compares as text.
pub fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
    }
}

const STUDY_ORDER: [&str; 3] = [
    STUDY_DATE.keyword,
    STUDY_TIME.keyword,
    STUDY_INSTANCE_UID.keyword,
];

fn compare_studies<A, B>(a: A, b: B) -> Ordering
where
    A: Fn(&str) -> Option<String>,
    B: Fn(&str) -> Option<String>,
{
    STUDY_ORDER.into_iter().fold(Ordering::Equal, |ord, name| {
        ord.then_with(|| compare_values(a(name).as_deref(), b(name).as_deref()))
    })
}

/// Order studies by date, then time, then UID. Stable.
pub fn sort_studies(studies: &mut [IndexRecord]) {
    studies.sort_by(|a, b| compare_studies(|n| a.first_value(n), |n| b.first_value(n)));
}

/// [`sort_studies`] over raw index entries, including ones that would not
/// validate as records.
pub fn sort_study_values(studies: &mut [Value]) {
    studies.sort_by(|a, b| compare_studies(|n| first_value_of(a, n), |n| first_value_of(b, n)));
}
