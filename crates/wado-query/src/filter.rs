//! QIDO-style attribute matching.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::{AttributeValue, IndexRecord};

/// How one query value matches an attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchSpec {
    /// Empty value or a lone `*`: any record that has the attribute.
    Universal,
    /// Case-sensitive equality.
    Exact(String),
    /// Glob pattern; `*` matches any run of characters.
    Wildcard(String),
    /// `start-end`, either side optional. Inclusive, lexicographic, applied
    /// to date/time attributes; other attributes compare `raw` exactly.
    Range {
        raw: String,
        start: Option<String>,
        end: Option<String>,
    },
    /// Enumerated values; any member matching is enough.
    AnyOf(Vec<MatchSpec>),
}

impl MatchSpec {
    /// Classify a query string.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == "*" {
            return Self::Universal;
        }
        if value.contains('*') {
            return Self::Wildcard(value.to_string());
        }
        if let Some((start, end)) = parse_range(value) {
            return Self::Range {
                raw: value.to_string(),
                start,
                end,
            };
        }
        Self::Exact(value.to_string())
    }

    /// Classify a JSON query value: arrays become [`AnyOf`](Self::AnyOf),
    /// scalars are parsed from their string form.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::AnyOf(items.iter().map(Self::from_json).collect()),
            Value::String(s) => Self::parse(s),
            Value::Null => Self::Universal,
            other => Self::Exact(other.to_string()),
        }
    }

    /// Whether any value of `attr` satisfies this specifier.
    pub fn matches(&self, attr: &AttributeValue) -> bool {
        match self {
            Self::Universal => true,
            Self::AnyOf(specs) => specs.iter().any(|spec| spec.matches(attr)),
            _ => attr.values.iter().any(|v| self.matches_one(v, attr.temporal)),
        }
    }

    fn matches_one(&self, value: &str, temporal: bool) -> bool {
        match self {
            Self::Universal => true,
            Self::Exact(expected) => value == expected,
            Self::Wildcard(pattern) => glob_match(pattern, value),
            Self::Range { raw, start, end } => {
                if !temporal {
                    return value == raw;
                }
                start.as_deref().map_or(true, |s| value >= s)
                    && end.as_deref().map_or(true, |e| value <= e)
            }
            Self::AnyOf(specs) => specs.iter().any(|s| s.matches_one(value, temporal)),
        }
    }
}

/// `digits-digits` with at least one side present. Times may carry a
/// fractional part, so `.` is allowed alongside digits.
fn parse_range(value: &str) -> Option<(Option<String>, Option<String>)> {
    let (start, end) = value.split_once('-')?;
    let valid = |s: &str| s.chars().all(|c| c.is_ascii_digit() || c == '.');
    if (start.is_empty() && end.is_empty()) || !valid(start) || !valid(end) {
        return None;
    }
    let side = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Some((side(start), side(end)))
}

/// Glob match where `*` is the only metacharacter.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Attribute name → match specifier for one query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryConstraints {
    specs: BTreeMap<String, MatchSpec>,
}

impl QueryConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: impl Into<String>, spec: MatchSpec) -> Self {
        self.insert(attribute, spec);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, spec: MatchSpec) {
        self.specs.insert(attribute.into(), spec);
    }

    /// Build from string pairs such as decoded query parameters.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let specs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), MatchSpec::parse(v.as_ref())))
            .collect();
        Self { specs }
    }

    /// Build from a JSON object; non-object values yield no constraints.
    pub fn from_json(value: &Value) -> Self {
        let specs = value
            .as_object()
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), MatchSpec::from_json(v)))
                    .collect()
            })
            .unwrap_or_default();
        Self { specs }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatchSpec)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Keep the entries that satisfy every constraint, in input order.
///
/// A constraint on an attribute a record lacks rejects that record. A
/// constraint on an attribute no entry carries at all (paging keys,
/// include-field lists, future attributes) is ignored.
pub fn qido_filter(entries: &[IndexRecord], constraints: &QueryConstraints) -> Vec<IndexRecord> {
    let active: Vec<(&str, &MatchSpec)> = constraints
        .iter()
        .filter(|(name, _)| entries.iter().any(|e| e.has(name)))
        .collect();

    entries
        .iter()
        .filter(|entry| {
            active.iter().all(|(name, spec)| match entry.attribute(name) {
                Some(attr) => spec.matches(&attr),
                None => false,
            })
        })
        .cloned()
        .collect()
}
