use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use wado_types::tags;
use wado_types::{Level, Uid};

use crate::error::{QueryError, QueryResult};

/// One entry of an index document.
///
/// The identifying UID is validated and held separately; every attribute,
/// the identifier included, stays in the open `attributes` map exactly as
/// it was read, so unknown keys survive a read-modify-write untouched.
///
/// Attributes may be stored by keyword (`"PatientName": "A"`) or as DICOM
/// JSON elements keyed by tag (`"00100010": {"vr": "PN", "Value": [...]}`);
/// lookups accept either spelling.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexRecord {
    uid: Uid,
    attributes: Map<String, Value>,
}

impl IndexRecord {
    /// Validate a raw JSON entry for `level`.
    pub fn from_value(level: Level, value: Value) -> QueryResult<Self> {
        let Value::Object(attributes) = value else {
            return Err(QueryError::NotAnObject);
        };
        let raw = identifier_in(level, &attributes).ok_or(QueryError::MissingIdentifier {
            level,
            attribute: level.identifier().keyword,
        })?;
        let uid = Uid::new(raw)?;
        Ok(Self { uid, attributes })
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Raw value stored under `name` or its keyword/tag alias.
    pub fn get(&self, name: &str) -> Option<&Value> {
        lookup(&self.attributes, name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Normalized view of the attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.get(name).map(|v| AttributeValue::from_json(name, v))
    }

    /// First value of `name` in string form.
    pub fn first_value(&self, name: &str) -> Option<String> {
        self.attribute(name)?.values.into_iter().next()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.attributes)
    }
}

impl Serialize for IndexRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

/// Identifier of a raw JSON entry at `level`, in keyword or tag form.
///
/// Works on unvalidated values so that callers rewriting a document can
/// match entries without re-encoding them.
pub fn identifier_of(level: Level, value: &Value) -> Option<String> {
    identifier_in(level, value.as_object()?)
}

/// First value of `name` (or its keyword/tag alias) in a raw JSON entry.
pub fn first_value_of(value: &Value, name: &str) -> Option<String> {
    let found = lookup(value.as_object()?, name)?;
    AttributeValue::from_json(name, found).values.into_iter().next()
}

fn identifier_in(level: Level, attributes: &Map<String, Value>) -> Option<String> {
    let attr = level.identifier();
    let value = attributes
        .get(attr.keyword)
        .or_else(|| attributes.get(attr.tag))?;
    AttributeValue::from_json(attr.keyword, value)
        .values
        .into_iter()
        .next()
}

fn lookup<'a>(attributes: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    attributes.get(name).or_else(|| {
        let attr = tags::lookup(name)?;
        attributes
            .get(attr.keyword)
            .or_else(|| attributes.get(attr.tag))
    })
}

/// An attribute flattened to its string values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeValue {
    /// Value representation, when the record carries one.
    pub vr: Option<String>,
    /// Every value, multi-valued attributes in order; person names use their
    /// alphabetic form.
    pub values: Vec<String>,
    /// Whether range matching applies (date/time VR or a known date/time
    /// attribute).
    pub temporal: bool,
}

impl AttributeValue {
    pub fn from_json(name: &str, value: &Value) -> Self {
        let mut vr = None;
        let mut values = Vec::new();

        match value {
            Value::Object(obj) if obj.contains_key("Value") || obj.contains_key("vr") => {
                vr = obj.get("vr").and_then(Value::as_str).map(str::to_string);
                if let Some(inner) = obj.get("Value") {
                    flatten(inner, &mut values);
                }
            }
            other => flatten(other, &mut values),
        }

        let temporal = match &vr {
            Some(vr) => tags::is_temporal_vr(vr),
            None => tags::lookup(name).is_some_and(|a| a.is_temporal()),
        };
        Self {
            vr,
            values,
            temporal,
        }
    }
}

fn flatten(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Array(items) => items.iter().for_each(|item| flatten(item, out)),
        Value::Object(obj) => {
            if let Some(Value::String(name)) = obj.get("Alphabetic") {
                out.push(name.clone());
            }
        }
        Value::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyword_record() {
        let rec = IndexRecord::from_value(
            Level::Study,
            json!({"StudyInstanceUID": "1.2.3", "PatientName": "A", "Extra": 7}),
        )
        .unwrap();
        assert_eq!(rec.uid(), &Uid::new("1.2.3").unwrap());
        assert_eq!(rec.first_value("PatientName").as_deref(), Some("A"));
        assert_eq!(rec.first_value("00100010").as_deref(), Some("A"));
        assert_eq!(rec.first_value("Extra").as_deref(), Some("7"));
    }

    #[test]
    fn first_value_of_raw_entries() {
        let raw = json!({"00080020": {"vr": "DA", "Value": ["20240131"]}, "PatientName": "A"});
        assert_eq!(first_value_of(&raw, "StudyDate").as_deref(), Some("20240131"));
        assert_eq!(first_value_of(&raw, "PatientName").as_deref(), Some("A"));
        assert!(first_value_of(&raw, "StudyTime").is_none());
        assert!(first_value_of(&json!("not an object"), "PatientName").is_none());
    }

    #[test]
    fn dicom_json_record() {
        let rec = IndexRecord::from_value(
            Level::Study,
            json!({
                "0020000D": {"vr": "UI", "Value": ["1.2.840.1"]},
                "00100010": {"vr": "PN", "Value": [{"Alphabetic": "Doe^John"}]},
                "00080061": {"vr": "CS", "Value": ["CT", "MR"]},
                "00080020": {"vr": "DA", "Value": ["20240131"]}
            }),
        )
        .unwrap();
        assert_eq!(rec.uid().as_str(), "1.2.840.1");
        assert_eq!(rec.first_value("PatientName").as_deref(), Some("Doe^John"));

        let modalities = rec.attribute("ModalitiesInStudy").unwrap();
        assert_eq!(modalities.vr.as_deref(), Some("CS"));
        assert_eq!(modalities.values, vec!["CT", "MR"]);
        assert!(!modalities.temporal);
        assert!(rec.attribute("StudyDate").unwrap().temporal);
    }

    #[test]
    fn keyword_date_is_temporal_without_vr() {
        let attr = AttributeValue::from_json("StudyDate", &json!("20240101"));
        assert!(attr.temporal);
        assert!(attr.vr.is_none());
    }

    #[test]
    fn element_without_value_is_empty() {
        let attr = AttributeValue::from_json("PatientName", &json!({"vr": "PN"}));
        assert!(attr.values.is_empty());
    }

    #[test]
    fn missing_identifier_rejected() {
        let err = IndexRecord::from_value(Level::Series, json!({"StudyInstanceUID": "1.2"}))
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingIdentifier {
                level: Level::Series,
                attribute: "SeriesInstanceUID"
            }
        );
    }

    #[test]
    fn invalid_identifier_rejected() {
        let long = "1".repeat(65);
        let err =
            IndexRecord::from_value(Level::Study, json!({"StudyInstanceUID": long})).unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier(_)));
        assert_eq!(
            IndexRecord::from_value(Level::Study, json!([1, 2])).unwrap_err(),
            QueryError::NotAnObject
        );
    }

    #[test]
    fn serialization_is_lossless() {
        let raw = json!({"0020000D": {"vr": "UI", "Value": ["1.2"]}, "zz-unknown": [1, {"a": null}]});
        let rec = IndexRecord::from_value(Level::Study, raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
        assert_eq!(rec.to_value(), raw);
        assert_eq!(rec.into_value(), raw);
    }

    #[test]
    fn identifier_of_raw_values() {
        assert_eq!(
            identifier_of(Level::Study, &json!({"StudyInstanceUID": "1.2.3"})).as_deref(),
            Some("1.2.3")
        );
        assert_eq!(
            identifier_of(Level::Instance, &json!({"00080018": {"vr": "UI", "Value": ["9.9"]}}))
                .as_deref(),
            Some("9.9")
        );
        assert_eq!(identifier_of(Level::Study, &json!("not an object")), None);
    }
}
