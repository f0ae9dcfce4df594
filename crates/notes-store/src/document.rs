//! Typed document model.
//!
//! Documents are maps from field name to [`FieldValue`]. The JSON encoding
//! tags every value with its type (`{"stringValue": "..."}`,
//! `{"timestampValue": "..."}`, ...) so timestamps survive a trip through a
//! JSON column and equality filters can be expressed as JSONB containment.
//! An absent field is represented by leaving it out of the map.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field map of a document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A value in one of the store's native types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    #[serde(rename = "integerValue")]
    Integer(i64),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "timestampValue", with = "notes_core::schema::rfc3339_micros")]
    Timestamp(DateTime<Utc>),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "mapValue")]
    Map(MapValue),
}

/// Wire wrapper for array values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

/// Wire wrapper for nested maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(array) => Some(&array.values),
            _ => None,
        }
    }

    /// Build an array of strings.
    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(ArrayValue {
            values: items.into_iter().map(|s| Self::String(s.into())).collect(),
        })
    }

    /// Position of the value's type in the cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Self::Boolean(_) => 0,
            Self::Integer(_) | Self::Double(_) => 1,
            Self::Timestamp(_) => 2,
            Self::String(_) => 3,
            Self::Array(_) => 4,
            Self::Map(_) => 5,
        }
    }

    /// Total order used for query sorting: by type first, then by value.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Double(b)) => (*a as f64).total_cmp(b),
            (Self::Double(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => {
                for (x, y) in a.values.iter().zip(&b.values) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.values.len().cmp(&b.values.len())
            }
            (Self::Map(a), Self::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.fields.iter().zip(&b.fields) {
                    let ord = ka.cmp(kb).then_with(|| va.compare(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.fields.len().cmp(&b.fields.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// A document as read back from a store, with its assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

// ============================================================================
// Queries
// ============================================================================

/// Sort direction for an [`OrderBy`] clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Equality filters plus ordering.
///
/// Results are always totally ordered: after the requested keys, documents
/// are ordered by id ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub filters: Vec<(String, FieldValue)>,
    pub order_by: Vec<OrderBy>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only documents whose `field` equals `value`.
    pub fn where_eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Add a sort key after the existing ones.
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Whether `fields` satisfies every filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(name, expected)| fields.get(name) == Some(expected))
    }

    /// The filters as a document, for backends that match by containment.
    pub fn filter_document(&self) -> Fields {
        self.filters.iter().cloned().collect()
    }

    /// Sort documents by the query's keys, then by id.
    ///
    /// A missing field sorts before any present value.
    pub fn sort(&self, docs: &mut [StoredDocument]) {
        docs.sort_by(|a, b| self.compare_documents(a, b));
    }

    fn compare_documents(&self, a: &StoredDocument, b: &StoredDocument) -> Ordering {
        for key in &self.order_by {
            let ord = match (a.fields.get(&key.field), b.fields.get(&key.field)) {
                (Some(x), Some(y)) => x.compare(y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(id: &str, pinned: bool, minute: u32) -> StoredDocument {
        let mut fields = Fields::new();
        fields.insert("owner".into(), FieldValue::from("u1"));
        fields.insert("pinned".into(), FieldValue::from(pinned));
        fields.insert(
            "updated".into(),
            FieldValue::from(Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap()),
        );
        StoredDocument {
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn test_wire_encoding_is_type_tagged() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let mut fields = Fields::new();
        fields.insert("title".into(), FieldValue::from("hi"));
        fields.insert("at".into(), FieldValue::from(ts));
        fields.insert("tags".into(), FieldValue::string_array(["a"]));

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["title"], serde_json::json!({"stringValue": "hi"}));
        assert_eq!(
            json["at"],
            serde_json::json!({"timestampValue": "2024-02-03T04:05:06.000000Z"})
        );
        assert_eq!(
            json["tags"],
            serde_json::json!({"arrayValue": {"values": [{"stringValue": "a"}]}})
        );

        let back: Fields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_empty_array_decodes_without_values_key() {
        let value: FieldValue = serde_json::from_str(r#"{"arrayValue": {}}"#).unwrap();
        assert_eq!(value.as_array(), Some(&[][..]));
    }

    #[test]
    fn test_query_matches_equality_filters() {
        let query = DocumentQuery::new().where_eq("owner", "u1");
        assert!(query.matches(&doc("a", false, 0).fields));

        let query = DocumentQuery::new().where_eq("owner", "u2");
        assert!(!query.matches(&doc("a", false, 0).fields));
    }

    #[test]
    fn test_sort_descending_keys_then_id() {
        let mut docs = vec![
            doc("c", false, 5),
            doc("b", true, 1),
            doc("a", false, 5),
            doc("d", false, 9),
        ];
        let query = DocumentQuery::new()
            .order_by("pinned", SortDirection::Descending)
            .order_by("updated", SortDirection::Descending);
        query.sort(&mut docs);

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_compare_across_types() {
        assert_eq!(
            FieldValue::Boolean(true).compare(&FieldValue::from("a")),
            Ordering::Less
        );
        assert_eq!(
            FieldValue::Integer(2).compare(&FieldValue::Double(1.5)),
            Ordering::Greater
        );
    }
}
