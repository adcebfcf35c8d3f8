use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::Error as SerError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;

/// A typed Firestore value as it appears on the wire.
///
/// The REST API tags every value with its type (`{"stringValue": "x"}`);
/// externally-tagged serde enums produce exactly that shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum FieldValue {
    #[serde(rename = "nullValue")]
    Null(()),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// Integers travel as decimal strings.
    #[serde(rename = "integerValue")]
    Integer(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    #[serde(rename = "stringValue")]
    String(String),
    /// Base64-encoded bytes.
    #[serde(rename = "bytesValue")]
    Bytes(String),
    #[serde(rename = "referenceValue")]
    Reference(String),
    #[serde(rename = "geoPointValue")]
    GeoPoint(LatLng),
    #[serde(rename = "arrayValue")]
    Array(ArrayPayload),
    #[serde(rename = "mapValue")]
    Map(MapPayload),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ArrayPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<FieldValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MapPayload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
}

/// A Firestore document: fully-qualified resource name plus typed fields.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// The document id: the last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Deserializes the document's fields into a plain serde struct.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut map = Map::new();
        for (key, value) in &self.fields {
            map.insert(key.clone(), wire_to_json(value.clone())?);
        }
        serde_json::from_value(JsonValue::Object(map))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

/// One element of the `:runQuery` streamed-array response. Elements without
/// a document carry only read metadata and are skipped.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponseItem {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<QueryOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub enum QueryFilter {
    FieldFilter(FieldFilterPayload),
    CompositeFilter(CompositeFilterPayload),
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilterPayload {
    pub field: FieldPath,
    pub op: FilterOp,
    pub value: FieldValue,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilterPayload {
    pub op: String,
    pub filters: Vec<QueryFilter>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FieldPath {
    pub field_path: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    ArrayContains,
    In,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QueryOrder {
    pub field: FieldPath,
    pub direction: OrderDirection,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// Converts a wire value into plain JSON for serde deserialization.
pub(crate) fn wire_to_json(value: FieldValue) -> Result<JsonValue, serde_json::Error> {
    Ok(match value {
        FieldValue::Null(()) => JsonValue::Null,
        FieldValue::Boolean(b) => JsonValue::Bool(b),
        FieldValue::Integer(s) => {
            let i: i64 = s
                .parse()
                .map_err(|e| DeError::custom(format!("bad integerValue {:?}: {}", s, e)))?;
            JsonValue::Number(i.into())
        }
        FieldValue::Double(d) => serde_json::Number::from_f64(d)
            .map(JsonValue::Number)
            .ok_or_else(|| DeError::custom(format!("non-finite doubleValue: {}", d)))?,
        FieldValue::Timestamp(s)
        | FieldValue::String(s)
        | FieldValue::Bytes(s)
        | FieldValue::Reference(s) => JsonValue::String(s),
        FieldValue::GeoPoint(point) => {
            json!({"latitude": point.latitude, "longitude": point.longitude})
        }
        FieldValue::Array(array) => JsonValue::Array(
            array
                .values
                .into_iter()
                .map(wire_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        FieldValue::Map(map) => {
            let mut object = Map::new();
            for (key, value) in map.fields {
                object.insert(key, wire_to_json(value)?);
            }
            JsonValue::Object(object)
        }
    })
}

/// Converts plain JSON into a wire value.
pub(crate) fn json_to_wire(value: JsonValue) -> Result<FieldValue, serde_json::Error> {
    Ok(match value {
        JsonValue::Null => FieldValue::Null(()),
        JsonValue::Bool(b) => FieldValue::Boolean(b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i.to_string())
            } else if let Some(f) = n.as_f64() {
                FieldValue::Double(f)
            } else {
                return Err(SerError::custom(format!("unsupported number: {}", n)));
            }
        }
        JsonValue::String(s) => FieldValue::String(s),
        JsonValue::Array(values) => FieldValue::Array(ArrayPayload {
            values: values
                .into_iter()
                .map(json_to_wire)
                .collect::<Result<Vec<_>, _>>()?,
        }),
        JsonValue::Object(object) => {
            let mut fields = BTreeMap::new();
            for (key, value) in object {
                fields.insert(key, json_to_wire(value)?);
            }
            FieldValue::Map(MapPayload { fields })
        }
    })
}

/// Serializes a plain serde struct into a document field map.
pub(crate) fn to_wire_fields<T: Serialize>(
    value: &T,
) -> Result<BTreeMap<String, FieldValue>, serde_json::Error> {
    match serde_json::to_value(value)? {
        JsonValue::Object(object) => {
            let mut fields = BTreeMap::new();
            for (key, value) in object {
                fields.insert(key, json_to_wire(value)?);
            }
            Ok(fields)
        }
        _ => Err(SerError::custom("only maps and structs become documents")),
    }
}
