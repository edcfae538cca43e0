//! Schema inference over a [`Document`] tree.
//!
//! The generated schema is closed-world: every object sets
//! `additionalProperties: false`, so a values file may only carry keys that
//! were present when the schema was generated.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::document::Document;

/// JSON-Schema primitive types produced for scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Null,
}

impl ScalarType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Null => "null",
        }
    }
}

/// One node of an inferred schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `{"type":"object","properties":{..},"additionalProperties":false}`
    Object(BTreeMap<String, SchemaNode>),
    /// `{"type":"array","items":..}`
    Array(Box<SchemaNode>),
    /// `{"type":"string"|"number"|"boolean"|"null"}`
    Scalar(ScalarType),
    /// `{"type":<name>}` for values with no JSON-Schema counterpart. The name
    /// is not a valid JSON-Schema type; it is kept so regenerated schemas stay
    /// byte-compatible with ones already committed.
    Unknown(String),
    /// A hand-authored fragment spliced in by the overlay, emitted verbatim.
    Fragment(Value),
}

/// Infer the schema of a document node.
///
/// Arrays take their item schema from the first element only. An empty
/// array gets an object item schema with no properties.
#[must_use]
pub fn infer(doc: &Document) -> SchemaNode {
    match doc {
        Document::Mapping(map) => SchemaNode::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), infer(value)))
                .collect(),
        ),
        Document::Sequence(items) => {
            let item = items
                .first()
                .map(infer)
                .unwrap_or_else(|| SchemaNode::Object(BTreeMap::new()));
            SchemaNode::Array(Box::new(item))
        }
        Document::String(_) => SchemaNode::Scalar(ScalarType::String),
        Document::Number(_) => SchemaNode::Scalar(ScalarType::Number),
        Document::Boolean(_) => SchemaNode::Scalar(ScalarType::Boolean),
        Document::Null => SchemaNode::Scalar(ScalarType::Null),
        Document::Unknown(name) => SchemaNode::Unknown(name.clone()),
    }
}

impl SchemaNode {
    /// Properties of an object node.
    #[must_use]
    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match self {
            SchemaNode::Object(props) => Some(props),
            _ => None,
        }
    }

    /// Convert to a JSON value. Object keys come out sorted because
    /// `serde_json::Map` is ordered.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            SchemaNode::Object(props) => {
                let properties: Map<String, Value> = props
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                json!({
                    "type": "object",
                    "properties": properties,
                    "additionalProperties": false,
                })
            }
            SchemaNode::Array(items) => json!({
                "type": "array",
                "items": items.to_json(),
            }),
            SchemaNode::Scalar(t) => json!({ "type": t.as_str() }),
            SchemaNode::Unknown(name) => json!({ "type": name }),
            SchemaNode::Fragment(value) => value.clone(),
        }
    }

    /// Canonical serialization: sorted keys, two-space indent, trailing newline.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        canonical_string(&self.to_json())
    }
}

/// Canonical serialization of any JSON value.
#[must_use]
pub fn canonical_string(value: &Value) -> String {
    // Serializing a `serde_json::Value` cannot fail.
    let mut out = serde_json::to_string_pretty(value).unwrap_or_default();
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_of(yaml: &str) -> Value {
        infer(&Document::from_yaml_str(yaml).unwrap()).to_json()
    }

    #[test]
    fn root_is_closed_object() {
        let s = schema_of("key: value\n");
        assert_eq!(s["type"], "object");
        assert_eq!(s["additionalProperties"], false);
        assert_eq!(s["properties"]["key"], json!({"type": "string"}));
    }

    #[test]
    fn scalars_map_to_primitive_types() {
        let s = schema_of("s: text\ncount: 123\nratio: 1.23\nflag: true\nnothing: null\n");
        let p = &s["properties"];
        assert_eq!(p["s"]["type"], "string");
        assert_eq!(p["count"], json!({"type": "number"}));
        assert_eq!(p["ratio"]["type"], "number");
        assert_eq!(p["flag"], json!({"type": "boolean"}));
        assert_eq!(p["nothing"]["type"], "null");
    }

    #[test]
    fn nested_objects_are_closed() {
        let s = schema_of("nested:\n  inner: 123\n");
        let nested = &s["properties"]["nested"];
        assert_eq!(nested["type"], "object");
        assert_eq!(nested["additionalProperties"], false);
        assert_eq!(nested["properties"]["inner"]["type"], "number");
    }

    #[test]
    fn array_items_come_from_first_element() {
        let s = schema_of("items: [\"a\", \"b\"]\n");
        assert_eq!(
            s["properties"]["items"],
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn later_array_elements_do_not_affect_items() {
        let s = schema_of("items:\n  - a\n  - 2\n  - {x: 1}\n");
        assert_eq!(s["properties"]["items"]["items"], json!({"type": "string"}));
    }

    #[test]
    fn array_of_objects() {
        let s = schema_of("list:\n  - itemKey: itemVal\n");
        let items = &s["properties"]["list"]["items"];
        assert_eq!(items["type"], "object");
        assert_eq!(items["properties"]["itemKey"]["type"], "string");
    }

    #[test]
    fn empty_array_items_is_object_without_properties() {
        let s = schema_of("list: []\n");
        assert_eq!(
            s["properties"]["list"]["items"],
            json!({"type": "object", "properties": {}, "additionalProperties": false})
        );
    }

    #[test]
    fn nested_arrays() {
        let s = schema_of("matrix:\n  - [1, 2]\n");
        assert_eq!(
            s["properties"]["matrix"]["items"],
            json!({"type": "array", "items": {"type": "number"}})
        );
    }

    #[test]
    fn unknown_values_keep_their_type_name() {
        let s = schema_of("secret: !vault abc\n");
        assert_eq!(s["properties"]["secret"], json!({"type": "!vault"}));
    }

    #[test]
    fn every_key_has_one_property() {
        let s = schema_of("a: 1\nb: x\nc:\n  d: true\n");
        let props = s["properties"].as_object().unwrap();
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn canonical_output_is_sorted_and_stable() {
        let doc = Document::from_yaml_str("zeta: 1\nalpha: x\nmid:\n  z: 1\n  a: 2\n").unwrap();
        let first = infer(&doc).to_canonical_string();
        let second = infer(&doc).to_canonical_string();
        assert_eq!(first, second);
        assert!(first.find("\"alpha\"").unwrap() < first.find("\"zeta\"").unwrap());
        assert!(first.ends_with("}\n"));
    }
}
