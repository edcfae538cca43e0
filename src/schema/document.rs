use std::collections::BTreeMap;

use serde_yaml_ng::Value;

/// A decoded values document as a closed tree.
///
/// Everything YAML can express that is not a plain mapping, sequence, or
/// scalar ends up in [`Document::Unknown`], carrying a type name for
/// diagnostics instead of being dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Mapping(BTreeMap<String, Document>),
    Sequence(Vec<Document>),
    String(String),
    Number(serde_yaml_ng::Number),
    Boolean(bool),
    Null,
    Unknown(String),
}

impl Document {
    /// Parse YAML text into a document. Merge keys (`<<`) are expanded first.
    ///
    /// # Errors
    ///
    /// Returns a message if the text is not valid YAML or a mapping uses a
    /// non-scalar key.
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, String> {
        let mut value: Value = serde_yaml_ng::from_str(text).map_err(|e| e.to_string())?;
        value.apply_merge().map_err(|e| e.to_string())?;
        Self::from_value(value)
    }

    /// Convert a decoded YAML value.
    ///
    /// Scalar mapping keys are stringified (`1: a` becomes key `"1"`).
    pub fn from_value(value: Value) -> std::result::Result<Self, String> {
        Ok(match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Boolean(b),
            Value::Number(n) => Document::Number(n),
            Value::String(s) => Document::String(s),
            Value::Sequence(seq) => Document::Sequence(
                seq.into_iter()
                    .map(Self::from_value)
                    .collect::<std::result::Result<_, _>>()?,
            ),
            Value::Mapping(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(key_to_string(&k)?, Self::from_value(v)?);
                }
                Document::Mapping(out)
            }
            Value::Tagged(tagged) => Document::Unknown(tagged.tag.to_string()),
        })
    }

    /// Name of the variant, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Document::Mapping(_) => "mapping",
            Document::Sequence(_) => "sequence",
            Document::String(_) => "string",
            Document::Number(_) => "number",
            Document::Boolean(_) => "boolean",
            Document::Null => "null",
            Document::Unknown(name) => name,
        }
    }
}

fn key_to_string(key: &Value) -> std::result::Result<String, String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(format!(
            "unsupported mapping key: {}",
            serde_yaml_ng::to_string(other)
                .unwrap_or_default()
                .trim()
        )),
    }
}
