//! Structural comparison of persisted and freshly generated schemas.

use std::fmt;

use serde_json::Value;
use similar::TextDiff;

/// One difference between two JSON documents, located by JSON pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added { path: String, value: Value },
    Removed { path: String, value: Value },
    Modified { path: String, old: Value, new: Value },
}

impl Change {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Change::Added { path, .. } | Change::Removed { path, .. } | Change::Modified { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added { path, value } => write!(f, "+ {}: {}", display_path(path), value),
            Change::Removed { path, value } => write!(f, "- {}: {}", display_path(path), value),
            Change::Modified { path, old, new } => {
                write!(f, "~ {}: {} -> {}", display_path(path), old, new)
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Structural equality. Key order and whitespace in the serialized form do
/// not matter.
#[must_use]
pub fn matches(existing: &Value, generated: &Value) -> bool {
    existing == generated
}

/// Every difference turning `existing` into `generated`, in path order.
#[must_use]
pub fn changes(existing: &Value, generated: &Value) -> Vec<Change> {
    let mut out = Vec::new();
    walk(String::new(), existing, generated, &mut out);
    out
}

fn walk(path: String, old: &Value, new: &Value, out: &mut Vec<Change>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child = format!("{path}/{}", escape_pointer(key));
                match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => walk(child, x, y, out),
                    (Some(x), None) => out.push(Change::Removed {
                        path: child,
                        value: x.clone(),
                    }),
                    (None, Some(y)) => out.push(Change::Added {
                        path: child,
                        value: y.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for i in 0..a.len().max(b.len()) {
                let child = format!("{path}/{i}");
                match (a.get(i), b.get(i)) {
                    (Some(x), Some(y)) => walk(child, x, y, out),
                    (Some(x), None) => out.push(Change::Removed {
                        path: child,
                        value: x.clone(),
                    }),
                    (None, Some(y)) => out.push(Change::Added {
                        path: child,
                        value: y.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        (a, b) if a != b => out.push(Change::Modified {
            path,
            old: a.clone(),
            new: b.clone(),
        }),
        _ => {}
    }
}

/// RFC 6901 escaping of a single pointer segment.
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Human-readable report of the structural differences, one per line.
///
/// Returns an empty string when the documents match.
#[must_use]
pub fn diff(existing: &Value, generated: &Value) -> String {
    let changes = changes(existing, generated);
    let mut out = String::new();
    for change in &changes {
        out.push_str(&change.to_string());
        out.push('\n');
    }
    out
}

/// Unified line diff of two serialized schemas.
#[must_use]
pub fn unified_diff(existing: &str, generated: &str, label: &str) -> String {
    TextDiff::from_lines(existing, generated)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{label} (committed)"), &format!("{label} (generated)"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_ignores_key_order_and_whitespace() {
        let a: Value = serde_json::from_str(r#"{"type":"object","properties":{"a":{"type":"string"},"b":{"type":"number"}}}"#).unwrap();
        let b: Value = serde_json::from_str(
            "{\n  \"properties\": {\n    \"b\": {\"type\": \"number\"},\n    \"a\": {\"type\": \"string\"}\n  },\n  \"type\": \"object\"\n}",
        )
        .unwrap();
        assert!(matches(&a, &b));
        assert!(matches(&a, &a));
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn reports_added_removed_and_modified() {
        let existing = json!({"properties": {"a": {"type": "string"}, "gone": {"type": "null"}}});
        let generated = json!({"properties": {"a": {"type": "number"}, "new": {"type": "boolean"}}});
        assert!(!matches(&existing, &generated));

        let c = changes(&existing, &generated);
        assert_eq!(
            c,
            vec![
                Change::Modified {
                    path: "/properties/a/type".into(),
                    old: json!("string"),
                    new: json!("number"),
                },
                Change::Removed {
                    path: "/properties/gone".into(),
                    value: json!({"type": "null"}),
                },
                Change::Added {
                    path: "/properties/new".into(),
                    value: json!({"type": "boolean"}),
                },
            ]
        );

        let text = diff(&existing, &generated);
        assert!(text.contains("~ /properties/a/type: \"string\" -> \"number\""));
        assert!(text.contains("- /properties/gone"));
        assert!(text.contains("+ /properties/new"));
    }

    #[test]
    fn array_length_changes() {
        let c = changes(&json!({"enum": ["a"]}), &json!({"enum": ["a", "b"]}));
        assert_eq!(
            c,
            vec![Change::Added {
                path: "/enum/1".into(),
                value: json!("b"),
            }]
        );
    }

    #[test]
    fn type_change_at_root() {
        let c = changes(&json!([1]), &json!({"a": 1}));
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].path(), "");
        assert!(c[0].to_string().starts_with("~ /:"));
    }

    #[test]
    fn pointer_segments_are_escaped() {
        let c = changes(&json!({}), &json!({"a/b~c": 1}));
        assert_eq!(c[0].path(), "/a~1b~0c");
    }

    #[test]
    fn unified_diff_shows_changed_lines() {
        let text = unified_diff("{\n  \"a\": 1\n}\n", "{\n  \"a\": 2\n}\n", "values.schema.json");
        assert!(text.contains("-  \"a\": 1"));
        assert!(text.contains("+  \"a\": 2"));
        assert!(text.contains("values.schema.json (generated)"));
    }
}
