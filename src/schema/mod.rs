//! JSON schemas for Helm-style `values.yaml` files.
//!
//! [`generate_schemas`] writes a `values.schema.json` beside every
//! `values.yaml` under a base directory; [`check_schemas`] regenerates them
//! in memory and compares against what is on disk.

pub mod diff;
pub mod document;
pub mod infer;
pub mod overlay;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{ReleaseError, Result};
use crate::fs_util::{find_files, write_atomic};

pub use document::Document;
pub use infer::{canonical_string, infer, ScalarType, SchemaNode};
pub use overlay::SchemaRegistry;

/// Name of the values documents schemas are generated for.
pub const VALUES_FILE: &str = "values.yaml";

/// Name of the generated schema, written beside each values document.
pub const SCHEMA_FILE: &str = "values.schema.json";

/// Read a values document.
///
/// An empty file is treated as an empty mapping.
///
/// # Errors
///
/// Returns [`ReleaseError::SchemaLoad`] if the file cannot be read, is not
/// valid YAML, or its root is not a mapping.
pub fn load_values(path: &Path) -> Result<Document> {
    let schema_err = |message: String| ReleaseError::SchemaLoad {
        path: path.to_path_buf(),
        message,
    };
    let text = std::fs::read_to_string(path).map_err(|e| schema_err(e.to_string()))?;
    match Document::from_yaml_str(&text).map_err(schema_err)? {
        Document::Null => Ok(Document::Mapping(Default::default())),
        doc @ Document::Mapping(_) => Ok(doc),
        other => Err(schema_err(format!(
            "expected a mapping at the document root, found {}",
            other.type_name()
        ))),
    }
}

/// Infer the schema for one values document and apply the registry overlay.
pub fn build_schema(values_path: &Path, registry: &SchemaRegistry) -> Result<SchemaNode> {
    let doc = load_values(values_path)?;
    let mut schema = infer(&doc);
    registry.apply(&mut schema);
    Ok(schema)
}

/// Path of the schema file belonging to a values document.
#[must_use]
pub fn schema_path_for(values_path: &Path) -> PathBuf {
    values_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(SCHEMA_FILE)
}

/// Write a schema beside every values document under `base_dir`.
///
/// Returns the schema files written. Processing stops at the first document
/// that fails to load.
pub fn generate_schemas(base_dir: &Path, registry: &SchemaRegistry) -> Result<Vec<PathBuf>> {
    let values_files = find_files(base_dir, VALUES_FILE)?;
    if values_files.is_empty() {
        tracing::warn!(base_dir = %base_dir.display(), "no {VALUES_FILE} files found");
    }

    let mut written = Vec::with_capacity(values_files.len());
    for values_path in values_files {
        tracing::info!(path = %values_path.display(), "generating schema");
        let schema = build_schema(&values_path, registry)?;
        let schema_path = schema_path_for(&values_path);
        write_atomic(&schema_path, schema.to_canonical_string().as_bytes())?;
        tracing::info!(path = %schema_path.display(), "schema generated");
        written.push(schema_path);
    }
    Ok(written)
}

/// Result of comparing one values document with its committed schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaStatus {
    /// The committed schema equals the generated one.
    Match,
    /// The committed schema differs; `diff` lists the structural changes
    /// needed to bring it up to date.
    Mismatch { diff: String },
    /// No schema file exists beside the values document.
    Missing,
}

/// One entry of a [`CheckReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCheck {
    pub values_path: PathBuf,
    pub schema_path: PathBuf,
    pub status: SchemaStatus,
}

/// Outcome of [`check_schemas`] across every discovered values document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub checks: Vec<SchemaCheck>,
}

impl CheckReport {
    /// `true` only if every document's schema matches.
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.checks.iter().all(|c| c.status == SchemaStatus::Match)
    }

    /// Entries that are missing or out of date.
    pub fn failures(&self) -> impl Iterator<Item = &SchemaCheck> {
        self.checks.iter().filter(|c| c.status != SchemaStatus::Match)
    }
}

/// Compare one values document with its committed schema.
pub fn check_schema(values_path: &Path, registry: &SchemaRegistry) -> Result<SchemaCheck> {
    let generated = build_schema(values_path, registry)?.to_json();
    let schema_path = schema_path_for(values_path);

    let status = match read_schema(&schema_path)? {
        None => SchemaStatus::Missing,
        Some(existing) if diff::matches(&existing, &generated) => SchemaStatus::Match,
        Some(existing) => SchemaStatus::Mismatch {
            diff: diff::diff(&existing, &generated),
        },
    };

    Ok(SchemaCheck {
        values_path: values_path.to_path_buf(),
        schema_path,
        status,
    })
}

/// Check every values document under `base_dir`.
///
/// Mismatched and missing schemas are collected into the report rather than
/// aborting; a document or schema that cannot be loaded aborts the batch.
pub fn check_schemas(base_dir: &Path, registry: &SchemaRegistry) -> Result<CheckReport> {
    let values_files = find_files(base_dir, VALUES_FILE)?;
    if values_files.is_empty() {
        tracing::warn!(base_dir = %base_dir.display(), "no {VALUES_FILE} files found");
    }

    let mut report = CheckReport::default();
    for values_path in values_files {
        tracing::info!(path = %values_path.display(), "checking schema");
        let check = check_schema(&values_path, registry)?;
        match &check.status {
            SchemaStatus::Match => {}
            SchemaStatus::Missing => {
                tracing::warn!(path = %check.schema_path.display(), "existing schema not found");
            }
            SchemaStatus::Mismatch { .. } => {
                tracing::warn!(path = %values_path.display(), "schema does not match");
            }
        }
        report.checks.push(check);
    }
    Ok(report)
}

fn read_schema(path: &Path) -> Result<Option<Value>> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ReleaseError::SchemaLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| ReleaseError::SchemaLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
