//! Hand-authored schema fragments spliced into inferred schemas.
//!
//! A fragment is registered under its file name without the `.json`
//! extension. Wherever an object property with that name appears, at any
//! depth, the inferred subtree is replaced wholesale by the fragment. Array
//! item schemas are not searched.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use super::infer::SchemaNode;
use crate::errors::{ReleaseError, Result};
use crate::fs_util::is_regular_file;

/// Fragments shipped inside the binary: `(file name, contents)`.
const EMBEDDED_FRAGMENTS: &[(&str, &str)] = &[(
    "additionalNetworkAllow.json",
    include_str!("schemas/additionalNetworkAllow.json"),
)];

/// Custom schema fragments keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    fragments: BTreeMap<String, Value>,
}

impl SchemaRegistry {
    /// An empty registry; overlays become no-ops.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fragments bundled with this tool.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::OverlayLoad`] if a bundled fragment is not
    /// valid JSON.
    pub fn embedded() -> Result<Self> {
        let mut registry = Self::new();
        for (file_name, contents) in EMBEDDED_FRAGMENTS {
            registry.insert_json(file_name, contents)?;
        }
        Ok(registry)
    }

    /// Load every `*.json` file directly inside `dir`.
    ///
    /// A single unparsable fragment fails the whole load.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let overlay_err = |message: String| ReleaseError::OverlayLoad {
            name: dir.display().to_string(),
            message,
        };
        let entries = std::fs::read_dir(dir).map_err(|e| overlay_err(e.to_string()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| overlay_err(e.to_string()))?.path();
            if is_regular_file(&path) && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let contents = std::fs::read_to_string(&path).map_err(|e| ReleaseError::OverlayLoad {
                name: file_name.clone(),
                message: e.to_string(),
            })?;
            registry.insert_json(&file_name, &contents)?;
        }
        tracing::debug!(dir = %dir.display(), fragments = registry.len(), "loaded custom schemas");
        Ok(registry)
    }

    /// Add every fragment of `other`, replacing same-named entries.
    pub fn extend(&mut self, other: SchemaRegistry) {
        self.fragments.extend(other.fragments);
    }

    pub fn insert(&mut self, name: impl Into<String>, fragment: Value) {
        self.fragments.insert(name.into(), fragment);
    }

    fn insert_json(&mut self, file_name: &str, contents: &str) -> Result<()> {
        let name = file_name.strip_suffix(".json").unwrap_or(file_name);
        let fragment: Value =
            serde_json::from_str(contents).map_err(|e| ReleaseError::OverlayLoad {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        self.insert(name, fragment);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fragments.get(name)
    }

    /// Registered fragment names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Replace every matching object property in `schema` with its fragment.
    pub fn apply(&self, schema: &mut SchemaNode) {
        if let SchemaNode::Object(props) = schema {
            self.apply_to_properties(props);
        }
    }

    fn apply_to_properties(&self, props: &mut BTreeMap<String, SchemaNode>) {
        for (name, node) in props.iter_mut() {
            if let Some(fragment) = self.fragments.get(name) {
                *node = SchemaNode::Fragment(fragment.clone());
            } else if let SchemaNode::Object(children) = node {
                self.apply_to_properties(children);
            }
        }
    }
}
