//! Package (`zarf.yaml`) and bundle (`bundle/uds-bundle.yaml`) manifests.
//!
//! Both are kept as untyped YAML trees so every field this tool does not
//! touch survives a rewrite, in its original key order. Comments and
//! custom formatting do not survive: the document is re-serialized.

use std::path::{Path, PathBuf};

use serde_yaml_ng::{Mapping, Value};

use crate::errors::{ReleaseError, Result};
use crate::fs_util::write_atomic;

/// Package manifest path, relative to the working directory.
pub const PACKAGE_MANIFEST: &str = "zarf.yaml";

/// Bundle manifest path, relative to the working directory.
pub const BUNDLE_MANIFEST: &str = "bundle/uds-bundle.yaml";

/// The package manifest: `metadata.name` and `metadata.version` are the only
/// fields read or written.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    path: PathBuf,
    doc: Value,
}

impl PackageManifest {
    /// Load `<dir>/zarf.yaml`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(PACKAGE_MANIFEST);
        let doc = read_yaml(&path)?;
        Ok(Self { path, doc })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `metadata.name`.
    pub fn name(&self) -> Result<&str> {
        self.doc
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| self.invalid("missing metadata.name"))
    }

    /// `metadata.version`, if present and a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.doc
            .get("metadata")
            .and_then(|m| m.get("version"))
            .and_then(Value::as_str)
    }

    pub fn set_version(&mut self, version: &str) -> Result<()> {
        let path = self.path.clone();
        let metadata = metadata_mut(&mut self.doc, &path)?;
        metadata.insert(Value::from("version"), Value::from(version));
        Ok(())
    }

    /// Write the manifest back to where it was loaded from.
    pub fn save(&self) -> Result<()> {
        write_yaml(&self.path, &self.doc)
    }

    fn invalid(&self, message: &str) -> ReleaseError {
        ReleaseError::Manifest {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

/// The bundle manifest: `metadata.version` and the `ref` of each entry in
/// `packages`.
#[derive(Debug, Clone)]
pub struct BundleManifest {
    path: PathBuf,
    doc: Value,
}

impl BundleManifest {
    /// Load `<dir>/bundle/uds-bundle.yaml`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(BUNDLE_MANIFEST);
        let doc = read_yaml(&path)?;
        Ok(Self { path, doc })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `metadata.version`, if present and a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.doc
            .get("metadata")
            .and_then(|m| m.get("version"))
            .and_then(Value::as_str)
    }

    pub fn set_version(&mut self, version: &str) -> Result<()> {
        let path = self.path.clone();
        let metadata = metadata_mut(&mut self.doc, &path)?;
        metadata.insert(Value::from("version"), Value::from(version));
        Ok(())
    }

    /// The `ref` of the first package entry named `name`.
    #[must_use]
    pub fn package_ref(&self, name: &str) -> Option<&str> {
        self.doc
            .get("packages")
            .and_then(Value::as_sequence)?
            .iter()
            .find(|p| p.get("name").and_then(Value::as_str) == Some(name))
            .and_then(|p| p.get("ref"))
            .and_then(Value::as_str)
    }

    /// Set `ref` on every package entry named `name`; other entries are left
    /// untouched. Returns how many entries were updated.
    pub fn set_package_ref(&mut self, name: &str, reference: &str) -> Result<usize> {
        let Some(packages) = self.doc.get_mut("packages") else {
            return Ok(0);
        };
        let Some(packages) = packages.as_sequence_mut() else {
            return Err(ReleaseError::Manifest {
                path: self.path.clone(),
                message: "packages is not a list".into(),
            });
        };

        let mut updated = 0;
        for entry in packages.iter_mut() {
            if entry.get("name").and_then(Value::as_str) != Some(name) {
                continue;
            }
            if let Some(map) = entry.as_mapping_mut() {
                map.insert(Value::from("ref"), Value::from(reference));
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Write the manifest back to where it was loaded from.
    pub fn save(&self) -> Result<()> {
        write_yaml(&self.path, &self.doc)
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ReleaseError::io(path, e))?;
    let doc: Value = serde_yaml_ng::from_str(&content).map_err(|e| ReleaseError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if !doc.is_mapping() {
        return Err(ReleaseError::Manifest {
            path: path.to_path_buf(),
            message: "document root is not a mapping".into(),
        });
    }
    Ok(doc)
}

fn write_yaml(path: &Path, doc: &Value) -> Result<()> {
    let yaml = serde_yaml_ng::to_string(doc).map_err(|e| ReleaseError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_atomic(path, yaml.as_bytes())
}

/// The `metadata` mapping, created if absent.
fn metadata_mut<'a>(doc: &'a mut Value, path: &Path) -> Result<&'a mut Mapping> {
    let invalid = |message: &str| ReleaseError::Manifest {
        path: path.to_path_buf(),
        message: message.to_string(),
    };
    let root = doc
        .as_mapping_mut()
        .ok_or_else(|| invalid("document root is not a mapping"))?;
    let metadata = root
        .entry(Value::from("metadata"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    metadata
        .as_mapping_mut()
        .ok_or_else(|| invalid("metadata is not a mapping"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ZARF: &str = "\
kind: ZarfPackageConfig
metadata:
  name: podinfo
  description: sample package
  version: devel
components:
  - name: podinfo
    required: true
";

    const BUNDLE: &str = "\
kind: UDSBundle
metadata:
  name: podinfo-test
  version: devel
packages:
  - name: uds-k3d-dev
    repository: ghcr.io/defenseunicorns/packages/uds-k3d
    ref: 0.9.0
  - name: podinfo
    path: ../
    ref: devel
";

    fn workspace() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PACKAGE_MANIFEST), ZARF).unwrap();
        fs::create_dir(dir.path().join("bundle")).unwrap();
        fs::write(dir.path().join(BUNDLE_MANIFEST), BUNDLE).unwrap();
        dir
    }

    #[test]
    fn package_name_and_version() {
        let dir = workspace();
        let pkg = PackageManifest::load(dir.path()).unwrap();
        assert_eq!(pkg.name().unwrap(), "podinfo");
        assert_eq!(pkg.version(), Some("devel"));
    }

    #[test]
    fn package_set_version_keeps_other_fields() {
        let dir = workspace();
        let mut pkg = PackageManifest::load(dir.path()).unwrap();
        pkg.set_version("1.0.0-uds.0").unwrap();
        pkg.save().unwrap();

        let reloaded = PackageManifest::load(dir.path()).unwrap();
        assert_eq!(reloaded.version(), Some("1.0.0-uds.0"));
        let text = fs::read_to_string(dir.path().join(PACKAGE_MANIFEST)).unwrap();
        assert!(text.contains("description: sample package"));
        assert!(text.contains("required: true"));
        assert!(text.starts_with("kind: ZarfPackageConfig"));
    }

    #[test]
    fn numeric_looking_version_stays_a_string() {
        let dir = workspace();
        let mut pkg = PackageManifest::load(dir.path()).unwrap();
        pkg.set_version("1.0").unwrap();
        pkg.save().unwrap();
        let reloaded = PackageManifest::load(dir.path()).unwrap();
        assert_eq!(reloaded.version(), Some("1.0"));
    }

    #[test]
    fn package_without_name_is_manifest_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PACKAGE_MANIFEST), "metadata:\n  version: devel\n").unwrap();
        let pkg = PackageManifest::load(dir.path()).unwrap();
        assert!(matches!(pkg.name(), Err(ReleaseError::Manifest { .. })));
    }

    #[test]
    fn missing_package_manifest_is_io_error_with_path() {
        let dir = tempdir().unwrap();
        let err = PackageManifest::load(dir.path()).unwrap_err();
        assert!(matches!(err, ReleaseError::Io { .. }));
        assert!(err.to_string().contains("zarf.yaml"));
    }

    #[test]
    fn scalar_document_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PACKAGE_MANIFEST), "just a string\n").unwrap();
        assert!(matches!(
            PackageManifest::load(dir.path()),
            Err(ReleaseError::Manifest { .. })
        ));
    }

    #[test]
    fn bundle_updates_only_matching_package() {
        let dir = workspace();
        let mut bundle = BundleManifest::load(dir.path()).unwrap();
        bundle.set_version("1.0.0-uds.0").unwrap();
        let updated = bundle.set_package_ref("podinfo", "1.0.0-uds.0").unwrap();
        assert_eq!(updated, 1);
        bundle.save().unwrap();

        let reloaded = BundleManifest::load(dir.path()).unwrap();
        assert_eq!(reloaded.version(), Some("1.0.0-uds.0"));
        assert_eq!(reloaded.package_ref("podinfo"), Some("1.0.0-uds.0"));
        assert_eq!(reloaded.package_ref("uds-k3d-dev"), Some("0.9.0"));
    }

    #[test]
    fn bundle_without_packages_updates_nothing() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("bundle")).unwrap();
        fs::write(dir.path().join(BUNDLE_MANIFEST), "metadata:\n  version: devel\n").unwrap();
        let mut bundle = BundleManifest::load(dir.path()).unwrap();
        assert_eq!(bundle.set_package_ref("podinfo", "1.0.0").unwrap(), 0);
    }

    #[test]
    fn set_version_creates_missing_metadata() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("bundle")).unwrap();
        fs::write(dir.path().join(BUNDLE_MANIFEST), "packages: []\n").unwrap();
        let mut bundle = BundleManifest::load(dir.path()).unwrap();
        bundle.set_version("2.0.0").unwrap();
        assert_eq!(bundle.version(), Some("2.0.0"));
    }
}
