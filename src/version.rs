//! Rewriting manifest versions for a flavor.
//!
//! A mutation first checks whether the flavor's tag already exists. If it
//! does, nothing is written and the caller gets
//! [`ReleaseError::TagAlreadyExists`]. Otherwise the package manifest and
//! then the bundle manifest are rewritten. The two writes are independent:
//! if the bundle step fails, the package manifest keeps its new version.

use std::path::Path;

use crate::errors::{ReleaseError, Result};
use crate::git::SourceControl;
use crate::manifest::{BundleManifest, PackageManifest};
use crate::models::Flavor;

/// What a successful rewrite changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// `metadata.name` of the package manifest.
    pub package_name: String,
    /// The version written to both manifests.
    pub version: String,
    /// Number of bundle package entries whose `ref` was updated.
    pub bundle_refs_updated: usize,
}

/// Check the flavor's tag, then rewrite both manifests under `dir`.
///
/// # Errors
///
/// Returns [`ReleaseError::TagAlreadyExists`] when the tag
/// `{version}-{name}` exists, or any error from the source-control query or
/// the manifest rewrite.
pub fn mutate_manifests(dir: &Path, flavor: &Flavor, scm: &dyn SourceControl) -> Result<Mutation> {
    let tag = flavor.tag_name();
    if scm.tag_exists(&tag)? {
        tracing::info!(%tag, "version is already tagged; no release necessary");
        return Err(ReleaseError::TagAlreadyExists { tag });
    }
    tracing::info!(%tag, "version is not tagged; updating package and bundle manifests");
    update_manifests(dir, flavor)
}

/// Rewrite both manifests under `dir` without consulting source control.
pub fn update_manifests(dir: &Path, flavor: &Flavor) -> Result<Mutation> {
    let package_name = update_package(dir, &flavor.version)?;
    let bundle_refs_updated = update_bundle(dir, &flavor.version, &package_name)?;
    Ok(Mutation {
        package_name,
        version: flavor.version.clone(),
        bundle_refs_updated,
    })
}

fn update_package(dir: &Path, version: &str) -> Result<String> {
    let mut package = PackageManifest::load(dir)?;
    let name = package.name()?.to_string();
    package.set_version(version)?;
    package.save()?;
    tracing::info!(path = %package.path().display(), %version, "updated package manifest");
    Ok(name)
}

fn update_bundle(dir: &Path, version: &str, package_name: &str) -> Result<usize> {
    let mut bundle = BundleManifest::load(dir)?;
    bundle.set_version(version)?;
    let updated = bundle.set_package_ref(package_name, version)?;
    if updated == 0 {
        tracing::warn!(
            package = %package_name,
            "bundle does not reference the package; only the bundle version was updated"
        );
    }
    bundle.save()?;
    tracing::info!(path = %bundle.path().display(), %version, "updated bundle manifest");
    Ok(updated)
}
