use std::collections::HashSet;
use std::path::Path;

use crate::errors::{ReleaseError, Result};
use crate::models::{Flavor, ReleaseConfig};

/// File name of the release config inside the working directory.
pub const CONFIG_FILE: &str = "releaser.yaml";

/// Read and parse `<dir>/releaser.yaml`.
///
/// Duplicate flavor names are accepted; [`resolve_flavor`] returns the first
/// one, and a warning names the shadowed duplicates.
///
/// # Errors
///
/// Returns [`ReleaseError::ConfigNotFound`] if the file does not exist and
/// [`ReleaseError::ConfigParse`] if it is not a valid release config.
pub fn load_config(dir: &Path) -> Result<ReleaseConfig> {
    let path = dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReleaseError::ConfigNotFound { path });
        }
        Err(e) => return Err(ReleaseError::io(path, e)),
    };

    let config: ReleaseConfig =
        serde_yaml_ng::from_str(&content).map_err(|e| ReleaseError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

    let mut seen = HashSet::new();
    for flavor in &config.flavors {
        if !seen.insert(flavor.name.as_str()) {
            tracing::warn!(
                flavor = %flavor.name,
                "duplicate flavor in {}; the first definition wins",
                path.display()
            );
        }
    }
    tracing::debug!(path = %path.display(), flavors = config.flavors.len(), "loaded release config");

    Ok(config)
}

/// Find the first flavor whose name matches exactly (case-sensitive).
///
/// # Errors
///
/// Returns [`ReleaseError::FlavorNotFound`] when no flavor matches.
pub fn resolve_flavor<'a>(config: &'a ReleaseConfig, name: &str) -> Result<&'a Flavor> {
    config
        .flavors
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| ReleaseError::FlavorNotFound {
            name: name.to_string(),
        })
}

/// Load the config from `dir` and resolve `name` in one step.
pub fn load_flavor(dir: &Path, name: &str) -> Result<Flavor> {
    let config = load_config(dir)?;
    resolve_flavor(&config, name).cloned()
}
