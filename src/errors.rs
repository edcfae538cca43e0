use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving flavors, editing manifests,
/// generating schemas, or publishing releases.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// `releaser.yaml` does not exist in the configured directory.
    #[error("release config not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// `releaser.yaml` exists but is not a valid release config.
    #[error("cannot parse release config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// No flavor with the requested name exists in the release config.
    #[error("flavor not found: {name}")]
    FlavorNotFound { name: String },

    /// The version is already tagged; there is nothing to release.
    #[error("no release necessary: tag {tag} already exists")]
    TagAlreadyExists { tag: String },

    /// A required credential environment variable is unset or empty.
    #[error("{var} is unset or empty")]
    MissingCredential { var: String },

    /// A repository remote URL could not be mapped to a platform address.
    #[error("cannot parse remote URL: {url}")]
    UnparsableRemote { url: String },

    /// The release platform rejected a request or could not be reached.
    #[error("{platform} error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Platform {
        platform: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// A values document or persisted schema could not be loaded.
    #[error("cannot load schema input {}: {message}", path.display())]
    SchemaLoad { path: PathBuf, message: String },

    /// A custom schema fragment could not be loaded.
    #[error("cannot load custom schema '{name}': {message}")]
    OverlayLoad { name: String, message: String },

    /// A package or bundle manifest is missing an expected field or is malformed.
    #[error("invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// A source-control query failed.
    #[error("git error: {message}")]
    Git { message: String },

    /// Filesystem I/O error, with the path it happened on.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReleaseError::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for the expected "already tagged" outcome, which automation
    /// should treat as a skip rather than a failure.
    #[must_use]
    pub fn is_no_release_necessary(&self) -> bool {
        matches!(self, ReleaseError::TagAlreadyExists { .. })
    }
}

/// Convenience alias for `Result<T, ReleaseError>`.
pub type Result<T> = std::result::Result<T, ReleaseError>;
