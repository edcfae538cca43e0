pub mod config;
pub mod errors;
pub(crate) mod fs_util;
pub mod git;
pub mod manifest;
pub mod models;
pub mod platforms;
pub mod schema;
pub mod version;

// Re-export key types at crate root for convenience.
pub use config::{load_config, load_flavor, resolve_flavor, CONFIG_FILE};
pub use errors::{ReleaseError, Result};
pub use fs_util::find_files;
pub use git::{GitCli, SourceControl};
pub use models::{Flavor, ReleaseConfig};
pub use platforms::{load_and_tag, GitHub, GitLab, Platform, ReleaseOutcome};
pub use schema::{check_schemas, generate_schemas, CheckReport, SchemaRegistry, SchemaStatus};
pub use version::{mutate_manifests, update_manifests, Mutation};
