use std::path::Path;

use flavorkit::schema::{build_schema, diff, SchemaCheck};
use flavorkit::{ReleaseError, SchemaRegistry, SchemaStatus};

/// Embedded fragments, overridden by any found in `schemas_dir`.
fn registry(schemas_dir: Option<&Path>) -> Result<SchemaRegistry, ReleaseError> {
    let mut registry = SchemaRegistry::embedded()?;
    if let Some(dir) = schemas_dir {
        registry.extend(SchemaRegistry::from_dir(dir)?);
    }
    Ok(registry)
}

pub(crate) fn run_generate(base_dir: &Path, schemas_dir: Option<&Path>) {
    let written = registry(schemas_dir)
        .and_then(|r| flavorkit::generate_schemas(base_dir, &r));
    match written {
        Ok(paths) => {
            for path in &paths {
                println!("{}", path.display());
            }
        }
        Err(e) => super::fail("schema generate", &e),
    }
}

pub(crate) fn run_validate(base_dir: &Path, schemas_dir: Option<&Path>, unified: bool) {
    let registry = match registry(schemas_dir) {
        Ok(r) => r,
        Err(e) => super::fail("schema validate", &e),
    };
    let report = match flavorkit::check_schemas(base_dir, &registry) {
        Ok(r) => r,
        Err(e) => super::fail("schema validate", &e),
    };

    for check in report.failures() {
        match &check.status {
            SchemaStatus::Missing => {
                println!("{}: schema not found", check.schema_path.display());
            }
            SchemaStatus::Mismatch { diff } if !unified => {
                println!("{}:", check.schema_path.display());
                print!("{diff}");
            }
            SchemaStatus::Mismatch { .. } => match line_diff(check, &registry) {
                Ok(text) => print!("{text}"),
                Err(e) => super::fail("schema validate", &e),
            },
            SchemaStatus::Match => {}
        }
    }

    if report.all_match() {
        println!("All schemas match.");
    } else {
        println!("Schema differences found.");
        std::process::exit(1);
    }
}

/// Unified diff of the committed file against its canonical regeneration.
fn line_diff(check: &SchemaCheck, registry: &SchemaRegistry) -> Result<String, ReleaseError> {
    let committed = std::fs::read_to_string(&check.schema_path)
        .map_err(|e| ReleaseError::io(&check.schema_path, e))?;
    let generated = build_schema(&check.values_path, registry)?.to_canonical_string();
    Ok(diff::unified_diff(
        &committed,
        &generated,
        &check.schema_path.display().to_string(),
    ))
}
