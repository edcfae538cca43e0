//! Symlink-safe filesystem helpers.
//!
//! Discovery uses `symlink_metadata()` so a symlinked directory cannot pull
//! files from outside the base directory into a batch run. Writes go through
//! a temp file in the target directory and a rename, so a failed write never
//! leaves a half-written manifest or schema behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{ReleaseError, Result};

/// Returns `true` if the path is a regular file (not a symlink).
#[must_use]
pub(crate) fn is_regular_file(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_file())
        .unwrap_or(false)
}

/// Returns `true` if the path is a regular directory (not a symlink).
#[must_use]
pub(crate) fn is_regular_dir(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

/// Recursively collect every regular file named `file_name` under `base`.
///
/// Results are sorted so batch output is stable across platforms.
///
/// # Errors
///
/// Returns an I/O error if `base` or any directory below it cannot be read.
pub fn find_files(base: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !is_regular_dir(base) {
        return Err(ReleaseError::io(
            base,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }
    walk(base, file_name, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| ReleaseError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ReleaseError::io(dir, e))?;
        let path = entry.path();
        if is_regular_dir(&path) {
            walk(&path, file_name, found)?;
        } else if is_regular_file(&path) && entry.file_name() == file_name {
            found.push(path);
        }
    }
    Ok(())
}

/// Replace `path` with `contents` via a temp file and rename.
///
/// An existing file keeps its permissions. New files get the process default
/// for a regular file (0644 on Unix).
///
/// # Errors
///
/// Returns an I/O error carrying `path` if any step fails; the original file
/// is left untouched in that case.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok().map(|m| m.permissions());

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| ReleaseError::io(path, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.flush())
        .map_err(|e| ReleaseError::io(path, e))?;

    let permissions = match existing {
        Some(p) => p,
        None => default_permissions(&tmp)?,
    };
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| ReleaseError::io(path, e))?;

    tmp.persist(path).map_err(|e| ReleaseError::io(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions(_tmp: &tempfile::NamedTempFile) -> Result<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(tmp: &tempfile::NamedTempFile) -> Result<fs::Permissions> {
    tmp.as_file()
        .metadata()
        .map(|m| m.permissions())
        .map_err(|e| ReleaseError::io(tmp.path(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn is_regular_file_true_for_regular_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("values.yaml");
        fs::write(&file, "a: 1").unwrap();
        assert!(is_regular_file(&file));
        assert!(!is_regular_dir(&file));
    }

    #[test]
    fn is_regular_file_false_for_nonexistent() {
        assert!(!is_regular_file(Path::new("/nonexistent/values.yaml")));
    }

    #[cfg(unix)]
    #[test]
    fn is_regular_dir_false_for_symlink_to_dir() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target_dir");
        fs::create_dir(&target).unwrap();
        let link = dir.path().join("link_dir");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        assert!(!is_regular_dir(&link));
    }

    #[test]
    fn find_files_walks_nested_dirs_sorted() {
        let dir = tempdir().unwrap();
        let b = dir.path().join("b/chart");
        let a = dir.path().join("a");
        fs::create_dir_all(&b).unwrap();
        fs::create_dir_all(&a).unwrap();
        fs::write(b.join("values.yaml"), "x: 1").unwrap();
        fs::write(a.join("values.yaml"), "x: 1").unwrap();
        fs::write(a.join("other.yaml"), "x: 1").unwrap();

        let found = find_files(dir.path(), "values.yaml").unwrap();
        assert_eq!(found, vec![a.join("values.yaml"), b.join("values.yaml")]);
    }

    #[cfg(unix)]
    #[test]
    fn find_files_does_not_follow_symlinked_dirs() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("values.yaml"), "x: 1").unwrap();
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();

        let found = find_files(dir.path(), "values.yaml").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn find_files_missing_base_is_error() {
        let dir = tempdir().unwrap();
        assert!(find_files(&dir.path().join("nope"), "values.yaml").is_err());
    }

    #[test]
    fn write_atomic_replaces_contents() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("zarf.yaml");
        fs::write(&file, "old").unwrap();
        write_atomic(&file, b"new").unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let file = dir.path().join("zarf.yaml");
        fs::write(&file, "old").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o600)).unwrap();

        write_atomic(&file, b"new").unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let file = dir.path().join("values.schema.json");
        write_atomic(&file, b"{}").unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn write_atomic_missing_parent_is_error_with_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("missing/zarf.yaml");
        let err = write_atomic(&file, b"x").unwrap_err();
        assert!(err.to_string().contains("zarf.yaml"));
    }
}
