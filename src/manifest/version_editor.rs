//! In-place version bumping for pubspec.yaml
//!
//! The file is human-maintained, so the edit is purely textual: the top-level
//! `version:` line is substituted and every other byte (comments, blank lines,
//! key order, indentation) is written back untouched. Round-tripping through
//! [`Pubspec`](super::pubspec::Pubspec) would drop comments.

use crate::core::error::PluginError;
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use std::path::Path;
use tokio::fs;

lazy_static! {
    /// Top-level `version:` declaration, anchored at column zero.
    /// CRLF mode keeps a trailing `\r` out of the match.
    static ref VERSION_LINE: Regex =
        Regex::new(r"(?mR)^version:[ \t]*.+$").expect("version pattern is valid");
}

/// Replace the value of every top-level `version:` line in `content`
///
/// Returns `None` when no such line exists.
pub fn replace_version(content: &str, new_version: &str) -> Option<String> {
    if !VERSION_LINE.is_match(content) {
        return None;
    }

    let replacement = format!("version: {}", new_version);
    Some(
        VERSION_LINE
            .replace_all(content, NoExpand(&replacement))
            .into_owned(),
    )
}

/// Rewrite the version declared in the pubspec at `path`
///
/// The file is left unmodified when no top-level `version:` line exists.
/// The write is a single full overwrite of `path`.
pub async fn update_version(path: impl AsRef<Path>, new_version: &str) -> Result<(), PluginError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| PluginError::ManifestNotFound {
            path: path.to_path_buf(),
            source,
        })?;

    let updated = replace_version(&content, new_version).ok_or_else(|| {
        PluginError::VersionFieldNotFound {
            path: path.to_path_buf(),
        }
    })?;

    write_manifest(path, &updated).await
}

/// Overwrite the manifest at `path` with `content`
pub(crate) async fn write_manifest(path: &Path, content: &str) -> Result<(), PluginError> {
    fs::write(path, content)
        .await
        .map_err(|source| PluginError::ManifestWrite {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::pubspec::parse_pubspec;
    use tempfile::TempDir;

    async fn write_and_update(content: &str, new_version: &str) -> (TempDir, Result<(), PluginError>) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pubspec.yaml");
        std::fs::write(&path, content).unwrap();
        let result = update_version(&path, new_version).await;
        (temp_dir, result)
    }

    fn read_back(temp_dir: &TempDir) -> String {
        std::fs::read_to_string(temp_dir.path().join("pubspec.yaml")).unwrap()
    }

    #[tokio::test]
    async fn test_simple_version_update() {
        let (dir, result) = write_and_update(
            "name: my_package\nversion: 1.0.0\ndescription: Test package\n",
            "2.0.0",
        )
        .await;

        result.unwrap();
        assert_eq!(
            read_back(&dir),
            "name: my_package\nversion: 2.0.0\ndescription: Test package\n"
        );
    }

    #[tokio::test]
    async fn test_build_number_version_update() {
        let (dir, result) = write_and_update(
            "name: my_app\nversion: 1.0.0+1\ndescription: Test app\n",
            "2.0.0+5",
        )
        .await;

        result.unwrap();
        assert_eq!(
            read_back(&dir),
            "name: my_app\nversion: 2.0.0+5\ndescription: Test app\n"
        );
    }

    #[tokio::test]
    async fn test_comments_and_blank_lines_preserved() {
        let original = "# Package metadata\nname: my_package\n\n# This is the package version\nversion: 1.0.0   # bumped by CI\n\ndependencies:\n  path: ^1.8.0\n";
        let (dir, result) = write_and_update(original, "3.0.0").await;

        result.unwrap();
        let updated = read_back(&dir);
        let before: Vec<&str> = original.split('\n').collect();
        let after: Vec<&str> = updated.split('\n').collect();

        assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after.iter()) {
            if old.starts_with("version:") {
                assert_eq!(*new, "version: 3.0.0");
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[tokio::test]
    async fn test_indented_version_is_not_top_level() {
        let original = "name: my_package\ndependencies:\n  foo:\n    version: 1.0.0\n";
        let (dir, result) = write_and_update(original, "2.0.0").await;

        assert!(matches!(result, Err(PluginError::VersionFieldNotFound { .. })));
        assert_eq!(read_back(&dir), original);
    }

    #[tokio::test]
    async fn test_missing_version_leaves_file_unmodified() {
        let original = "name: my_package\ndescription: Test package\n";
        let (dir, result) = write_and_update(original, "1.0.0").await;

        assert!(matches!(result, Err(PluginError::VersionFieldNotFound { .. })));
        assert_eq!(read_back(&dir), original);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = update_version(temp_dir.path().join("pubspec.yaml"), "1.0.0").await;
        assert!(matches!(result, Err(PluginError::ManifestNotFound { .. })));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("pubspec.yaml");

        let err = write_manifest(&path, "name: p\nversion: 2.0.0\n")
            .await
            .unwrap_err();

        assert!(matches!(err, PluginError::ManifestWrite { .. }));
        assert_eq!(err.code(), "MANIFEST_WRITE_ERROR");
        assert!(err.to_string().starts_with("failed to write "));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_updated_manifest_parses_with_new_version() {
        let (dir, result) = write_and_update(
            "name: p\n# the version\nversion: 1.0.0\nenvironment:\n  sdk: '>=3.0.0'\n",
            "2.0.0",
        )
        .await;

        result.unwrap();
        let pubspec = parse_pubspec(dir.path().join("pubspec.yaml")).await.unwrap();
        assert_eq!(pubspec.version, "2.0.0");
        assert_eq!(pubspec.name, "p");
    }

    #[test]
    fn test_crlf_line_endings_preserved() {
        let updated = replace_version("name: p\r\nversion: 1.0.0\r\nx: y\r\n", "1.1.0").unwrap();
        assert_eq!(updated, "name: p\r\nversion: 1.1.0\r\nx: y\r\n");
    }

    #[test]
    fn test_replacement_is_literal() {
        let updated = replace_version("version: 1.0.0\n", "$1.0.0").unwrap();
        assert_eq!(updated, "version: $1.0.0\n");
    }

    #[test]
    fn test_every_matching_line_replaced() {
        let updated = replace_version("version: 1.0.0\nversion: 0.9.0\n", "2.0.0").unwrap();
        assert_eq!(updated, "version: 2.0.0\nversion: 2.0.0\n");
    }
}
