//! The `filelist.json` model and its resolution against the repository root.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ManifestError;

/// Name of the manifest file inside every module directory.
pub const MANIFEST_FILE: &str = "filelist.json";

/// A module manifest as authored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Name of the top-level hardware entity.
    pub top: String,
    /// Source files, repository-root-relative and forward-slash separated.
    pub files: Vec<String>,
}

/// A manifest whose sources have been made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    /// Name of the top-level hardware entity.
    pub top: String,
    /// Absolute source paths, in manifest order.
    pub sources: Vec<PathBuf>,
}

impl Manifest {
    /// Reads and validates `<module_dir>/filelist.json`.
    pub fn load(module_dir: &Path) -> Result<Self, ManifestError> {
        let path = module_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            ManifestError::ManifestNotFound {
                path: path.clone(),
                source,
            }
        })?;
        Self::from_json(&content, &path)
    }

    /// Parses and validates manifest JSON; `path` is only used in errors.
    pub fn from_json(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let malformed = |reason: String| ManifestError::ManifestMalformed {
            path: path.to_path_buf(),
            reason,
        };
        let manifest: Manifest = serde_json::from_str(content).map_err(|e| malformed(e.to_string()))?;
        if manifest.top.trim().is_empty() {
            return Err(malformed("`top` must be a non-empty string".to_string()));
        }
        if manifest.files.is_empty() {
            return Err(malformed("`files` must list at least one source".to_string()));
        }
        if let Some(file) = manifest
            .files
            .iter()
            .find(|f| f.starts_with('/') || Path::new(f.as_str()).is_absolute())
        {
            return Err(malformed(format!(
                "`{file}` is absolute; sources are relative to the repository root"
            )));
        }
        Ok(manifest)
    }

    /// Joins every listed file to `repo_root`, keeping manifest order.
    pub fn sources(&self, repo_root: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|file| {
                file.split('/')
                    .filter(|part| !part.is_empty())
                    .fold(repo_root.to_path_buf(), |acc, part| acc.join(part))
            })
            .collect()
    }

    /// Resolves this manifest against `repo_root`.
    pub fn resolve(self, repo_root: &Path) -> ResolvedManifest {
        let sources = self.sources(repo_root);
        ResolvedManifest {
            top: self.top,
            sources,
        }
    }
}

/// Reads the manifest of `module_dir` and resolves its sources against `repo_root`.
pub fn resolve_module(repo_root: &Path, module_dir: &Path) -> Result<ResolvedManifest, ManifestError> {
    let resolved = Manifest::load(module_dir)?.resolve(repo_root);
    debug!(
        module = %module_dir.display(),
        top = %resolved.top,
        sources = resolved.sources.len(),
        "resolved module manifest"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::write(dir.join(MANIFEST_FILE), json).unwrap();
    }

    #[test]
    fn resolves_sources_against_root() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), r#"{"top": "t", "files": ["a/b.ext"]}"#);
        let root = Path::new("/repo");
        let resolved = resolve_module(root, tmp.path()).unwrap();
        assert_eq!(resolved.top, "t");
        assert_eq!(resolved.sources, vec![PathBuf::from("/repo/a/b.ext")]);
    }

    #[test]
    fn preserves_manifest_order() {
        let manifest = Manifest::from_json(
            r#"{"top": "hello", "files": ["z/last.sv", "a/first.sv", "m/mid.v"]}"#,
            Path::new("filelist.json"),
        )
        .unwrap();
        let sources = manifest.sources(Path::new("/r"));
        assert_eq!(
            sources,
            vec![
                PathBuf::from("/r/z/last.sv"),
                PathBuf::from("/r/a/first.sv"),
                PathBuf::from("/r/m/mid.v"),
            ]
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = Manifest::load(tmp.path()).unwrap_err();
        match err {
            ManifestError::ManifestNotFound { path, .. } => {
                assert_eq!(path, tmp.path().join(MANIFEST_FILE));
            }
            other => panic!("expected ManifestNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_top_is_malformed() {
        let err = Manifest::from_json(r#"{"files": ["a.sv"]}"#, Path::new("f.json")).unwrap_err();
        match err {
            ManifestError::ManifestMalformed { reason, .. } => assert!(reason.contains("top")),
            other => panic!("expected ManifestMalformed, got {other:?}"),
        }
    }

    #[test]
    fn missing_files_is_malformed() {
        let err = Manifest::from_json(r#"{"top": "t"}"#, Path::new("f.json")).unwrap_err();
        assert!(matches!(err, ManifestError::ManifestMalformed { .. }));
    }

    #[test]
    fn empty_top_is_malformed() {
        let err =
            Manifest::from_json(r#"{"top": " ", "files": ["a.sv"]}"#, Path::new("f.json")).unwrap_err();
        assert!(matches!(err, ManifestError::ManifestMalformed { .. }));
    }

    #[test]
    fn empty_files_is_malformed() {
        let err = Manifest::from_json(r#"{"top": "t", "files": []}"#, Path::new("f.json")).unwrap_err();
        assert!(matches!(err, ManifestError::ManifestMalformed { .. }));
    }

    #[test]
    fn absolute_entry_is_malformed() {
        let err = Manifest::from_json(
            r#"{"top": "t", "files": ["rtl/a.sv", "/abs/x.v"]}"#,
            Path::new("f.json"),
        )
        .unwrap_err();
        match err {
            ManifestError::ManifestMalformed { reason, .. } => assert!(reason.contains("/abs/x.v")),
            other => panic!("expected ManifestMalformed, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_malformed() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "{ top: ");
        let err = Manifest::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::ManifestMalformed { .. }));
    }
}
