//! Sandboxed path handling for the output tree.
//!
//! Model-chosen file paths are untrusted. Every write goes through
//! [`SandboxRoot::join`], which rejects absolute paths, `..` traversal and
//! (by default) symlinks, so nothing lands outside the output root.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during sandbox path validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// The sandbox root path does not exist
    #[error("Sandbox root does not exist: {path}")]
    RootNotFound { path: String },

    /// The sandbox root path is not a directory
    #[error("Sandbox root is not a directory: {path}")]
    RootNotDirectory { path: String },

    /// Failed to canonicalize the sandbox root path
    #[error("Failed to canonicalize sandbox root '{path}': {reason}")]
    RootCanonicalizationFailed { path: String, reason: String },

    /// Path contains ".." traversal components
    #[error("Path contains parent directory traversal: {path}")]
    ParentTraversal { path: String },

    /// Path is absolute
    #[error("Absolute path not allowed: {path}")]
    AbsolutePath { path: String },

    /// Path resolves outside the sandbox root
    #[error("Path escapes sandbox root: {path} resolves outside {root}")]
    EscapeAttempt { path: String, root: String },

    /// Path is or contains a symlink (when symlinks are not allowed)
    #[error("Symlink not allowed: {path}")]
    SymlinkNotAllowed { path: String },

    /// Failed to canonicalize the joined path
    #[error("Failed to canonicalize path '{path}': {reason}")]
    PathCanonicalizationFailed { path: String, reason: String },
}

/// Configuration for sandbox path validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SandboxConfig {
    /// Whether to allow symlinks within the sandbox
    pub allow_symlinks: bool,
}

/// A validated root directory for sandboxed operations.
///
/// The root is canonicalized at construction; joined paths cannot escape it.
///
/// ```rust,no_run
/// use archsmith_utils::paths::SandboxRoot;
///
/// let root = SandboxRoot::new_default("output")?;
/// let file = root.join("backend/app/main.py")?;
/// println!("{}", file.as_path().display());
/// # Ok::<(), archsmith_utils::paths::SandboxError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    root: PathBuf,
    config: SandboxConfig,
}

impl SandboxRoot {
    /// Create a new sandbox root from an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, is not a directory, or
    /// cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>, config: SandboxConfig) -> Result<Self, SandboxError> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(SandboxError::RootNotFound {
                path: root_path.display().to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(SandboxError::RootNotDirectory {
                path: root_path.display().to_string(),
            });
        }

        let canonical =
            root_path
                .canonicalize()
                .map_err(|e| SandboxError::RootCanonicalizationFailed {
                    path: root_path.display().to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self {
            root: canonical,
            config,
        })
    }

    /// Create a sandbox root that rejects symlinks.
    pub fn new_default(root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        Self::new(root, SandboxConfig::default())
    }

    /// Join a relative path, validating it stays within the sandbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is absolute, contains `..`, escapes the
    /// root once resolved, or crosses a symlink while symlinks are disallowed.
    pub fn join(&self, rel: impl AsRef<Path>) -> Result<SandboxPath, SandboxError> {
        let rel_path = rel.as_ref();

        if rel_path.is_absolute() || rel_path.has_root() {
            return Err(SandboxError::AbsolutePath {
                path: rel_path.display().to_string(),
            });
        }

        if rel_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(SandboxError::ParentTraversal {
                path: rel_path.display().to_string(),
            });
        }

        let full_path = self.root.join(rel_path);

        if !self.config.allow_symlinks {
            self.check_symlinks_below_root(rel_path)?;
        }

        if full_path.exists() {
            let canonical =
                full_path
                    .canonicalize()
                    .map_err(|e| SandboxError::PathCanonicalizationFailed {
                        path: full_path.display().to_string(),
                        reason: e.to_string(),
                    })?;

            if !canonical.starts_with(&self.root) {
                return Err(SandboxError::EscapeAttempt {
                    path: rel_path.display().to_string(),
                    root: self.root.display().to_string(),
                });
            }

            Ok(SandboxPath {
                full: canonical,
                rel: rel_path.to_path_buf(),
            })
        } else {
            self.validate_ancestor_within_sandbox(&full_path, rel_path)?;
            Ok(SandboxPath {
                full: full_path,
                rel: rel_path.to_path_buf(),
            })
        }
    }

    /// Reject symlinks on the path between the root and the target.
    ///
    /// The root itself is already canonical, so only the relative part is walked.
    fn check_symlinks_below_root(&self, rel_path: &Path) -> Result<(), SandboxError> {
        let mut current = self.root.clone();

        for component in rel_path.components() {
            current.push(component);

            if current
                .symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false)
            {
                return Err(SandboxError::SymlinkNotAllowed {
                    path: current.display().to_string(),
                });
            }
        }

        Ok(())
    }

    /// The nearest existing ancestor of a new path must resolve inside the root.
    fn validate_ancestor_within_sandbox(
        &self,
        full_path: &Path,
        rel_path: &Path,
    ) -> Result<(), SandboxError> {
        let mut ancestor = full_path.to_path_buf();
        while !ancestor.exists() {
            if !ancestor.pop() {
                return Ok(());
            }
        }

        let canonical_ancestor =
            ancestor
                .canonicalize()
                .map_err(|e| SandboxError::PathCanonicalizationFailed {
                    path: ancestor.display().to_string(),
                    reason: e.to_string(),
                })?;

        if !canonical_ancestor.starts_with(&self.root) {
            return Err(SandboxError::EscapeAttempt {
                path: rel_path.display().to_string(),
                root: self.root.display().to_string(),
            });
        }

        Ok(())
    }

    /// Get the canonicalized root path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.root
    }
}

/// A path that has been validated to be within a `SandboxRoot`.
///
/// Only [`SandboxRoot::join()`] constructs one.
#[derive(Debug, Clone)]
pub struct SandboxPath {
    full: PathBuf,
    rel: PathBuf,
}

impl SandboxPath {
    /// Full path for I/O.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.full
    }

    /// Relative path rendered with forward slashes.
    #[must_use]
    pub fn relative_display(&self) -> String {
        to_forward_slash(&self.rel)
    }
}

impl AsRef<Path> for SandboxPath {
    fn as_ref(&self) -> &Path {
        &self.full
    }
}

/// Render a relative path with `/` separators on every platform.
#[must_use]
pub fn to_forward_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Create a directory and all parents; an existing directory is not an error.
pub fn ensure_dir_all<P: AsRef<Path>>(p: P) -> std::io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && p.as_ref().is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_join_accepts_nested_relative_path() {
        let temp = TempDir::new().unwrap();
        let root = SandboxRoot::new_default(temp.path()).unwrap();

        let joined = root.join("backend/app/main.py").unwrap();
        assert!(joined.as_path().starts_with(root.as_path()));
        assert_eq!(joined.relative_display(), "backend/app/main.py");
    }

    #[test]
    fn test_join_rejects_parent_traversal() {
        let temp = TempDir::new().unwrap();
        let root = SandboxRoot::new_default(temp.path()).unwrap();

        let err = root.join("backend/../../etc/passwd").unwrap_err();
        assert!(matches!(err, SandboxError::ParentTraversal { .. }));
    }

    #[test]
    fn test_join_rejects_absolute_path() {
        let temp = TempDir::new().unwrap();
        let root = SandboxRoot::new_default(temp.path()).unwrap();

        let absolute = temp.path().join("x.txt");
        let err = root.join(&absolute).unwrap_err();
        assert!(matches!(err, SandboxError::AbsolutePath { .. }));
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = SandboxRoot::new_default(temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, SandboxError::RootNotFound { .. }));
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let err = SandboxRoot::new_default(&file).unwrap_err();
        assert!(matches!(err, SandboxError::RootNotDirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_join_rejects_symlinked_directory() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("backend")).unwrap();

        let root = SandboxRoot::new_default(temp.path()).unwrap();
        let err = root.join("backend/leak.py").unwrap_err();
        assert!(matches!(err, SandboxError::SymlinkNotAllowed { .. }));

        // Allowing symlinks still keeps the resolved path inside the root
        let config = SandboxConfig {
            allow_symlinks: true,
        };
        let permissive = SandboxRoot::new(temp.path(), config).unwrap();
        let err = permissive.join("backend/leak.py").unwrap_err();
        assert!(matches!(err, SandboxError::EscapeAttempt { .. }));
    }

    #[test]
    fn test_to_forward_slash_drops_cur_dir() {
        let path = Path::new("./frontend").join("src").join("App.tsx");
        assert_eq!(to_forward_slash(&path), "frontend/src/App.tsx");
    }

    #[test]
    fn test_ensure_dir_all_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        ensure_dir_all(&nested).unwrap();
        ensure_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
