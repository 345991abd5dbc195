//! Filesystem checks, injectable for tests.

use std::path::Path;

use super::types::AttemptOutcome;

/// Decides whether a candidate path is a usable executable.
pub trait FsProvider: Send + Sync {
    fn check_executable(&self, path: &Path) -> AttemptOutcome;
}

/// Checks against the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFs;

impl FsProvider for SystemFs {
    fn check_executable(&self, path: &Path) -> AttemptOutcome {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return AttemptOutcome::NotFound;
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return AttemptOutcome::PermissionDenied;
            }
            Err(e) => return AttemptOutcome::IoError(e.to_string()),
        };

        if !metadata.is_file() {
            return AttemptOutcome::NotAFile;
        }

        // Windows has no execute bit; any regular file passes.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return AttemptOutcome::NotExecutable;
            }
        }

        AttemptOutcome::Ok
    }
}

/// Predefined answers for tests. Unknown paths report `NotFound`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default, Clone)]
pub struct MockFs {
    executables: std::collections::HashSet<std::path::PathBuf>,
    non_executables: std::collections::HashSet<std::path::PathBuf>,
    checked: std::sync::Arc<std::sync::Mutex<Vec<std::path::PathBuf>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_executable(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.executables.insert(path.into());
        self
    }

    #[must_use]
    pub fn with_non_executable(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.non_executables.insert(path.into());
        self
    }

    /// Every path passed to `check_executable`, in call order.
    pub fn checked(&self) -> Vec<std::path::PathBuf> {
        self.checked
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl FsProvider for MockFs {
    fn check_executable(&self, path: &Path) -> AttemptOutcome {
        if let Ok(mut checked) = self.checked.lock() {
            checked.push(path.to_path_buf());
        }
        if self.executables.contains(path) {
            AttemptOutcome::Ok
        } else if self.non_executables.contains(path) {
            AttemptOutcome::NotExecutable
        } else {
            AttemptOutcome::NotFound
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn system_fs_classifies_paths() {
        let dir = tempfile::tempdir().unwrap();

        let exe = dir.path().join("siril");
        std::fs::write(&exe, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let plain = dir.path().join("notes.txt");
        std::fs::write(&plain, "hello").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(SystemFs.check_executable(&exe), AttemptOutcome::Ok);
        assert_eq!(
            SystemFs.check_executable(&plain),
            AttemptOutcome::NotExecutable
        );
        assert_eq!(SystemFs.check_executable(dir.path()), AttemptOutcome::NotAFile);
        assert_eq!(
            SystemFs.check_executable(&dir.path().join("missing")),
            AttemptOutcome::NotFound
        );
    }
}
