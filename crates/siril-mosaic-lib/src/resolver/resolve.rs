//! Resolution order and the reusable [`Locator`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::env::{EnvProvider, SystemEnv};
use super::fs::{FsProvider, SystemFs};
use super::types::{
    Attempt, AttemptOutcome, OverrideOrigin, Platform, Resolution, ResolveError, Strategy,
    WellKnownLocation,
};

/// Environment variable naming an explicit Siril executable.
pub const OVERRIDE_ENV_VAR: &str = "SIRIL_BINARY";

/// Command name looked up on `PATH`.
pub const SIRIL_COMMAND: &str = "siril";

/// Fallback install locations, probed in order on every host.
pub const WELL_KNOWN_LOCATIONS: &[WellKnownLocation] = &[
    WellKnownLocation {
        platform: Platform::MacOsBundle,
        path: "/Applications/Siril.app/Contents/MacOS/Siril",
    },
    WellKnownLocation {
        platform: Platform::UnixPrefix,
        path: "/usr/local/bin/siril",
    },
    WellKnownLocation {
        platform: Platform::Homebrew,
        path: "/opt/homebrew/bin/siril",
    },
    WellKnownLocation {
        platform: Platform::Linux,
        path: "/usr/bin/siril",
    },
    WellKnownLocation {
        platform: Platform::Wsl,
        path: "/mnt/c/Program Files/Siril/siril.exe",
    },
    WellKnownLocation {
        platform: Platform::Wsl,
        path: "/mnt/c/Program Files (x86)/Siril/siril.exe",
    },
];

/// Resolve the Siril executable against the real environment and filesystem.
pub fn resolve_siril(explicit: Option<&Path>) -> Result<Resolution, ResolveError> {
    resolve_siril_with_deps(explicit, &SystemEnv, &SystemFs, WELL_KNOWN_LOCATIONS)
}

/// Resolve with injected dependencies.
pub fn resolve_siril_with_deps(
    explicit: Option<&Path>,
    env: &dyn EnvProvider,
    fs: &dyn FsProvider,
    well_known: &[WellKnownLocation],
) -> Result<Resolution, ResolveError> {
    // Empty strings come through from tool arguments and blank env vars.
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return check_override(&absolutize(path), OverrideOrigin::Argument, fs);
    }

    if let Some(value) = env.get(OVERRIDE_ENV_VAR).filter(|v| !v.is_empty()) {
        return check_override(
            &absolutize(Path::new(&value)),
            OverrideOrigin::Environment,
            fs,
        );
    }

    let mut attempts = Vec::new();

    if let Some(path_var) = env.get("PATH") {
        let names = command_variants(env);
        for dir in search_dirs(&path_var) {
            for name in &names {
                if record(&mut attempts, dir.join(name), fs) {
                    return Ok(finish(attempts, Strategy::SearchPath));
                }
            }
        }
    }

    for location in well_known {
        if record(&mut attempts, PathBuf::from(location.path), fs) {
            return Ok(finish(attempts, Strategy::WellKnown(location.platform)));
        }
    }

    Err(ResolveError::not_found(&attempts))
}

fn check_override(
    path: &Path,
    origin: OverrideOrigin,
    fs: &dyn FsProvider,
) -> Result<Resolution, ResolveError> {
    let outcome = fs.check_executable(path);
    debug!(candidate = %path.display(), %outcome, ?origin, "checked Siril override");
    if outcome != AttemptOutcome::Ok {
        return Err(ResolveError::InvalidOverride {
            origin,
            path: path.to_path_buf(),
            outcome,
        });
    }

    let strategy = match origin {
        OverrideOrigin::Argument => Strategy::Explicit,
        OverrideOrigin::Environment => Strategy::Environment,
    };
    Ok(Resolution {
        path: path.to_path_buf(),
        strategy,
        attempts: vec![Attempt {
            candidate: path.to_path_buf(),
            outcome,
        }],
    })
}

/// Check one candidate and append it to the attempt log. Returns true on a hit.
fn record(attempts: &mut Vec<Attempt>, candidate: PathBuf, fs: &dyn FsProvider) -> bool {
    let outcome = fs.check_executable(&candidate);
    debug!(candidate = %candidate.display(), %outcome, "checked Siril candidate");
    let hit = outcome == AttemptOutcome::Ok;
    attempts.push(Attempt { candidate, outcome });
    hit
}

fn finish(attempts: Vec<Attempt>, strategy: Strategy) -> Resolution {
    let path = attempts
        .last()
        .map(|a| a.candidate.clone())
        .unwrap_or_default();
    Resolution {
        path,
        strategy,
        attempts,
    }
}

/// Absolute form of `path`, anchored at the current directory. Children are
/// spawned with their own working directory, so a relative path would
/// resolve differently there.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn search_dirs(path_var: &OsString) -> Vec<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|d| !d.as_os_str().is_empty())
        .map(|d| absolutize(&d))
        .collect()
}

/// File names to try in each `PATH` directory: the bare command, then one per
/// `PATHEXT` extension (e.g. `siril` -> `siril.exe`). Without `PATHEXT`,
/// Windows falls back to its usual executable extensions.
fn command_variants(env: &dyn EnvProvider) -> Vec<String> {
    let mut variants = vec![SIRIL_COMMAND.to_string()];
    match env.get("PATHEXT") {
        Some(pathext) => {
            let pathext = pathext.to_string_lossy();
            variants.extend(
                pathext
                    .split(';')
                    .filter(|ext| !ext.is_empty())
                    .map(|ext| format!("{SIRIL_COMMAND}{}", ext.to_ascii_lowercase())),
            );
        }
        None if cfg!(windows) => {
            variants.extend(
                [".exe", ".cmd", ".bat", ".com"].map(|ext| format!("{SIRIL_COMMAND}{ext}")),
            );
        }
        None => {}
    }
    variants
}

/// Resolver configuration that can be cloned into long-lived services.
///
/// Nothing is cached: every [`Locator::locate`] call repeats the full lookup
/// so changes to the environment or filesystem are picked up.
#[derive(Clone)]
pub struct Locator {
    explicit: Option<PathBuf>,
    env: Arc<dyn EnvProvider>,
    fs: Arc<dyn FsProvider>,
    well_known: Arc<[WellKnownLocation]>,
}

impl Default for Locator {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator")
            .field("explicit", &self.explicit)
            .field("well_known", &self.well_known.len())
            .finish_non_exhaustive()
    }
}

impl Locator {
    /// Locator over the real environment, filesystem and install list.
    pub fn system() -> Self {
        Self {
            explicit: None,
            env: Arc::new(SystemEnv),
            fs: Arc::new(SystemFs),
            well_known: Arc::from(WELL_KNOWN_LOCATIONS),
        }
    }

    #[must_use]
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    #[must_use]
    pub fn with_env(mut self, env: impl EnvProvider + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    #[must_use]
    pub fn with_fs(mut self, fs: impl FsProvider + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    /// Check a single path with this locator's filesystem view.
    pub fn check_executable(&self, path: &Path) -> AttemptOutcome {
        self.fs.check_executable(path)
    }

    /// Run the full resolution order.
    pub fn locate(&self) -> Result<Resolution, ResolveError> {
        resolve_siril_with_deps(
            self.explicit.as_deref(),
            self.env.as_ref(),
            self.fs.as_ref(),
            &self.well_known,
        )
    }
}
