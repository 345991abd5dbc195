//! Talking to the Siril executable: version queries, validation and probing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{Settings, DEFAULT_VALIDATE_TIMEOUT};
use crate::error::SirilError;
use crate::process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
use crate::resolver::{AttemptOutcome, Locator, Resolution};

pub const VERSION_FLAG: &str = "--version";
pub const SCRIPT_FLAG: &str = "-s";

/// Handle on a (not yet located) Siril installation.
///
/// Cheap to clone; the binary is re-resolved on every call.
#[derive(Clone)]
pub struct Siril {
    locator: Locator,
    runner: Arc<dyn CommandRunner>,
    validate_timeout: Duration,
}

impl fmt::Debug for Siril {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siril")
            .field("locator", &self.locator)
            .field("validate_timeout", &self.validate_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for Siril {
    fn default() -> Self {
        Self::new(Locator::system(), Arc::new(SystemRunner))
    }
}

impl Siril {
    pub fn new(locator: Locator, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            locator,
            runner,
            validate_timeout: DEFAULT_VALIDATE_TIMEOUT,
        }
    }

    /// System locator and runner configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Locator::system().with_explicit(settings.siril_binary.clone()),
            Arc::new(SystemRunner),
        )
        .with_validate_timeout(settings.validate_timeout)
    }

    #[must_use]
    pub fn with_validate_timeout(mut self, timeout: Duration) -> Self {
        self.validate_timeout = timeout;
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub(crate) fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Resolve the executable.
    pub fn locate(&self) -> Result<Resolution, SirilError> {
        let found = self.locator.locate()?;
        info!(path = %found.path.display(), strategy = %found.strategy, "located Siril");
        Ok(found)
    }

    /// Run `siril --version` and return its trimmed stdout.
    pub async fn version(&self) -> Result<String, SirilError> {
        let binary = self.locate()?.path;
        let out = self.runner.run(&Invocation::new(binary).arg(VERSION_FLAG)).await?;
        if !out.success() {
            return Err(SirilError::ProcessFailed {
                context: "Error getting Siril version: ",
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out.stdout.trim().to_string())
    }

    /// Check that `path` is a working Siril binary. Never fails; the outcome
    /// is carried in the returned value.
    pub async fn validate(&self, path: &Path) -> Validation {
        info!(path = %path.display(), "validating Siril binary");
        let validation = match self.locator.check_executable(path) {
            AttemptOutcome::Ok => match self.version_within_timeout(path).await {
                Ok(out) if out.success() => Validation::Working {
                    path: path.to_path_buf(),
                    version: out.stdout.trim().to_string(),
                },
                Ok(out) => Validation::Failed {
                    stderr: out.stderr.trim().to_string(),
                },
                Err(SirilError::Timeout { .. }) => Validation::TimedOut,
                Err(e) => Validation::LaunchError {
                    message: e.to_string(),
                },
            },
            AttemptOutcome::NotExecutable => Validation::NotExecutable {
                path: path.to_path_buf(),
            },
            _ => Validation::NotFound {
                path: path.to_path_buf(),
            },
        };
        if validation.is_working() {
            info!("binary validation successful");
        } else {
            error!(%validation, "binary validation failed");
        }
        validation
    }

    /// Locate Siril and check that it runs. Never fails.
    pub async fn probe(&self) -> Probe {
        info!("searching for Siril binary");
        let found = match self.locate() {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "error finding Siril binary");
                return Probe::Unavailable {
                    message: e.to_string(),
                };
            }
        };

        match self.version_within_timeout(&found.path).await {
            Ok(out) if out.success() => Probe::Working {
                path: found.path,
                version: out.stdout.trim().to_string(),
            },
            Ok(out) => {
                warn!(stderr = %out.stderr.trim(), "Siril binary test failed");
                Probe::Broken {
                    path: found.path,
                    detail: out.stderr.trim().to_string(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Siril binary test failed");
                Probe::Broken {
                    path: found.path,
                    detail: e.to_string(),
                }
            }
        }
    }

    async fn version_within_timeout(&self, path: &Path) -> Result<ProcessOutput, SirilError> {
        self.runner
            .run(
                &Invocation::new(path)
                    .arg(VERSION_FLAG)
                    .timeout(self.validate_timeout),
            )
            .await
    }
}

/// Outcome of [`Siril::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum Validation {
    Working { path: PathBuf, version: String },
    NotFound { path: PathBuf },
    NotExecutable { path: PathBuf },
    Failed { stderr: String },
    TimedOut,
    LaunchError { message: String },
}

impl Validation {
    pub fn is_working(&self) -> bool {
        matches!(self, Self::Working { .. })
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Working { path, version } => write!(
                f,
                "✅ Siril binary works correctly!\nPath: {}\n{version}",
                path.display()
            ),
            Self::NotFound { path } => write!(f, "❌ File not found: {}", path.display()),
            Self::NotExecutable { path } => {
                write!(f, "❌ File is not executable: {}", path.display())
            }
            Self::Failed { stderr } => write!(f, "❌ Binary failed to run: {stderr}"),
            Self::TimedOut => write!(f, "❌ Binary timed out (may be hanging)"),
            Self::LaunchError { message } => write!(f, "❌ Error testing binary: {message}"),
        }
    }
}

/// Outcome of [`Siril::probe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum Probe {
    Working { path: PathBuf, version: String },
    Broken { path: PathBuf, detail: String },
    Unavailable { message: String },
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Working { path, version } => write!(
                f,
                "✅ Found working Siril binary at: {}\n{version}",
                path.display()
            ),
            Self::Broken { path, detail } => write!(
                f,
                "⚠️ Found Siril binary at {} but it failed to run: {detail}",
                path.display()
            ),
            Self::Unavailable { message } => write!(f, "❌ {message}"),
        }
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;
    use crate::resolver::{MockEnv, MockFs};

    const SIRIL: &str = "/usr/bin/siril";

    fn siril_with(runner: Arc<ScriptedRunner>, fs: MockFs) -> Siril {
        let locator = Locator::system()
            .with_env(MockEnv::new().with_var("PATH", "/usr/bin"))
            .with_fs(fs);
        Siril::new(locator, runner)
    }

    #[tokio::test]
    async fn version_returns_trimmed_stdout() {
        let runner = Arc::new(ScriptedRunner::exit(0, "  Siril 1.4.0-beta1\n", ""));
        let siril = siril_with(runner.clone(), MockFs::new().with_executable(SIRIL));

        assert_eq!(siril.version().await.unwrap(), "Siril 1.4.0-beta1");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, PathBuf::from(SIRIL));
        assert_eq!(calls[0].args, vec!["--version".to_string()]);
        assert_eq!(calls[0].timeout, None);
    }

    #[tokio::test]
    async fn version_failure_embeds_stderr() {
        let runner = Arc::new(ScriptedRunner::exit(1, "", "siril: command not found\n"));
        let siril = siril_with(runner, MockFs::new().with_executable(SIRIL));

        let err = siril.version().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error getting Siril version: siril: command not found"
        );
    }

    #[tokio::test]
    async fn version_without_binary_is_not_found() {
        let runner = Arc::new(ScriptedRunner::default());
        let siril = siril_with(runner.clone(), MockFs::new());

        let err = siril.version().await.unwrap_err();
        assert!(matches!(err, SirilError::Resolve(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn validate_reports_missing_and_non_executable_files() {
        let runner = Arc::new(ScriptedRunner::default());
        let siril = siril_with(
            runner.clone(),
            MockFs::new().with_non_executable("/opt/siril"),
        );

        let missing = siril.validate(Path::new("/nope/siril")).await;
        assert_eq!(missing.to_string(), "❌ File not found: /nope/siril");

        let locked = siril.validate(Path::new("/opt/siril")).await;
        assert_eq!(locked.to_string(), "❌ File is not executable: /opt/siril");

        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn validate_uses_bounded_timeout() {
        let runner = Arc::new(ScriptedRunner::exit(0, "Siril 1.4.0\n", ""));
        let siril = siril_with(runner.clone(), MockFs::new().with_executable("/opt/siril"))
            .with_validate_timeout(Duration::from_secs(3));

        let v = siril.validate(Path::new("/opt/siril")).await;
        assert!(v.is_working());
        assert_eq!(
            v.to_string(),
            "✅ Siril binary works correctly!\nPath: /opt/siril\nSiril 1.4.0"
        );
        assert_eq!(runner.calls()[0].timeout, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn validate_maps_timeout_and_failures() {
        let timed_out = Arc::new(ScriptedRunner::replying(Err(SirilError::Timeout {
            program: PathBuf::from("/opt/siril"),
            timeout: Duration::from_secs(10),
        })));
        let siril = siril_with(timed_out, MockFs::new().with_executable("/opt/siril"));
        assert_eq!(siril.validate(Path::new("/opt/siril")).await, Validation::TimedOut);

        let failing = Arc::new(ScriptedRunner::exit(2, "", "GTK init failed\n"));
        let siril = siril_with(failing, MockFs::new().with_executable("/opt/siril"));
        assert_eq!(
            siril.validate(Path::new("/opt/siril")).await.to_string(),
            "❌ Binary failed to run: GTK init failed"
        );
    }

    #[tokio::test]
    async fn probe_never_fails() {
        let runner = Arc::new(ScriptedRunner::default());
        let missing = siril_with(runner, MockFs::new()).probe().await;
        assert!(matches!(missing, Probe::Unavailable { .. }));
        assert!(missing.to_string().starts_with("❌ Siril binary not found."));

        let runner = Arc::new(ScriptedRunner::exit(1, "", "boom"));
        let broken = siril_with(runner, MockFs::new().with_executable(SIRIL))
            .probe()
            .await;
        assert_eq!(
            broken.to_string(),
            "⚠️ Found Siril binary at /usr/bin/siril but it failed to run: boom"
        );

        let runner = Arc::new(ScriptedRunner::exit(0, "Siril 1.4.0\n", ""));
        let working = siril_with(runner, MockFs::new().with_executable(SIRIL))
            .probe()
            .await;
        assert_eq!(
            working,
            Probe::Working {
                path: PathBuf::from(SIRIL),
                version: "Siril 1.4.0".to_string(),
            }
        );
    }
}
