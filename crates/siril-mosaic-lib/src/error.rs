//! Error types shared across the crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::ResolveError;

/// Failures surfaced to callers of the Siril operations.
#[derive(Debug, thiserror::Error)]
pub enum SirilError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Unknown filter_type '{0}' (expected 'broadband' or 'narrowband')")]
    UnknownFilter(String),

    #[error("Project directory '{}' does not exist", .0.display())]
    MissingProjectDir(PathBuf),

    #[error("No 'lights' folder found at {}", .0.display())]
    MissingInputDir(PathBuf),

    #[error("Failed to launch {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}{stderr}")]
    ProcessFailed {
        /// Message prefix, separator included.
        context: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{} timed out after {}s (may be hanging)", .program.display(), .timeout.as_secs())]
    Timeout { program: PathBuf, timeout: Duration },

    #[error("Siril finished but the expected mosaic was not produced at {}", .0.display())]
    OutputMissing(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SirilError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure stems from bad caller input rather than the
    /// environment or the external program.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::UnknownFilter(_) | Self::MissingProjectDir(_) | Self::MissingInputDir(_)
        )
    }
}

/// Failure to retrieve a remote script template. Always recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("empty response body from {0}")]
    Empty(String),
}
