//! Types for Siril executable resolution.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Install convention a well-known location belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    MacOsBundle,
    UnixPrefix,
    Homebrew,
    Linux,
    Wsl,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MacOsBundle => "macOS app bundle",
            Self::UnixPrefix => "/usr/local prefix",
            Self::Homebrew => "Homebrew",
            Self::Linux => "Linux package",
            Self::Wsl => "Windows install via WSL",
        })
    }
}

/// One entry in the fallback probe list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownLocation {
    pub platform: Platform,
    pub path: &'static str,
}

/// Where an explicit override came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideOrigin {
    /// Passed directly by the caller.
    Argument,
    /// Read from `SIRIL_BINARY`.
    Environment,
}

impl fmt::Display for OverrideOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument => f.write_str("Siril binary path"),
            Self::Environment => write!(
                f,
                "Custom Siril binary specified in {} environment variable",
                super::resolve::OVERRIDE_ENV_VAR
            ),
        }
    }
}

/// The strategy that produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "platform")]
pub enum Strategy {
    Explicit,
    Environment,
    SearchPath,
    WellKnown(Platform),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit path"),
            Self::Environment => write!(f, "{}", super::resolve::OVERRIDE_ENV_VAR),
            Self::SearchPath => f.write_str("PATH"),
            Self::WellKnown(p) => write!(f, "well-known location ({p})"),
        }
    }
}

/// A successfully located executable.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub path: PathBuf,
    pub strategy: Strategy,
    /// Every candidate checked on the way, the winner last.
    pub attempts: Vec<Attempt>,
}

/// A single candidate that was checked.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub candidate: PathBuf,
    pub outcome: AttemptOutcome,
}

/// Result of checking one candidate path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "detail")]
pub enum AttemptOutcome {
    Ok,
    NotFound,
    NotAFile,
    NotExecutable,
    PermissionDenied,
    IoError(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::NotFound => write!(f, "not found"),
            Self::NotAFile => write!(f, "not a file"),
            Self::NotExecutable => write!(f, "not executable"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

/// Resolution failed.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// An override was given but does not name an executable file.
    #[error("{origin} is not found or not executable: {} ({outcome})", .path.display())]
    InvalidOverride {
        origin: OverrideOrigin,
        path: PathBuf,
        outcome: AttemptOutcome,
    },

    #[error(
        "Siril binary not found. Please ensure Siril is installed and either:\n\
         1. Add 'siril' to your PATH, or\n\
         2. Install Siril in a standard location like /Applications/Siril.app (macOS), or\n\
         3. Set the SIRIL_BINARY environment variable to the full path of your Siril binary\n\
         Searched locations:\n{attempts}"
    )]
    NotFound { attempts: String },
}

impl ResolveError {
    /// Build a `NotFound` error listing every candidate and its outcome.
    pub fn not_found(attempts: &[Attempt]) -> Self {
        let listed = attempts
            .iter()
            .map(|a| format!("  ✗ {}: {}", a.candidate.display(), a.outcome))
            .collect::<Vec<_>>()
            .join("\n");

        Self::NotFound {
            attempts: if listed.is_empty() {
                "  (no candidates checked)".to_string()
            } else {
                listed
            },
        }
    }
}
