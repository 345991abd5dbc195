//! Runtime settings shared by the CLI and the MCP server.

use std::path::PathBuf;
use std::time::Duration;

use crate::mosaic::OutputCheck;

/// Upstream location of the mosaic scripts.
pub const DEFAULT_SCRIPT_BASE_URL: &str =
    "https://raw.githubusercontent.com/naztronaut/siril-scripts/main/";

/// Upper bound for `siril --version` during validation and probing.
pub const DEFAULT_VALIDATE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const SCRIPT_BASE_URL_ENV: &str = "SIRIL_MOSAIC_SCRIPT_BASE_URL";
pub const REQUIRE_OUTPUT_ENV: &str = "SIRIL_MOSAIC_REQUIRE_OUTPUT";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Explicit Siril path; wins over `SIRIL_BINARY` and every search.
    pub siril_binary: Option<PathBuf>,
    pub script_base_url: String,
    pub validate_timeout: Duration,
    pub fetch_timeout: Duration,
    pub output_check: OutputCheck,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            siril_binary: None,
            script_base_url: DEFAULT_SCRIPT_BASE_URL.to_string(),
            validate_timeout: DEFAULT_VALIDATE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            output_check: OutputCheck::default(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(url) = lookup(SCRIPT_BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            settings.script_base_url = normalize_base_url(url.trim());
        }
        if lookup(REQUIRE_OUTPUT_ENV).is_some_and(|v| is_truthy(&v)) {
            settings.output_check = OutputCheck::Require;
        }

        settings
    }
}

/// Ensure the base URL ends in `/` so file names append cleanly.
pub fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
