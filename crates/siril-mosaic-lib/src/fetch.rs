//! Refreshing the SSF scripts from upstream, with the embedded copies as fallback.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::normalize_base_url;
use crate::error::{FetchError, SirilError};
use crate::scripts::FilterMode;

/// Somewhere script templates can be downloaded from.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Fetch the current text of the script named `file_name`.
    async fn fetch(&self, file_name: &str) -> Result<String, FetchError>;

    /// Human-readable location of `file_name`, for logs.
    fn describe(&self, file_name: &str) -> String;
}

/// Plain HTTP(S) `GET` of `<base_url><file_name>`.
#[derive(Debug, Clone)]
pub struct HttpScriptSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScriptSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("siril-mosaic/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }
}

#[async_trait]
impl ScriptSource for HttpScriptSource {
    async fn fetch(&self, file_name: &str) -> Result<String, FetchError> {
        let url = self.describe(file_name);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::Empty(url));
        }
        Ok(body)
    }

    fn describe(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.base_url)
    }
}

/// How one script ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "source")]
pub enum RefreshOutcome {
    Downloaded,
    /// The embedded template was written instead.
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRefresh {
    pub mode: FilterMode,
    pub path: PathBuf,
    pub outcome: RefreshOutcome,
}

impl ScriptRefresh {
    pub fn file_name(&self) -> &str {
        self.mode.script_name()
    }
}

/// Summary line for a batch of refreshes.
pub struct RefreshSummary<'a> {
    pub project_dir: &'a Path,
    pub results: &'a [ScriptRefresh],
}

impl fmt::Display for RefreshSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .results
            .iter()
            .map(|r| match r.outcome {
                RefreshOutcome::Downloaded => r.file_name().to_string(),
                RefreshOutcome::Fallback { .. } => format!("{} (fallback)", r.file_name()),
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Downloaded scripts to {}: {names}",
            self.project_dir.display()
        )
    }
}

/// Overwrite every mode's script in `project_dir` with the upstream version,
/// falling back to the embedded template per script when the download fails.
///
/// Download failures are logged, never returned. Only a missing project
/// directory or a failed local write is an error.
pub async fn refresh_scripts(
    source: &dyn ScriptSource,
    project_dir: &Path,
) -> Result<Vec<ScriptRefresh>, SirilError> {
    if !project_dir.is_dir() {
        return Err(SirilError::MissingProjectDir(project_dir.to_path_buf()));
    }
    info!(project = %project_dir.display(), "downloading latest SSF scripts");

    let mut results = Vec::with_capacity(FilterMode::ALL.len());
    for mode in FilterMode::ALL {
        let name = mode.script_name();
        let path = project_dir.join(name);

        info!(script = name, from = %source.describe(name), "downloading");
        let (text, outcome) = match source.fetch(name).await {
            Ok(text) => (text, RefreshOutcome::Downloaded),
            Err(e) => {
                warn!(script = name, error = %e, "download failed, writing embedded copy");
                (
                    mode.script_contents().to_string(),
                    RefreshOutcome::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        tokio::fs::write(&path, text)
            .await
            .map_err(|e| SirilError::io(&path, e))?;
        results.push(ScriptRefresh {
            mode,
            path,
            outcome,
        });
    }

    info!("script download completed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves fixed bodies; unknown names fail with a 404.
    struct StaticSource(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl ScriptSource for StaticSource {
        async fn fetch(&self, file_name: &str) -> Result<String, FetchError> {
            self.0
                .get(file_name)
                .map(|s| s.to_string())
                .ok_or_else(|| FetchError::Status {
                    url: self.describe(file_name),
                    status: 404,
                })
        }

        fn describe(&self, file_name: &str) -> String {
            format!("memory://{file_name}")
        }
    }

    #[tokio::test]
    async fn partial_success_mixes_download_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticSource(HashMap::from([(
            FilterMode::Broadband.script_name(),
            "requires 1.4.0\n# upstream\n",
        )]));

        let results = refresh_scripts(&source, dir.path()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].mode, FilterMode::Broadband);
        assert_eq!(results[0].outcome, RefreshOutcome::Downloaded);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(FilterMode::Broadband.script_name())).unwrap(),
            "requires 1.4.0\n# upstream\n"
        );

        assert_eq!(results[1].mode, FilterMode::Narrowband);
        match &results[1].outcome {
            RefreshOutcome::Fallback { reason } => assert!(reason.contains("404")),
            other => panic!("expected fallback, got {other:?}"),
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join(FilterMode::Narrowband.script_name())).unwrap(),
            FilterMode::Narrowband.script_contents()
        );

        let summary = RefreshSummary {
            project_dir: dir.path(),
            results: &results,
        }
        .to_string();
        assert!(summary.ends_with(
            ": Naztronomy-Seestar_Broadband_Mosaic.ssf, Naztronomy-Seestar_Narrowband_Mosaic.ssf (fallback)"
        ));
    }

    #[tokio::test]
    async fn refresh_overwrites_existing_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join(FilterMode::Broadband.script_name());
        std::fs::write(&script, "stale").unwrap();

        let results = refresh_scripts(&StaticSource(HashMap::new()), dir.path())
            .await
            .unwrap();

        assert!(results
            .iter()
            .all(|r| matches!(r.outcome, RefreshOutcome::Fallback { .. })));
        assert_eq!(
            std::fs::read_to_string(&script).unwrap(),
            FilterMode::Broadband.script_contents()
        );
    }

    #[tokio::test]
    async fn missing_project_dir_is_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = refresh_scripts(&StaticSource(HashMap::new()), &missing)
            .await
            .unwrap_err();
        assert!(matches!(err, SirilError::MissingProjectDir(_)));
    }

    #[tokio::test]
    async fn unreachable_http_source_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        // Port 9 (discard) on loopback refuses connections on typical hosts.
        let source =
            HttpScriptSource::new("http://127.0.0.1:9/scripts", Duration::from_secs(2)).unwrap();
        assert_eq!(
            source.describe("a.ssf"),
            "http://127.0.0.1:9/scripts/a.ssf"
        );

        let results = refresh_scripts(&source, dir.path()).await.unwrap();
        assert!(results
            .iter()
            .all(|r| matches!(r.outcome, RefreshOutcome::Fallback { .. })));
    }
}
