use std::path::Path;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content},
    schemars, ErrorData as McpError,
};
use serde::Deserialize;
use siril_mosaic::fetch::RefreshSummary;
use siril_mosaic::{
    describe_project, refresh_scripts, run_mosaic, FilterMode, HttpScriptSource, MosaicOptions,
    ScriptSource, Settings, Siril, SirilError,
};
use tracing::{error, info};

/// Input for validating a specific binary.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateBinaryInput {
    #[schemars(description = "Full path to the Siril binary to test")]
    pub binary_path: String,
}

/// Filter the frames were shot with; anything else is rejected when the
/// arguments are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// UV/IR block filter.
    Broadband,
    /// Light-pollution filter.
    Narrowband,
}

impl From<FilterType> for FilterMode {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Broadband => FilterMode::Broadband,
            FilterType::Narrowband => FilterMode::Narrowband,
        }
    }
}

/// Input for running the mosaic script.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProcessMosaicInput {
    #[schemars(description = "Path to your project root (must contain a 'lights/' subdir)")]
    pub project_dir: String,
    #[schemars(
        description = "'broadband' for UV/IR block or 'narrowband' for LP filter (default: broadband)"
    )]
    pub filter_type: Option<FilterType>,
}

/// Input for tools that only need a project directory.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProjectDirInput {
    #[schemars(description = "Path to your project root")]
    pub project_dir: String,
}

/// MCP server exposing Siril discovery and Seestar mosaic preprocessing.
#[derive(Clone)]
pub struct SirilMcpServer {
    siril: Siril,
    scripts: Arc<dyn ScriptSource>,
    options: MosaicOptions,
    pub tool_router: ToolRouter<Self>,
}

#[rmcp::tool_router]
impl SirilMcpServer {
    pub fn new(siril: Siril, scripts: Arc<dyn ScriptSource>, options: MosaicOptions) -> Self {
        Self {
            siril,
            scripts,
            options,
            tool_router: Self::tool_router(),
        }
    }

    /// Server wired to the real system, configured from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = Settings::from_env();
        let scripts = HttpScriptSource::new(&settings.script_base_url, settings.fetch_timeout)?;
        Ok(Self::new(
            Siril::from_settings(&settings),
            Arc::new(scripts),
            MosaicOptions {
                output_check: settings.output_check,
            },
        ))
    }

    #[rmcp::tool(
        description = "Runs 'siril --version' on the local machine and returns the version string."
    )]
    async fn check_siril_version(&self) -> Result<CallToolResult, McpError> {
        let version = self.siril.version().await.map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(version)]))
    }

    #[rmcp::tool(
        description = "Locates the Siril binary on your system and returns its path. Useful for troubleshooting installation issues or confirming which Siril will be used."
    )]
    async fn find_siril_binary(&self) -> Result<CallToolResult, McpError> {
        let probe = self.siril.probe().await;
        Ok(CallToolResult::success(vec![Content::text(probe.to_string())]))
    }

    #[rmcp::tool(
        description = "Tests whether a specific Siril binary path works correctly. Useful for validating custom installations or non-standard locations."
    )]
    async fn validate_siril_binary(
        &self,
        Parameters(input): Parameters<ValidateBinaryInput>,
    ) -> Result<CallToolResult, McpError> {
        let validation = self.siril.validate(Path::new(&input.binary_path)).await;
        Ok(CallToolResult::success(vec![Content::text(
            validation.to_string(),
        )]))
    }

    #[rmcp::tool(
        description = "Runs the Siril .ssf mosaic script on all FIT(S) in project_dir/lights, stacking them into a mosaic for Seestar S30/S50. Creates the script in the project directory if it is missing. Returns the path to the resulting mosaic."
    )]
    async fn process_seestar_mosaic(
        &self,
        Parameters(input): Parameters<ProcessMosaicInput>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.process_mosaic_impl(input).await.map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[rmcp::tool(
        description = "Downloads the latest SSF scripts from the naztronaut/siril-scripts repository into the project directory, falling back to the bundled copies when a download fails."
    )]
    async fn download_latest_ssf_scripts(
        &self,
        Parameters(input): Parameters<ProjectDirInput>,
    ) -> Result<CallToolResult, McpError> {
        let summary = self
            .download_scripts_impl(input)
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(summary)]))
    }

    #[rmcp::tool(
        description = "Checks and displays the structure of a Seestar project directory, showing what files are present and what might be missing."
    )]
    async fn check_project_structure(
        &self,
        Parameters(input): Parameters<ProjectDirInput>,
    ) -> Result<CallToolResult, McpError> {
        let report = describe_project(Path::new(&input.project_dir));
        Ok(CallToolResult::success(vec![Content::text(report)]))
    }
}

impl SirilMcpServer {
    async fn process_mosaic_impl(&self, input: ProcessMosaicInput) -> Result<String, SirilError> {
        let mode = input.filter_type.map(FilterMode::from).unwrap_or_default();
        info!(project = %input.project_dir, %mode, "process_seestar_mosaic");
        match run_mosaic(
            &self.siril,
            Path::new(&input.project_dir),
            mode,
            self.options,
        )
        .await
        {
            Ok(run) => Ok(run.output_path.display().to_string()),
            Err(e) => {
                error!(error = %e, "mosaic processing failed");
                Err(e)
            }
        }
    }

    async fn download_scripts_impl(&self, input: ProjectDirInput) -> Result<String, SirilError> {
        let project_dir = Path::new(&input.project_dir);
        let results = refresh_scripts(self.scripts.as_ref(), project_dir).await?;
        Ok(RefreshSummary {
            project_dir,
            results: &results,
        }
        .to_string())
    }
}

/// Validation problems are the caller's to fix; everything else is internal.
fn to_mcp_error(err: SirilError) -> McpError {
    if err.is_invalid_input() {
        McpError::invalid_params(err.to_string(), None)
    } else {
        McpError::internal_error(err.to_string(), None)
    }
}
