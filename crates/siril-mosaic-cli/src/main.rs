//! CLI for locating Siril and running the Seestar mosaic scripts.
//!
//! Subcommands:
//!  - `locate`        : show which Siril binary would be used and how it was found.
//!  - `version`       : run `siril --version`.
//!  - `validate`      : check that a specific binary path works.
//!  - `mosaic`        : run the broadband or narrowband mosaic script on a project.
//!  - `fetch-scripts` : download the latest SSF scripts into a project.
//!  - `structure`     : describe a project directory.
//!
//! Settings come from the environment (`SIRIL_BINARY`,
//! `SIRIL_MOSAIC_SCRIPT_BASE_URL`, `SIRIL_MOSAIC_REQUIRE_OUTPUT`) and are
//! overridden by the flags below. Logs go to stderr so stdout stays parseable.
//!
//! Usage examples:
//!  cargo run -p siril-mosaic -- locate
//!  cargo run -p siril-mosaic -- mosaic ~/astro/m42 --filter narrowband

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use siril_mosaic::fetch::RefreshSummary;
use siril_mosaic::{
    describe_project, refresh_scripts, run_mosaic, FilterMode, HttpScriptSource, MosaicOptions,
    OutputCheck, Settings, Siril,
};

/// CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "siril-mosaic",
    about = "Drive Siril's Seestar mosaic preprocessing from the command line",
    version
)]
struct Cli {
    /// Use this Siril binary instead of searching for one.
    #[arg(long, global = true, value_name = "PATH")]
    siril: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which Siril binary would be used.
    Locate(LocateArgs),

    /// Print the output of `siril --version`.
    Version,

    /// Check whether a specific binary is a working Siril.
    Validate(ValidateArgs),

    /// Run the mosaic script on `<PROJECT>/lights`.
    Mosaic(MosaicArgs),

    /// Download the latest SSF scripts into a project, overwriting local copies.
    FetchScripts(FetchArgs),

    /// Describe what a project directory contains.
    Structure(StructureArgs),
}

#[derive(Args, Debug)]
struct LocateArgs {
    /// Output as JSON, including every candidate checked.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path of the binary to test.
    #[arg(value_name = "PATH")]
    binary: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct MosaicArgs {
    /// Project root containing a `lights/` directory.
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// broadband (UV/IR block) or narrowband (LP filter).
    #[arg(long, short, default_value_t = FilterMode::Broadband)]
    filter: FilterMode,

    /// Fail when Siril exits cleanly but `process/mosaic.fits` is missing.
    #[arg(long)]
    require_output: bool,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Project root to write the scripts into.
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Download from this base URL instead of the configured one.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct StructureArgs {
    /// Project root to inspect.
    #[arg(value_name = "PROJECT")]
    project: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = cli.settings();
    let siril = Siril::from_settings(&settings);

    match cli.command {
        Commands::Locate(args) => run_locate(&siril, args),
        Commands::Version => run_version(&siril).await,
        Commands::Validate(args) => run_validate(&siril, args).await,
        Commands::Mosaic(args) => run_mosaic_cmd(&siril, &settings, args).await,
        Commands::FetchScripts(args) => run_fetch(&settings, args).await,
        Commands::Structure(args) => {
            println!("{}", describe_project(&args.project));
            Ok(())
        }
    }
}

impl Cli {
    /// Environment settings with the global flags applied.
    fn settings(&self) -> Settings {
        let mut settings = Settings::from_env();
        if let Some(path) = &self.siril {
            settings.siril_binary = Some(path.clone());
        }
        settings
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_locate(siril: &Siril, args: LocateArgs) -> Result<()> {
    let found = siril.locate()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        println!("{}", found.path.display());
        println!("  found via: {}", found.strategy);
    }
    Ok(())
}

async fn run_version(siril: &Siril) -> Result<()> {
    println!("{}", siril.version().await?);
    Ok(())
}

async fn run_validate(siril: &Siril, args: ValidateArgs) -> Result<()> {
    let validation = siril.validate(&args.binary).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&validation)?);
        ensure!(
            validation.is_working(),
            "'{}' is not a working Siril binary",
            args.binary.display()
        );
    } else {
        ensure!(validation.is_working(), "{validation}");
        println!("{validation}");
    }
    Ok(())
}

async fn run_mosaic_cmd(siril: &Siril, settings: &Settings, args: MosaicArgs) -> Result<()> {
    let options = MosaicOptions {
        output_check: if args.require_output {
            OutputCheck::Require
        } else {
            settings.output_check
        },
    };

    info!(
        project = %args.project.display(),
        filter = %args.filter,
        output_check = ?options.output_check,
        "running mosaic"
    );
    let run = run_mosaic(siril, &args.project, args.filter, options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }
    if run.script_created {
        eprintln!("Wrote {}", run.script_path.display());
    }
    println!("{}", run.output_path.display());
    Ok(())
}

async fn run_fetch(settings: &Settings, args: FetchArgs) -> Result<()> {
    let base_url = args.base_url.as_deref().unwrap_or(&settings.script_base_url);
    let source = HttpScriptSource::new(base_url, settings.fetch_timeout)
        .context("failed to build HTTP client")?;

    info!(project = %args.project.display(), base_url, "fetching SSF scripts");
    let results = refresh_scripts(&source, &args.project).await?;

    if args.json {
        let out = json!({
            "project_dir": args.project.to_string_lossy(),
            "base_url": base_url,
            "scripts": results,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{}",
            RefreshSummary {
                project_dir: &args.project,
                results: &results,
            }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mosaic_defaults_to_broadband() {
        let cli = Cli::try_parse_from(["siril-mosaic", "mosaic", "/data/m42"]).unwrap();
        match cli.command {
            Commands::Mosaic(args) => {
                assert_eq!(args.project, PathBuf::from("/data/m42"));
                assert_eq!(args.filter, FilterMode::Broadband);
                assert!(!args.require_output);
                assert!(!args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn filter_is_parsed_exactly() {
        let cli = Cli::try_parse_from([
            "siril-mosaic",
            "mosaic",
            "/data/m42",
            "--filter",
            "narrowband",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mosaic(MosaicArgs {
                filter: FilterMode::Narrowband,
                ..
            })
        ));

        let err = Cli::try_parse_from(["siril-mosaic", "mosaic", "/data/m42", "-f", "Narrowband"])
            .unwrap_err();
        assert!(err.to_string().contains("Unknown filter_type 'Narrowband'"));
    }

    #[test]
    fn global_siril_flag_overrides_environment() {
        let cli =
            Cli::try_parse_from(["siril-mosaic", "locate", "--siril", "/opt/siril/bin/siril"])
                .unwrap();
        assert_eq!(
            cli.settings().siril_binary,
            Some(PathBuf::from("/opt/siril/bin/siril"))
        );
    }

    #[test]
    fn fetch_scripts_takes_base_url() {
        let cli = Cli::try_parse_from([
            "siril-mosaic",
            "fetch-scripts",
            "proj",
            "--base-url",
            "https://example.org/ssf",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::FetchScripts(args) => {
                assert_eq!(args.base_url.as_deref(), Some("https://example.org/ssf"));
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn validate_requires_a_path() {
        assert!(Cli::try_parse_from(["siril-mosaic", "validate"]).is_err());
    }
}
