//! Running the Seestar mosaic script against a project directory.
//!
//! A project directory holds the raw frames in `lights/`. The script for the
//! chosen [`FilterMode`] is written next to it on first use (and left alone
//! afterwards), then Siril is run in script mode from inside the project so
//! the script's relative paths resolve. By convention the script leaves its
//! products in `process/`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::SirilError;
use crate::process::Invocation;
use crate::scripts::FilterMode;
use crate::siril::{Siril, SCRIPT_FLAG};

/// Subdirectory holding the raw light frames.
pub const INPUT_DIR: &str = "lights";
/// Subdirectory the script writes its products into.
pub const OUTPUT_DIR: &str = "process";
/// Name of the expected stacked result inside [`OUTPUT_DIR`].
pub const OUTPUT_FILE: &str = "mosaic.fits";

/// What to do when Siril exits cleanly but the expected output is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCheck {
    /// Log a warning and still report the expected path.
    #[default]
    Warn,
    /// Fail with [`SirilError::OutputMissing`].
    Require,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MosaicOptions {
    pub output_check: OutputCheck,
}

/// Report of a finished mosaic run.
#[derive(Debug, Clone, Serialize)]
pub struct MosaicRun {
    pub mode: FilterMode,
    pub script_path: PathBuf,
    /// False when an existing script was reused.
    pub script_created: bool,
    pub output_path: PathBuf,
    pub output_present: bool,
    pub stdout: String,
}

/// Path the script is expected to leave its mosaic at.
pub fn expected_output(project_dir: &Path) -> PathBuf {
    project_dir.join(OUTPUT_DIR).join(OUTPUT_FILE)
}

/// Check the preconditions of a mosaic run without side effects.
pub fn check_project(project_dir: &Path) -> Result<(), SirilError> {
    let lights = project_dir.join(INPUT_DIR);
    if !lights.is_dir() {
        return Err(SirilError::MissingInputDir(lights));
    }
    Ok(())
}

/// Write the script for `mode` into `project_dir` unless a file with that name
/// already exists. Returns the script path and whether it was written.
pub fn ensure_script(project_dir: &Path, mode: FilterMode) -> Result<(PathBuf, bool), SirilError> {
    let path = project_dir.join(mode.script_name());
    if path.is_file() {
        return Ok((path, false));
    }
    std::fs::write(&path, mode.script_contents()).map_err(|e| SirilError::io(&path, e))?;
    info!(script = %path.display(), "created SSF script");
    Ok((path, true))
}

/// Preprocess `project_dir/lights` into a mosaic.
///
/// Nothing is written and nothing is spawned unless `lights/` exists. Siril
/// gets exactly `-s <script name>` with the project as its working directory.
/// A non-zero exit fails with Siril's stderr.
pub async fn run_mosaic(
    siril: &Siril,
    project_dir: &Path,
    mode: FilterMode,
    options: MosaicOptions,
) -> Result<MosaicRun, SirilError> {
    info!(project = %project_dir.display(), %mode, "starting Seestar mosaic processing");
    check_project(project_dir)?;

    let (script_path, script_created) = ensure_script(project_dir, mode)?;
    let binary = siril.locate()?.path;

    let invocation = Invocation::new(binary)
        .arg(SCRIPT_FLAG)
        .arg(mode.script_name())
        .current_dir(project_dir);
    let out = siril.runner().run(&invocation).await?;

    if !out.success() {
        error!(code = ?out.code, "mosaic processing failed");
        return Err(SirilError::ProcessFailed {
            context: "Siril failed:\n",
            code: out.code,
            stderr: out.stderr,
        });
    }

    let output_path = expected_output(project_dir);
    let output_present = output_path.is_file();
    if !output_present {
        match options.output_check {
            OutputCheck::Warn => {
                warn!(
                    output = %output_path.display(),
                    "Siril succeeded but expected mosaic is missing"
                );
            }
            OutputCheck::Require => return Err(SirilError::OutputMissing(output_path)),
        }
    }

    info!(output = %output_path.display(), "mosaic processing completed");
    Ok(MosaicRun {
        mode,
        script_path,
        script_created,
        output_path,
        output_present,
        stdout: out.stdout,
    })
}
